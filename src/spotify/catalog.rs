use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::SpotifyError,
    types::{SearchResponse, Track},
};

/// GETs `url` with the bearer token and decodes the JSON body as `T`.
///
/// # Errors
///
/// - [`SpotifyError::Network`] on transport failure
/// - [`SpotifyError::HttpStatus`] on any non-2xx status
/// - [`SpotifyError::MalformedResponse`] when the body does not decode as `T`
async fn get_json<T, Q>(
    client: &Client,
    url: &str,
    authorization: &str,
    query: &Q,
) -> Result<T, SpotifyError>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let response = client
        .get(url)
        .query(query)
        .header(AUTHORIZATION, authorization)
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SpotifyError::HttpStatus(status));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

const NO_QUERY: &[(&str, &str)] = &[];

pub async fn get_track(
    client: &Client,
    api_url: &str,
    authorization: &str,
    track_id: &str,
) -> Result<Track, SpotifyError> {
    let url = format!("{}/tracks/{}", api_url, track_id);
    get_json(client, &url, authorization, NO_QUERY).await
}

pub async fn search_tracks(
    client: &Client,
    api_url: &str,
    authorization: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<Track>, SpotifyError> {
    let url = format!("{}/search", api_url);
    let limit = limit.to_string();
    let params = [("q", query), ("type", "track"), ("limit", limit.as_str())];
    let response: SearchResponse = get_json(client, &url, authorization, &params[..]).await?;
    Ok(response.tracks.items)
}

/// Album object exactly as the Web API returns it.
pub async fn get_album(
    client: &Client,
    api_url: &str,
    authorization: &str,
    album_id: &str,
) -> Result<Value, SpotifyError> {
    let url = format!("{}/albums/{}", api_url, album_id);
    get_json(client, &url, authorization, NO_QUERY).await
}

/// Playlist object exactly as the Web API returns it, local files included.
pub async fn get_playlist(
    client: &Client,
    api_url: &str,
    authorization: &str,
    playlist_id: &str,
) -> Result<Value, SpotifyError> {
    let url = format!("{}/playlists/{}", api_url, playlist_id);
    get_json(client, &url, authorization, NO_QUERY).await
}

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};

use crate::{
    error::SpotifyError,
    proto::{CanvasResponse, encode_request},
};

/// The canvas endpoint only answers the mobile app.
pub const MOBILE_USER_AGENT: &str = "Spotify/9.0.34.593 iOS/18.4 (iPhone15,3)";

/// Posts an encoded canvas request and decodes the answer.
///
/// `authorization` is the full header value, `Bearer <token>`.
pub async fn fetch_canvases<S: AsRef<str>>(
    client: &Client,
    canvas_url: &str,
    authorization: &str,
    track_uris: &[S],
) -> Result<CanvasResponse, SpotifyError> {
    let response = client
        .post(canvas_url)
        .header(ACCEPT, "application/protobuf")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT_LANGUAGE, "en")
        .header(USER_AGENT, MOBILE_USER_AGENT)
        .header(AUTHORIZATION, authorization)
        .body(encode_request(track_uris))
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(SpotifyError::HttpStatus(status));
    }

    let body = response.bytes().await?;
    Ok(CanvasResponse::decode(&body)?)
}

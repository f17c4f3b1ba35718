use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    api::{ApiError, api_error},
    spotify::SpotifyClient,
    types::TrackView,
    utils,
};

const DEFAULT_SEARCH_LIMIT: u32 = 10;
const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// Passes the Web API album object through unchanged.
pub async fn album(
    Path(id): Path<String>,
    Extension(client): Extension<SpotifyClient>,
) -> Result<Json<Value>, ApiError> {
    client
        .get_album(&id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Album not found"))
}

/// Passes the Web API playlist object through unchanged.
pub async fn playlist(
    Path(id): Path<String>,
    Extension(client): Extension<SpotifyClient>,
) -> Result<Json<Value>, ApiError> {
    client
        .get_playlist(&id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Playlist not found"))
}

pub async fn search(
    Query(params): Query<SearchParams>,
    Extension(client): Extension<SpotifyClient>,
) -> Result<Json<Vec<TrackView>>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query parameter q is required"));
    }

    // the Web API rejects limits outside 1..=50
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    match client.search_tracks(query, limit).await {
        Some(tracks) => Ok(Json(
            tracks.iter().map(|t| utils::map_track(t, "")).collect(),
        )),
        None => Err(api_error(StatusCode::BAD_GATEWAY, "Search failed")),
    }
}

use axum::{Extension, Json, extract::Path, http::StatusCode};

use crate::{
    api::{ApiError, api_error},
    spotify::SpotifyClient,
    types::{CanvasView, TrackView},
    utils,
};

pub const CANVAS_NOT_AVAILABLE: &str = "Canvas not available";

pub async fn track(
    Path(id): Path<String>,
    Extension(client): Extension<SpotifyClient>,
) -> Result<Json<TrackView>, ApiError> {
    match client.get_track(&id).await {
        Some(track) => Ok(Json(utils::map_track(&track, ""))),
        None => Err(api_error(StatusCode::NOT_FOUND, "Track not found")),
    }
}

pub async fn track_canvas(
    Path(id): Path<String>,
    Extension(client): Extension<SpotifyClient>,
) -> Json<CanvasView> {
    let canvas_url = client
        .get_canvas_by_track_id(&id)
        .await
        .and_then(|response| response.canvas_url().map(str::to_string));

    let message = match canvas_url {
        Some(_) => None,
        None => Some(CANVAS_NOT_AVAILABLE.to_string()),
    };

    Json(CanvasView {
        id,
        canvas_url,
        message,
    })
}

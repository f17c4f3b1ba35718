//! # API Module
//!
//! HTTP handlers for the local server. Each handler is a thin caller of
//! [`SpotifyClient`](crate::spotify::SpotifyClient), which is shared with the
//! handlers through an axum [`Extension`](axum::Extension).
//!
//! ## Endpoints
//!
//! - [`health`] - status, version and auth readiness
//! - [`track`] - `GET /spotify/track/{id}`, mapped to [`TrackView`](crate::types::TrackView)
//! - [`track_canvas`] - `GET /spotify/track/{id}/canvas`
//! - [`album`] - `GET /spotify/album/{id}`
//! - [`playlist`] - `GET /spotify/playlist/{id}`
//! - [`search`] - `GET /spotify/search?q=&limit=`
//!
//! Lookups that produce nothing answer `404` with `{"error": "..."}`. The
//! canvas endpoint is the exception: a missing canvas is a normal answer and
//! comes back as `200` with `canvasUrl: null`.

mod catalog;
mod health;
mod track;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

pub use catalog::{SearchParams, album, playlist, search};
pub use health::health;
pub use track::{CANVAS_NOT_AVAILABLE, track, track_canvas};

pub type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

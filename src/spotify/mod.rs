//! # Spotify Integration Module
//!
//! HTTP calls against the web player and the Web API, plus [`SpotifyClient`],
//! the thin front that attaches the current bearer token to them.
//!
//! ## Endpoint families
//!
//! ```text
//! open.spotify.com        /api/server-time, /api/token   browser UA + sp_dc cookie
//! spclient.wg.spotify.com /canvaz-cache/v0/canvases       mobile app UA, protobuf body
//! api.spotify.com         /v1/tracks, /albums, ...        bearer token, JSON
//! ```
//!
//! The families check different headers, so each module builds its own.
//! Albums and playlists are handed on as the raw JSON the Web API sent;
//! tracks and search results are decoded into [`Track`].
//!
//! ## Failure policy
//!
//! Every [`SpotifyClient`] call returns `None` on any failure (no token,
//! transport error, non-success status, undecodable body) and logs why.
//! Nothing is retried.

pub mod auth;
pub mod canvas;
pub mod catalog;
pub mod time;

use std::{sync::Arc, time::Duration};

use reqwest::{
    Client,
    header::{COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT},
};
use serde_json::Value;

use crate::{
    config::Endpoints,
    error::SpotifyError,
    management::AuthManager,
    proto::CanvasResponse,
    types::Track,
    utils,
};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";
pub const WEB_PLAYER_ORIGIN: &str = "https://open.spotify.com/";

/// Timeout for every request that does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn http_client() -> Result<Client, SpotifyError> {
    Ok(Client::builder().timeout(DEFAULT_TIMEOUT).build()?)
}

/// Headers the web player endpoints expect: browser user agent, origin,
/// referer and the `sp_dc` session cookie.
pub fn web_player_headers(sp_dc: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ORIGIN, HeaderValue::from_static(WEB_PLAYER_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(WEB_PLAYER_ORIGIN));

    if !sp_dc.is_empty() {
        match HeaderValue::from_str(&format!("sp_dc={}", sp_dc)) {
            Ok(cookie) => {
                headers.insert(COOKIE, cookie);
            }
            Err(_) => tracing::warn!("SP_DC contains characters not allowed in a cookie"),
        }
    }

    headers
}

/// Authenticated calls against the Web API and the canvas endpoint.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    endpoints: Endpoints,
    auth: Arc<AuthManager>,
}

impl SpotifyClient {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            http: auth.http().clone(),
            endpoints: auth.options().endpoints.clone(),
            auth,
        }
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    /// Current `Bearer <token>` value, if one is held.
    pub async fn get_access_token(&self) -> Option<String> {
        self.auth.token().await
    }

    async fn require_token(&self) -> Option<String> {
        match self.auth.require_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "request skipped");
                None
            }
        }
    }

    pub async fn get_track(&self, track_id: &str) -> Option<Track> {
        let token = self.require_token().await?;
        catalog::get_track(&self.http, &self.endpoints.api_url, &token, track_id)
            .await
            .inspect_err(|e| tracing::error!(track_id, error = %e, "failed to fetch track"))
            .ok()
    }

    pub async fn search_tracks(&self, query: &str, limit: u32) -> Option<Vec<Track>> {
        let token = self.require_token().await?;
        catalog::search_tracks(&self.http, &self.endpoints.api_url, &token, query, limit)
            .await
            .inspect_err(|e| tracing::error!(query, error = %e, "failed to search tracks"))
            .ok()
    }

    /// Raw Web API album JSON.
    pub async fn get_album(&self, album_id: &str) -> Option<Value> {
        let token = self.require_token().await?;
        catalog::get_album(&self.http, &self.endpoints.api_url, &token, album_id)
            .await
            .inspect_err(|e| tracing::error!(album_id, error = %e, "failed to fetch album"))
            .ok()
    }

    /// Raw Web API playlist JSON.
    pub async fn get_playlist(&self, playlist_id: &str) -> Option<Value> {
        let token = self.require_token().await?;
        catalog::get_playlist(&self.http, &self.endpoints.api_url, &token, playlist_id)
            .await
            .inspect_err(|e| tracing::error!(playlist_id, error = %e, "failed to fetch playlist"))
            .ok()
    }

    pub async fn get_canvas_by_track_id(&self, track_id: &str) -> Option<CanvasResponse> {
        self.get_canvas(&utils::track_uri(track_id)).await
    }

    pub async fn get_canvas(&self, track_uri: &str) -> Option<CanvasResponse> {
        let token = self.require_token().await?;
        canvas::fetch_canvases(&self.http, &self.endpoints.canvas_url, &token, &[track_uri])
            .await
            .inspect_err(|e| tracing::error!(track_uri, error = %e, "canvas request failed"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_player_headers_carry_cookie() {
        let headers = web_player_headers("abc");
        assert_eq!(headers[COOKIE], "sp_dc=abc");
        assert_eq!(headers[ORIGIN], WEB_PLAYER_ORIGIN);
        assert_eq!(headers[USER_AGENT], BROWSER_USER_AGENT);
    }

    #[test]
    fn empty_or_invalid_cookie_is_left_out() {
        assert!(web_player_headers("").get(COOKIE).is_none());
        assert!(web_player_headers("bad\nvalue").get(COOKIE).is_none());
    }
}

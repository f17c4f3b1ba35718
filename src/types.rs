use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Secret table: version key -> masked secret bytes.
pub type SecretsMap = HashMap<String, Vec<u32>>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: Option<String>,
}

// Local files in playlists come back with `"id": null` on the track, its
// album and its artists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Absent on tracks nested inside an album.
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub duration_ms: u64,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub release_date: String,
    pub total_tracks: u32,
    #[serde(default)]
    pub images: Vec<Image>,
    pub tracks: Paging<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// `null` for tracks that are no longer available.
    pub track: Option<Track>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: PlaylistOwner,
    pub tracks: Paging<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Duration {
    pub ms: u64,
    /// `m:ss`
    pub human: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artwork {
    pub url: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumArt {
    pub sm: Artwork,
    pub lg: Artwork,
    pub xl: Artwork,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumView {
    pub id: String,
    pub name: String,
    pub link: String,
    pub art: AlbumArt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistView {
    pub id: Option<String>,
    pub name: String,
    /// `None` for artists of local files.
    pub link: Option<String>,
}

/// Track as served by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackView {
    pub id: Option<String>,
    pub name: String,
    pub duration: Duration,
    pub preview: Option<String>,
    pub popularity: Option<u32>,
    pub album: Option<AlbumView>,
    pub artists: Vec<ArtistView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    pub id: String,
    pub canvas_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub name: String,
    pub artists: String,
    pub duration: String,
    pub id: String,
}

use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::types::{
    self, AlbumArt, AlbumView, ArtistView, Artwork, Image, Track, TrackTableRow, TrackView,
};

const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Current Unix time in milliseconds. A clock set before 1970 reads as 0.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// `spotify:track:<id>` for a bare id; full URIs are returned unchanged.
pub fn track_uri(track_id: &str) -> String {
    if track_id.starts_with(TRACK_URI_PREFIX) {
        track_id.to_string()
    } else {
        format!("{}{}", TRACK_URI_PREFIX, track_id)
    }
}

/// Formats milliseconds as `m:ss`.
pub fn ms_to_human(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Route of a catalog object on this service, e.g. `/spotify/album/<id>`.
pub fn resource_link(base_path: &str, kind: &str, id: &str) -> String {
    format!("{}/spotify/{}/{}", base_path.trim_end_matches('/'), kind, id)
}

fn artwork(images: &[Image], index: usize, fallback_size: u32) -> Artwork {
    match images.get(index) {
        Some(image) => Artwork {
            url: image.url.clone(),
            size: image.width.unwrap_or(fallback_size),
        },
        None => Artwork {
            url: String::new(),
            size: fallback_size,
        },
    }
}

/// Album art in three sizes. The Web API lists images largest first.
pub fn album_art(images: &[Image]) -> AlbumArt {
    AlbumArt {
        sm: artwork(images, 2, 64),
        lg: artwork(images, 1, 300),
        xl: artwork(images, 0, 640),
    }
}

/// Maps a Web API track onto the shape served by the HTTP API. Links are
/// prefixed with `base_path` (empty for root-relative links).
pub fn map_track(track: &Track, base_path: &str) -> TrackView {
    TrackView {
        id: track.id.clone(),
        name: track.name.clone(),
        duration: types::Duration {
            ms: track.duration_ms,
            human: ms_to_human(track.duration_ms),
        },
        preview: track.preview_url.clone(),
        popularity: track.popularity,
        // an album without id (local file) is reported as no album
        album: track.album.as_ref().and_then(|album| {
            let id = album.id.as_deref()?;
            Some(AlbumView {
                id: id.to_string(),
                name: album.name.clone(),
                link: resource_link(base_path, "album", id),
                art: album_art(&album.images),
            })
        }),
        artists: track
            .artists
            .iter()
            .map(|artist| ArtistView {
                id: artist.id.clone(),
                name: artist.name.clone(),
                link: artist
                    .id
                    .as_deref()
                    .map(|id| resource_link(base_path, "artist", id)),
            })
            .collect(),
    }
}

pub fn artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn track_table_rows<'a, I>(tracks: I) -> Vec<TrackTableRow>
where
    I: IntoIterator<Item = &'a Track>,
{
    tracks
        .into_iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            position: i + 1,
            name: track.name.clone(),
            artists: artist_names(track),
            duration: ms_to_human(track.duration_ms),
            id: track.id.clone().unwrap_or_else(|| "local".to_string()),
        })
        .collect()
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.into());
    pb
}

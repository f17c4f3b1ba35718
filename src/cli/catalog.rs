use serde::de::DeserializeOwned;
use serde_json::Value;
use tabled::Table;

use crate::{
    cli::connect,
    error, info,
    types::{Album, Playlist},
    utils, warning,
};

/// Reads the fields the tables need out of a raw Web API object.
fn decode<T: DeserializeOwned>(kind: &str, id: &str, raw: Value) -> T {
    match serde_json::from_value(raw) {
        Ok(value) => value,
        Err(e) => error!("Cannot read {} {}. Err: {}", kind, id, e),
    }
}

pub async fn track(track_id: &str) {
    let client = connect().await;

    let pb = utils::spinner(format!("Fetching track {}...", track_id));
    let track = client.get_track(track_id).await;
    pb.finish_and_clear();

    let Some(track) = track else {
        error!("Track {} not found.", track_id);
    };

    let view = utils::map_track(&track, "");
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Cannot render track. Err: {}", e),
    }
}

pub async fn album(album_id: &str) {
    let client = connect().await;

    let pb = utils::spinner(format!("Fetching album {}...", album_id));
    let album = client.get_album(album_id).await;
    pb.finish_and_clear();

    let Some(album) = album else {
        error!("Album {} not found.", album_id);
    };
    let album: Album = decode("album", album_id, album);

    let artists = album
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    info!(
        "{} by {} ({}, {} tracks)",
        album.name, artists, album.release_date, album.total_tracks
    );
    println!("{}", Table::new(utils::track_table_rows(&album.tracks.items)));
}

pub async fn playlist(playlist_id: &str) {
    let client = connect().await;

    let pb = utils::spinner(format!("Fetching playlist {}...", playlist_id));
    let playlist = client.get_playlist(playlist_id).await;
    pb.finish_and_clear();

    let Some(playlist) = playlist else {
        error!("Playlist {} not found.", playlist_id);
    };
    let playlist: Playlist = decode("playlist", playlist_id, playlist);

    let owner = playlist
        .owner
        .display_name
        .as_deref()
        .unwrap_or(&playlist.owner.id);
    info!("{} by {}", playlist.name, owner);

    // unavailable tracks come back as null
    let tracks = playlist.tracks.items.iter().filter_map(|i| i.track.as_ref());
    println!("{}", Table::new(utils::track_table_rows(tracks)));
}

pub async fn search(query: &str, limit: u32) {
    let client = connect().await;

    let pb = utils::spinner(format!("Searching for \"{}\"...", query));
    let tracks = client.search_tracks(query, limit).await;
    pb.finish_and_clear();

    match tracks {
        Some(tracks) if tracks.is_empty() => warning!("No tracks found for \"{}\"", query),
        Some(tracks) => println!("{}", Table::new(utils::track_table_rows(&tracks))),
        None => error!("Search for \"{}\" failed.", query),
    }
}

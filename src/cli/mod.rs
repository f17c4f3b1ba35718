//! # CLI Module
//!
//! User-facing commands. Every command builds its own
//! [`AuthManager`](crate::management::AuthManager) from the environment,
//! so one-shot commands pay for a secret fetch and a token request each run;
//! only `serve` keeps the manager alive and refreshes on a schedule.
//!
//! ## Commands
//!
//! - [`serve`] - run the HTTP API until interrupted
//! - [`token`] - print a fresh web player bearer token
//! - [`totp`] - print the current TOTP code and secret version
//! - [`canvas`] - print (and optionally open) the canvas URL of a track
//! - [`track`], [`album`], [`playlist`], [`search`] - catalog lookups
//!
//! ## Output
//!
//! Progress is shown with `indicatif` spinners, listings with `tabled`, and
//! status lines with the crate's [`info!`](crate::info), [`success!`](crate::success),
//! [`warning!`](crate::warning) and [`error!`](crate::error) macros. `error!`
//! exits the process.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spcanvas serve                       # API on SERVER_ADDRESS
//! spcanvas canvas 4uLU6hMCjMI75M1A2tKUQC --open
//! spcanvas search "daft punk" --limit 5
//! ```

mod auth;
mod canvas;
mod catalog;
mod serve;

use std::sync::Arc;

use crate::{
    config::ServiceOptions, error, management::AuthManager, spotify::SpotifyClient, utils,
};

pub use auth::{token, totp};
pub use canvas::canvas;
pub use catalog::{album, playlist, search, track};
pub use serve::serve;

fn auth_manager() -> Arc<AuthManager> {
    match AuthManager::new(ServiceOptions::from_env()) {
        Ok(manager) => Arc::new(manager),
        Err(e) => error!("Cannot create HTTP client. Err: {}", e),
    }
}

/// Client with a token obtained up front. Exits if no token can be had.
async fn connect() -> SpotifyClient {
    let auth = auth_manager();

    let pb = utils::spinner("Authenticating with Spotify...");
    let authenticated = auth.initialize().await;
    pb.finish_and_clear();

    if !authenticated {
        error!("Cannot obtain an access token. Check SP_DC and run with --verbose for details.");
    }
    SpotifyClient::new(auth)
}

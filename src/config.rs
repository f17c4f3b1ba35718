//! Configuration management for spcanvas.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Every value has a default, so a missing
//! `.env` file is not an error; only the `SP_DC` session cookie has to be
//! supplied for token refreshes to succeed.
//!
//! Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Defaults documented on each accessor

use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_SECRETS_URL: &str = "https://raw.githubusercontent.com/Thereallo1026/spotify-secrets/refs/heads/main/secrets/secretDict.json";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://open.spotify.com/api/token";
pub const DEFAULT_SERVER_TIME_URL: &str = "https://open.spotify.com/api/server-time";
pub const DEFAULT_CANVAS_URL: &str = "https://spclient.wg.spotify.com/canvaz-cache/v0/canvases";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_TOKEN_REFRESH_SECS: u64 = 30 * 60;
pub const DEFAULT_SECRETS_REFRESH_SECS: u64 = 60 * 60;

/// Loads environment variables from `<data_local_dir>/spcanvas/.env`.
///
/// Creates the `spcanvas` directory if needed. A missing `.env` file is
/// ignored; a file that exists but cannot be parsed is reported.
///
/// - Linux: `~/.local/share/spcanvas/.env`
/// - macOS: `~/Library/Application Support/spcanvas/.env`
/// - Windows: `%LOCALAPPDATA%/spcanvas/.env`
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spcanvas/.env");
    path
}

fn var_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn secs_or(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// The `sp_dc` session cookie of a logged-in web player session.
///
/// Read from `SP_DC`. Defaults to empty, which disables token refreshes.
pub fn sp_dc() -> String {
    env::var("SP_DC").unwrap_or_default()
}

/// URL of the versioned TOTP secret table (`SPOTIFY_SECRETS_URL`).
pub fn secrets_url() -> String {
    var_or("SPOTIFY_SECRETS_URL", DEFAULT_SECRETS_URL)
}

/// Interval between scheduled token refreshes (`SPOTIFY_TOKEN_REFRESH_SECS`,
/// default 30 minutes).
pub fn token_refresh_interval() -> Duration {
    secs_or("SPOTIFY_TOKEN_REFRESH_SECS", DEFAULT_TOKEN_REFRESH_SECS)
}

/// Minimum interval between secret table fetches
/// (`SPOTIFY_SECRETS_REFRESH_SECS`, default 1 hour).
pub fn secrets_refresh_interval() -> Duration {
    secs_or("SPOTIFY_SECRETS_REFRESH_SECS", DEFAULT_SECRETS_REFRESH_SECS)
}

/// Spotify Web API base URL (`SPOTIFY_API_URL`).
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
}

/// Web player token endpoint (`SPOTIFY_TOKEN_URL`).
pub fn spotify_token_url() -> String {
    var_or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Web player server-time endpoint (`SPOTIFY_SERVER_TIME_URL`).
pub fn spotify_server_time_url() -> String {
    var_or("SPOTIFY_SERVER_TIME_URL", DEFAULT_SERVER_TIME_URL)
}

/// Canvas endpoint (`SPOTIFY_CANVAS_URL`).
pub fn spotify_canvas_url() -> String {
    var_or("SPOTIFY_CANVAS_URL", DEFAULT_CANVAS_URL)
}

/// Bind address for `spcanvas serve` (`SERVER_ADDRESS`, default
/// `127.0.0.1:3000`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Remote endpoints the service talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub token_url: String,
    pub server_time_url: String,
    pub canvas_url: String,
    pub secrets_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            server_time_url: DEFAULT_SERVER_TIME_URL.to_string(),
            canvas_url: DEFAULT_CANVAS_URL.to_string(),
            secrets_url: DEFAULT_SECRETS_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            api_url: spotify_apiurl(),
            token_url: spotify_token_url(),
            server_time_url: spotify_server_time_url(),
            canvas_url: spotify_canvas_url(),
            secrets_url: secrets_url(),
        }
    }

    /// Points every endpoint at `base`, keeping the real paths. Used to aim
    /// the service at a local mock.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_url: format!("{}/v1", base),
            token_url: format!("{}/api/token", base),
            server_time_url: format!("{}/api/server-time", base),
            canvas_url: format!("{}/canvaz-cache/v0/canvases", base),
            secrets_url: format!("{}/secrets/secretDict.json", base),
        }
    }
}

/// Everything the auth manager and client need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    pub sp_dc: String,
    pub token_refresh_interval: Duration,
    pub secrets_refresh_interval: Duration,
    pub endpoints: Endpoints,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            sp_dc: String::new(),
            token_refresh_interval: Duration::from_secs(DEFAULT_TOKEN_REFRESH_SECS),
            secrets_refresh_interval: Duration::from_secs(DEFAULT_SECRETS_REFRESH_SECS),
            endpoints: Endpoints::default(),
        }
    }
}

impl ServiceOptions {
    pub fn from_env() -> Self {
        Self {
            sp_dc: sp_dc(),
            token_refresh_interval: token_refresh_interval(),
            secrets_refresh_interval: secrets_refresh_interval(),
            endpoints: Endpoints::from_env(),
        }
    }
}

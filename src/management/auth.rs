//! Token lifecycle for the web player endpoints.
//!
//! [`AuthManager`] ties the secret table, the TOTP generator and the server
//! clock together. It mints `Bearer` tokens from the `sp_dc` cookie and keeps
//! them fresh on two schedules, one for secret rotation and one for tokens.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use reqwest::Client;
use tokio::{
    sync::{Mutex, RwLock, watch},
    time::{Instant, MissedTickBehavior, interval_at},
};

use crate::{
    config::ServiceOptions,
    error::SpotifyError,
    management::secrets::{SecretStore, SecretUpdate, fallback_secret},
    spotify::{
        self,
        auth::{AuthPayload, request_access_token},
        time::TimeSync,
    },
    totp::{ActiveTotp, TotpEngine, TotpGenerator},
    utils,
};

/// Owns the current bearer token and the TOTP generator it is minted with.
///
/// Token refreshes are single-flight: a refresh requested while another is
/// running waits for that one and reports its result instead of sending a
/// second request. It only does so when the secret has not rotated in the
/// meantime; otherwise it sends its own request with the new version. Secret rotations are serialized by the [`SecretStore`].
/// Readers never wait on either; they get whatever token is cached.
pub struct AuthManager {
    options: ServiceOptions,
    http: Client,
    secrets: SecretStore,
    totp: TotpEngine,
    time: TimeSync,
    token: RwLock<Option<String>>,
    /// TOTP version used by the last completed refresh.
    refresh_lock: Mutex<Option<String>>,
    /// Bumped after every completed refresh.
    refresh_generation: AtomicU64,
    last_refresh_ok: AtomicBool,
    started: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl AuthManager {
    /// Builds a manager with its own web-player HTTP client.
    pub fn new(options: ServiceOptions) -> Result<Self, SpotifyError> {
        Ok(Self::with_client(options, spotify::http_client()?))
    }

    /// Builds a manager that sends every request through `http`.
    ///
    /// Nothing is fetched here. No secret is installed and no token is held
    /// until [`AuthManager::initialize`] or [`AuthManager::start`] runs.
    ///
    /// # Arguments
    ///
    /// * `options` - Endpoints, the `sp_dc` cookie and both schedule periods
    /// * `http` - Client carrying the web-player headers
    ///
    /// # Returns
    ///
    /// An idle manager. A missing `sp_dc` is logged but not rejected.
    ///
    /// # Example
    ///
    /// ```
    /// let http = spotify::http_client()?;
    /// let auth = Arc::new(AuthManager::with_client(ServiceOptions::from_env(), http));
    /// auth.start().await;
    /// ```
    pub fn with_client(options: ServiceOptions, http: Client) -> Self {
        if options.sp_dc.is_empty() {
            tracing::warn!("SP_DC cookie missing. Set SP_DC for auth.");
        }

        let secrets = SecretStore::new(
            http.clone(),
            options.endpoints.secrets_url.clone(),
            options.secrets_refresh_interval,
        );
        let time = TimeSync::new(
            http.clone(),
            options.endpoints.server_time_url.clone(),
            options.sp_dc.clone(),
        );
        let (shutdown, _) = watch::channel(false);

        Self {
            options,
            http,
            secrets,
            totp: TotpEngine::new(),
            time,
            token: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            refresh_generation: AtomicU64::new(0),
            last_refresh_ok: AtomicBool::new(false),
            started: AtomicBool::new(false),
            shutdown,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn totp(&self) -> &TotpEngine {
        &self.totp
    }

    pub async fn totp_version(&self) -> Option<String> {
        self.totp.version().await
    }

    /// Current `Bearer <token>` value.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn require_token(&self) -> Result<String, SpotifyError> {
        self.token().await.ok_or(SpotifyError::AuthUnavailable)
    }

    /// Installs a secret and obtains a first token, without scheduling
    /// anything. Returns whether a token is held afterwards.
    pub async fn initialize(&self) -> bool {
        self.rotate(false).await;
        if self.token().await.is_none() {
            self.refresh().await;
        }
        self.token().await.is_some()
    }

    /// Runs [`AuthManager::initialize`] and spawns the rotation and refresh
    /// schedules. Calling it again does nothing.
    pub async fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }

        self.initialize().await;

        self.spawn_schedule("secret rotation", self.secrets.interval(), |me| async move {
            me.rotate(true).await;
        });
        self.spawn_schedule("token refresh", self.options.token_refresh_interval, |me| {
            async move {
                me.refresh().await;
            }
        });

        let version = self.totp_version().await;
        let has_token = self.token().await.is_some();
        tracing::info!(version = ?version, has_token, "auth manager started");
    }

    /// Stops both schedules. Work already in flight completes.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn spawn_schedule<F, Fut>(self: &Arc<Self>, name: &'static str, period: Duration, job: F)
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let me = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => job(Arc::clone(&me)).await,
                    _ = shutdown.changed() => {}
                }
            }

            tracing::debug!(schedule = name, "schedule stopped");
        });
    }

    /// Checks the remote secret table, honoring the store's throttle.
    /// Returns whether a new generator was installed.
    pub async fn rotate_secrets(&self) -> bool {
        self.rotate(false).await
    }

    async fn rotate(&self, force: bool) -> bool {
        let current = self.totp.version().await;
        let result = if force {
            self.secrets.force_refresh(current.as_deref()).await
        } else {
            self.secrets.refresh(current.as_deref()).await
        };

        let (version, secret) = match result {
            Ok(SecretUpdate::Rotated { version, secret }) => (version, secret),
            Ok(SecretUpdate::NoChange) => {
                tracing::debug!(version = ?current, "TOTP secret unchanged");
                return false;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to update TOTP secrets");
                self.ensure_fallback().await;
                return false;
            }
        };

        let generator = match TotpGenerator::from_secret(&secret) {
            Ok(generator) => generator,
            Err(e) => {
                tracing::error!(version = %version, error = %e, "unusable TOTP secret");
                self.ensure_fallback().await;
                return false;
            }
        };

        self.totp.install(version.clone(), generator).await;
        tracing::info!(version = %version, "TOTP secrets updated");

        if self.token().await.is_none() {
            tracing::info!("no auth token after TOTP update, refreshing");
            self.refresh().await;
        }
        true
    }

    async fn ensure_fallback(&self) {
        let (version, secret) = fallback_secret();
        match TotpGenerator::from_secret(&secret) {
            Ok(generator) => {
                if self.totp.install_if_empty(version, generator).await {
                    tracing::warn!("using fallback TOTP secret");
                }
            }
            Err(e) => tracing::error!(error = %e, "fallback TOTP secret unusable"),
        }
    }

    /// Requests a new token. On failure the previous token, if any, is kept.
    pub async fn refresh(&self) -> bool {
        if self.options.sp_dc.is_empty() {
            tracing::warn!("SP_DC cookie missing, skipping token refresh");
            return false;
        }

        let seen = self.refresh_generation.load(Ordering::Acquire);
        let mut last_version = self.refresh_lock.lock().await;
        if self.refresh_generation.load(Ordering::Acquire) != seen
            && *last_version == self.totp.version().await
        {
            // joined a refresh that finished while we waited, minted with the
            // same secret we would use
            return self.last_refresh_ok.load(Ordering::Acquire);
        }

        let active = self.totp.snapshot().await;
        let result = match &active {
            Some(active) => self.fetch_token(active).await,
            None => Err(SpotifyError::NotInitialized),
        };
        let ok = match result {
            Ok(token) => {
                *self.token.write().await = Some(format!("Bearer {}", token));
                tracing::info!("auth token refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh auth token");
                false
            }
        };

        *last_version = active.map(|active| active.version);
        self.last_refresh_ok.store(ok, Ordering::Release);
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
        ok
    }

    async fn fetch_token(&self, active: &ActiveTotp) -> Result<String, SpotifyError> {
        let local_ms = utils::now_millis();
        let server_ms = self.time.now().await;
        let payload = AuthPayload::new(active, local_ms, server_ms);
        tracing::debug!(version = %payload.totp_ver, "requesting access token");

        request_access_token(
            &self.http,
            &self.options.endpoints.token_url,
            &self.options.sp_dc,
            &payload,
        )
        .await
    }
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("endpoints", &self.options.endpoints)
            .field("has_sp_dc", &!self.options.sp_dc.is_empty())
            .field("totp", &self.totp)
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

//! Time-based one-time codes (RFC 6238, HMAC-SHA1, 30 s period, 6 digits).

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use tokio::sync::RwLock;

use crate::error::SpotifyError;

pub const PERIOD_SECS: u64 = 30;
pub const DIGITS: u32 = 6;

/// Length of one code window in milliseconds.
pub const PERIOD_MS: u64 = PERIOD_SECS * 1000;

/// Hex-encoded secret produced from one entry of the secret table.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedSecret {
    hex: String,
}

impl DecodedSecret {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self { hex: hex.into() }
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Debug for DecodedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedSecret")
            .field("len", &(self.hex.len() / 2))
            .finish_non_exhaustive()
    }
}

/// Immutable code generator bound to one secret.
#[derive(Clone)]
pub struct TotpGenerator {
    mac: Hmac<Sha1>,
}

impl TotpGenerator {
    pub fn new(key: &[u8]) -> Result<Self, SpotifyError> {
        let mac = Hmac::<Sha1>::new_from_slice(key)
            .map_err(|e| SpotifyError::MalformedResponse(e.to_string()))?;
        Ok(Self { mac })
    }

    pub fn from_secret(secret: &DecodedSecret) -> Result<Self, SpotifyError> {
        let key = hex::decode(secret.as_hex())
            .map_err(|e| SpotifyError::MalformedResponse(format!("secret is not hex: {}", e)))?;
        Self::new(&key)
    }

    /// Code for the window containing `timestamp_ms` (Unix epoch milliseconds).
    pub fn generate(&self, timestamp_ms: u64) -> String {
        let counter = timestamp_ms / PERIOD_MS;

        let mut mac = self.mac.clone();
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // dynamic truncation
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = (u32::from(digest[offset] & 0x7f) << 24)
            | (u32::from(digest[offset + 1]) << 16)
            | (u32::from(digest[offset + 2]) << 8)
            | u32::from(digest[offset + 3]);

        format!(
            "{:0>width$}",
            binary % 10u32.pow(DIGITS),
            width = DIGITS as usize
        )
    }
}

impl fmt::Debug for TotpGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpGenerator")
            .field("period", &PERIOD_SECS)
            .field("digits", &DIGITS)
            .finish_non_exhaustive()
    }
}

/// Rounds a millisecond timestamp down to the start of its code window.
pub fn window_start(timestamp_ms: u64) -> u64 {
    timestamp_ms / PERIOD_MS * PERIOD_MS
}

/// A generator together with the secret-table version it was built from.
#[derive(Debug, Clone)]
pub struct ActiveTotp {
    pub version: String,
    pub generator: TotpGenerator,
}

/// Holds the currently active generator. Rotation swaps the whole
/// [`ActiveTotp`], so a reader never sees a generator paired with another
/// version's label.
#[derive(Debug, Default)]
pub struct TotpEngine {
    active: RwLock<Option<ActiveTotp>>,
}

impl TotpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn install(&self, version: impl Into<String>, generator: TotpGenerator) {
        *self.active.write().await = Some(ActiveTotp {
            version: version.into(),
            generator,
        });
    }

    /// Installs `generator` only if none is active yet.
    pub async fn install_if_empty(
        &self,
        version: impl Into<String>,
        generator: TotpGenerator,
    ) -> bool {
        let mut active = self.active.write().await;
        if active.is_some() {
            return false;
        }
        *active = Some(ActiveTotp {
            version: version.into(),
            generator,
        });
        true
    }

    pub async fn generate(&self, timestamp_ms: u64) -> Result<String, SpotifyError> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|active| active.generator.generate(timestamp_ms))
            .ok_or(SpotifyError::NotInitialized)
    }

    pub async fn version(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|a| a.version.clone())
    }

    pub async fn is_initialized(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn snapshot(&self) -> Option<ActiveTotp> {
        self.active.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc_generator() -> TotpGenerator {
        TotpGenerator::new(b"12345678901234567890").unwrap()
    }

    #[test]
    fn matches_rfc_6238_sha1_vectors() {
        let generator = rfc_generator();
        let vectors = [
            (59u64, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
        ];
        for (secs, code) in vectors {
            assert_eq!(generator.generate(secs * 1000), code, "t = {}", secs);
        }
    }

    #[test]
    fn hex_secret_matches_raw_key() {
        let secret = DecodedSecret::from_hex(hex::encode("12345678901234567890"));
        let generator = TotpGenerator::from_secret(&secret).unwrap();
        assert_eq!(generator.generate(59_000), "287082");
    }

    #[test]
    fn invalid_hex_is_rejected() {
        let secret = DecodedSecret::from_hex("not hex");
        assert!(matches!(
            TotpGenerator::from_secret(&secret),
            Err(SpotifyError::MalformedResponse(_))
        ));
    }

    #[test]
    fn codes_are_stable_within_a_window() {
        let generator = rfc_generator();
        let start = window_start(1_700_000_012_345);
        assert_eq!(start, 1_700_000_010_000);

        let first = generator.generate(start);
        assert_eq!(generator.generate(start + 1), first);
        assert_eq!(generator.generate(start + PERIOD_MS - 1), first);
        assert_ne!(generator.generate(start + PERIOD_MS), first);
        assert_ne!(generator.generate(start - 1), first);
    }

    #[test]
    fn codes_are_six_digits() {
        let generator = rfc_generator();
        for step in 0..50u64 {
            let code = generator.generate(step * PERIOD_MS);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn debug_output_hides_key_material() {
        let secret = DecodedSecret::from_hex(hex::encode("12345678901234567890"));
        assert!(!format!("{:?}", secret).contains("3132"));
        assert!(!format!("{:?}", rfc_generator()).contains("1234"));
    }

    #[tokio::test]
    async fn engine_requires_a_generator() {
        let engine = TotpEngine::new();
        assert!(!engine.is_initialized().await);
        assert!(matches!(
            engine.generate(0).await,
            Err(SpotifyError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn install_replaces_generator_and_version() {
        let engine = TotpEngine::new();
        engine.install("7", rfc_generator()).await;
        assert_eq!(engine.version().await.as_deref(), Some("7"));
        assert_eq!(engine.generate(59_000).await.unwrap(), "287082");

        engine
            .install("8", TotpGenerator::new(b"another key").unwrap())
            .await;
        assert!(
            !engine
                .install_if_empty("9", TotpGenerator::new(b"ignored").unwrap())
                .await
        );
        let snapshot = engine.snapshot().await.unwrap();
        assert_eq!(snapshot.version, "8");
        assert_eq!(
            engine.generate(59_000).await.unwrap(),
            snapshot.generator.generate(59_000)
        );
    }
}

use std::time::Duration;

use reqwest::{Client, header::USER_AGENT};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::SpotifyError,
    totp::DecodedSecret,
    types::SecretsMap,
};

/// Version label of the embedded secret.
pub const FALLBACK_VERSION: &str = "19";

/// Embedded secret table entry, used when the remote table is unreachable.
pub const FALLBACK_SECRET: [u32; 26] = [
    99, 111, 47, 88, 49, 56, 118, 65, 52, 67, 50, 104, 117, 101, 55, 94, 95, 75, 94, 49, 69, 36,
    85, 64, 74, 60,
];

pub const SECRETS_TIMEOUT: Duration = Duration::from_secs(10);

/// The host rejects requests without a browser-ish user agent.
const SECRETS_USER_AGENT: &str = "Mozilla/5.0";

/// Outcome of a secret store refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretUpdate {
    /// A newer version was published; build a generator from `secret`.
    Rotated {
        version: String,
        secret: DecodedSecret,
    },
    /// Throttled, or the newest version is the one already in use.
    NoChange,
}

/// Applies the index-based mask `v ^ ((i % 33) + 9)`. Applying it twice
/// returns the input.
pub fn xor_mask(values: &[u32]) -> Vec<u32> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| v ^ ((i as u32 % 33) + 9))
        .collect()
}

/// Turns a secret table entry into a TOTP secret.
///
/// The masked values are joined as decimal strings, and the UTF-8 bytes of
/// that string, hex-encoded, are the secret.
pub fn decode_secret(values: &[u32]) -> DecodedSecret {
    let joined: String = xor_mask(values).iter().map(|v| v.to_string()).collect();
    DecodedSecret::from_hex(hex::encode(joined.as_bytes()))
}

/// Key with the numerically largest version. Keys that are not integers are
/// ignored.
pub fn newest_version(secrets: &SecretsMap) -> Option<&str> {
    secrets
        .keys()
        .filter_map(|key| key.trim().parse::<u64>().ok().map(|n| (n, key)))
        .max_by_key(|(n, _)| *n)
        .map(|(_, key)| key.as_str())
}

pub fn fallback_secret() -> (String, DecodedSecret) {
    (FALLBACK_VERSION.to_string(), decode_secret(&FALLBACK_SECRET))
}

/// Picks the newest version of `secrets` and decodes it unless it is
/// `current_version`.
///
/// # Arguments
///
/// * `secrets` - Secret table as served, version key to masked values
/// * `current_version` - Version the active generator was built from, if any
///
/// # Returns
///
/// * `Ok(SecretUpdate::Rotated { .. })` - A different version is newest
/// * `Ok(SecretUpdate::NoChange)` - The newest version is already active
/// * `Err(SpotifyError::EmptySecretTable)` - No key parses as an integer
/// * `Err(SpotifyError::MalformedResponse(_))` - The newest entry is empty
///
/// # Example
///
/// ```
/// let table: SecretsMap = serde_json::from_str(r#"{"18":[1,2],"21":[3,4]}"#)?;
/// match select_update(&table, Some("18"))? {
///     SecretUpdate::Rotated { version, .. } => assert_eq!(version, "21"),
///     SecretUpdate::NoChange => unreachable!(),
/// }
/// ```
pub fn select_update(
    secrets: &SecretsMap,
    current_version: Option<&str>,
) -> Result<SecretUpdate, SpotifyError> {
    let version = newest_version(secrets).ok_or(SpotifyError::EmptySecretTable)?;
    if Some(version) == current_version {
        return Ok(SecretUpdate::NoChange);
    }

    let values = &secrets[version];
    if values.is_empty() {
        return Err(SpotifyError::MalformedResponse(format!(
            "secret version {} is empty",
            version
        )));
    }

    Ok(SecretUpdate::Rotated {
        version: version.to_string(),
        secret: decode_secret(values),
    })
}

/// Fetches the remote secret table, at most once per interval.
#[derive(Debug)]
pub struct SecretStore {
    client: Client,
    url: String,
    interval: Duration,
    /// Held for the whole fetch, so refreshes never overlap.
    last_fetch: Mutex<Option<Instant>>,
}

impl SecretStore {
    /// Creates a store that has never fetched, so the first
    /// [`SecretStore::refresh`] always goes to the network.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for the table request
    /// * `url` - Location of the JSON secret table
    /// * `interval` - Minimum time between two successful fetches
    pub fn new(client: Client, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            interval,
            last_fetch: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetches and decodes the newest secret, unless the last successful
    /// fetch was less than one interval ago.
    pub async fn refresh(
        &self,
        current_version: Option<&str>,
    ) -> Result<SecretUpdate, SpotifyError> {
        let mut last_fetch = self.last_fetch.lock().await;
        if let Some(at) = *last_fetch {
            if at.elapsed() < self.interval {
                tracing::debug!(
                    next_in = ?self.interval.saturating_sub(at.elapsed()),
                    "secret table fetch throttled"
                );
                return Ok(SecretUpdate::NoChange);
            }
        }

        let update = self.fetch_update(current_version).await?;
        *last_fetch = Some(Instant::now());
        Ok(update)
    }

    /// Like [`SecretStore::refresh`] but ignores the throttle. Used by the
    /// scheduled rotation, whose ticks already are one interval apart.
    pub async fn force_refresh(
        &self,
        current_version: Option<&str>,
    ) -> Result<SecretUpdate, SpotifyError> {
        let mut last_fetch = self.last_fetch.lock().await;
        let update = self.fetch_update(current_version).await?;
        *last_fetch = Some(Instant::now());
        Ok(update)
    }

    async fn fetch_update(
        &self,
        current_version: Option<&str>,
    ) -> Result<SecretUpdate, SpotifyError> {
        let secrets = self.fetch_table().await?;
        select_update(&secrets, current_version)
    }

    async fn fetch_table(&self) -> Result<SecretsMap, SpotifyError> {
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, SECRETS_USER_AGENT)
            .timeout(SECRETS_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: Vec<(&str, Vec<u32>)>) -> SecretsMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn newest_version_compares_numerically() {
        let secrets = table(vec![("3", vec![1]), ("10", vec![2]), ("2", vec![3])]);
        assert_eq!(newest_version(&secrets), Some("10"));
    }

    #[test]
    fn newest_version_ignores_non_numeric_keys() {
        let secrets = table(vec![("latest", vec![1]), ("9", vec![2])]);
        assert_eq!(newest_version(&secrets), Some("9"));
        assert_eq!(newest_version(&table(vec![("x", vec![1])])), None);
    }

    #[test]
    fn mask_is_self_inverse() {
        let values: Vec<u32> = (0..100).map(|i| (i * 37 % 256) as u32).collect();
        assert_eq!(xor_mask(&xor_mask(&values)), values);
        assert_eq!(xor_mask(&[0, 0]), vec![9, 10]);
        // the mask wraps every 33 positions
        let zeros = vec![0u32; 34];
        assert_eq!(xor_mask(&zeros)[33], 9);
    }

    #[test]
    fn fallback_secret_decodes_to_known_string() {
        let (version, secret) = fallback_secret();
        assert_eq!(version, "19");
        assert_eq!(
            xor_mask(&FALLBACK_SECRET),
            vec![
                106, 101, 36, 84, 60, 54, 121, 81, 37, 81, 33, 124, 96, 115, 32, 70, 70, 81, 69,
                45, 88, 58, 74, 96, 107, 30
            ]
        );
        assert_eq!(
            secret.as_hex(),
            hex::encode("1061013684605412181378133124961153270708169458858749610730")
        );
    }

    #[test]
    fn select_update_skips_current_version() {
        let secrets = table(vec![("18", vec![1, 2]), ("19", FALLBACK_SECRET.to_vec())]);
        assert_eq!(
            select_update(&secrets, Some("19")).unwrap(),
            SecretUpdate::NoChange
        );
        assert_eq!(
            select_update(&secrets, Some("18")).unwrap(),
            SecretUpdate::Rotated {
                version: "19".to_string(),
                secret: decode_secret(&FALLBACK_SECRET),
            }
        );
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(matches!(
            select_update(&SecretsMap::new(), None),
            Err(SpotifyError::EmptySecretTable)
        ));
    }

    #[test]
    fn empty_entry_is_malformed() {
        let secrets = table(vec![("5", vec![])]);
        assert!(matches!(
            select_update(&secrets, None),
            Err(SpotifyError::MalformedResponse(_))
        ));
    }
}

//! Configuration loading and resolution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cutoff::Cutoff;

/// Form endpoint of the cNLS Mapper.
pub const DEFAULT_ENDPOINT: &str = "http://nls-mapper.iab.keio.ac.jp/cgi-bin/NLS_Mapper_y.cgi";

/// Politeness delay after every successful request.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings for talking to the cNLS Mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenscraperConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub cut_off: Cutoff,
    /// Pause after each successful request, serialized as seconds.
    #[serde(with = "pause_secs")]
    pub pause: Duration,
    /// Maximum submissions in flight at once in a batch run.
    pub concurrency: usize,
}

impl Default for ScreenscraperConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: format!("cnls-screenscraper/{}", env!("CARGO_PKG_VERSION")),
            cut_off: Cutoff::default(),
            pause: DEFAULT_PAUSE,
            concurrency: 1,
        }
    }
}

impl ScreenscraperConfig {
    /// Defaults, overridden by `CNLS_*` environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup. Unparseable values are logged and
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("CNLS_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(raw) = lookup("CNLS_TIMEOUT_MS") {
            match raw.parse() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => tracing::warn!("ignoring CNLS_TIMEOUT_MS={raw}: not an integer"),
            }
        }
        if let Some(raw) = lookup("CNLS_CUTOFF") {
            match raw.parse() {
                Ok(cut_off) => self.cut_off = cut_off,
                Err(e) => tracing::warn!("ignoring CNLS_CUTOFF={raw}: {e}"),
            }
        }
        if let Some(raw) = lookup("CNLS_PAUSE_SECS") {
            match parse_pause(&raw) {
                Some(pause) => self.pause = pause,
                None => tracing::warn!("ignoring CNLS_PAUSE_SECS={raw}: not a non-negative number"),
            }
        }
        if let Some(raw) = lookup("CNLS_CONCURRENCY") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.concurrency = n,
                _ => tracing::warn!("ignoring CNLS_CONCURRENCY={raw}: must be a positive integer"),
            }
        }
    }
}

/// Parse a pause given in (possibly fractional) seconds.
pub fn parse_pause(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

mod pause_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pause: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(pause.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

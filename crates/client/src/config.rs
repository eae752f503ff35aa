//! Client configuration loaded from environment variables.
//!
//! | Variable                      | Required | Default | Description                          |
//! |-------------------------------|----------|---------|--------------------------------------|
//! | `SPECGEN_API_URL`             | yes*     | --      | Service base URL, e.g. `https://host/api` |
//! | `SPECGEN_OUTPUT_DIR`          | no       | `.`     | Directory receiving archives         |
//! | `SPECGEN_POLL_INTERVAL_SECS`  | no       | `10`    | Seconds between progress polls       |
//! | `SPECGEN_POLL_START_DELAY_MS` | no       | `1000`  | Delay before the first progress poll |
//!
//! \* unless supplied through [`ConfigOverrides`].

use std::path::PathBuf;
use std::time::Duration;

use crate::poller::PollSettings;

pub const ENV_API_URL: &str = "SPECGEN_API_URL";
pub const ENV_OUTPUT_DIR: &str = "SPECGEN_OUTPUT_DIR";
pub const ENV_POLL_INTERVAL_SECS: &str = "SPECGEN_POLL_INTERVAL_SECS";
pub const ENV_POLL_START_DELAY_MS: &str = "SPECGEN_POLL_START_DELAY_MS";

const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("SPECGEN_API_URL is required (or pass --api-url)")]
    MissingApiUrl,

    #[error("API URL must start with http:// or https://, got: '{0}'")]
    InvalidApiUrl(String),

    #[error("Poll interval must be at least one second")]
    ZeroPollInterval,
}

/// Values given explicitly (e.g. on the command line); they win over the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub output_dir: PathBuf,
    pub poll: PollSettings,
}

impl ClientConfig {
    /// Load `.env` (if present), then read the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration from an arbitrary variable source.
    ///
    /// Unparseable optional values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F, overrides: ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = overrides
            .api_url
            .or_else(|| lookup(ENV_API_URL))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let output_dir = overrides
            .output_dir
            .or_else(|| lookup(ENV_OUTPUT_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let defaults = PollSettings::default();

        let interval_secs = overrides
            .poll_interval_secs
            .or_else(|| lookup(ENV_POLL_INTERVAL_SECS).and_then(|v| v.trim().parse().ok()))
            .unwrap_or(defaults.interval.as_secs());
        if interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let start_delay = lookup(ENV_POLL_START_DELAY_MS)
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.start_delay);

        Ok(Self {
            api_url,
            output_dir,
            poll: PollSettings {
                interval: Duration::from_secs(interval_secs),
                start_delay,
            },
        })
    }
}

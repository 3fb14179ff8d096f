//! Client configuration.
//!
//! [`ClientConfig`] has working defaults for a local relay. Override it in
//! code through [`RoomClient::builder`](crate::RoomClient::builder) or from
//! the environment with [`ClientConfig::from_env`]:
//!
//! | Variable                          | Default                |
//! |-----------------------------------|------------------------|
//! | `POLYROOM_RELAY_URL`              | `ws://127.0.0.1:5000`  |
//! | `POLYROOM_JOIN_TIMEOUT_MS`        | `10000`                |
//! | `POLYROOM_SNAPSHOT_INTERVAL_MS`   | `100`                  |
//! | `POLYROOM_TRANSCRIPT_INTERVAL_MS` | `250`                  |

use std::num::ParseIntError;
use std::time::Duration;

use polyroom_relay::CadenceConfig;
use polyroom_session::SessionConfig;

pub const RELAY_URL_VAR: &str = "POLYROOM_RELAY_URL";
pub const JOIN_TIMEOUT_VAR: &str = "POLYROOM_JOIN_TIMEOUT_MS";
pub const SNAPSHOT_INTERVAL_VAR: &str = "POLYROOM_SNAPSHOT_INTERVAL_MS";
pub const TRANSCRIPT_INTERVAL_VAR: &str = "POLYROOM_TRANSCRIPT_INTERVAL_MS";

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a whole number of milliseconds: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },

    #[error("{var} is empty")]
    Empty { var: &'static str },
}

/// Settings for connecting to a relay and running sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub relay_url: String,
    pub join_timeout: Duration,
    pub snapshot_interval: Duration,
    pub transcript_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            relay_url: "ws://127.0.0.1:5000".to_string(),
            join_timeout: session.join_timeout,
            snapshot_interval: session.snapshot_cadence.interval,
            transcript_interval: session.transcript_cadence.interval,
        }
    }
}

impl ClientConfig {
    /// Reads overrides from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// [`ConfigError`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(RELAY_URL_VAR) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty { var: RELAY_URL_VAR });
            }
            config.relay_url = url.to_string();
        }
        if let Some(d) = millis(&lookup, JOIN_TIMEOUT_VAR)? {
            config.join_timeout = d;
        }
        if let Some(d) = millis(&lookup, SNAPSHOT_INTERVAL_VAR)? {
            config.snapshot_interval = d;
        }
        if let Some(d) = millis(&lookup, TRANSCRIPT_INTERVAL_VAR)? {
            config.transcript_interval = d;
        }

        Ok(config)
    }

    /// The per-session settings derived from this config.
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            join_timeout: self.join_timeout,
            snapshot_cadence: CadenceConfig {
                interval: self.snapshot_interval,
                ..defaults.snapshot_cadence
            },
            transcript_cadence: CadenceConfig {
                interval: self.transcript_interval,
                ..defaults.transcript_cadence
            },
            ..defaults
        }
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber {
            var,
            value: raw.clone(),
            source,
        })?;
    if ms == 0 {
        return Err(ConfigError::Zero { var });
    }
    Ok(Some(Duration::from_millis(ms)))
}

//! Gateway configuration
//!
//! Values come from built-in defaults overridden by `BALLOT_*` environment
//! variables, e.g. `BALLOT_API_BASE=https://vote.example.org/api/`.

use super::ClientError;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend used when `BALLOT_API_BASE` is not set
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api/";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "BALLOT";

/// Connection settings for a [`Gateway`](super::Gateway)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL every relative request path is joined onto
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds; `None` leaves it to reqwest
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_agent() -> String {
    concat!("ballot-client/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed into its field type
    pub fn load() -> Result<Self, ClientError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from an explicit environment source
    pub(crate) fn load_from(env: Environment) -> Result<Self, ClientError> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(env.try_parsing(true))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no gateway can work with
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for an empty `api_base` or a
    /// zero `timeout_secs`.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api_base.trim().is_empty() {
            return Err(ClientError::Configuration("api_base is required".into()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ClientError::Configuration(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = GatewayConfig::load_from(env(&[])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout_secs, None);
        assert!(config.user_agent.starts_with("ballot-client/"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = GatewayConfig::load_from(env(&[
            ("BALLOT_API_BASE", "https://vote.example.org/api/"),
            ("BALLOT_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://vote.example.org/api/");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn empty_base_is_rejected() {
        let result = GatewayConfig::load_from(env(&[("BALLOT_API_BASE", "  ")]));
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = GatewayConfig {
            timeout_secs: Some(0),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

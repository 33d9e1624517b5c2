//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Connector configuration derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "GCE")]
pub struct ConnectorConfig {
    /// Base URL of the compute API. Overridable so integration tests can
    /// point the connector at a local stub server.
    #[ortho_config(default = "https://www.googleapis.com/compute/v1".to_owned())]
    pub api_base_url: String,
    /// Hostname agents on provisioned machines use to reach the controller.
    pub controller_host: String,
    /// Port the controller listens on. Defaults to `8090`.
    #[ortho_config(default = 8090)]
    pub controller_port: u16,
    /// Seconds between boot disk readiness polls. Defaults to `5`.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Seconds to wait for boot disk readiness before failing the create.
    /// Defaults to `300`.
    #[ortho_config(default = 300)]
    pub wait_timeout_secs: u64,
}

impl ConnectorConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("gce-connector")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidValue`] when a duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "api_base_url: set GCE_API_BASE_URL or api_base_url in the config file".to_owned(),
            ));
        }
        if self.controller_host.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "controller_host: set GCE_CONTROLLER_HOST or controller_host in the config file"
                    .to_owned(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_interval_secs must be greater than zero".to_owned(),
            ));
        }
        if self.wait_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "wait_timeout_secs must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Interval between boot disk readiness polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Upper bound on the wait for boot disk readiness.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration field holds an unusable value.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConnectorConfig};

    fn config() -> ConnectorConfig {
        ConnectorConfig {
            api_base_url: "https://www.googleapis.com/compute/v1".to_owned(),
            controller_host: "controller.test".to_owned(),
            controller_port: 8090,
            poll_interval_secs: 5,
            wait_timeout_secs: 300,
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn blank_controller_host_is_rejected() {
        let mut invalid = config();
        invalid.controller_host = "  ".to_owned();
        assert!(matches!(
            invalid.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut invalid = config();
        invalid.poll_interval_secs = 0;
        assert!(matches!(
            invalid.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}

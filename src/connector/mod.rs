//! Provisioning orchestrator for the GCE fleet connector.
//!
//! [`GceConnector`] drives the lifecycle of single machine instances: create
//! boot disk → await readiness → create instance, with a compensating disk
//! delete when the later steps fail; best-effort state refresh; and ordered
//! teardown. All provider access flows through the connection cache so every
//! call runs against a validated, credential-keyed client handle.

mod create;
mod error;
mod poller;
mod state;
mod terminate;

use std::time::Duration;

use crate::config::{ConfigError, ConnectorConfig};
use crate::connection::{ConnectionCache, CredentialProvider};
use crate::controller::{AgentResolution, ControllerServices};
use crate::images::ImageCatalog;
use crate::request::ProviderAccount;

pub use error::{ProvisionError, TerminateError};

/// Orchestrates machine provisioning against one compute provider.
///
/// The connection cache is owned here rather than living in process-global
/// state, so callers can construct independent connectors with test doubles.
pub struct GceConnector<P: CredentialProvider, C: ControllerServices> {
    connections: ConnectionCache<P>,
    controller: C,
    images: ImageCatalog,
    config: ConnectorConfig,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl<P, C> GceConnector<P, C>
where
    P: CredentialProvider,
    C: ControllerServices,
{
    /// Constructs a connector from configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn new(
        config: ConnectorConfig,
        provider: P,
        controller: C,
        images: ImageCatalog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let poll_interval = config.poll_interval();
        let wait_timeout = config.wait_timeout();
        Ok(Self {
            connections: ConnectionCache::new(provider),
            controller,
            images,
            config,
            poll_interval,
            wait_timeout,
        })
    }

    /// Overrides the boot disk readiness poll interval.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the boot disk readiness wait timeout.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Port agents on provisioned machines connect back on.
    #[must_use]
    pub fn agent_port(&self) -> u16 {
        self.controller.default_agent_port()
    }

    fn agent_resolution(&self, account: &ProviderAccount) -> AgentResolution {
        AgentResolution::new(
            self.config.controller_host.as_str(),
            self.config.controller_port,
            account.account_name.as_str(),
            account.access_key.as_str(),
        )
    }
}

#[cfg(test)]
mod tests;

//! Core library for the GCE fleet connector.
//!
//! The crate provisions, monitors, and tears down Google Compute Engine
//! instances on behalf of a fleet-management controller. It exposes a
//! credential-keyed connection cache, a provisioning orchestrator that drives
//! the create boot disk → await readiness → create instance lifecycle with
//! compensating rollback, and a best-effort machine state refresher.

pub mod compute;
pub mod config;
pub mod connection;
pub mod connector;
pub mod controller;
pub mod images;
pub mod request;
pub mod test_support;

pub use compute::{ApiFuture, ComputeApi, ComputeError, GceComputeClient};
pub use config::{ConfigError, ConnectorConfig};
pub use connection::{ConnectionCache, CredentialError, CredentialProvider, TokenFileCredentials};
pub use connector::{GceConnector, ProvisionError, TerminateError};
pub use controller::{AgentResolution, ControllerServices, MachineRecord, MachineState};
pub use images::ImageCatalog;
pub use request::{
    ProviderAccount, ProvisioningRequest, ProvisioningRequestBuilder, RequestError,
    ServiceCredentials,
};

//! Credential-keyed cache of authenticated provider connections.
//!
//! Handles live for the process lifetime once built: the cache never evicts,
//! and a validation failure leaves the cached entry in place so transient
//! provider trouble cannot trigger rebuild storms.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use crate::compute::{ComputeApi, GceComputeClient, COMPUTE_API_BASE};
use crate::request::ServiceCredentials;

/// Errors raised while building or validating a provider connection.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CredentialError {
    /// Raised when the private-key material cannot be read.
    #[error("unable to read credential key file {path}: {message}")]
    KeyFile {
        /// Path that failed to read.
        path: String,
        /// I/O error description.
        message: String,
    },
    /// Raised when the key material is present but unusable.
    #[error("credential material for {service_account} is not valid: {message}")]
    Build {
        /// Credential identity being built.
        service_account: String,
        /// Description of what was wrong with the material.
        message: String,
    },
    /// Raised when the provider rejects the validation read performed before
    /// every hand-out.
    #[error("service account {service_account} failed provider validation: {message}")]
    Invalid {
        /// Credential identity that failed validation.
        service_account: String,
        /// Provider error description.
        message: String,
    },
}

/// Builds an authenticated client handle from credential material.
pub trait CredentialProvider: Send + Sync {
    /// Client handle type produced by this provider.
    type Api: ComputeApi + Send + Sync + 'static;

    /// Constructs a new handle for the given credentials.
    ///
    /// Construction must be side-effect-free on the provider; the cache may
    /// transiently build one extra handle under a first-lookup race and
    /// discard it.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the key material cannot be read or is
    /// unusable.
    fn connect(&self, credentials: &ServiceCredentials) -> Result<Self::Api, CredentialError>;
}

/// Credential provider that reads a bearer token from the key file.
///
/// Token minting from service-account private keys is delegated to external
/// tooling; this provider expects the key file to hold the resulting access
/// token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenFileCredentials {
    base_url: String,
}

impl TokenFileCredentials {
    /// Creates a provider building clients against the production API base.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(COMPUTE_API_BASE)
    }

    /// Creates a provider building clients against an alternative API base.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for TokenFileCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for TokenFileCredentials {
    type Api = GceComputeClient;

    fn connect(&self, credentials: &ServiceCredentials) -> Result<Self::Api, CredentialError> {
        let raw = fs::read_to_string(credentials.key_file.as_std_path()).map_err(|err| {
            CredentialError::KeyFile {
                path: credentials.key_file.to_string(),
                message: err.to_string(),
            }
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(CredentialError::Build {
                service_account: credentials.service_account.clone(),
                message: format!("key file {} is empty", credentials.key_file),
            });
        }
        GceComputeClient::with_base_url(token, &self.base_url).map_err(|err| {
            CredentialError::Build {
                service_account: credentials.service_account.clone(),
                message: err.to_string(),
            }
        })
    }
}

/// Thread-safe map from credential identity to a shared client handle.
///
/// The lock guards the map only; handle construction and the validation read
/// both happen outside it so slow builds for one identity never block
/// lookups for another.
pub struct ConnectionCache<P: CredentialProvider> {
    provider: P,
    handles: RwLock<HashMap<String, Arc<P::Api>>>,
}

impl<P: CredentialProvider> ConnectionCache<P> {
    /// Creates an empty cache over the given credential provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the validated handle for the given credentials.
    ///
    /// The fast path is a shared-lock lookup by identity. On a miss the
    /// handle is built outside the lock and inserted under the write lock;
    /// when two first-time lookups race, the loser's handle is discarded and
    /// both callers observe the same cached instance. Every hand-out, cached
    /// or fresh, is validated against the provider with a project read.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Invalid`] when the validation read fails;
    /// the cached entry is deliberately not evicted. Build errors from the
    /// credential provider pass through unchanged.
    pub async fn connection(
        &self,
        credentials: &ServiceCredentials,
        project: &str,
    ) -> Result<Arc<P::Api>, CredentialError> {
        let identity = credentials.service_account.as_str();
        let handle = match self.lookup(identity) {
            Some(cached) => {
                debug!(service_account = identity, "reusing cached connection");
                cached
            }
            None => {
                let built = self.provider.connect(credentials)?;
                info!(service_account = identity, "built new provider connection");
                self.store(identity, built)
            }
        };

        handle
            .get_project(project)
            .await
            .map_err(|err| CredentialError::Invalid {
                service_account: identity.to_owned(),
                message: err.to_string(),
            })?;

        Ok(handle)
    }

    fn lookup(&self, identity: &str) -> Option<Arc<P::Api>> {
        let guard = self
            .handles
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(identity).cloned()
    }

    fn store(&self, identity: &str, handle: P::Api) -> Arc<P::Api> {
        let mut guard = self
            .handles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            guard
                .entry(identity.to_owned())
                .or_insert_with(|| Arc::new(handle)),
        )
    }
}

#[cfg(test)]
mod tests;

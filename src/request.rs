//! Provisioning inputs supplied by the controller per account and per machine.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Credential material identifying one provider service account.
///
/// The `service_account` string is the credential identity: the connection
/// cache keys authenticated client handles by it, so two accounts with the
/// same identity share one handle and distinct identities never do.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceCredentials {
    /// Service account identifier (for example
    /// `fleet@my-project.iam.gserviceaccount.com`).
    pub service_account: String,
    /// Path to the private-key material used to authenticate the account.
    pub key_file: Utf8PathBuf,
}

impl ServiceCredentials {
    /// Constructs credentials from an identity and key-file path.
    #[must_use]
    pub fn new(service_account: impl Into<String>, key_file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            service_account: service_account.into(),
            key_file: key_file.into(),
        }
    }
}

/// One compute-center account as configured on the controller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProviderAccount {
    /// Credentials used to authenticate provider calls.
    pub credentials: ServiceCredentials,
    /// Project that owns all resources provisioned for this account.
    pub project_id: String,
    /// Controller-side account name, folded into the agent host identifier.
    pub account_name: String,
    /// Controller-side access key, folded into the agent host identifier.
    pub access_key: String,
}

/// Immutable input bundle for one machine creation attempt.
///
/// Produced fresh per create call and never persisted. The boot disk shares
/// the instance name, so `instance_name` identifies both resources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisioningRequest {
    /// Target availability zone (for example `us-central1-a`).
    pub zone: String,
    /// Name for the instance and its boot disk.
    pub instance_name: String,
    /// Machine type short name (for example `n1-standard-1`).
    pub machine_type: String,
    /// Short image key resolved through the image catalogue.
    pub image: String,
}

impl ProvisioningRequest {
    /// Starts a builder for a [`ProvisioningRequest`].
    #[must_use]
    pub fn builder() -> ProvisioningRequestBuilder {
        ProvisioningRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any field is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.zone.is_empty() {
            return Err(RequestError::Validation("zone".to_owned()));
        }
        if self.instance_name.is_empty() {
            return Err(RequestError::Validation("instance_name".to_owned()));
        }
        if self.machine_type.is_empty() {
            return Err(RequestError::Validation("machine_type".to_owned()));
        }
        if self.image.is_empty() {
            return Err(RequestError::Validation("image".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ProvisioningRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProvisioningRequestBuilder {
    zone: String,
    instance_name: String,
    machine_type: String,
    image: String,
}

impl ProvisioningRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the availability zone.
    #[must_use]
    pub fn zone(mut self, value: impl Into<String>) -> Self {
        self.zone = value.into();
        self
    }

    /// Sets the instance (and boot disk) name.
    #[must_use]
    pub fn instance_name(mut self, value: impl Into<String>) -> Self {
        self.instance_name = value.into();
        self
    }

    /// Sets the machine type.
    #[must_use]
    pub fn machine_type(mut self, value: impl Into<String>) -> Self {
        self.machine_type = value.into();
        self
    }

    /// Sets the short image key.
    #[must_use]
    pub fn image(mut self, value: impl Into<String>) -> Self {
        self.image = value.into();
        self
    }

    /// Builds and validates the [`ProvisioningRequest`], trimming string
    /// inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<ProvisioningRequest, RequestError> {
        let request = ProvisioningRequest {
            zone: self.zone.trim().to_owned(),
            instance_name: self.instance_name.trim().to_owned(),
            machine_type: self.machine_type.trim().to_owned(),
            image: self.image.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while assembling provisioning inputs.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_trims_and_builds() {
        let request = ProvisioningRequest::builder()
            .zone(" us-central1-a ")
            .instance_name("vm-1")
            .machine_type("n1-standard-1")
            .image("debian-7-wheezy-v20131120")
            .build()
            .unwrap_or_else(|err| panic!("request should build: {err}"));
        assert_eq!(request.zone, "us-central1-a");
        assert_eq!(request.instance_name, "vm-1");
    }

    #[test]
    fn builder_rejects_blank_instance_name() {
        let result = ProvisioningRequest::builder()
            .zone("us-central1-a")
            .instance_name("   ")
            .machine_type("n1-standard-1")
            .image("debian-7-wheezy-v20131120")
            .build();
        assert_eq!(
            result,
            Err(RequestError::Validation("instance_name".to_owned()))
        );
    }
}

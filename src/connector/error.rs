//! Error types for the provisioning orchestrator.

use thiserror::Error;

use crate::compute::ComputeError;
use crate::connection::CredentialError;
use crate::request::RequestError;

/// Errors surfaced while provisioning a machine.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProvisionError {
    /// Raised when the provisioning request fails validation.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// Raised when the connection cannot be built or fails provider
    /// validation.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Raised when the boot disk insert is rejected. Nothing was confirmed
    /// created, so no rollback is attempted.
    #[error("failed to create boot disk {disk} in zone {zone}: {source}")]
    Disk {
        /// Boot disk name (the instance name).
        disk: String,
        /// Target zone.
        zone: String,
        /// Provider failure.
        #[source]
        source: ComputeError,
    },
    /// Raised when the boot disk does not reach its terminal status before
    /// the configured wait timeout. The disk has been rolled back.
    #[error("timed out waiting for boot disk {disk} in zone {zone} to become ready")]
    DiskTimeout {
        /// Boot disk name (the instance name).
        disk: String,
        /// Target zone.
        zone: String,
    },
    /// Raised when the readiness wait ends without a signal, for example
    /// because the polling task was lost. The disk has been rolled back.
    #[error("wait for boot disk {disk} readiness was aborted before completion")]
    WaitAborted {
        /// Boot disk name (the instance name).
        disk: String,
    },
    /// Raised when the instance insert is rejected. The boot disk has been
    /// rolled back.
    #[error("failed to create instance {name}: {source}")]
    Instance {
        /// Instance name.
        name: String,
        /// Provider failure.
        #[source]
        source: ComputeError,
    },
    /// Raised when the compensating boot disk delete itself fails. The disk
    /// is orphaned on the provider and an operator must remove it manually.
    #[error(
        "machine create failed and the boot disk could not be deleted; \
         disk {disk} in zone {zone} is not used by any instance and must be \
         removed manually: {source}"
    )]
    OrphanedDisk {
        /// Name of the orphaned disk.
        disk: String,
        /// Zone holding the orphaned disk.
        zone: String,
        /// Provider failure from the compensating delete.
        #[source]
        source: ComputeError,
    },
}

/// Errors surfaced while terminating a machine.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TerminateError {
    /// Raised when the connection cannot be built or fails provider
    /// validation.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Raised when the instance delete fails; the record state is left
    /// unchanged.
    #[error("failed to delete instance {name}: {source}")]
    Instance {
        /// Instance name.
        name: String,
        /// Provider failure.
        #[source]
        source: ComputeError,
    },
    /// Raised when the boot disk delete fails after the instance was
    /// deleted; the record stays `Stopped` since the instance is confirmed
    /// gone.
    #[error("instance {name} deleted but boot disk removal failed: {source}")]
    Disk {
        /// Instance (and disk) name.
        name: String,
        /// Provider failure.
        #[source]
        source: ComputeError,
    },
}

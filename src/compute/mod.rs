//! Compute API client seam.
//!
//! The connector core only speaks to the provider through the [`ComputeApi`]
//! trait so orchestration logic can be exercised against scripted doubles.
//! [`GceComputeClient`] is the reqwest-backed implementation.

mod http;
mod types;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use http::GceComputeClient;
pub use types::{
    AccessConfig, AttachedDisk, DiskSpec, Instance, InstanceSpec, NetworkInterface, Operation,
    Project, OPERATION_DONE,
};

/// Base URL of the Compute Engine v1 API.
pub const COMPUTE_API_BASE: &str = "https://www.googleapis.com/compute/v1";

/// Future returned by compute API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ComputeError>> + Send + 'a>>;

/// Errors raised by compute API implementations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised when the request never reached the provider or the response
    /// could not be read.
    #[error("compute api request failed: {message}")]
    Transport {
        /// Transport-level failure description.
        message: String,
    },
    /// Raised when the provider answered with a non-success status.
    #[error("compute api {endpoint} returned {status}: {body}")]
    Api {
        /// Logical endpoint that failed (for example `disks.insert`).
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, when one was readable.
        body: String,
    },
}

/// Operations the connector requires from a provider client.
///
/// Implementations must be safe to share across concurrent callers; the
/// connection cache hands the same handle to every caller of one credential
/// identity without additional locking.
pub trait ComputeApi: Send + Sync {
    /// Reads the project resource; used as the connection validation call.
    fn get_project<'a>(&'a self, project: &'a str) -> ApiFuture<'a, Project>;

    /// Issues an asynchronous boot disk insert.
    fn insert_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a DiskSpec,
    ) -> ApiFuture<'a, Operation>;

    /// Deletes a disk by name.
    fn delete_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a str,
    ) -> ApiFuture<'a, Operation>;

    /// Issues an asynchronous instance insert.
    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        instance: &'a InstanceSpec,
    ) -> ApiFuture<'a, Operation>;

    /// Reads an instance by name; `Ok(None)` when the provider reports it
    /// absent.
    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Option<Instance>>;

    /// Deletes an instance by name.
    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Operation>;

    /// Reads the status of a zone-scoped operation.
    fn get_zone_operation<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        operation: &'a str,
    ) -> ApiFuture<'a, Operation>;
}

//! Reqwest-backed client for the Compute Engine v1 REST API.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::types::{DiskSpec, Instance, InstanceSpec, Operation, Project};
use super::{ApiFuture, ComputeApi, ComputeError, COMPUTE_API_BASE};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated HTTP client bound to one credential identity.
///
/// One client is built per service account by the credential provider and
/// cached for the process lifetime; concurrent read-style use is safe.
#[derive(Clone, Debug)]
pub struct GceComputeClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GceComputeClient {
    /// Creates a client against the production API base.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(token: impl Into<String>) -> Result<Self, ComputeError> {
        Self::with_base_url(token, COMPUTE_API_BASE)
    }

    /// Creates a client against an alternative API base, primarily for
    /// integration tests pointing at a local stub server.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ComputeError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| ComputeError::Transport {
                message: format!("http client build failed: {err}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &'static str,
    ) -> Result<T, ComputeError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ComputeError::Transport {
                message: err.to_string(),
            })?;
        if !status.is_success() {
            return Err(ComputeError::Api {
                endpoint,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(|err| ComputeError::Transport {
            message: format!("{endpoint} response decode failed: {err}"),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: &'static str,
    ) -> Result<T, ComputeError> {
        let response = self
            .http
            .get(self.url(path))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|err| ComputeError::Transport {
                message: err.to_string(),
            })?;
        Self::parse(response, endpoint).await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        endpoint: &'static str,
    ) -> Result<T, ComputeError> {
        let response = self
            .http
            .post(self.url(path))
            .header("Authorization", self.auth())
            .json(body)
            .send()
            .await
            .map_err(|err| ComputeError::Transport {
                message: err.to_string(),
            })?;
        Self::parse(response, endpoint).await
    }

    async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: &'static str,
    ) -> Result<T, ComputeError> {
        let response = self
            .http
            .delete(self.url(path))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|err| ComputeError::Transport {
                message: err.to_string(),
            })?;
        Self::parse(response, endpoint).await
    }
}

impl ComputeApi for GceComputeClient {
    fn get_project<'a>(&'a self, project: &'a str) -> ApiFuture<'a, Project> {
        Box::pin(async move {
            self.get_json(&format!("/projects/{project}"), "projects.get")
                .await
        })
    }

    fn insert_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a DiskSpec,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            self.post_json(
                &format!("/projects/{project}/zones/{zone}/disks"),
                disk,
                "disks.insert",
            )
            .await
        })
    }

    fn delete_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            self.delete_json(
                &format!("/projects/{project}/zones/{zone}/disks/{disk}"),
                "disks.delete",
            )
            .await
        })
    }

    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        instance: &'a InstanceSpec,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            self.post_json(
                &format!("/projects/{project}/zones/{zone}/instances"),
                instance,
                "instances.insert",
            )
            .await
        })
    }

    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Option<Instance>> {
        Box::pin(async move {
            let response = self
                .http
                .get(self.url(&format!("/projects/{project}/zones/{zone}/instances/{name}")))
                .header("Authorization", self.auth())
                .send()
                .await
                .map_err(|err| ComputeError::Transport {
                    message: err.to_string(),
                })?;
            if response.status().as_u16() == 404 {
                return Ok(None);
            }
            Self::parse(response, "instances.get").await.map(Some)
        })
    }

    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            self.delete_json(
                &format!("/projects/{project}/zones/{zone}/instances/{name}"),
                "instances.delete",
            )
            .await
        })
    }

    fn get_zone_operation<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        operation: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            self.get_json(
                &format!("/projects/{project}/zones/{zone}/operations/{operation}"),
                "zoneOperations.get",
            )
            .await
        })
    }
}

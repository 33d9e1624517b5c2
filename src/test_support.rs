//! Test support utilities shared across unit and integration tests.
//!
//! Provides a scripted compute API double that records every call, plus
//! controller and credential-provider doubles, so orchestration flows can be
//! driven deterministically without touching the provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::compute::{
    AccessConfig, ApiFuture, ComputeApi, ComputeError, DiskSpec, Instance, InstanceSpec,
    NetworkInterface, Operation, Project,
};
use crate::config::ConnectorConfig;
use crate::connection::{CredentialError, CredentialProvider};
use crate::controller::{ControllerServices, MachineRecord, MachineState};
use crate::request::{ProviderAccount, ProvisioningRequest, ServiceCredentials};

/// Records a single call made through [`ScriptedComputeApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// `projects.get`, the connection validation read.
    GetProject {
        /// Project requested.
        project: String,
    },
    /// `disks.insert`.
    InsertDisk {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Disk payload as sent.
        disk: DiskSpec,
    },
    /// `disks.delete`.
    DeleteDisk {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Disk name.
        disk: String,
    },
    /// `instances.insert`.
    InsertInstance {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Instance payload as sent.
        instance: InstanceSpec,
    },
    /// `instances.get`.
    GetInstance {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Instance name.
        name: String,
    },
    /// `instances.delete`.
    DeleteInstance {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Instance name.
        name: String,
    },
    /// `zoneOperations.get`.
    GetZoneOperation {
        /// Target project.
        project: String,
        /// Target zone.
        zone: String,
        /// Operation name.
        operation: String,
    },
}

#[derive(Debug, Default)]
struct Script {
    calls: Vec<ApiCall>,
    validation_error: Option<ComputeError>,
    disk_insert_error: Option<ComputeError>,
    instance_insert_error: Option<ComputeError>,
    disk_delete_error: Option<ComputeError>,
    instance_delete_error: Option<ComputeError>,
    operation_polls: VecDeque<Result<String, ComputeError>>,
    operation_poll_panic: bool,
    idle_operation_status: Option<String>,
    instance_get: Option<Result<Option<Instance>, ComputeError>>,
}

/// Scripted compute API double that records calls and returns pre-seeded
/// outcomes.
///
/// Clones share state, so a test can keep one copy for assertions while the
/// connector owns another. Unscripted operation polls report `DONE`, and an
/// unscripted instance read reports the instance absent.
#[derive(Clone, Debug, Default)]
pub struct ScriptedComputeApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedComputeApi {
    /// Creates a double with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.script().calls.clone()
    }

    /// Number of disk delete calls recorded so far.
    #[must_use]
    pub fn disk_delete_calls(&self) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| matches!(call, ApiCall::DeleteDisk { .. }))
            .count()
    }

    /// Makes the validation read fail with the given error.
    pub fn fail_validation(&self, error: ComputeError) {
        self.script().validation_error = Some(error);
    }

    /// Clears a previously scripted validation failure.
    pub fn pass_validation(&self) {
        self.script().validation_error = None;
    }

    /// Makes the disk insert fail with the given error.
    pub fn fail_disk_insert(&self, error: ComputeError) {
        self.script().disk_insert_error = Some(error);
    }

    /// Makes the instance insert fail with the given error.
    pub fn fail_instance_insert(&self, error: ComputeError) {
        self.script().instance_insert_error = Some(error);
    }

    /// Makes the disk delete fail with the given error.
    pub fn fail_disk_delete(&self, error: ComputeError) {
        self.script().disk_delete_error = Some(error);
    }

    /// Makes the instance delete fail with the given error.
    pub fn fail_instance_delete(&self, error: ComputeError) {
        self.script().instance_delete_error = Some(error);
    }

    /// Queues one operation poll outcome reporting the given status.
    pub fn push_operation_status(&self, status: &str) {
        self.script()
            .operation_polls
            .push_back(Ok(status.to_owned()));
    }

    /// Queues one operation poll outcome failing with the given error.
    pub fn push_operation_error(&self, error: ComputeError) {
        self.script().operation_polls.push_back(Err(error));
    }

    /// Makes every operation poll panic, killing the polling task so its
    /// completion signal is never sent.
    pub fn abort_operation_polls(&self) {
        self.script().operation_poll_panic = true;
    }

    /// Sets the status reported once the poll queue is exhausted. Defaults
    /// to `DONE`.
    pub fn set_idle_operation_status(&self, status: &str) {
        self.script().idle_operation_status = Some(status.to_owned());
    }

    /// Scripts the instance read to observe the given instance.
    pub fn set_instance(&self, instance: Option<Instance>) {
        self.script().instance_get = Some(Ok(instance));
    }

    /// Makes the instance read fail with the given error.
    pub fn fail_instance_get(&self, error: ComputeError) {
        self.script().instance_get = Some(Err(error));
    }
}

impl ComputeApi for ScriptedComputeApi {
    fn get_project<'a>(&'a self, project: &'a str) -> ApiFuture<'a, Project> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::GetProject {
                project: project.to_owned(),
            });
            script.validation_error.clone().map_or_else(
                || {
                    Ok(Project {
                        name: project.to_owned(),
                    })
                },
                Err,
            )
        })
    }

    fn insert_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a DiskSpec,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::InsertDisk {
                project: project.to_owned(),
                zone: zone.to_owned(),
                disk: disk.clone(),
            });
            script.disk_insert_error.clone().map_or_else(
                || {
                    Ok(Operation {
                        name: format!("insert-disk-{}", disk.name),
                        status: "RUNNING".to_owned(),
                    })
                },
                Err,
            )
        })
    }

    fn delete_disk<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        disk: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::DeleteDisk {
                project: project.to_owned(),
                zone: zone.to_owned(),
                disk: disk.to_owned(),
            });
            script.disk_delete_error.clone().map_or_else(
                || {
                    Ok(Operation {
                        name: format!("delete-disk-{disk}"),
                        status: "RUNNING".to_owned(),
                    })
                },
                Err,
            )
        })
    }

    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        instance: &'a InstanceSpec,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::InsertInstance {
                project: project.to_owned(),
                zone: zone.to_owned(),
                instance: instance.clone(),
            });
            script.instance_insert_error.clone().map_or_else(
                || {
                    Ok(Operation {
                        name: format!("insert-instance-{}", instance.name),
                        status: "RUNNING".to_owned(),
                    })
                },
                Err,
            )
        })
    }

    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Option<Instance>> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::GetInstance {
                project: project.to_owned(),
                zone: zone.to_owned(),
                name: name.to_owned(),
            });
            script.instance_get.clone().unwrap_or(Ok(None))
        })
    }

    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::DeleteInstance {
                project: project.to_owned(),
                zone: zone.to_owned(),
                name: name.to_owned(),
            });
            script.instance_delete_error.clone().map_or_else(
                || {
                    Ok(Operation {
                        name: format!("delete-instance-{name}"),
                        status: "RUNNING".to_owned(),
                    })
                },
                Err,
            )
        })
    }

    fn get_zone_operation<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        operation: &'a str,
    ) -> ApiFuture<'a, Operation> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(ApiCall::GetZoneOperation {
                project: project.to_owned(),
                zone: zone.to_owned(),
                operation: operation.to_owned(),
            });
            assert!(
                !script.operation_poll_panic,
                "operation poll aborted by script"
            );
            let scripted = script.operation_polls.pop_front();
            let outcome = scripted.unwrap_or_else(|| {
                Ok(script
                    .idle_operation_status
                    .clone()
                    .unwrap_or_else(|| "DONE".to_owned()))
            });
            outcome.map(|status| Operation {
                name: operation.to_owned(),
                status,
            })
        })
    }
}

/// Credential-provider double returning clones of one scripted API.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCredentials {
    api: ScriptedComputeApi,
    connects: Arc<AtomicUsize>,
    connect_error: Arc<Mutex<Option<CredentialError>>>,
}

impl ScriptedCredentials {
    /// Creates a provider handing out clones of the given scripted API.
    #[must_use]
    pub fn new(api: ScriptedComputeApi) -> Self {
        Self {
            api,
            connects: Arc::new(AtomicUsize::new(0)),
            connect_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of successful handle builds so far.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Makes the next and all following builds fail with the given error.
    pub fn fail_connect(&self, error: CredentialError) {
        *self
            .connect_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }
}

impl CredentialProvider for ScriptedCredentials {
    type Api = ScriptedComputeApi;

    fn connect(&self, _credentials: &ServiceCredentials) -> Result<Self::Api, CredentialError> {
        let scripted_failure = self
            .connect_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(error) = scripted_failure {
            return Err(error);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.api.clone())
    }
}

/// Machine-record double counting every state and IP write.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestMachine {
    name: String,
    state: MachineState,
    ip: Option<String>,
    host_identifier: Option<String>,
    agent_port: Option<u16>,
    state_writes: usize,
    ip_writes: usize,
}

impl TestMachine {
    /// Creates a record in the given state with no IP.
    #[must_use]
    pub fn new(name: impl Into<String>, state: MachineState) -> Self {
        Self {
            name: name.into(),
            state,
            ip: None,
            host_identifier: None,
            agent_port: None,
            state_writes: 0,
            ip_writes: 0,
        }
    }

    /// Number of state writes observed.
    #[must_use]
    pub const fn state_writes(&self) -> usize {
        self.state_writes
    }

    /// Number of IP writes observed.
    #[must_use]
    pub const fn ip_writes(&self) -> usize {
        self.ip_writes
    }

    /// Host identifier the record was created with, when factory-built.
    #[must_use]
    pub fn host_identifier(&self) -> Option<&str> {
        self.host_identifier.as_deref()
    }

    /// Agent port the record was created with, when factory-built.
    #[must_use]
    pub const fn agent_port(&self) -> Option<u16> {
        self.agent_port
    }
}

impl MachineRecord for TestMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MachineState {
        self.state
    }

    fn set_state(&mut self, state: MachineState) {
        self.state = state;
        self.state_writes += 1;
    }

    fn ip_address(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    fn set_ip_address(&mut self, ip: Option<String>) {
        self.ip = ip;
        self.ip_writes += 1;
    }
}

/// Controller double whose factory produces [`TestMachine`] records.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StaticController {
    /// Default agent port handed to the connector.
    pub agent_port: u16,
}

impl ControllerServices for StaticController {
    type Record = TestMachine;

    fn create_machine_record(
        &self,
        name: &str,
        host_identifier: &str,
        agent_port: u16,
    ) -> Self::Record {
        let mut record = TestMachine::new(name, MachineState::Starting);
        record.host_identifier = Some(host_identifier.to_owned());
        record.agent_port = Some(agent_port);
        record
    }

    fn default_agent_port(&self) -> u16 {
        self.agent_port
    }
}

/// Builds a scripted API error for the given endpoint.
#[must_use]
pub fn api_error(endpoint: &'static str) -> ComputeError {
    ComputeError::Api {
        endpoint,
        status: 409,
        body: "scripted failure".to_owned(),
    }
}

/// Credentials for the test service account.
#[must_use]
pub fn test_credentials() -> ServiceCredentials {
    ServiceCredentials::new("fleet@p1.iam.gserviceaccount.com", "/tmp/unused-token")
}

/// Provider account for project `p1`.
#[must_use]
pub fn test_account() -> ProviderAccount {
    ProviderAccount {
        credentials: test_credentials(),
        project_id: "p1".to_owned(),
        account_name: "acme".to_owned(),
        access_key: "access-key-1".to_owned(),
    }
}

/// Provisioning request for one named machine in zone `z1`.
///
/// # Panics
///
/// Panics when the builder rejects the fixture, which indicates a broken
/// fixture rather than a test failure.
#[must_use]
pub fn test_request(name: &str) -> ProvisioningRequest {
    ProvisioningRequest::builder()
        .zone("z1")
        .instance_name(name)
        .machine_type("n1-standard-1")
        .image("debian-7-wheezy-v20131120")
        .build()
        .unwrap_or_else(|err| panic!("fixture request should build: {err}"))
}

/// Connector configuration suitable for fast tests.
#[must_use]
pub fn test_config() -> ConnectorConfig {
    ConnectorConfig {
        api_base_url: "https://www.googleapis.com/compute/v1".to_owned(),
        controller_host: "controller.test".to_owned(),
        controller_port: 8090,
        poll_interval_secs: 5,
        wait_timeout_secs: 300,
    }
}

/// Builds a `RUNNING` instance with one access config per given NAT IP,
/// spread across one interface each.
#[must_use]
pub fn running_instance(name: &str, nat_ips: &[&str]) -> Instance {
    Instance {
        name: name.to_owned(),
        status: "RUNNING".to_owned(),
        network_interfaces: nat_ips
            .iter()
            .map(|ip| NetworkInterface {
                name: "nic0".to_owned(),
                network: None,
                access_configs: vec![AccessConfig {
                    name: "External NAT".to_owned(),
                    kind: "ONE_TO_ONE_NAT".to_owned(),
                    nat_ip: Some((*ip).to_owned()),
                }],
            })
            .collect(),
    }
}

/// Builds an instance reporting the given status with no interfaces.
#[must_use]
pub fn instance_with_status(name: &str, status: &str) -> Instance {
    Instance {
        name: name.to_owned(),
        status: status.to_owned(),
        network_interfaces: Vec::new(),
    }
}

//! Machine creation flow: boot disk, readiness wait, instance, rollback.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::compute::{
    AccessConfig, AttachedDisk, ComputeApi, DiskSpec, InstanceSpec, NetworkInterface, Operation,
};
use crate::connection::CredentialProvider;
use crate::controller::ControllerServices;
use crate::request::{ProviderAccount, ProvisioningRequest};

use super::poller::{self, PendingOperation};
use super::{GceConnector, ProvisionError};

const NETWORK_INTERFACE_NAME: &str = "Default";
const ACCESS_CONFIG_NAME: &str = "External NAT";
const ACCESS_CONFIG_TYPE: &str = "ONE_TO_ONE_NAT";
const BOOT_DISK_TYPE: &str = "PERSISTENT";
const BOOT_DISK_MODE: &str = "READ_WRITE";

impl<P, C> GceConnector<P, C>
where
    P: CredentialProvider,
    C: ControllerServices,
{
    /// Provisions a new machine and returns its controller record.
    ///
    /// Steps run strictly in order: resolve the connection, issue the boot
    /// disk insert, wait for the disk operation to reach its terminal status,
    /// then issue the instance insert. No record is exposed until the final
    /// step succeeds. Any failure after the disk insert triggers exactly one
    /// compensating disk delete.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::OrphanedDisk`] when the compensating delete
    /// itself fails; the message names the disk so an operator can remove it
    /// manually. All other variants describe which step failed.
    pub async fn create_machine(
        &self,
        account: &ProviderAccount,
        request: &ProvisioningRequest,
    ) -> Result<C::Record, ProvisionError> {
        request.validate()?;
        let api = self
            .connections
            .connection(&account.credentials, &account.project_id)
            .await?;
        let host_identifier = self.agent_resolution(account).unique_host_identifier();

        let operation = self.create_boot_disk(api.as_ref(), account, request).await?;
        info!(
            instance = request.instance_name.as_str(),
            operation = operation.name.as_str(),
            "boot disk creation accepted"
        );
        self.await_disk_ready(&api, account, request, operation)
            .await?;

        let spec = self.instance_spec(account, request);
        match api
            .insert_instance(&account.project_id, &request.zone, &spec)
            .await
        {
            Ok(_) => {
                info!(
                    instance = request.instance_name.as_str(),
                    zone = request.zone.as_str(),
                    "instance creation accepted"
                );
                Ok(self.controller.create_machine_record(
                    &request.instance_name,
                    &host_identifier,
                    self.agent_port(),
                ))
            }
            Err(err) => {
                warn!(
                    instance = request.instance_name.as_str(),
                    error = %err,
                    "instance create failed; rolling back boot disk"
                );
                self.roll_back_boot_disk(api.as_ref(), account, request)
                    .await?;
                Err(ProvisionError::Instance {
                    name: request.instance_name.clone(),
                    source: err,
                })
            }
        }
    }

    async fn create_boot_disk(
        &self,
        api: &P::Api,
        account: &ProviderAccount,
        request: &ProvisioningRequest,
    ) -> Result<Operation, ProvisionError> {
        // An unknown image key is not rejected here: the insert goes out
        // without a source image and the provider refuses it.
        let disk = DiskSpec {
            name: request.instance_name.clone(),
            source_image: self.images.resolve(&request.image).map(str::to_owned),
        };
        api.insert_disk(&account.project_id, &request.zone, &disk)
            .await
            .map_err(|err| ProvisionError::Disk {
                disk: request.instance_name.clone(),
                zone: request.zone.clone(),
                source: err,
            })
    }

    async fn await_disk_ready(
        &self,
        api: &Arc<P::Api>,
        account: &ProviderAccount,
        request: &ProvisioningRequest,
        operation: Operation,
    ) -> Result<(), ProvisionError> {
        let pending = PendingOperation {
            name: operation.name,
            project: account.project_id.clone(),
            zone: request.zone.clone(),
        };
        let ready = poller::watch(Arc::clone(api), pending, self.poll_interval);

        match timeout(self.wait_timeout, ready).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => {
                warn!(
                    instance = request.instance_name.as_str(),
                    "boot disk readiness wait aborted; rolling back boot disk"
                );
                self.roll_back_boot_disk(api.as_ref(), account, request)
                    .await?;
                Err(ProvisionError::WaitAborted {
                    disk: request.instance_name.clone(),
                })
            }
            Err(_) => {
                warn!(
                    instance = request.instance_name.as_str(),
                    "boot disk readiness wait timed out; rolling back boot disk"
                );
                self.roll_back_boot_disk(api.as_ref(), account, request)
                    .await?;
                Err(ProvisionError::DiskTimeout {
                    disk: request.instance_name.clone(),
                    zone: request.zone.clone(),
                })
            }
        }
    }

    async fn roll_back_boot_disk(
        &self,
        api: &P::Api,
        account: &ProviderAccount,
        request: &ProvisioningRequest,
    ) -> Result<(), ProvisionError> {
        match api
            .delete_disk(&account.project_id, &request.zone, &request.instance_name)
            .await
        {
            Ok(_) => {
                info!(
                    disk = request.instance_name.as_str(),
                    zone = request.zone.as_str(),
                    "boot disk rolled back"
                );
                Ok(())
            }
            Err(err) => Err(ProvisionError::OrphanedDisk {
                disk: request.instance_name.clone(),
                zone: request.zone.clone(),
                source: err,
            }),
        }
    }

    fn instance_spec(
        &self,
        account: &ProviderAccount,
        request: &ProvisioningRequest,
    ) -> InstanceSpec {
        let base = self.config.api_base_url.as_str();
        let project = account.project_id.as_str();
        InstanceSpec {
            name: request.instance_name.clone(),
            machine_type: format!(
                "{base}/projects/{project}/zones/{}/machineTypes/{}",
                request.zone, request.machine_type
            ),
            zone: request.zone.clone(),
            network_interfaces: vec![NetworkInterface {
                name: NETWORK_INTERFACE_NAME.to_owned(),
                network: Some(format!("{base}/projects/{project}/global/networks/default")),
                access_configs: vec![AccessConfig {
                    name: ACCESS_CONFIG_NAME.to_owned(),
                    kind: ACCESS_CONFIG_TYPE.to_owned(),
                    nat_ip: None,
                }],
            }],
            disks: vec![AttachedDisk {
                boot: true,
                kind: BOOT_DISK_TYPE.to_owned(),
                mode: BOOT_DISK_MODE.to_owned(),
                device_name: request.instance_name.clone(),
                source: format!(
                    "{base}/projects/{project}/zones/{}/disks/{}",
                    request.zone, request.instance_name
                ),
            }],
        }
    }
}

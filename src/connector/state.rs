//! Best-effort machine state refresh from provider-reported status.

use tracing::warn;

use crate::compute::{ComputeApi, Instance};
use crate::connection::{CredentialError, CredentialProvider};
use crate::controller::{ControllerServices, MachineRecord, MachineState};
use crate::request::ProviderAccount;

use super::GceConnector;

const STATUS_RUNNING: &str = "RUNNING";
const STATUS_PROVISIONING: &str = "PROVISIONING";
const STATUS_STAGING: &str = "STAGING";

impl<P, C> GceConnector<P, C>
where
    P: CredentialProvider,
    C: ControllerServices,
{
    /// Refreshes the record's lifecycle state and IP from provider status.
    ///
    /// This is a best-effort read path: a transport failure on the instance
    /// read is logged and swallowed, leaving the record untouched. Only a
    /// connection or validation failure surfaces to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the provider connection cannot be
    /// obtained or validated.
    pub async fn refresh_machine_state<M: MachineRecord>(
        &self,
        account: &ProviderAccount,
        zone: &str,
        machine: &mut M,
    ) -> Result<(), CredentialError> {
        let api = self
            .connections
            .connection(&account.credentials, &account.project_id)
            .await?;

        match api
            .get_instance(&account.project_id, zone, machine.name())
            .await
        {
            Ok(observation) => apply_observation(machine, observation.as_ref()),
            Err(err) => warn!(
                machine = machine.name(),
                error = %err,
                "best-effort state refresh failed; record left unchanged"
            ),
        }
        Ok(())
    }
}

/// Applies one provider observation to a machine record.
///
/// An absent instance means `Stopped`, written only when the state actually
/// changes to avoid redundant controller writes. A `RUNNING` instance also
/// refreshes the IP address from its access configs; provider iteration
/// order is preserved, so the last access config visited wins.
pub(crate) fn apply_observation<M: MachineRecord>(machine: &mut M, observation: Option<&Instance>) {
    let Some(instance) = observation else {
        if machine.state() != MachineState::Stopped {
            machine.set_state(MachineState::Stopped);
        }
        return;
    };

    match instance.status.as_str() {
        STATUS_RUNNING => {
            for interface in &instance.network_interfaces {
                for access in &interface.access_configs {
                    machine.set_ip_address(access.nat_ip.clone());
                }
            }
            machine.set_state(MachineState::Started);
        }
        STATUS_PROVISIONING | STATUS_STAGING => machine.set_state(MachineState::Starting),
        _ => machine.set_state(MachineState::Stopped),
    }
}

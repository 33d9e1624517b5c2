//! Ordered teardown: instance delete, forced stop, boot disk delete.

use tracing::info;

use crate::compute::ComputeApi;
use crate::connection::CredentialProvider;
use crate::controller::{ControllerServices, MachineRecord, MachineState};
use crate::request::ProviderAccount;

use super::{GceConnector, TerminateError};

impl<P, C> GceConnector<P, C>
where
    P: CredentialProvider,
    C: ControllerServices,
{
    /// Terminates a machine: deletes the instance, forces the record to
    /// `Stopped`, then deletes the boot disk of the same name.
    ///
    /// There are no retries and no partial-state repair. The record is
    /// forced to `Stopped` as soon as the instance delete succeeds; a later
    /// disk delete failure leaves that state in place, since the instance
    /// itself is confirmed gone.
    ///
    /// # Errors
    ///
    /// Returns [`TerminateError`] when either delete call fails.
    pub async fn terminate_machine<M: MachineRecord>(
        &self,
        account: &ProviderAccount,
        zone: &str,
        machine: &mut M,
    ) -> Result<(), TerminateError> {
        let api = self
            .connections
            .connection(&account.credentials, &account.project_id)
            .await?;

        api.delete_instance(&account.project_id, zone, machine.name())
            .await
            .map_err(|err| TerminateError::Instance {
                name: machine.name().to_owned(),
                source: err,
            })?;
        machine.set_state(MachineState::Stopped);
        info!(machine = machine.name(), zone, "instance deleted");

        api.delete_disk(&account.project_id, zone, machine.name())
            .await
            .map_err(|err| TerminateError::Disk {
                name: machine.name().to_owned(),
                source: err,
            })?;
        info!(machine = machine.name(), zone, "boot disk deleted");
        Ok(())
    }
}

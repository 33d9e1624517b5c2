//! Seam between the connector core and the fleet controller.
//!
//! The controller owns machine records; the connector only mutates their
//! lifecycle state and IP address in place. Record creation is delegated back
//! to the controller through [`ControllerServices::create_machine_record`].

/// Controller-visible lifecycle state of a provisioned instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MachineState {
    /// The provider is still bringing the instance up.
    Starting,
    /// The instance is running and reachable.
    Started,
    /// The instance is stopped or gone; terminal for this core.
    Stopped,
}

/// Mutable view of a controller-owned machine record.
///
/// State transitions are driven by the state refresher reading provider
/// status; the connector never transitions state from local intent, except
/// the forced [`MachineState::Stopped`] after a successful instance delete.
pub trait MachineRecord {
    /// Instance name, shared with the boot disk.
    fn name(&self) -> &str;
    /// Current lifecycle state.
    fn state(&self) -> MachineState;
    /// Overwrites the lifecycle state.
    fn set_state(&mut self, state: MachineState);
    /// Current IP address, when one has been observed.
    fn ip_address(&self) -> Option<&str>;
    /// Overwrites the IP address.
    fn set_ip_address(&mut self, ip: Option<String>);
}

/// Services the controller supplies to the connector.
pub trait ControllerServices {
    /// Machine record type produced by the controller's factory.
    type Record: MachineRecord;

    /// Creates a machine record for a freshly provisioned instance.
    fn create_machine_record(
        &self,
        name: &str,
        host_identifier: &str,
        agent_port: u16,
    ) -> Self::Record;

    /// Default port agents on provisioned machines connect back on.
    fn default_agent_port(&self) -> u16;
}

/// Encodes the controller endpoint and account identity into the unique host
/// identifier handed to agents on provisioned machines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgentResolution {
    controller_host: String,
    controller_port: u16,
    account_name: String,
    access_key: String,
}

impl AgentResolution {
    /// Builds a resolution from the controller endpoint and account identity.
    #[must_use]
    pub fn new(
        controller_host: impl Into<String>,
        controller_port: u16,
        account_name: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        Self {
            controller_host: controller_host.into(),
            controller_port,
            account_name: account_name.into(),
            access_key: access_key.into(),
        }
    }

    /// Returns the encoded identifier passed to the machine-record factory.
    #[must_use]
    pub fn unique_host_identifier(&self) -> String {
        format!(
            "{}:{}|{}|{}",
            self.controller_host, self.controller_port, self.account_name, self.access_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AgentResolution;

    #[test]
    fn host_identifier_encodes_endpoint_and_account() {
        let resolution = AgentResolution::new("controller.local", 8090, "acme", "secret");
        assert_eq!(
            resolution.unique_host_identifier(),
            "controller.local:8090|acme|secret"
        );
    }
}

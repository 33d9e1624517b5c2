//! Tests for ordered machine teardown.

use crate::connector::TerminateError;
use crate::controller::{MachineRecord, MachineState};
use crate::test_support::{api_error, test_account, ApiCall, ScriptedComputeApi, TestMachine};

use super::connector;

#[tokio::test]
async fn terminate_deletes_instance_then_disk_and_forces_stopped() {
    let api = ScriptedComputeApi::new();
    let orchestrator = connector(&api);
    let mut machine = TestMachine::new("vm-1", MachineState::Started);

    orchestrator
        .terminate_machine(&test_account(), "z1", &mut machine)
        .await
        .unwrap_or_else(|err| panic!("terminate should succeed: {err}"));

    assert_eq!(machine.state(), MachineState::Stopped);
    let deletes: Vec<&'static str> = api
        .calls()
        .iter()
        .filter_map(|call| match call {
            ApiCall::DeleteInstance { .. } => Some("instances.delete"),
            ApiCall::DeleteDisk { .. } => Some("disks.delete"),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, vec!["instances.delete", "disks.delete"]);
}

#[tokio::test]
async fn instance_delete_failure_leaves_the_record_state() {
    let api = ScriptedComputeApi::new();
    api.fail_instance_delete(api_error("instances.delete"));
    let orchestrator = connector(&api);
    let mut machine = TestMachine::new("vm-1", MachineState::Started);

    let result = orchestrator
        .terminate_machine(&test_account(), "z1", &mut machine)
        .await;

    assert!(matches!(
        result,
        Err(TerminateError::Instance { ref name, .. }) if name == "vm-1"
    ));
    assert_eq!(machine.state(), MachineState::Started);
    assert_eq!(api.disk_delete_calls(), 0);
}

#[tokio::test]
async fn disk_delete_failure_still_leaves_the_machine_stopped() {
    let api = ScriptedComputeApi::new();
    api.fail_disk_delete(api_error("disks.delete"));
    let orchestrator = connector(&api);
    let mut machine = TestMachine::new("vm-1", MachineState::Started);

    let result = orchestrator
        .terminate_machine(&test_account(), "z1", &mut machine)
        .await;

    assert!(matches!(
        result,
        Err(TerminateError::Disk { ref name, .. }) if name == "vm-1"
    ));
    // The instance itself is confirmed gone, so the forced stop stands.
    assert_eq!(machine.state(), MachineState::Stopped);
}

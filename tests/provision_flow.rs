//! End-to-end provisioning flows against a scripted provider.

use std::time::Duration;

use gce_connector::test_support::{
    api_error, running_instance, test_account, test_config, ApiCall, ScriptedComputeApi,
    ScriptedCredentials, StaticController,
};
use gce_connector::{
    GceConnector, ImageCatalog, MachineRecord, MachineState, ProvisionError, ProvisioningRequest,
};

fn connector(api: &ScriptedComputeApi) -> GceConnector<ScriptedCredentials, StaticController> {
    GceConnector::new(
        test_config(),
        ScriptedCredentials::new(api.clone()),
        StaticController { agent_port: 8091 },
        ImageCatalog::default(),
    )
    .unwrap_or_else(|err| panic!("connector should build: {err}"))
    .with_poll_interval(Duration::from_millis(1))
    .with_wait_timeout(Duration::from_millis(250))
}

fn request() -> ProvisioningRequest {
    ProvisioningRequest::builder()
        .zone("z1")
        .instance_name("vm-1")
        .machine_type("n1-standard-1")
        .image("debian-7-wheezy-v20131120")
        .build()
        .unwrap_or_else(|err| panic!("request should build: {err}"))
}

#[tokio::test]
async fn create_succeeds_when_the_disk_is_ready_on_the_first_poll() {
    let api = ScriptedComputeApi::new();
    api.push_operation_status("DONE");
    let orchestrator = connector(&api);

    let record = orchestrator
        .create_machine(&test_account(), &request())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(record.name(), "vm-1");
    assert_eq!(api.disk_delete_calls(), 0);
    let polls = api
        .calls()
        .iter()
        .filter(|call| matches!(call, ApiCall::GetZoneOperation { .. }))
        .count();
    assert_eq!(polls, 1);
}

#[tokio::test]
async fn rejected_instance_insert_rolls_back_the_boot_disk() {
    let api = ScriptedComputeApi::new();
    api.push_operation_status("DONE");
    api.fail_instance_insert(api_error("instances.insert"));
    let orchestrator = connector(&api);

    let result = orchestrator.create_machine(&test_account(), &request()).await;

    assert!(matches!(result, Err(ProvisionError::Instance { .. })));
    assert_eq!(api.disk_delete_calls(), 1);
    let rollback = api.calls().into_iter().find_map(|call| match call {
        ApiCall::DeleteDisk {
            project,
            zone,
            disk,
        } => Some((project, zone, disk)),
        _ => None,
    });
    assert_eq!(
        rollback,
        Some(("p1".to_owned(), "z1".to_owned(), "vm-1".to_owned()))
    );
}

#[tokio::test]
async fn full_lifecycle_create_refresh_terminate() {
    let api = ScriptedComputeApi::new();
    let orchestrator = connector(&api);
    let account = test_account();

    let mut record = orchestrator
        .create_machine(&account, &request())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));
    assert_eq!(record.state(), MachineState::Starting);

    api.set_instance(Some(running_instance("vm-1", &["198.51.100.7"])));
    orchestrator
        .refresh_machine_state(&account, "z1", &mut record)
        .await
        .unwrap_or_else(|err| panic!("refresh should succeed: {err}"));
    assert_eq!(record.state(), MachineState::Started);
    assert_eq!(record.ip_address(), Some("198.51.100.7"));

    orchestrator
        .terminate_machine(&account, "z1", &mut record)
        .await
        .unwrap_or_else(|err| panic!("terminate should succeed: {err}"));
    assert_eq!(record.state(), MachineState::Stopped);
}

//! Tests for the provisioning orchestrator.

mod terminate;

use std::time::Duration;

use crate::connector::GceConnector;
use crate::images::ImageCatalog;
use crate::test_support::{test_config, ScriptedComputeApi, ScriptedCredentials, StaticController};

pub(super) const TEST_AGENT_PORT: u16 = 7777;

/// Builds a connector over the given scripted API with fast poll timings.
pub(super) fn connector(
    api: &ScriptedComputeApi,
) -> GceConnector<ScriptedCredentials, StaticController> {
    GceConnector::new(
        test_config(),
        ScriptedCredentials::new(api.clone()),
        StaticController {
            agent_port: TEST_AGENT_PORT,
        },
        ImageCatalog::default(),
    )
    .unwrap_or_else(|err| panic!("connector should build: {err}"))
    .with_poll_interval(Duration::from_millis(1))
    .with_wait_timeout(Duration::from_millis(250))
}

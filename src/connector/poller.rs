//! Background poller watching a boot disk creation operation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::compute::ComputeApi;

/// An in-flight provider-side asynchronous action.
///
/// Created when the disk insert returns and discarded once a terminal status
/// is observed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PendingOperation {
    /// Operation name used for status polling.
    pub(crate) name: String,
    /// Project owning the operation.
    pub(crate) project: String,
    /// Zone the operation runs in.
    pub(crate) zone: String,
}

/// Spawns a polling task and returns the one-shot completion signal.
///
/// The task polls immediately and then at the fixed interval. Transport
/// errors are never terminal: they are logged and polling continues. The
/// signal fires exactly once, when a terminal status is observed. Dropping
/// the receiver cancels the task cooperatively at its next iteration.
pub(crate) fn watch<A>(
    api: Arc<A>,
    operation: PendingOperation,
    interval: Duration,
) -> oneshot::Receiver<()>
where
    A: ComputeApi + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(poll_until_done(api, operation, interval, done_tx));
    done_rx
}

async fn poll_until_done<A: ComputeApi>(
    api: Arc<A>,
    operation: PendingOperation,
    interval: Duration,
    done_tx: oneshot::Sender<()>,
) {
    loop {
        if done_tx.is_closed() {
            debug!(
                operation = operation.name.as_str(),
                "waiter gone; stopping boot disk poll"
            );
            return;
        }

        match api
            .get_zone_operation(&operation.project, &operation.zone, &operation.name)
            .await
        {
            Ok(status) if status.is_done() => {
                if done_tx.send(()).is_err() {
                    debug!(
                        operation = operation.name.as_str(),
                        "waiter dropped before the ready signal was observed"
                    );
                }
                return;
            }
            Ok(status) => debug!(
                operation = operation.name.as_str(),
                status = status.status.as_str(),
                "boot disk not ready yet"
            ),
            Err(err) => warn!(
                operation = operation.name.as_str(),
                error = %err,
                "boot disk status poll failed; will retry"
            ),
        }

        sleep(interval).await;
    }
}

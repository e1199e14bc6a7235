//! Blocks until a service's replacement instance runs.

use logweave_feeds::{LifecycleWatch, Phase, WatchError};
use tokio_util::sync::CancellationToken;

/// Wait until `service` is running again.
///
/// Returns [`WatchError::Cancelled`] when `cancel` fires, whether or not the
/// watch implementation itself observes the token.
pub async fn wait_for_restart(
    watch: &dyn LifecycleWatch,
    service: &str,
    cancel: &CancellationToken,
) -> Result<(), WatchError> {
    let running = |phase: Phase| phase == Phase::Running;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WatchError::Cancelled),
        result = watch.wait_until(service, &running, cancel) => result,
    }
}

// Notification loop: one correlator pass per poll interval until cancelled.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use routerctl_api::RouterApi;

use crate::correlator;
use crate::error::CoreError;
use crate::model::RouterInterface;

/// Wait, fetch, publish; repeat.
///
/// Cancellation during the wait only wakes the loop early; the token is
/// then checked and the loop returns normally. A correlator pass already
/// in flight always runs to completion.
pub(super) async fn poll_until_cancelled<A: RouterApi>(
    api: &mut A,
    cancel: &CancellationToken,
    poll_interval: Duration,
    on_update: &(dyn Fn(&[RouterInterface]) + Send + Sync),
) -> Result<(), CoreError> {
    let mut cycles: u64 = 0;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(poll_interval) => {}
        }

        if cancel.is_cancelled() {
            debug!(cycles, "notification loop cancelled");
            return Ok(());
        }

        let interfaces = correlator::fetch_interfaces(api).await?;
        cycles += 1;
        trace!(cycle = cycles, count = interfaces.len(), "publishing interface update");
        on_update(&interfaces);
    }
}

//! Background release timers

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use super::controller::Inner;
use crate::lifecycle::StopSignal;

/// Whether `runtime` can drive timers
///
/// Tokio panics when a timer is created on a runtime without the time
/// driver, so create one up front instead of inside the task.
pub(super) fn timer_available(runtime: &Handle) -> bool {
    let _enter = runtime.enter();
    std::panic::catch_unwind(|| drop(time::sleep(Duration::ZERO))).is_ok()
}

/// One-shot release: sleep, then deassert if still current
///
/// Aborted by the actuator when a later commit supersedes it.
pub(super) async fn release_after(inner: Arc<Inner>, generation: u64, delay: Duration) {
    trace!(generation, ?delay, "release timer armed");
    time::sleep(delay).await;
    inner.release_if_current(generation);
}

/// Persistent poller: check for an expired release every `interval`
pub(super) async fn poll_releases(
    inner: Arc<Inner>,
    interval: Duration,
    release_after: Duration,
    mut stop: StopSignal,
) {
    debug!(?interval, ?release_after, "release poller started");

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.wait() => break,
        }
        inner.release_if_expired(release_after);
    }

    debug!("release poller stopped");
}

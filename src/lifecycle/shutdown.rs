//! Cooperative stop signal for background timer tasks

use tokio::sync::watch;
use tracing::debug;

/// Sending half, held by the accessory
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half, moved into a background task
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopHandle {
    /// Create a stop handle and its first signal
    pub fn channel() -> (Self, StopSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, StopSignal { rx })
    }

    /// Ask every task holding a signal to stop
    pub fn stop(&self) {
        // send_replace succeeds even when every receiver is gone
        self.tx.send_replace(true);
    }
}

impl StopSignal {
    /// Wait until a stop is requested
    ///
    /// Also resolves if the handle is dropped.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            debug!("stop handle dropped");
        }
    }
}

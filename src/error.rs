//! Errors surfaced by the hardware module lifecycle

/// Failures of `init`/`deinit`
///
/// Handshake traffic never produces an error; a mismatched write simply
/// resets the recognizer.
#[derive(Debug, thiserror::Error)]
pub enum RumbleError {
    #[error("no tokio runtime available to drive the debounce timer: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),

    #[error("runtime was built without a time driver; enable_time() is required")]
    TimerUnavailable,

    #[error("debounce task failed to join: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

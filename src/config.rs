//! Configuration loading and management

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default one-shot release delay
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(200);
/// Default poller cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Default poller release threshold
pub const DEFAULT_RELEASE_AFTER: Duration = Duration::from_millis(400);

/// How a deferred motor release is timed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceStrategy {
    /// One release task per Off commit, cancelled and rescheduled by every
    /// later commit
    OneShot {
        /// Time between the Off commit and the release
        delay: Duration,
    },
    /// A task living as long as the accessory, checking for an expired
    /// release on every tick
    Poller {
        /// Tick cadence
        interval: Duration,
        /// Minimum time since the Off commit before releasing
        release_after: Duration,
    },
}

impl DebounceStrategy {
    /// Nominal time between an Off commit and the release
    pub fn release_delay(&self) -> Duration {
        match self {
            DebounceStrategy::OneShot { delay } => *delay,
            DebounceStrategy::Poller { release_after, .. } => *release_after,
        }
    }
}

impl Default for DebounceStrategy {
    fn default() -> Self {
        Self::OneShot {
            delay: DEFAULT_RELEASE_DELAY,
        }
    }
}

/// Address check applied to the Idle-state `0x0008` shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleShortcut {
    /// Any address takes the shortcut, matching traffic recognized by
    /// existing cartridges
    #[default]
    AnyAddress,
    /// Only the rumble data address takes the shortcut
    DataAddressOnly,
}

/// Accessory configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Debounce timing for motor release
    pub debounce: DebounceStrategy,

    /// Idle-state shortcut behaviour
    pub idle_shortcut: IdleShortcut,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => {
                    let ms: u64 = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{key} must be a number of milliseconds"))?;
                    Ok(Duration::from_millis(ms))
                }
                None => Ok(default),
            }
        };

        let debounce = match lookup("CHIS_RUMBLE_DEBOUNCE").as_deref().map(str::trim) {
            None | Some("oneshot") => DebounceStrategy::OneShot {
                delay: millis("CHIS_RUMBLE_DELAY_MS", DEFAULT_RELEASE_DELAY)?,
            },
            Some("poller") => {
                let interval = millis("CHIS_RUMBLE_POLL_MS", DEFAULT_POLL_INTERVAL)?;
                if interval.is_zero() {
                    bail!("CHIS_RUMBLE_POLL_MS must be greater than zero");
                }
                DebounceStrategy::Poller {
                    interval,
                    release_after: millis("CHIS_RUMBLE_RELEASE_MS", DEFAULT_RELEASE_AFTER)?,
                }
            }
            Some(other) => bail!("unknown CHIS_RUMBLE_DEBOUNCE strategy: {other:?}"),
        };

        let idle_shortcut = match lookup("CHIS_RUMBLE_STRICT_IDLE").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => IdleShortcut::AnyAddress,
            Some("1") | Some("true") => IdleShortcut::DataAddressOnly,
            Some(other) => bail!("CHIS_RUMBLE_STRICT_IDLE must be a boolean, got {other:?}"),
        };

        Ok(Self {
            debounce,
            idle_shortcut,
        })
    }
}

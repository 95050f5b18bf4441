//! Events published by the actuator
//!
//! Lets the host (a frontend forwarding rumble to a gamepad, a recorder,
//! tests) observe what the motor line is doing without owning the GPIO sink.

use serde::{Deserialize, Serialize};

/// Events emitted whenever the motor line changes or a release is planned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RumbleEvent {
    /// Motor latched on by an On commit
    MotorEngaged,

    /// Off commit recorded; the motor will be released after the debounce delay
    ReleaseScheduled {
        /// Debounce delay in milliseconds
        delay_ms: u64,
    },

    /// A pending release was cancelled by a later On commit
    ReleaseSuperseded,

    /// Motor line deasserted
    MotorReleased {
        /// Milliseconds the motor was held on
        held_ms: u64,
    },
}

impl std::fmt::Display for RumbleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RumbleEvent::MotorEngaged => write!(f, "MOTOR_ENGAGED"),
            RumbleEvent::ReleaseScheduled { delay_ms } => {
                write!(f, "RELEASE_SCHEDULED ({}ms)", delay_ms)
            }
            RumbleEvent::ReleaseSuperseded => write!(f, "RELEASE_SUPERSEDED"),
            RumbleEvent::MotorReleased { held_ms } => {
                write!(f, "MOTOR_RELEASED ({}ms)", held_ms)
            }
        }
    }
}

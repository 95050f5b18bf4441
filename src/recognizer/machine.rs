//! Core handshake state machine
//!
//! One call to [`Recognizer::step`] per bus write. Writes that do not match
//! the expected address/value for the current state reset to Idle; the
//! resetting write itself is not re-evaluated.

use tracing::{debug, trace};

use super::handshake::{self, addresses};
use crate::config::IdleShortcut;

/// Position in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognizerState {
    /// Waiting for the first unlock write (or the Off shortcut)
    #[default]
    Idle,
    /// First unlock write seen
    Step1,
    /// Second unlock write seen
    Step2,
    /// Third unlock write seen
    Step3,
    /// Preamble complete, waiting for rumble data
    Step4,
    /// Rumble data accepted, waiting for the commit write
    Step5,
    /// Committed; accepts motor commands until an unrelated write
    Step6,
}

impl std::fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizerState::Idle => write!(f, "Idle"),
            RecognizerState::Step1 => write!(f, "Step1"),
            RecognizerState::Step2 => write!(f, "Step2"),
            RecognizerState::Step3 => write!(f, "Step3"),
            RecognizerState::Step4 => write!(f, "Step4"),
            RecognizerState::Step5 => write!(f, "Step5"),
            RecognizerState::Step6 => write!(f, "Step6"),
        }
    }
}

/// Definite motor command forwarded to the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Off,
    On,
}

/// Motor command staged by the handshake, not yet necessarily committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingIntent {
    /// Nothing staged since the accessory was inserted
    #[default]
    Unset,
    Off,
    On,
}

impl PendingIntent {
    /// The committable intent, if one has been staged
    pub fn intent(self) -> Option<Intent> {
        match self {
            PendingIntent::Unset => None,
            PendingIntent::Off => Some(Intent::Off),
            PendingIntent::On => Some(Intent::On),
        }
    }
}

impl From<Intent> for PendingIntent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Off => PendingIntent::Off,
            Intent::On => PendingIntent::On,
        }
    }
}

/// Handshake recognizer
///
/// Owned by the foreground (bus) context; never blocks.
#[derive(Debug, Clone, Default)]
pub struct Recognizer {
    state: RecognizerState,
    pending: PendingIntent,
    shortcut: IdleShortcut,
}

impl Recognizer {
    /// Create a recognizer in the Idle state with nothing staged
    pub fn new(shortcut: IdleShortcut) -> Self {
        Self {
            state: RecognizerState::Idle,
            pending: PendingIntent::Unset,
            shortcut,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecognizerState {
        self.state
    }

    /// Get the staged intent
    pub fn pending(&self) -> PendingIntent {
        self.pending
    }

    /// Feed one bus write
    ///
    /// `value` is truncated to 16 bits regardless of the write width. Returns
    /// the intent to commit when the write completes a commit step.
    pub fn step(&mut self, address: u32, value: u32) -> Option<Intent> {
        let value = value as u16;
        let old_state = self.state;
        let (next, commit) = self.compute_next(address, value);

        if next != old_state {
            if next == RecognizerState::Idle {
                trace!(
                    from = %old_state,
                    address = format_args!("{address:#010X}"),
                    value = format_args!("{value:#06X}"),
                    "handshake reset"
                );
            } else {
                trace!(from = %old_state, to = %next, "handshake step");
            }
        }
        self.state = next;

        if let Some(intent) = commit {
            debug!(?intent, state = %self.state, "handshake commit");
        }
        commit
    }

    fn compute_next(&mut self, address: u32, value: u16) -> (RecognizerState, Option<Intent>) {
        use RecognizerState::*;

        let low = value as u8;
        let state = self.state;
        let next = match state {
            Idle => return (self.compute_from_idle(address, value), None),
            Step1 if address == addresses::UNLOCK_2 && value == handshake::UNLOCK_B => Step2,
            Step2 if address == addresses::UNLOCK_3 && value == handshake::UNLOCK_A => Step3,
            Step3 if address == addresses::UNLOCK_4 && value == handshake::UNLOCK_B => Step4,
            Step4
                if address == addresses::RUMBLE_DATA
                    && (value == handshake::DATA_WIDE || handshake::DATA_LOW.contains(&low)) =>
            {
                Step5
            }
            Step5 if address == addresses::COMMIT && value == handshake::UNLOCK_B => {
                return (Step6, self.pending.intent());
            }
            Step6 if address == addresses::MOTOR_COMMAND => {
                let intent = if low == handshake::MOTOR_ON {
                    Intent::On
                } else {
                    Intent::Off
                };
                self.pending = intent.into();
                return (Step6, Some(intent));
            }
            _ => Idle,
        };
        (next, None)
    }

    fn compute_from_idle(&mut self, address: u32, value: u16) -> RecognizerState {
        if address == addresses::UNLOCK_1 && value == handshake::UNLOCK_A {
            RecognizerState::Step1
        } else if value == handshake::SHORTCUT_OFF && self.shortcut_address_matches(address) {
            self.pending = PendingIntent::Off;
            RecognizerState::Step5
        } else {
            RecognizerState::Idle
        }
    }

    fn shortcut_address_matches(&self, address: u32) -> bool {
        match self.shortcut {
            IdleShortcut::AnyAddress => true,
            IdleShortcut::DataAddressOnly => address == addresses::RUMBLE_DATA,
        }
    }
}

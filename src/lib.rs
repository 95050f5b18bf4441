//! chis-rumble: rumble accessory for a handheld console emulator
//!
//! Models the rumble add-on that sits in the cartridge slot:
//! - Handshake recognizer for the undocumented unlock/commit write sequence
//! - Motor actuator driving the cartridge GPIO port
//! - Debounced release on a background tokio task (one-shot or poller)
//!
//! The CPU, memory map, and GPIO block belong to the host emulator, which
//! routes cartridge-space writes into [`ChisRumble`].

pub mod actuator;
pub mod config;
pub mod error;
pub mod events;
pub mod gpio;
pub mod hardware;
pub mod lifecycle;
pub mod recognizer;

pub use config::{Config, DebounceStrategy, IdleShortcut};
pub use error::RumbleError;
pub use events::RumbleEvent;
pub use gpio::{GpioSink, Pin};
pub use hardware::ChisRumble;
pub use recognizer::{Intent, PendingIntent, RecognizerState};

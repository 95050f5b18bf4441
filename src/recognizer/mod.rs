//! Handshake recognizer for the rumble command protocol
//!
//! Watches cartridge-space writes and reports a commit whenever the fixed
//! unlock sequence reaches one of its data-carrying steps:
//! - Idle → Step1..Step4: unlock preamble
//! - Step4 → Step5: rumble data write
//! - Step5 → Step6: commit of the pending intent
//! - Step6: motor command, repeated until an unrelated write resets

mod handshake;
mod machine;

pub use handshake::addresses;
pub use machine::{Intent, PendingIntent, Recognizer, RecognizerState};

//! Cartridge GPIO port seen by the rumble accessory
//!
//! The pin implementation belongs to the surrounding emulator; this module
//! only names the registers the accessory drives and the sink trait it
//! writes through.

mod pins;
mod sink;

pub use pins::{values, Pin};
pub use sink::GpioSink;

#[cfg(test)]
pub(crate) use sink::testing;

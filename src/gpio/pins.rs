//! GPIO register definitions for the rumble motor line

use std::fmt;

/// Register values written by the accessory
pub mod values {
    /// Data register: motor line high
    pub const MOTOR_ON: u16 = 8;
    /// Data register: motor line low
    pub const MOTOR_OFF: u16 = 0;
    /// Direction register: motor line configured as output
    pub const MOTOR_OUTPUT: u16 = 8;
    /// Control register: port readable and writable
    pub const PORT_ENABLED: u16 = 1;
}

/// Cartridge GPIO registers, identified by their offset in ROM space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Pin {
    /// Pin levels (motor on bit 3)
    Data = 0xC4,
    /// Pin directions
    Direction = 0xC6,
    /// Port enable
    Control = 0xC8,
}

impl Pin {
    /// Register offset as the emulator's GPIO block addresses it
    pub fn offset(self) -> u32 {
        self as u32
    }

    /// The latch registers that must be set before the data line has effect
    pub fn latches() -> [(Pin, u16); 2] {
        [
            (Pin::Control, values::PORT_ENABLED),
            (Pin::Direction, values::MOTOR_OUTPUT),
        ]
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Data => write!(f, "DATA(0x{:02X})", self.offset()),
            Pin::Direction => write!(f, "DIRECTION(0x{:02X})", self.offset()),
            Pin::Control => write!(f, "CONTROL(0x{:02X})", self.offset()),
        }
    }
}

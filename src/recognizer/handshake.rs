//! Bus addresses and values of the unlock sequence

/// Cartridge-space addresses written during the handshake
pub mod addresses {
    /// First preamble write (`0xD200`)
    pub const UNLOCK_1: u32 = 0x09FE_0000;
    /// Second preamble write (`0x1500`)
    pub const UNLOCK_2: u32 = 0x0800_0000;
    /// Third preamble write (`0xD200`)
    pub const UNLOCK_3: u32 = 0x0802_0000;
    /// Fourth preamble write (`0x1500`)
    pub const UNLOCK_4: u32 = 0x0804_0000;
    /// Rumble data register
    pub const RUMBLE_DATA: u32 = 0x09E2_0000;
    /// Commit write (`0x1500`)
    pub const COMMIT: u32 = 0x09FC_0000;
    /// Motor command register (low byte 2 is on)
    pub const MOTOR_COMMAND: u32 = 0x0800_1000;
}

pub(super) const UNLOCK_A: u16 = 0xD200;
pub(super) const UNLOCK_B: u16 = 0x1500;

/// Idle-state value that skips the preamble and stages an Off
pub(super) const SHORTCUT_OFF: u16 = 0x0008;

/// Full-width data value accepted at Step4
pub(super) const DATA_WIDE: u16 = 0x00F1;
/// Low bytes accepted at Step4
pub(super) const DATA_LOW: [u8; 2] = [0x07, 0x08];

/// Motor command low byte that turns the motor on
pub(super) const MOTOR_ON: u8 = 0x02;

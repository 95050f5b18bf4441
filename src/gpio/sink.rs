//! Pin-write primitive provided by the emulator

use super::Pin;

/// Destination for GPIO register writes
///
/// Implementations are synchronous and non-blocking. The actuator only calls
/// `write` while holding its lock, so an implementation needs no locking of
/// its own, but it must be `Send` because delayed releases are written from
/// the timer task.
pub trait GpioSink: Send {
    fn write(&mut self, pin: Pin, value: u16);
}

impl<F> GpioSink for F
where
    F: FnMut(Pin, u16) + Send,
{
    fn write(&mut self, pin: Pin, value: u16) {
        self(pin, value)
    }
}

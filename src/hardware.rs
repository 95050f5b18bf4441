//! The rumble accessory as seen by the cartridge bus
//!
//! The emulator's cartridge dispatch calls `init` when the accessory is
//! inserted, forwards every cartridge-space write to `write32/16/8`, and
//! calls `deinit` on removal.

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::info;

use crate::actuator::Actuator;
use crate::config::Config;
use crate::error::RumbleError;
use crate::events::RumbleEvent;
use crate::gpio::GpioSink;
use crate::recognizer::{Recognizer, RecognizerState};

/// Rumble accessory hardware instance
pub struct ChisRumble {
    recognizer: Recognizer,
    actuator: Actuator,
}

impl ChisRumble {
    /// Insert the accessory
    ///
    /// Must be called from within a tokio runtime with its time driver
    /// enabled; the debounce timer runs on it for the life of the accessory.
    pub fn init<G>(gpio: G, config: Config) -> Result<Self, RumbleError>
    where
        G: GpioSink + 'static,
    {
        let runtime = Handle::try_current()?;
        Self::init_on(gpio, config, runtime)
    }

    /// Insert the accessory, running its timer on an explicit runtime
    pub fn init_on<G>(gpio: G, config: Config, runtime: Handle) -> Result<Self, RumbleError>
    where
        G: GpioSink + 'static,
    {
        let actuator = Actuator::start(Box::new(gpio), config.debounce, runtime)?;

        info!(
            debounce = ?config.debounce,
            idle_shortcut = ?config.idle_shortcut,
            "rumble accessory inserted"
        );

        Ok(Self {
            recognizer: Recognizer::new(config.idle_shortcut),
            actuator,
        })
    }

    /// Remove the accessory
    ///
    /// Returns once the debounce timer has stopped and been joined.
    pub async fn deinit(self) -> Result<(), RumbleError> {
        self.actuator.shutdown().await?;
        info!("rumble accessory removed");
        Ok(())
    }

    /// 32-bit cartridge write
    pub fn write32(&mut self, address: u32, value: u32) {
        if let Some(intent) = self.recognizer.step(address, value) {
            self.actuator.commit(intent);
        }
    }

    /// 16-bit cartridge write
    pub fn write16(&mut self, address: u32, value: u16) {
        self.write32(address, value.into());
    }

    /// 8-bit cartridge write
    pub fn write8(&mut self, address: u32, value: u8) {
        self.write32(address, value.into());
    }

    /// Current handshake position
    pub fn state(&self) -> RecognizerState {
        self.recognizer.state()
    }

    /// Whether the motor line is asserted
    pub fn motor_engaged(&self) -> bool {
        self.actuator.motor_engaged()
    }

    /// Subscribe to motor events
    pub fn subscribe(&self) -> broadcast::Receiver<RumbleEvent> {
        self.actuator.subscribe()
    }
}

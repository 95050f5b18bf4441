//! Accessory lifecycle helpers

mod shutdown;

pub use shutdown::{StopHandle, StopSignal};

//! Motor actuator with debounced release
//!
//! On commits latch the motor immediately. Off commits only record a
//! release; a background task deasserts the motor once the debounce delay
//! passes without a newer commit.

mod controller;
mod debounce;

pub use controller::Actuator;

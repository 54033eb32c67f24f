//! Configuration module for stepper-pulse.
//!
//! Provides types for loading and validating timer and channel configurations
//! from TOML files (with `std` feature) or pre-parsed data.

mod channel;
#[cfg(feature = "std")]
mod loader;
mod system;
mod timer;
pub mod units;
mod validation;

pub use channel::ChannelConfig;
pub use system::EngineConfig;
pub use timer::TimerConfig;
pub use validation::validate_config;
pub(crate) use validation::validate_timer;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{CounterBits, StepsPerSec, StepsPerSecSquared};

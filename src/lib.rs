//! # stepper-pulse
//!
//! Interrupt-driven step/direction pulse generation for stepper drivers, with
//! trapezoidal ramps, on a single shared hardware timer.
//!
//! ## Features
//!
//! - **Hardware-timed edges**: step edges come from the timer's output-compare
//!   action, so interrupt latency never shifts them
//! - **Long intervals**: delays beyond the counter width are chained from
//!   coarse chunks and a fine remainder
//! - **Time-based ramps**: speed is recomputed once per counter overflow from
//!   elapsed time and remaining distance
//! - **embedded-hal 1.0**: `OutputPin` for direction and enable lines
//! - **no_std compatible**: core library works without the standard library
//! - **Configuration-driven**: timer and channels from TOML files (`std`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_pulse::{Engine, TimerConfig};
//!
//! let engine = Engine::new(timer, clock, TimerConfig::default())?;
//! engine.init();
//!
//! let x = engine.channel_a(dir_pin)?;
//! x.set_enable_pin(enable_pin)?;
//! x.set_auto_enable(true);
//! x.set_dynamics(1000.0, 2000.0)?;
//! x.move_by(500)?;
//!
//! // from the interrupt vectors
//! engine.on_overflow();
//! engine.on_compare_match(CompareUnit::A);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and the host simulator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod axis;
pub mod config;
pub mod error;
pub mod hal;
pub mod motion;

// Re-exports for ergonomic API
pub use axis::{Channel, Engine, StartOutcome};
pub use config::{validate_config, ChannelConfig, EngineConfig, TimerConfig};
pub use error::{Error, Result};
pub use hal::{CompareTimer, CompareUnit, MillisClock, OutputAction};
pub use motion::{Direction, EncodedInterval, IntervalEncoder, MotionPhase, RampGenerator};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{CounterBits, StepsPerSec, StepsPerSecSquared};

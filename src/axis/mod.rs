//! Axis module for stepper-pulse.
//!
//! Provides the engine that owns the pulse timer, the per-channel state it
//! shares with the interrupt handlers, and the channel handle used by the
//! application.

mod channel;
mod engine;
mod shared;

pub use channel::{Channel, StartOutcome};
pub use engine::{Engine, Heartbeat};

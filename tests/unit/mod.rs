//! Unit test harness for stepper-pulse.
//!
//! Configuration tests that go through the public TOML surface.

mod config_parsing;
mod config_validation;

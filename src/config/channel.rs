//! Channel configuration from TOML.

use serde::Deserialize;

use crate::hal::CompareUnit;

use super::units::{StepsPerSec, StepsPerSecSquared};

/// Configuration of one pulse channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Index of the compare unit driving the step output (0 = A, 1 = B).
    pub unit: u8,

    /// Cruise speed in steps per second.
    pub max_speed: StepsPerSec,

    /// Acceleration in steps per second squared.
    pub acceleration: StepsPerSecSquared,

    /// Assert the enable line only while stepping.
    #[serde(default)]
    pub auto_enable: bool,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,
}

impl ChannelConfig {
    /// Compare unit this channel is bound to.
    #[inline]
    pub fn compare_unit(&self) -> CompareUnit {
        CompareUnit::new(self.unit)
    }

    /// Steps of a full ramp up and back down at these dynamics.
    pub fn min_ramp_steps(&self) -> u32 {
        libm::roundf(self.max_speed.0 * self.max_speed.0 / self.acceleration.0) as u32
    }
}

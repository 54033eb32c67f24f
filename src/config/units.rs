//! Unit types for physical quantities.
//!
//! Keeps step rates, accelerations and counter widths apart at compile time.

use serde::Deserialize;

use crate::error::ConfigError;

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Step acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub f32);

impl StepsPerSecSquared {
    /// Create a new StepsPerSecSquared value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Width of the hardware counter in bits (8..=32).
///
/// Validated at construction; the coarse chunk is `2^(bits-2)` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterBits(u8);

impl CounterBits {
    /// 8-bit counter.
    pub const BITS_8: Self = Self(8);
    /// 16-bit counter (reference design).
    pub const BITS_16: Self = Self(16);
    /// 32-bit counter.
    pub const BITS_32: Self = Self(32);

    /// Create a new CounterBits value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCounterBits` outside 8..=32.
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if Self::is_valid(value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidCounterBits(value))
        }
    }

    /// Get the raw width.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Ticks in one full counter wrap.
    #[inline]
    pub const fn range(self) -> u64 {
        1u64 << self.0
    }

    /// Check if a width is supported.
    #[inline]
    pub fn is_valid(value: u8) -> bool {
        (8..=32).contains(&value)
    }
}

impl Default for CounterBits {
    fn default() -> Self {
        Self::BITS_16
    }
}

impl TryFrom<u8> for CounterBits {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for CounterBits {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u8::deserialize(deserializer)?;
        CounterBits::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

//! Error types for stepper-pulse.
//!
//! Provides unified error handling across configuration, channel control and
//! ramp computation. Interrupt paths never produce errors; everything here is
//! reported to the application thread.

use core::fmt;

use crate::hal::CompareUnit;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-pulse operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Channel operation error
    Channel(ChannelError),
    /// Ramp parameter error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Timer clock frequency must be > 0
    InvalidClockFrequency(u32),
    /// Counter width outside the supported 8..=32 bits
    InvalidCounterBits(u8),
    /// Clock divider must be >= 1
    InvalidClockDivider(u16),
    /// Settle delay must be non-zero and below one counter wrap
    InvalidSettleTicks(u32),
    /// Channel name not found in configuration
    ChannelNotFound(heapless::String<32>),
    /// Two channels bound to the same compare unit
    DuplicateCompareUnit(u8),
    /// Channel bound to a compare unit the timer does not have
    InvalidCompareUnit(u8),
    /// Compare unit count is zero or exceeds what the timer provides
    InvalidCompareUnits(u8),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Channel operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// Pin operation failed
    PinError,
    /// Channel is stepping; the request is only valid while idle
    Busy,
    /// Dynamics were never configured for this channel
    NotConfigured,
    /// Compare unit already bound to another channel
    UnitInUse(CompareUnit),
    /// All channel slots of the engine are taken
    NoFreeSlot,
    /// Compare unit index beyond the timer's units
    InvalidUnit(CompareUnit),
}

/// Ramp parameter errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Acceleration must be finite and > 0
    InvalidAcceleration(f32),
    /// Speed must be finite and > 0
    InvalidSpeed(f32),
    /// Speed is too slow for its step interval to be encoded
    SpeedBelowMinimum {
        /// Requested speed in steps/s
        requested: f32,
        /// Slowest encodable speed in steps/s
        minimum: f32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Channel(e) => write!(f, "Channel error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidClockFrequency(v) => {
                write!(f, "Invalid clock frequency: {} Hz. Must be > 0", v)
            }
            ConfigError::InvalidCounterBits(v) => {
                write!(f, "Invalid counter width: {} bits. Must be 8-32", v)
            }
            ConfigError::InvalidClockDivider(v) => {
                write!(f, "Invalid clock divider: {}. Must be >= 1", v)
            }
            ConfigError::InvalidSettleTicks(v) => {
                write!(f, "Invalid settle delay: {} ticks. Must fit one counter wrap", v)
            }
            ConfigError::ChannelNotFound(name) => write!(f, "Channel '{}' not found", name),
            ConfigError::DuplicateCompareUnit(unit) => {
                write!(f, "Compare unit {} is bound to more than one channel", unit)
            }
            ConfigError::InvalidCompareUnit(unit) => {
                write!(f, "Compare unit {} does not exist on this timer", unit)
            }
            ConfigError::InvalidCompareUnits(v) => {
                write!(f, "Invalid compare unit count: {}", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::PinError => write!(f, "GPIO pin operation failed"),
            ChannelError::Busy => write!(f, "Channel is running a move"),
            ChannelError::NotConfigured => write!(f, "Channel dynamics not configured"),
            ChannelError::UnitInUse(unit) => {
                write!(f, "Compare unit {} already bound to a channel", unit.index())
            }
            ChannelError::NoFreeSlot => write!(f, "No free channel slot"),
            ChannelError::InvalidUnit(unit) => {
                write!(f, "Compare unit {} does not exist on this timer", unit.index())
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            MotionError::InvalidSpeed(v) => write!(f, "Invalid speed: {}. Must be > 0", v),
            MotionError::SpeedBelowMinimum { requested, minimum } => {
                write!(f, "Speed {} is below the encodable minimum {}", requested, minimum)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

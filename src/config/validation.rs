//! Configuration validation.

use crate::error::{ConfigError, Error, MotionError, Result};

use super::{ChannelConfig, EngineConfig, TimerConfig};

/// Validate an engine configuration.
///
/// Checks:
/// - Timer clock and divider are usable and the settle delay fits the counter
/// - Channel speed and acceleration are positive and the speed is encodable
/// - Every channel names a compare unit the timer has, and no two share one
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    validate_timer(&config.timer)?;

    let minimum_speed = config.timer.minimum_speed();
    for (_name, channel) in config.channels.iter() {
        if channel.unit >= config.timer.compare_units {
            return Err(Error::Config(ConfigError::InvalidCompareUnit(channel.unit)));
        }
        validate_channel(channel, minimum_speed)?;
    }

    let mut seen: heapless::Vec<u8, 4> = heapless::Vec::new();
    for (_name, channel) in config.channels.iter() {
        if seen.contains(&channel.unit) {
            return Err(Error::Config(ConfigError::DuplicateCompareUnit(channel.unit)));
        }
        // capacity matches the channel map
        let _ = seen.push(channel.unit);
    }

    Ok(())
}

pub(crate) fn validate_timer(timer: &TimerConfig) -> Result<()> {
    if timer.clock_hz == 0 {
        return Err(Error::Config(ConfigError::InvalidClockFrequency(timer.clock_hz)));
    }

    if timer.clock_divider == 0 || timer.tick_hz() == 0 {
        return Err(Error::Config(ConfigError::InvalidClockDivider(timer.clock_divider)));
    }

    if timer.compare_units == 0 {
        return Err(Error::Config(ConfigError::InvalidCompareUnits(0)));
    }

    // The settle delay is a single register advance
    if timer.settle_ticks == 0 || u64::from(timer.settle_ticks) >= timer.counter_bits.range() {
        return Err(Error::Config(ConfigError::InvalidSettleTicks(timer.settle_ticks)));
    }

    Ok(())
}

fn validate_channel(channel: &ChannelConfig, minimum_speed: f32) -> Result<()> {
    let accel = channel.acceleration.0;
    if !accel.is_finite() || accel <= 0.0 {
        return Err(Error::Motion(MotionError::InvalidAcceleration(accel)));
    }

    let speed = channel.max_speed.0;
    if !speed.is_finite() || speed <= 0.0 {
        return Err(Error::Motion(MotionError::InvalidSpeed(speed)));
    }

    if speed < minimum_speed {
        return Err(Error::Motion(MotionError::SpeedBelowMinimum {
            requested: speed,
            minimum: minimum_speed,
        }));
    }

    Ok(())
}

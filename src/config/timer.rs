//! Timer configuration.

use serde::Deserialize;

use crate::motion::IntervalEncoder;

use super::units::CounterBits;

/// Shared pulse timer settings.
///
/// Defaults describe the reference design: 16 MHz, 16-bit counter, divider 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Timer input clock in Hz.
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,

    /// Counter width.
    #[serde(default)]
    pub counter_bits: CounterBits,

    /// Counter clock divider.
    #[serde(default = "default_clock_divider")]
    pub clock_divider: u16,

    /// Output-compare units available to channels.
    #[serde(default = "default_compare_units")]
    pub compare_units: u8,

    /// Delay between `start()` and the first step edge, letting the driver's
    /// enable line settle.
    #[serde(default = "default_settle_ticks")]
    pub settle_ticks: u32,

    /// Interval used until the first ramp update has run.
    #[serde(default = "default_start_interval_ticks")]
    pub start_interval_ticks: u32,
}

fn default_clock_hz() -> u32 {
    16_000_000
}

fn default_clock_divider() -> u16 {
    1
}

fn default_compare_units() -> u8 {
    2
}

fn default_settle_ticks() -> u32 {
    16_000
}

fn default_start_interval_ticks() -> u32 {
    60_000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            clock_hz: default_clock_hz(),
            counter_bits: CounterBits::default(),
            clock_divider: default_clock_divider(),
            compare_units: default_compare_units(),
            settle_ticks: default_settle_ticks(),
            start_interval_ticks: default_start_interval_ticks(),
        }
    }
}

impl TimerConfig {
    /// Counter ticks per second.
    #[inline]
    pub fn tick_hz(&self) -> u32 {
        self.clock_hz / u32::from(self.clock_divider.max(1))
    }

    /// Interval encoder matching the counter width.
    #[inline]
    pub fn encoder(&self) -> IntervalEncoder {
        IntervalEncoder::new(self.counter_bits.value())
    }

    /// Slowest encodable step rate, in steps/s.
    #[inline]
    pub fn minimum_speed(&self) -> f32 {
        self.encoder().minimum_speed(self.tick_hz())
    }

    /// Time between overflow interrupts, in ms.
    #[inline]
    pub fn overflow_period_ms(&self) -> f32 {
        self.counter_bits.range() as f32 * 1000.0 / self.tick_hz() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_timing() {
        let config = TimerConfig::default();
        assert_eq!(config.tick_hz(), 16_000_000);
        assert_eq!(config.encoder().chunk(), 16384);
        // 65536 / 16 MHz
        assert!((config.overflow_period_ms() - 4.096).abs() < 1e-3);
    }

    #[test]
    fn test_divider_scales_ticks() {
        let config = TimerConfig {
            clock_divider: 8,
            ..TimerConfig::default()
        };
        assert_eq!(config.tick_hz(), 2_000_000);
        assert!(config.minimum_speed() < TimerConfig::default().minimum_speed());
    }
}

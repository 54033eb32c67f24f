//! Unit tests for configuration validation.

use stepper_pulse::config::{parse_config, validate_config, EngineConfig};
use stepper_pulse::error::{ConfigError, Error, MotionError};

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let toml_str = r#"
[channels.x]
unit = 0
max_speed = 1000.0
acceleration = 2000.0

[channels.y]
unit = 1
max_speed = 1000.0
acceleration = 2000.0
"#;

    let config: EngineConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails when two channels share a compare unit.
#[test]
fn test_shared_compare_unit() {
    let toml_str = r#"
[channels.x]
unit = 1
max_speed = 1000.0
acceleration = 2000.0

[channels.y]
unit = 1
max_speed = 1000.0
acceleration = 2000.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::DuplicateCompareUnit(1)))
    ));
}

/// Test validation fails for a non-positive acceleration.
#[test]
fn test_zero_acceleration() {
    let toml_str = r#"
[channels.x]
unit = 0
max_speed = 1000.0
acceleration = 0.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Motion(MotionError::InvalidAcceleration(_)))
    ));
}

/// Test validation fails for a speed too slow to encode.
#[test]
fn test_speed_below_minimum() {
    let toml_str = r#"
[channels.x]
unit = 0
max_speed = 0.001
acceleration = 10.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Motion(MotionError::SpeedBelowMinimum { .. }))
    ));
}

/// Test that a slower counter clock lowers the minimum speed.
#[test]
fn test_divider_admits_slower_speeds() {
    let toml_str = r#"
[timer]
clock_divider = 64

[channels.x]
unit = 0
max_speed = 0.001
acceleration = 10.0
"#;

    // 250 kHz / ~1.07e9 ticks is about 0.00023 steps/s
    assert!(parse_config(toml_str).is_ok());
}

/// Test validation fails for a zero clock divider.
#[test]
fn test_zero_divider() {
    let toml_str = r#"
[timer]
clock_divider = 0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidClockDivider(0)))
    ));
}

/// Test validation fails for a settle delay longer than a counter wrap.
#[test]
fn test_settle_longer_than_counter() {
    let toml_str = r#"
[timer]
counter_bits = 8
settle_ticks = 16000
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidSettleTicks(16000)))
    ));
}

/// Test validation fails when a channel names a compare unit the timer lacks.
#[test]
fn test_compare_unit_out_of_range() {
    let toml_str = r#"
[channels.x]
unit = 7
max_speed = 1000.0
acceleration = 2000.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidCompareUnit(7)))
    ));

    let widened = format!("[timer]\ncompare_units = 8\n{}", toml_str);
    let config = parse_config(&widened).expect("unit 7 exists on an 8-unit timer");
    assert_eq!(config.timer.compare_units, 8);
}

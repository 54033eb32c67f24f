//! Unit tests for TOML configuration parsing.

use stepper_pulse::config::{load_config, EngineConfig};
use stepper_pulse::hal::CompareUnit;

/// Test parsing a full two-channel configuration.
#[test]
fn test_parse_engine_config() {
    let toml_str = r#"
[timer]
clock_hz = 16000000
counter_bits = 16
clock_divider = 8
settle_ticks = 2000
start_interval_ticks = 40000

[channels.x]
unit = 0
max_speed = 1000.0
acceleration = 2000.0
auto_enable = true

[channels.y]
unit = 1
max_speed = 400.0
acceleration = 800.0
invert_direction = true
"#;

    let config: EngineConfig = toml::from_str(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.timer.clock_divider, 8);
    assert_eq!(config.timer.tick_hz(), 2_000_000);
    assert_eq!(config.timer.settle_ticks, 2000);
    assert_eq!(config.timer.start_interval_ticks, 40_000);

    let x = config.channel("x").expect("Channel not found");
    assert_eq!(x.compare_unit(), CompareUnit::A);
    assert_eq!(x.max_speed.0, 1000.0);
    assert_eq!(x.acceleration.0, 2000.0);
    assert!(x.auto_enable);
    assert!(!x.invert_direction);

    let y = config.channel("y").expect("Channel not found");
    assert_eq!(y.compare_unit(), CompareUnit::B);
    assert!(y.invert_direction);
}

/// Test that an omitted timer table falls back to the reference design.
#[test]
fn test_timer_defaults() {
    let toml_str = r#"
[channels.x]
unit = 0
max_speed = 500.0
acceleration = 1000.0
"#;

    let config: EngineConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert_eq!(config.timer.clock_hz, 16_000_000);
    assert_eq!(config.timer.counter_bits.value(), 16);
    assert_eq!(config.timer.clock_divider, 1);
    assert_eq!(config.timer.settle_ticks, 16_000);
    assert_eq!(config.timer.start_interval_ticks, 60_000);
}

/// Test that channel names keep their file order.
#[test]
fn test_channel_names() {
    let toml_str = r#"
[channels.feed]
unit = 1
max_speed = 500.0
acceleration = 1000.0

[channels.spindle]
unit = 0
max_speed = 500.0
acceleration = 1000.0
"#;

    let config: EngineConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let names: Vec<&str> = config.channel_names().collect();
    assert_eq!(names, vec!["feed", "spindle"]);
}

/// Test that a missing required field fails to parse.
#[test]
fn test_missing_acceleration() {
    let toml_str = r#"
[channels.x]
unit = 0
max_speed = 500.0
"#;

    let result: Result<EngineConfig, _> = toml::from_str(toml_str);
    assert!(result.is_err());
}

/// Test that counter widths outside 8..=32 are rejected while parsing.
#[test]
fn test_invalid_counter_bits() {
    let toml_str = r#"
[timer]
counter_bits = 4
"#;

    let result: Result<EngineConfig, _> = toml::from_str(toml_str);
    assert!(result.is_err());
}

/// Test loading a configuration file from disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join("stepper_pulse_load_test.toml");
    std::fs::write(
        &path,
        r#"
[channels.z]
unit = 0
max_speed = 800.0
acceleration = 1600.0
"#,
    )
    .expect("Failed to write temp file");

    let config = load_config(&path).expect("Failed to load config");
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.channel("z").unwrap().min_ramp_steps(), 400);
}

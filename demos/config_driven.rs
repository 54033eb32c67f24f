//! Example: Configuration-driven channel setup.
//!
//! This example demonstrates how to:
//! - Parse and validate timer and channel settings from TOML
//! - Claim channels from the engine by configured name
//! - Run a move on each channel in the host simulator
//!
//! Run with: `cargo run --example config_driven --features std`

use stepper_pulse::error::Result;
use stepper_pulse::hal::sim::{SimEvent, SimPin, SimTimer};
use stepper_pulse::{parse_config, Engine};

const CONFIG_TOML: &str = r#"
[timer]
clock_hz = 16000000
counter_bits = 16
clock_divider = 1
settle_ticks = 16000
start_interval_ticks = 60000

[channels.pan]
unit = 0
max_speed = 1600.0
acceleration = 3200.0
auto_enable = true

[channels.tilt]
unit = 1
max_speed = 600.0
acceleration = 900.0
invert_direction = true
"#;

fn main() -> Result<()> {
    println!("=== Configuration-Driven Example ===\n");

    let config = parse_config(CONFIG_TOML)?;
    println!("Timer: {} Hz / {}", config.timer.clock_hz, config.timer.clock_divider);
    for name in config.channel_names() {
        let Some(channel) = config.channel(name) else {
            continue;
        };
        println!(
            "  {}: unit {}, {} steps/s, {} steps/s², full ramp {} steps",
            name,
            channel.unit,
            channel.max_speed.value(),
            channel.acceleration.value(),
            channel.min_ramp_steps()
        );
    }

    let timer = SimTimer::new(config.timer.counter_bits.value());
    let engine: Engine<_, _, SimPin> = Engine::new(&timer, timer.clock(config.timer.clock_hz), config.timer)?;
    engine.init();

    let pan = engine.channel_from_config(&config, "pan", SimPin::new())?;
    let tilt = engine.channel_from_config(&config, "tilt", SimPin::new())?;

    for (pan_target, tilt_target) in [(800, 300), (-400, 0), (0, -150)] {
        pan.move_to(pan_target)?;
        tilt.move_to(tilt_target)?;

        let finished = timer.run_until(20 * u64::from(config.timer.clock_hz), |event| {
            match event {
                SimEvent::Overflow => engine.on_overflow(),
                SimEvent::Compare(unit) => {
                    engine.on_compare_match(unit);
                }
            }
            !pan.is_running() && !tilt.is_running()
        });

        println!(
            "\nmove to ({}, {}): finished={} pan={} tilt={} at t={:.3} s",
            pan_target,
            tilt_target,
            finished,
            pan.current_pos(),
            tilt.current_pos(),
            timer.now() as f64 / f64::from(config.timer.clock_hz)
        );
    }

    Ok(())
}

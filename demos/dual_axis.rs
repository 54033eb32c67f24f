//! Dual-axis pulse generation example.
//!
//! Runs two independent moves on one shared timer through the host
//! simulator, dispatching overflow and compare interrupts in time order, and
//! prints the speed profile of each axis.
//!
//! Run with: `cargo run --example dual_axis`

use stepper_pulse::hal::sim::{SimEvent, SimPin, SimTimer};
use stepper_pulse::{CompareUnit, Engine, MotionPhase, TimerConfig};

const CLOCK_HZ: u32 = 16_000_000;

fn beat(count: u32) {
    if count % 50 == 0 {
        println!("  [heartbeat] tick {}", count);
    }
}

fn main() -> stepper_pulse::Result<()> {
    println!("=== Dual Axis Example ===\n");

    let config = TimerConfig::default();
    let timer = SimTimer::new(config.counter_bits.value());
    let engine: Engine<_, _, SimPin> = Engine::new(&timer, timer.clock(config.clock_hz), config)?;
    engine.init();
    engine.set_heartbeat(Some(beat));

    println!("Overflow period: {:.3} ms", config.overflow_period_ms());
    println!("Coarse chunk: {} ticks", engine.encoder().chunk());
    println!("Minimum speed: {:.4} steps/s\n", engine.minimum_speed());

    let x_enable = SimPin::new();
    let x_enable_probe = x_enable.probe();

    let x = engine.channel_a(SimPin::new())?;
    x.set_enable_pin(x_enable)?;
    x.set_auto_enable(true);
    x.set_dynamics(1000.0, 2000.0)?;

    let y = engine.channel_b(SimPin::new())?;
    y.set_dynamics(400.0, 1000.0)?;

    println!("X: {:?}", x.move_by(500)?);
    println!("Y: {:?}", y.move_to(-250)?);

    let mut last_phase = (MotionPhase::Idle, MotionPhase::Idle);
    timer.run_until(10 * CLOCK_HZ as u64, |event| {
        match event {
            SimEvent::Overflow => engine.on_overflow(),
            SimEvent::Compare(unit) => {
                engine.on_compare_match(unit);
            }
        }

        let phase = (x.phase(), y.phase());
        if phase != last_phase {
            println!(
                "t={:>7.1} ms  X {:?} @ {:.0} steps/s, Y {:?} @ {:.0} steps/s",
                timer.now() as f64 * 1000.0 / CLOCK_HZ as f64,
                phase.0,
                x.current_speed(),
                phase.1,
                y.current_speed()
            );
            last_phase = phase;
        }
        !x.is_running() && !y.is_running()
    });

    println!("\n=== Result ===");
    println!("X position: {} ({} edges)", x.current_pos(), timer.rising_edges(CompareUnit::A).len());
    println!("Y position: {} ({} edges)", y.current_pos(), timer.rising_edges(CompareUnit::B).len());
    println!("X driver enabled: {}", !x_enable_probe.is_high());
    println!("Overflow ticks: {}", engine.heartbeat_count());

    Ok(())
}

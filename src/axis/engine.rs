//! Pulse engine: owns the shared timer and routes its interrupts.
//!
//! The firmware calls [`Engine::on_overflow`] from the counter overflow vector
//! and [`Engine::on_compare_match`] from each compare vector. Both take
//! `&self`, so the engine is typically placed in a `static` cell and shared
//! with the application thread, which talks to it through [`Channel`]s.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use portable_atomic::{AtomicU32, Ordering};

use crate::config::{validate_timer, EngineConfig, TimerConfig};
use crate::error::{ChannelError, ConfigError, Error, Result};
use crate::hal::{CompareTimer, CompareUnit, MillisClock};
use crate::motion::{delay_ticks, EncodedInterval, IntervalEncoder, MatchOutcome};

use super::channel::Channel;
use super::shared::AxisState;

/// Hook called once per overflow tick with the running tick count.
pub type Heartbeat = fn(u32);

/// Interrupt-driven step pulse engine with `N` channel slots.
///
/// Generic over:
/// - `TIMER`: the shared timer peripheral (must implement `CompareTimer`)
/// - `CLOCK`: millisecond time source (must implement `MillisClock`)
/// - `PIN`: direction and enable pin type (must implement `OutputPin`)
pub struct Engine<TIMER, CLOCK, PIN, const N: usize = 2>
where
    TIMER: CompareTimer,
    CLOCK: MillisClock,
    PIN: OutputPin,
{
    timer: TIMER,
    clock: CLOCK,
    config: TimerConfig,
    encoder: IntervalEncoder,
    axes: [AxisState<PIN>; N],
    ticks: AtomicU32,
    heartbeat: Mutex<Cell<Option<Heartbeat>>>,
}

impl<TIMER, CLOCK, PIN, const N: usize> Engine<TIMER, CLOCK, PIN, N>
where
    TIMER: CompareTimer,
    CLOCK: MillisClock,
    PIN: OutputPin,
{
    /// Create an engine around `timer`. Nothing is written to the timer
    /// until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` is invalid, its counter width
    /// differs from the timer's, or it names more compare units than the
    /// timer has.
    pub fn new(timer: TIMER, clock: CLOCK, config: TimerConfig) -> Result<Self> {
        validate_timer(&config)?;
        if timer.counter_bits() != config.counter_bits.value() {
            return Err(Error::Config(ConfigError::InvalidCounterBits(timer.counter_bits())));
        }
        if config.compare_units > timer.compare_units() {
            return Err(Error::Config(ConfigError::InvalidCompareUnits(config.compare_units)));
        }

        Ok(Self {
            timer,
            clock,
            config,
            encoder: config.encoder(),
            axes: core::array::from_fn(|_| AxisState::new()),
            ticks: AtomicU32::new(0),
            heartbeat: Mutex::new(Cell::new(None)),
        })
    }

    /// Put the counter in free-running mode and enable the overflow tick.
    pub fn init(&self) {
        self.timer.set_mode_normal();
        self.timer.set_clock_divider(self.config.clock_divider);
        self.timer.enable_overflow_interrupt();

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "pulse engine: {} Hz / {}, {}-bit counter, {} slots",
            self.config.clock_hz,
            self.config.clock_divider,
            self.encoder.counter_bits(),
            N
        );
    }

    /// Claim a free slot for compare unit `unit`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidUnit` if `unit` is not one of the configured
    ///   compare units
    /// - `ChannelError::UnitInUse` if another channel already drives `unit`
    /// - `ChannelError::NoFreeSlot` if all `N` slots are taken
    pub fn channel(&self, unit: CompareUnit, direction_pin: PIN) -> Result<Channel<'_, TIMER, CLOCK, PIN, N>> {
        if unit.index() >= self.config.compare_units {
            return Err(Error::Channel(ChannelError::InvalidUnit(unit)));
        }

        let slot = critical_section::with(|cs| {
            if self.axes.iter().any(|axis| axis.unit(cs) == Some(unit)) {
                return Err(Error::Channel(ChannelError::UnitInUse(unit)));
            }
            let slot = self
                .axes
                .iter()
                .position(|axis| axis.unit(cs).is_none())
                .ok_or(Error::Channel(ChannelError::NoFreeSlot))?;

            let axis = &self.axes[slot];
            axis.unit.borrow(cs).set(Some(unit));
            axis.pins.borrow_ref_mut(cs).direction = Some(direction_pin);
            Ok(slot)
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("unit {} claimed slot {}", unit.index(), slot);

        Ok(Channel::new(self, slot, unit))
    }

    /// Channel on compare unit A.
    ///
    /// # Errors
    ///
    /// See [`channel`](Self::channel).
    pub fn channel_a(&self, direction_pin: PIN) -> Result<Channel<'_, TIMER, CLOCK, PIN, N>> {
        self.channel(CompareUnit::A, direction_pin)
    }

    /// Channel on compare unit B.
    ///
    /// # Errors
    ///
    /// See [`channel`](Self::channel).
    pub fn channel_b(&self, direction_pin: PIN) -> Result<Channel<'_, TIMER, CLOCK, PIN, N>> {
        self.channel(CompareUnit::B, direction_pin)
    }

    /// Claim the channel named `name` in `config` and apply its settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ChannelNotFound` for unknown names, otherwise
    /// the errors of [`channel`](Self::channel) and `set_dynamics`.
    pub fn channel_from_config(
        &self,
        config: &EngineConfig,
        name: &str,
        direction_pin: PIN,
    ) -> Result<Channel<'_, TIMER, CLOCK, PIN, N>> {
        let settings = config.channel(name).ok_or_else(|| {
            Error::Config(ConfigError::ChannelNotFound(
                heapless::String::try_from(name).unwrap_or_default(),
            ))
        })?;

        let channel = self.channel(settings.compare_unit(), direction_pin)?;
        channel.set_dynamics(settings.max_speed.value(), settings.acceleration.value())?;
        channel.set_auto_enable(settings.auto_enable);
        channel.set_invert_direction(settings.invert_direction);
        Ok(channel)
    }

    /// Install or remove the per-tick heartbeat hook.
    pub fn set_heartbeat(&self, hook: Option<Heartbeat>) {
        critical_section::with(|cs| self.heartbeat.borrow(cs).set(hook));
    }

    /// Overflow ticks handled so far.
    #[inline]
    pub fn heartbeat_count(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Slowest speed, in steps/s, whose step interval can be encoded.
    #[inline]
    pub fn minimum_speed(&self) -> f32 {
        self.encoder.minimum_speed(self.config.tick_hz())
    }

    /// Interval encoder for the timer's counter width.
    #[inline]
    pub fn encoder(&self) -> &IntervalEncoder {
        &self.encoder
    }

    /// Timer configuration.
    #[inline]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Timer handle.
    #[inline]
    pub fn timer(&self) -> &TIMER {
        &self.timer
    }

    #[inline]
    pub(crate) fn axis(&self, slot: usize) -> &AxisState<PIN> {
        &self.axes[slot]
    }

    #[inline]
    pub(crate) fn now_millis(&self) -> u32 {
        self.clock.now_millis()
    }

    /// Interval used until the first ramp update of a move.
    pub(crate) fn start_interval(&self) -> EncodedInterval {
        self.encoder.encode(u64::from(self.config.start_interval_ticks))
    }

    /// Overflow interrupt: recompute the ramp of every active channel.
    ///
    /// Each channel's state is copied out and written back in short critical
    /// sections; the float work in between runs with interrupts enabled so
    /// compare matches are served on time.
    pub fn on_overflow(&self) {
        self.timer.disable_overflow_interrupt();

        let now_ms = self.clock.now_millis();
        let tick_hz = self.config.tick_hz();

        for axis in self.axes.iter() {
            let snapshot = critical_section::with(|cs| {
                axis.unit(cs)?;
                let snapshot = axis.snapshot(cs);
                if snapshot.is_none() {
                    axis.settle_idle(cs);
                }
                snapshot
            });
            let Some(mut snapshot) = snapshot else {
                continue;
            };

            snapshot.ramp.update(snapshot.remaining, now_ms);
            let delay = delay_ticks(tick_hz, snapshot.ramp.step_speed());
            let interval = self.encoder.encode(delay);

            critical_section::with(|cs| axis.write_back(cs, &snapshot, interval));
        }

        let count = self.ticks.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if let Some(hook) = critical_section::with(|cs| self.heartbeat.borrow(cs).get()) {
            hook(count);
        }

        self.timer.enable_overflow_interrupt();
    }

    /// Compare-match interrupt of `unit`: emit or chain the next edge.
    pub fn on_compare_match(&self, unit: CompareUnit) -> MatchOutcome {
        critical_section::with(|cs| {
            let Some(axis) = self.axes.iter().find(|axis| axis.unit(cs) == Some(unit)) else {
                self.timer.disable_compare_interrupt(unit);
                return MatchOutcome::Ignored;
            };

            let seq_cell = axis.sequencer.borrow(cs);
            let mut sequencer = seq_cell.get();
            let mut position = axis.position.borrow(cs).get();
            let target = axis.target.borrow(cs).get();
            let pending = axis.pending.borrow(cs);

            let outcome = sequencer.on_match(
                &self.timer,
                unit,
                self.encoder.chunk(),
                &mut position,
                target,
                axis.direction(),
                || pending.get(),
            );

            seq_cell.set(sequencer);
            axis.position.borrow(cs).set(position);

            if outcome == MatchOutcome::Finished {
                let ramp = axis.ramp.borrow(cs);
                let mut r = ramp.get();
                r.stop();
                ramp.set(r);
            }
            outcome
        })
    }
}

//! Per-axis handle.
//!
//! A [`Channel`] borrows its slot in the [`Engine`] and is the only way the
//! application touches that slot. Requests that change the move are accepted
//! only while the channel is idle.

use embedded_hal::digital::OutputPin;

use crate::error::{ChannelError, Error, Result};
use crate::hal::{CompareTimer, CompareUnit, MillisClock};
use crate::motion::{Direction, MotionPhase};

use super::engine::Engine;
use super::shared::AxisState;

/// Result of [`Channel::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartOutcome {
    /// Pulses are being emitted toward the target.
    Started,
    /// Position already equals the target; nothing to do.
    AlreadyAtTarget,
    /// A move is in progress; the request was ignored.
    AlreadyActive,
}

/// Handle to one pulse channel.
pub struct Channel<'a, TIMER, CLOCK, PIN, const N: usize>
where
    TIMER: CompareTimer,
    CLOCK: MillisClock,
    PIN: OutputPin,
{
    engine: &'a Engine<TIMER, CLOCK, PIN, N>,
    slot: usize,
    unit: CompareUnit,
}

impl<'a, TIMER, CLOCK, PIN, const N: usize> Channel<'a, TIMER, CLOCK, PIN, N>
where
    TIMER: CompareTimer,
    CLOCK: MillisClock,
    PIN: OutputPin,
{
    pub(crate) fn new(engine: &'a Engine<TIMER, CLOCK, PIN, N>, slot: usize, unit: CompareUnit) -> Self {
        Self { engine, slot, unit }
    }

    #[inline]
    fn axis(&self) -> &AxisState<PIN> {
        self.engine.axis(self.slot)
    }

    /// Compare unit driving this channel's step output.
    #[inline]
    pub fn unit(&self) -> CompareUnit {
        self.unit
    }

    /// Replace the direction pin.
    pub fn set_direction_pin(&self, pin: PIN) {
        critical_section::with(|cs| {
            self.axis().pins.borrow_ref_mut(cs).direction = Some(pin);
        });
    }

    /// Bind the driver's enable pin (active low). The pin is driven high, so
    /// the driver starts disabled.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::PinError` if the pin cannot be written.
    pub fn set_enable_pin(&self, pin: PIN) -> Result<()> {
        critical_section::with(|cs| {
            let mut pins = self.axis().pins.borrow_ref_mut(cs);
            pins.enable = Some(pin);
            pins.release_enable()
                .map_err(|_| Error::Channel(ChannelError::PinError))
        })
    }

    /// With auto-enable the driver is enabled by `start()` and released on
    /// the first overflow tick after the move completes.
    pub fn set_auto_enable(&self, auto_enable: bool) {
        critical_section::with(|cs| {
            self.axis().pins.borrow_ref_mut(cs).auto_enable = auto_enable;
        });
    }

    /// Swap the direction pin levels.
    pub fn set_invert_direction(&self, invert: bool) {
        critical_section::with(|cs| {
            self.axis().pins.borrow_ref_mut(cs).invert_direction = invert;
        });
    }

    /// Set cruise speed (steps/s) and acceleration (steps/s²).
    ///
    /// # Errors
    ///
    /// - `ChannelError::Busy` while a move is running
    /// - `MotionError` for non-positive, non-finite or unencodably slow values
    pub fn set_dynamics(&self, speed: f32, acceleration: f32) -> Result<()> {
        let minimum = self.engine.minimum_speed();
        critical_section::with(|cs| {
            let axis = self.axis();
            if axis.is_active(cs) {
                return Err(Error::Channel(ChannelError::Busy));
            }
            let cell = axis.ramp.borrow(cs);
            let mut ramp = cell.get();
            ramp.set_dynamics(speed, acceleration, minimum)?;
            cell.set(ramp);
            Ok(())
        })
    }

    /// Plan a relative move of `delta` steps from the current position.
    ///
    /// # Errors
    ///
    /// - `ChannelError::Busy` while a move is running
    /// - `ChannelError::NotConfigured` before [`set_dynamics`](Self::set_dynamics)
    pub fn calculate_move(&self, delta: i64) -> Result<()> {
        let now_ms = self.engine.now_millis();
        let direction = Direction::from_steps(delta);
        let steps = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);

        critical_section::with(|cs| {
            let axis = self.axis();
            if axis.is_active(cs) {
                return Err(Error::Channel(ChannelError::Busy));
            }
            let cell = axis.ramp.borrow(cs);
            let mut ramp = cell.get();
            if !ramp.is_configured() {
                return Err(Error::Channel(ChannelError::NotConfigured));
            }

            let position = axis.position.borrow(cs).get();
            axis.target.borrow(cs).set(position.saturating_add(delta));
            axis.set_direction(direction);

            ramp.calculate_move(steps, now_ms);
            cell.set(ramp);

            let epoch = axis.epoch.borrow(cs);
            epoch.set(epoch.get().wrapping_add(1));

            #[cfg(feature = "defmt")]
            defmt::debug!(
                "unit {}: move {} steps, decel at {}",
                self.unit.index(),
                delta,
                ramp.deceleration_start()
            );
            Ok(())
        })
    }

    /// Begin emitting the planned move.
    ///
    /// Sets the direction pin, enables the driver and arms the compare unit
    /// so that the first edge follows after the settle delay.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::PinError` if a pin cannot be written; the move
    /// is then not started.
    pub fn start(&self) -> Result<StartOutcome> {
        let outcome: Result<StartOutcome> = critical_section::with(|cs| {
            let axis = self.axis();
            if axis.is_active(cs) {
                return Ok(StartOutcome::AlreadyActive);
            }
            if axis.remaining(cs) == 0 {
                return Ok(StartOutcome::AlreadyAtTarget);
            }

            {
                let mut pins = axis.pins.borrow_ref_mut(cs);
                pins.write_direction(axis.direction())
                    .map_err(|_| Error::Channel(ChannelError::PinError))?;
                pins.assert_enable()
                    .map_err(|_| Error::Channel(ChannelError::PinError))?;
            }

            axis.pending.borrow(cs).set(self.engine.start_interval());

            let cell = axis.sequencer.borrow(cs);
            let mut sequencer = cell.get();
            sequencer.arm(self.engine.timer(), self.unit, self.engine.config().settle_ticks);
            cell.set(sequencer);
            Ok(StartOutcome::Started)
        });

        #[cfg(feature = "defmt")]
        {
            if let Ok(o) = &outcome {
                defmt::debug!("unit {}: start -> {}", self.unit.index(), o);
            }
        }

        outcome
    }

    /// Plan and start a relative move.
    ///
    /// # Errors
    ///
    /// See [`calculate_move`](Self::calculate_move) and [`start`](Self::start).
    pub fn move_by(&self, delta: i64) -> Result<StartOutcome> {
        self.calculate_move(delta)?;
        self.start()
    }

    /// Plan and start a move to an absolute position.
    ///
    /// # Errors
    ///
    /// See [`calculate_move`](Self::calculate_move) and [`start`](Self::start).
    pub fn move_to(&self, position: i64) -> Result<StartOutcome> {
        self.move_by(position.saturating_sub(self.current_pos()))
    }

    /// Current position in steps.
    pub fn current_pos(&self) -> i64 {
        critical_section::with(|cs| self.axis().position.borrow(cs).get())
    }

    /// Target of the last planned move.
    pub fn target_pos(&self) -> i64 {
        critical_section::with(|cs| self.axis().target.borrow(cs).get())
    }

    /// Whether steps are being emitted.
    pub fn is_running(&self) -> bool {
        critical_section::with(|cs| self.axis().is_active(cs))
    }

    /// Current speed in steps/s; zero while idle.
    pub fn current_speed(&self) -> f32 {
        critical_section::with(|cs| {
            let axis = self.axis();
            if axis.is_active(cs) {
                axis.ramp.borrow(cs).get().current_speed()
            } else {
                0.0
            }
        })
    }

    /// Current ramp phase.
    pub fn phase(&self) -> MotionPhase {
        critical_section::with(|cs| {
            let axis = self.axis();
            if axis.is_active(cs) {
                axis.ramp.borrow(cs).get().phase()
            } else {
                MotionPhase::Idle
            }
        })
    }

    /// Direction of the last planned move.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.axis().direction()
    }
}

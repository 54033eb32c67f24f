//! State shared between the application thread and the timer interrupts.
//!
//! Multi-word fields live in `critical_section::Mutex<Cell<_>>`, so every
//! access is a copy in or out under a short critical section. The direction
//! flag is a single atomic written by the application and read by the
//! compare handler.

use core::cell::{Cell, RefCell};

use critical_section::{CriticalSection, Mutex};
use embedded_hal::digital::OutputPin;
use portable_atomic::{AtomicBool, Ordering};

use crate::hal::CompareUnit;
use crate::motion::{Direction, EncodedInterval, PulseSequencer, RampGenerator};

/// Pins and pin options of one channel.
pub(crate) struct AxisPins<PIN> {
    pub(crate) direction: Option<PIN>,
    pub(crate) enable: Option<PIN>,
    pub(crate) auto_enable: bool,
    pub(crate) invert_direction: bool,
    /// Whether the (active-low) enable line is currently driven low.
    pub(crate) enable_asserted: bool,
}

impl<PIN: OutputPin> AxisPins<PIN> {
    const fn new() -> Self {
        Self {
            direction: None,
            enable: None,
            auto_enable: false,
            invert_direction: false,
            enable_asserted: false,
        }
    }

    /// Drive the direction line for `direction`.
    pub(crate) fn write_direction(&mut self, direction: Direction) -> Result<(), PIN::Error> {
        let high = (direction == Direction::Forward) != self.invert_direction;
        match self.direction.as_mut() {
            Some(pin) if high => pin.set_high(),
            Some(pin) => pin.set_low(),
            None => Ok(()),
        }
    }

    /// Pull the enable line low (driver on).
    pub(crate) fn assert_enable(&mut self) -> Result<(), PIN::Error> {
        if let Some(pin) = self.enable.as_mut() {
            pin.set_low()?;
        }
        self.enable_asserted = true;
        Ok(())
    }

    /// Release the enable line (driver off).
    pub(crate) fn release_enable(&mut self) -> Result<(), PIN::Error> {
        if let Some(pin) = self.enable.as_mut() {
            pin.set_high()?;
        }
        self.enable_asserted = false;
        Ok(())
    }
}

/// Everything the overflow handler needs from one channel.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RampSnapshot {
    pub(crate) ramp: RampGenerator,
    pub(crate) remaining: u32,
    pub(crate) epoch: u32,
}

/// One channel slot of the engine.
pub(crate) struct AxisState<PIN> {
    /// Bound compare unit; `None` while the slot is free.
    pub(crate) unit: Mutex<Cell<Option<CompareUnit>>>,
    pub(crate) position: Mutex<Cell<i64>>,
    pub(crate) target: Mutex<Cell<i64>>,
    pub(crate) pending: Mutex<Cell<EncodedInterval>>,
    pub(crate) sequencer: Mutex<Cell<PulseSequencer>>,
    pub(crate) ramp: Mutex<Cell<RampGenerator>>,
    /// Bumped by every planned move; stale ramp write-backs are dropped.
    pub(crate) epoch: Mutex<Cell<u32>>,
    pub(crate) forward: AtomicBool,
    pub(crate) pins: Mutex<RefCell<AxisPins<PIN>>>,
}

impl<PIN: OutputPin> AxisState<PIN> {
    pub(crate) fn new() -> Self {
        Self {
            unit: Mutex::new(Cell::new(None)),
            position: Mutex::new(Cell::new(0)),
            target: Mutex::new(Cell::new(0)),
            pending: Mutex::new(Cell::new(EncodedInterval::direct(1))),
            sequencer: Mutex::new(Cell::new(PulseSequencer::new())),
            ramp: Mutex::new(Cell::new(RampGenerator::new())),
            epoch: Mutex::new(Cell::new(0)),
            forward: AtomicBool::new(true),
            pins: Mutex::new(RefCell::new(AxisPins::new())),
        }
    }

    #[inline]
    pub(crate) fn unit(&self, cs: CriticalSection<'_>) -> Option<CompareUnit> {
        self.unit.borrow(cs).get()
    }

    #[inline]
    pub(crate) fn is_active(&self, cs: CriticalSection<'_>) -> bool {
        self.sequencer.borrow(cs).get().is_active()
    }

    #[inline]
    pub(crate) fn direction(&self) -> Direction {
        if self.forward.load(Ordering::Acquire) {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    #[inline]
    pub(crate) fn set_direction(&self, direction: Direction) {
        self.forward
            .store(direction == Direction::Forward, Ordering::Release);
    }

    /// Steps between position and target.
    pub(crate) fn remaining(&self, cs: CriticalSection<'_>) -> u32 {
        let delta = self.target.borrow(cs).get() - self.position.borrow(cs).get();
        u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX)
    }

    /// Copy out the ramp of an active channel.
    pub(crate) fn snapshot(&self, cs: CriticalSection<'_>) -> Option<RampSnapshot> {
        if !self.is_active(cs) {
            return None;
        }
        Some(RampSnapshot {
            ramp: self.ramp.borrow(cs).get(),
            remaining: self.remaining(cs),
            epoch: self.epoch.borrow(cs).get(),
        })
    }

    /// Store a recomputed ramp and interval unless the move it was computed
    /// for has ended or been replaced meanwhile.
    pub(crate) fn write_back(
        &self,
        cs: CriticalSection<'_>,
        snapshot: &RampSnapshot,
        interval: EncodedInterval,
    ) -> bool {
        if !self.is_active(cs) || self.epoch.borrow(cs).get() != snapshot.epoch {
            return false;
        }
        self.ramp.borrow(cs).set(snapshot.ramp);
        self.pending.borrow(cs).set(interval);
        true
    }

    /// Reset an idle channel: speed to rest and, with auto-enable, the
    /// driver released.
    pub(crate) fn settle_idle(&self, cs: CriticalSection<'_>) {
        let ramp = self.ramp.borrow(cs);
        let mut r = ramp.get();
        r.stop();
        ramp.set(r);

        let mut pins = self.pins.borrow_ref_mut(cs);
        if pins.auto_enable && pins.enable_asserted {
            // no caller to report to from interrupt context
            let _ = pins.release_enable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimPin;

    #[test]
    fn test_remaining_saturates() {
        let axis: AxisState<SimPin> = AxisState::new();
        critical_section::with(|cs| {
            axis.position.borrow(cs).set(-5);
            axis.target.borrow(cs).set(5);
            assert_eq!(axis.remaining(cs), 10);

            axis.target.borrow(cs).set(i64::MAX / 2);
            assert_eq!(axis.remaining(cs), u32::MAX);
        });
    }

    #[test]
    fn test_direction_pin_follows_inversion() {
        let pin = SimPin::new();
        let probe = pin.probe();
        let mut pins = AxisPins::new();
        pins.direction = Some(pin);

        pins.write_direction(Direction::Forward).unwrap();
        assert!(probe.is_high());

        pins.invert_direction = true;
        pins.write_direction(Direction::Forward).unwrap();
        assert!(!probe.is_high());
        pins.write_direction(Direction::Reverse).unwrap();
        assert!(probe.is_high());
    }

    #[test]
    fn test_stale_write_back_dropped() {
        let axis: AxisState<SimPin> = AxisState::new();
        critical_section::with(|cs| {
            // idle channels take no snapshot
            assert!(axis.snapshot(cs).is_none());

            let snapshot = RampSnapshot {
                ramp: RampGenerator::new(),
                remaining: 3,
                epoch: 0,
            };
            assert!(!axis.write_back(cs, &snapshot, EncodedInterval::direct(99)));
            assert_eq!(axis.pending.borrow(cs).get(), EncodedInterval::direct(1));
        });
    }
}

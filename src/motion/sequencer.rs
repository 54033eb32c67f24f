//! Compare-match pulse sequencing.
//!
//! Each step edge is produced by the timer's own output-compare action; the
//! handler only decides when the next match fires and what the output does on
//! it. Delays longer than the register range are chained as chunk-sized
//! advances with the output held low, followed by the fine remainder with the
//! output set to toggle.

use crate::hal::{CompareTimer, CompareUnit, OutputAction};

use super::interval::EncodedInterval;
use super::ramp::Direction;

/// Sequencer state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Compare interrupt off, output disconnected.
    Idle,
    /// Chaining chunk advances; the output is held low.
    Skipping,
    /// The next match is a step edge.
    Stepping,
}

/// What a compare match did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatchOutcome {
    /// Intermediate chunk of a long interval.
    Skipped,
    /// A step was emitted and the next one scheduled.
    Stepped,
    /// The last step was emitted; the channel is idle again.
    Finished,
    /// Match while idle.
    Ignored,
}

/// Per-channel pulse sequencer.
#[derive(Debug, Clone, Copy)]
pub struct PulseSequencer {
    state: SequencerState,
    /// Chunk advances still to go.
    skip: u32,
    /// Final advance of the interval being chained.
    fine: u32,
}

impl Default for PulseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseSequencer {
    /// Create an idle sequencer.
    pub const fn new() -> Self {
        Self {
            state: SequencerState::Idle,
            skip: 0,
            fine: 0,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Whether a move is being emitted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != SequencerState::Idle
    }

    /// Arm `unit` so that its first step edge fires `settle_ticks` from now.
    ///
    /// The output is forced low first so the first toggle is a rising edge.
    /// Must run inside a critical section.
    pub fn arm<T: CompareTimer>(&mut self, timer: &T, unit: CompareUnit, settle_ticks: u32) {
        let now = timer.counter();
        timer.set_compare(unit, now);
        timer.advance_compare(unit, settle_ticks);
        timer.set_output_action(unit, OutputAction::ForceLow);
        timer.force_compare(unit);
        timer.set_output_action(unit, OutputAction::Toggle);

        self.skip = 0;
        self.fine = 0;
        self.state = SequencerState::Stepping;

        timer.clear_compare_flag(unit);
        timer.enable_compare_interrupt(unit);
    }

    /// Handle a compare match on `unit`.
    ///
    /// `next` is asked for the following interval only when a step was emitted
    /// and the target is not reached yet.
    #[allow(clippy::too_many_arguments)]
    pub fn on_match<T, F>(
        &mut self,
        timer: &T,
        unit: CompareUnit,
        chunk: u32,
        position: &mut i64,
        target: i64,
        direction: Direction,
        next: F,
    ) -> MatchOutcome
    where
        T: CompareTimer,
        F: FnOnce() -> EncodedInterval,
    {
        match self.state {
            SequencerState::Idle => MatchOutcome::Ignored,
            SequencerState::Skipping => {
                self.skip = self.skip.saturating_sub(1);
                if self.skip > 0 {
                    timer.advance_compare(unit, chunk);
                } else {
                    timer.set_output_action(unit, OutputAction::Toggle);
                    timer.advance_compare(unit, self.fine);
                    self.state = SequencerState::Stepping;
                }
                MatchOutcome::Skipped
            }
            SequencerState::Stepping => {
                // the match raised the step line; toggling again ends the pulse
                timer.force_compare(unit);

                *position += direction.sign();
                if *position == target {
                    timer.set_output_action(unit, OutputAction::Passive);
                    timer.disable_compare_interrupt(unit);
                    self.state = SequencerState::Idle;
                    return MatchOutcome::Finished;
                }

                let interval = next();
                if interval.is_extended() {
                    self.skip = interval.coarse;
                    self.fine = interval.fine;
                    timer.set_output_action(unit, OutputAction::ForceLow);
                    timer.advance_compare(unit, chunk);
                    self.state = SequencerState::Skipping;
                } else {
                    timer.advance_compare(unit, interval.fine);
                }
                MatchOutcome::Stepped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::motion::IntervalEncoder;

    /// Records compare register advances and output actions.
    #[derive(Default)]
    struct RecordingTimer {
        compare: Cell<u32>,
        advances: RefCell<heapless::Vec<u32, 64>>,
        action: Cell<Option<OutputAction>>,
        irq: Cell<bool>,
        forced: Cell<u32>,
    }

    impl CompareTimer for RecordingTimer {
        fn counter_bits(&self) -> u8 {
            16
        }
        fn compare_units(&self) -> u8 {
            2
        }
        fn set_mode_normal(&self) {}
        fn set_clock_divider(&self, _divider: u16) {}
        fn enable_overflow_interrupt(&self) {}
        fn disable_overflow_interrupt(&self) {}
        fn enable_compare_interrupt(&self, _unit: CompareUnit) {
            self.irq.set(true);
        }
        fn disable_compare_interrupt(&self, _unit: CompareUnit) {
            self.irq.set(false);
        }
        fn counter(&self) -> u32 {
            1000
        }
        fn set_compare(&self, _unit: CompareUnit, value: u32) {
            self.compare.set(value);
        }
        fn advance_compare(&self, _unit: CompareUnit, delta: u32) {
            self.compare.set(self.compare.get().wrapping_add(delta) & 0xFFFF);
            self.advances.borrow_mut().push(delta).unwrap();
        }
        fn set_output_action(&self, _unit: CompareUnit, action: OutputAction) {
            self.action.set(Some(action));
        }
        fn force_compare(&self, _unit: CompareUnit) {
            self.forced.set(self.forced.get() + 1);
        }
        fn clear_compare_flag(&self, _unit: CompareUnit) {}
    }

    #[test]
    fn test_arm_schedules_settle_delay() {
        let timer = RecordingTimer::default();
        let mut seq = PulseSequencer::new();
        seq.arm(&timer, CompareUnit::A, 16_000);

        assert_eq!(seq.state(), SequencerState::Stepping);
        assert_eq!(timer.compare.get(), 17_000);
        assert_eq!(timer.action.get(), Some(OutputAction::Toggle));
        assert_eq!(timer.forced.get(), 1);
        assert!(timer.irq.get());
    }

    #[test]
    fn test_long_interval_chain_sums_to_delay() {
        let encoder = IntervalEncoder::new(16);
        let timer = RecordingTimer::default();
        let mut seq = PulseSequencer::new();
        seq.arm(&timer, CompareUnit::A, 100);
        timer.advances.borrow_mut().clear();

        let mut position = 0;
        let interval = encoder.encode(100_000);
        let outcome = seq.on_match(&timer, CompareUnit::A, encoder.chunk(), &mut position, 10, Direction::Forward, || interval);
        assert_eq!(outcome, MatchOutcome::Stepped);
        assert_eq!(seq.state(), SequencerState::Skipping);
        assert_eq!(timer.action.get(), Some(OutputAction::ForceLow));

        while seq.state() == SequencerState::Skipping {
            let outcome = seq.on_match(&timer, CompareUnit::A, encoder.chunk(), &mut position, 10, Direction::Forward, || unreachable!());
            assert_eq!(outcome, MatchOutcome::Skipped);
        }

        let total: u64 = timer.advances.borrow().iter().map(|&d| d as u64).sum();
        assert_eq!(total, 100_000);
        assert!(timer.advances.borrow().iter().all(|&d| d < 1 << 16));
        assert_eq!(timer.action.get(), Some(OutputAction::Toggle));
        assert_eq!(position, 1);
    }

    #[test]
    fn test_finishes_at_target() {
        let timer = RecordingTimer::default();
        let mut seq = PulseSequencer::new();
        seq.arm(&timer, CompareUnit::B, 100);

        let mut position = 5;
        let outcome = seq.on_match(&timer, CompareUnit::B, 16384, &mut position, 4, Direction::Reverse, || {
            EncodedInterval::direct(1000)
        });
        assert_eq!(outcome, MatchOutcome::Finished);
        assert_eq!(position, 4);
        assert_eq!(seq.state(), SequencerState::Idle);
        assert_eq!(timer.action.get(), Some(OutputAction::Passive));
        assert!(!timer.irq.get());

        let outcome = seq.on_match(&timer, CompareUnit::B, 16384, &mut position, 4, Direction::Reverse, || {
            EncodedInterval::direct(1000)
        });
        assert_eq!(outcome, MatchOutcome::Ignored);
        assert_eq!(position, 4);
    }
}

//! Motion module for stepper-pulse.
//!
//! Provides the ramp calculation, the extended-delay encoding and the
//! compare-match pulse sequencer.

mod interval;
mod ramp;
mod sequencer;

pub use interval::{EncodedInterval, IntervalEncoder, MAX_COARSE};
pub use ramp::{delay_ticks, Direction, MotionPhase, RampGenerator};
pub use sequencer::{MatchOutcome, PulseSequencer, SequencerState};

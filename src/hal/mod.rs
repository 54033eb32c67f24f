//! Hardware seams: the shared pulse timer and the millisecond clock.
//!
//! GPIO goes through `embedded_hal::digital::OutputPin` directly.

mod clock;
#[cfg(feature = "std")]
pub mod sim;
mod timer;

pub use clock::{elapsed_millis, MillisClock};
pub use timer::{CompareTimer, CompareUnit, OutputAction};

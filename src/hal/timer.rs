//! Timer peripheral seam.
//!
//! A free-running counter with independent output-compare units and a
//! periodic overflow interrupt. Methods take `&self` so that the overflow and
//! compare handlers can share one handle, the way a register block is shared.

/// Identifies one output-compare unit of the shared timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompareUnit(u8);

impl CompareUnit {
    /// First compare unit (OC-A).
    pub const A: CompareUnit = CompareUnit(0);
    /// Second compare unit (OC-B).
    pub const B: CompareUnit = CompareUnit(1);

    /// Compare unit by index.
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Index of the unit within the timer.
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// What the hardware does to a unit's output pin on a compare match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputAction {
    /// Output disconnected from the compare unit.
    Passive,
    /// Output toggles on match.
    Toggle,
    /// Output is driven low on match.
    ForceLow,
}

/// Hardware timer used for pulse generation.
///
/// Compare register arithmetic wraps at the counter width.
pub trait CompareTimer {
    /// Counter width in bits.
    fn counter_bits(&self) -> u8;

    /// Number of output-compare units; valid indices are `0..compare_units()`.
    fn compare_units(&self) -> u8;

    /// Put the counter in free-running (normal) mode.
    fn set_mode_normal(&self);

    /// Select the counter clock divider.
    fn set_clock_divider(&self, divider: u16);

    /// Enable the overflow interrupt.
    fn enable_overflow_interrupt(&self);

    /// Disable the overflow interrupt.
    fn disable_overflow_interrupt(&self);

    /// Enable the compare-match interrupt of `unit`.
    fn enable_compare_interrupt(&self, unit: CompareUnit);

    /// Disable the compare-match interrupt of `unit`.
    fn disable_compare_interrupt(&self, unit: CompareUnit);

    /// Current counter value.
    fn counter(&self) -> u32;

    /// Load the compare register of `unit`.
    fn set_compare(&self, unit: CompareUnit, value: u32);

    /// Add `delta` to the compare register of `unit`.
    fn advance_compare(&self, unit: CompareUnit, delta: u32);

    /// Select the output action of `unit`.
    fn set_output_action(&self, unit: CompareUnit, action: OutputAction);

    /// Apply the output action of `unit` immediately, without a match.
    fn force_compare(&self, unit: CompareUnit);

    /// Clear a pending compare-match flag of `unit`.
    fn clear_compare_flag(&self, unit: CompareUnit);
}

impl<T: CompareTimer + ?Sized> CompareTimer for &T {
    fn counter_bits(&self) -> u8 {
        (**self).counter_bits()
    }

    fn compare_units(&self) -> u8 {
        (**self).compare_units()
    }

    fn set_mode_normal(&self) {
        (**self).set_mode_normal()
    }

    fn set_clock_divider(&self, divider: u16) {
        (**self).set_clock_divider(divider)
    }

    fn enable_overflow_interrupt(&self) {
        (**self).enable_overflow_interrupt()
    }

    fn disable_overflow_interrupt(&self) {
        (**self).disable_overflow_interrupt()
    }

    fn enable_compare_interrupt(&self, unit: CompareUnit) {
        (**self).enable_compare_interrupt(unit)
    }

    fn disable_compare_interrupt(&self, unit: CompareUnit) {
        (**self).disable_compare_interrupt(unit)
    }

    fn counter(&self) -> u32 {
        (**self).counter()
    }

    fn set_compare(&self, unit: CompareUnit, value: u32) {
        (**self).set_compare(unit, value)
    }

    fn advance_compare(&self, unit: CompareUnit, delta: u32) {
        (**self).advance_compare(unit, delta)
    }

    fn set_output_action(&self, unit: CompareUnit, action: OutputAction) {
        (**self).set_output_action(unit, action)
    }

    fn force_compare(&self, unit: CompareUnit) {
        (**self).force_compare(unit)
    }

    fn clear_compare_flag(&self, unit: CompareUnit) {
        (**self).clear_compare_flag(unit)
    }
}

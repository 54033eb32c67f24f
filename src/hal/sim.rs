//! Host-side simulation of the pulse timer.
//!
//! `SimTimer` models a free-running counter of configurable width with up to
//! [`SIM_UNITS`] compare units. Matches apply the unit's output action to a
//! simulated step line and are reported in time order, together with counter
//! overflows, so interrupt handlers can be driven deterministically.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, OutputPin};

use super::clock::MillisClock;
use super::timer::{CompareTimer, CompareUnit, OutputAction};

/// Number of compare units the simulator provides.
pub const SIM_UNITS: usize = 4;

/// A simulated interrupt source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Counter wrapped.
    Overflow,
    /// Compare unit matched.
    Compare(CompareUnit),
}

#[derive(Debug)]
struct SimUnit {
    compare: Cell<u32>,
    irq: Cell<bool>,
    action: Cell<OutputAction>,
    level: Cell<bool>,
}

impl SimUnit {
    fn new() -> Self {
        Self {
            compare: Cell::new(0),
            irq: Cell::new(false),
            action: Cell::new(OutputAction::Passive),
            level: Cell::new(false),
        }
    }
}

/// Simulated timer peripheral.
#[derive(Debug)]
pub struct SimTimer {
    bits: u8,
    now: Cell<u64>,
    normal_mode: Cell<bool>,
    divider: Cell<u16>,
    overflow_irq: Cell<bool>,
    units: [SimUnit; SIM_UNITS],
    edges: RefCell<Vec<(CompareUnit, u64)>>,
}

impl SimTimer {
    /// Create a stopped timer with a `counter_bits` wide counter.
    pub fn new(counter_bits: u8) -> Self {
        Self {
            bits: counter_bits.clamp(8, 32),
            now: Cell::new(0),
            normal_mode: Cell::new(false),
            divider: Cell::new(0),
            overflow_irq: Cell::new(false),
            units: core::array::from_fn(|_| SimUnit::new()),
            edges: RefCell::new(Vec::new()),
        }
    }

    fn range(&self) -> u64 {
        1u64 << self.bits
    }

    fn mask(&self) -> u32 {
        (self.range() - 1) as u32
    }

    fn unit(&self, unit: CompareUnit) -> &SimUnit {
        &self.units[unit.index() as usize]
    }

    /// Absolute ticks elapsed since creation.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Millisecond clock driven by this timer at `clock_hz`.
    pub fn clock(&self, clock_hz: u32) -> SimClock<'_> {
        SimClock { timer: self, clock_hz }
    }

    /// Whether `set_mode_normal` was called.
    pub fn is_normal_mode(&self) -> bool {
        self.normal_mode.get()
    }

    /// Last selected clock divider.
    pub fn clock_divider(&self) -> u16 {
        self.divider.get()
    }

    /// Whether the overflow interrupt is enabled.
    pub fn overflow_interrupt_enabled(&self) -> bool {
        self.overflow_irq.get()
    }

    /// Whether the compare interrupt of `unit` is enabled.
    pub fn compare_interrupt_enabled(&self, unit: CompareUnit) -> bool {
        self.unit(unit).irq.get()
    }

    /// Output action of `unit`.
    pub fn output_action(&self, unit: CompareUnit) -> OutputAction {
        self.unit(unit).action.get()
    }

    /// Step line level of `unit`.
    pub fn level(&self, unit: CompareUnit) -> bool {
        self.unit(unit).level.get()
    }

    /// Ticks at which the step line of `unit` rose.
    pub fn rising_edges(&self, unit: CompareUnit) -> Vec<u64> {
        self.edges
            .borrow()
            .iter()
            .filter(|(u, _)| *u == unit)
            .map(|(_, t)| *t)
            .collect()
    }

    fn apply_action(&self, unit: CompareUnit) {
        let u = self.unit(unit);
        match u.action.get() {
            OutputAction::Passive => {}
            OutputAction::ForceLow => u.level.set(false),
            OutputAction::Toggle => {
                let level = !u.level.get();
                u.level.set(level);
                if level {
                    self.edges.borrow_mut().push((unit, self.now.get()));
                }
            }
        }
    }

    /// Time and source of the next enabled interrupt.
    ///
    /// On equal times compare units win over the overflow, lower units first.
    pub fn next_event(&self) -> Option<(u64, SimEvent)> {
        let now = self.now.get();
        let range = self.range();
        let mut next: Option<(u64, SimEvent)> = None;

        for (index, u) in self.units.iter().enumerate() {
            if !u.irq.get() {
                continue;
            }
            let current = now % range;
            let mut delta = (u.compare.get() as u64 + range - current) % range;
            if delta == 0 {
                delta = range;
            }
            let at = now + delta;
            if next.map_or(true, |(t, _)| at < t) {
                next = Some((at, SimEvent::Compare(CompareUnit::new(index as u8))));
            }
        }

        if self.overflow_irq.get() {
            let at = (now / range + 1) * range;
            if next.map_or(true, |(t, _)| at < t) {
                next = Some((at, SimEvent::Overflow));
            }
        }

        next
    }

    /// Advance to the next event no later than `deadline` and apply its
    /// hardware side effects. Returns `None` once the deadline is reached.
    pub fn step(&self, deadline: u64) -> Option<SimEvent> {
        match self.next_event() {
            Some((at, event)) if at <= deadline => {
                self.now.set(at);
                if let SimEvent::Compare(unit) = event {
                    self.apply_action(unit);
                }
                Some(event)
            }
            _ => {
                self.now.set(deadline.max(self.now.get()));
                None
            }
        }
    }

    /// Run for at most `max_ticks`, handing every event to `on_event`.
    ///
    /// Stops early when `on_event` returns `true`; returns whether it did.
    pub fn run_until<F>(&self, max_ticks: u64, mut on_event: F) -> bool
    where
        F: FnMut(SimEvent) -> bool,
    {
        let deadline = self.now.get() + max_ticks;
        while let Some(event) = self.step(deadline) {
            if on_event(event) {
                return true;
            }
        }
        false
    }

    /// Let `ticks` pass without dispatching anything.
    pub fn advance(&self, ticks: u64) {
        self.now.set(self.now.get() + ticks);
    }
}

impl CompareTimer for SimTimer {
    fn counter_bits(&self) -> u8 {
        self.bits
    }

    fn compare_units(&self) -> u8 {
        SIM_UNITS as u8
    }

    fn set_mode_normal(&self) {
        self.normal_mode.set(true);
    }

    fn set_clock_divider(&self, divider: u16) {
        self.divider.set(divider);
    }

    fn enable_overflow_interrupt(&self) {
        self.overflow_irq.set(true);
    }

    fn disable_overflow_interrupt(&self) {
        self.overflow_irq.set(false);
    }

    fn enable_compare_interrupt(&self, unit: CompareUnit) {
        self.unit(unit).irq.set(true);
    }

    fn disable_compare_interrupt(&self, unit: CompareUnit) {
        self.unit(unit).irq.set(false);
    }

    fn counter(&self) -> u32 {
        (self.now.get() % self.range()) as u32
    }

    fn set_compare(&self, unit: CompareUnit, value: u32) {
        self.unit(unit).compare.set(value & self.mask());
    }

    fn advance_compare(&self, unit: CompareUnit, delta: u32) {
        let u = self.unit(unit);
        u.compare.set(u.compare.get().wrapping_add(delta) & self.mask());
    }

    fn set_output_action(&self, unit: CompareUnit, action: OutputAction) {
        self.unit(unit).action.set(action);
    }

    fn force_compare(&self, unit: CompareUnit) {
        self.apply_action(unit);
    }

    fn clear_compare_flag(&self, _unit: CompareUnit) {}
}

/// Millisecond clock derived from a [`SimTimer`].
#[derive(Debug, Clone, Copy)]
pub struct SimClock<'a> {
    timer: &'a SimTimer,
    clock_hz: u32,
}

impl MillisClock for SimClock<'_> {
    fn now_millis(&self) -> u32 {
        (self.timer.now() * 1000 / self.clock_hz as u64) as u32
    }
}

/// Simulated GPIO output whose level can be observed through a [`PinProbe`].
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl SimPin {
    /// Create a low pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer sharing this pin's level.
    pub fn probe(&self) -> PinProbe {
        PinProbe {
            level: Rc::clone(&self.level),
            writes: Rc::clone(&self.writes),
        }
    }

    fn write(&self, high: bool) {
        self.level.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }
}

/// Read side of a [`SimPin`].
#[derive(Debug, Clone)]
pub struct PinProbe {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl PinProbe {
    /// Whether the pin is high.
    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    /// Number of writes so far.
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_cadence() {
        let timer = SimTimer::new(16);
        timer.enable_overflow_interrupt();
        let mut overflows = 0;
        timer.run_until(65536 * 3, |event| {
            assert_eq!(event, SimEvent::Overflow);
            overflows += 1;
            false
        });
        assert_eq!(overflows, 3);
        assert_eq!(timer.clock(16_000_000).now_millis(), 12);
    }

    #[test]
    fn test_compare_toggle_records_edges() {
        let timer = SimTimer::new(16);
        let a = CompareUnit::A;
        timer.set_compare(a, 100);
        timer.set_output_action(a, OutputAction::Toggle);
        timer.enable_compare_interrupt(a);

        assert_eq!(timer.step(1000), Some(SimEvent::Compare(a)));
        assert_eq!(timer.now(), 100);
        assert!(timer.level(a));

        // wraps a full period when nothing is re-armed
        assert_eq!(timer.step(u64::MAX), Some(SimEvent::Compare(a)));
        assert_eq!(timer.now(), 100 + 65536);
        assert!(!timer.level(a));
        assert_eq!(timer.rising_edges(a), vec![100]);
    }

    #[test]
    fn test_pin_probe() {
        let mut pin = SimPin::new();
        let probe = pin.probe();
        pin.set_high().unwrap();
        assert!(probe.is_high());
        pin.set_low().unwrap();
        assert!(!probe.is_high());
        assert_eq!(probe.writes(), 2);
    }
}

//! Trapezoidal ramp generation.
//!
//! The ramp is recomputed once per overflow tick from elapsed wall time and
//! the steps still to go, never from the number of steps emitted since the
//! last tick. Skipped or late ticks therefore correct themselves on the next
//! one.
//!
//! Phase lengths follow constant-acceleration kinematics, `s = v² / 2a`:
//!
//! - ramp from rest to `v_t`: `v_t² / 2a` steps, `v_t / a` seconds
//! - stop from `v` with the generic deceleration `a_3 = v² / 2 s_remain`,
//!   which also covers stops shorter than the configured ramp

use libm::{roundf, sqrtf};

use crate::error::MotionError;
use crate::hal::elapsed_millis;

/// Direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Position counts up.
    Forward,
    /// Position counts down.
    Reverse,
}

impl Direction {
    /// Get direction from a signed step delta.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Current phase of a channel's ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// No move in progress.
    Idle,
    /// Speeding up toward the configured speed.
    Accelerating,
    /// Holding the configured speed.
    Cruising,
    /// Above the configured speed, slowing down to it.
    SlowingToCruise,
    /// Ramping down to stop at the target.
    Decelerating,
}

/// Per-channel ramp state.
#[derive(Debug, Clone, Copy)]
pub struct RampGenerator {
    /// Configured speed in steps/s.
    max_speed: f32,
    /// Configured acceleration in steps/s².
    acceleration: f32,
    /// Steps of a full ramp up and down at the configured dynamics.
    min_ramp_steps: u32,
    /// Remaining steps at which the stop ramp begins.
    deceleration_start: u32,
    /// Time left for the stop ramp, in ms.
    dec_time_ms: f32,
    /// Clock reading of the last update.
    last_ms: u32,
    /// Current speed in steps/s.
    curr_speed: f32,
    phase: MotionPhase,
    configured: bool,
}

impl Default for RampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RampGenerator {
    /// Create an unconfigured ramp at rest.
    pub const fn new() -> Self {
        Self {
            max_speed: 0.0,
            acceleration: 0.0,
            min_ramp_steps: 0,
            deceleration_start: 0,
            dec_time_ms: 1.0,
            last_ms: 0,
            curr_speed: 0.0,
            phase: MotionPhase::Idle,
            configured: false,
        }
    }

    /// Store speed (steps/s) and acceleration (steps/s²).
    ///
    /// `minimum_speed` is the slowest speed whose step interval the timer can
    /// still encode.
    ///
    /// # Errors
    ///
    /// Rejects non-finite or non-positive values and speeds below
    /// `minimum_speed`. The previous dynamics are kept on error.
    pub fn set_dynamics(
        &mut self,
        speed: f32,
        acceleration: f32,
        minimum_speed: f32,
    ) -> Result<(), MotionError> {
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(MotionError::InvalidAcceleration(acceleration));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(MotionError::InvalidSpeed(speed));
        }
        if speed < minimum_speed {
            return Err(MotionError::SpeedBelowMinimum {
                requested: speed,
                minimum: minimum_speed,
            });
        }

        self.max_speed = speed;
        self.acceleration = acceleration;
        self.min_ramp_steps = roundf(speed * speed / acceleration) as u32;
        self.configured = true;
        Ok(())
    }

    /// Plan a move of `steps` (absolute) starting at clock reading `now_ms`.
    ///
    /// Three cases, in order:
    /// 1. the current speed cannot stop within `steps`: stop ramp starts now
    /// 2. at or below the configured speed: (possibly triangular) ramp
    /// 3. above the configured speed: slow to it first, then the normal stop
    pub fn calculate_move(&mut self, steps: u32, now_ms: u32) {
        let v = self.curr_speed;
        let s_stop = roundf(v * v / 2.0 / self.acceleration) as u32;

        if s_stop > steps {
            self.deceleration_start = steps;
            self.dec_time_ms = roundf(2000.0 * steps as f32 / v);
        } else if v <= self.max_speed {
            let ramp_steps = steps.saturating_add(s_stop).min(self.min_ramp_steps);
            self.deceleration_start = ramp_steps / 2;
            self.dec_time_ms = roundf(sqrtf(ramp_steps as f32 / self.acceleration) * 1000.0);
        } else {
            self.deceleration_start = self.min_ramp_steps / 2;
            self.dec_time_ms = roundf(self.max_speed / self.acceleration * 1000.0);
        }

        self.last_ms = now_ms;
    }

    /// Recompute the current speed for `remaining_steps` at clock reading
    /// `now_ms`. Returns the new speed.
    pub fn update(&mut self, remaining_steps: u32, now_ms: u32) -> f32 {
        let dt_ms = elapsed_millis(self.last_ms, now_ms) as f32;
        self.last_ms = now_ms;

        if remaining_steps <= self.deceleration_start {
            self.phase = MotionPhase::Decelerating;
            // floor keeps the division below finite
            self.dec_time_ms = (self.dec_time_ms - dt_ms).max(1.0);
            self.curr_speed = 2.0 * remaining_steps as f32 * 1000.0 / self.dec_time_ms;
        } else if self.curr_speed < self.max_speed {
            self.phase = MotionPhase::Accelerating;
            self.curr_speed = (self.curr_speed + self.acceleration / 1000.0 * dt_ms).min(self.max_speed);
        } else if self.curr_speed > self.max_speed {
            self.phase = MotionPhase::SlowingToCruise;
            self.curr_speed = (self.curr_speed - self.acceleration / 1000.0 * dt_ms).max(self.max_speed);
        } else {
            self.phase = MotionPhase::Cruising;
        }

        self.curr_speed
    }

    /// Come to rest. Called once the target is reached.
    pub fn stop(&mut self) {
        self.curr_speed = 0.0;
        self.phase = MotionPhase::Idle;
    }

    /// Speed used to time the next step.
    ///
    /// Equal to the current speed. Only a zero speed, left by an update that
    /// saw no elapsed time, is replaced by the speed after one step from rest,
    /// `sqrt(2a)`, capped at the configured speed.
    #[inline]
    pub fn step_speed(&self) -> f32 {
        if self.curr_speed > 0.0 {
            return self.curr_speed;
        }
        sqrtf(2.0 * self.acceleration).min(self.max_speed)
    }

    /// Current speed in steps/s.
    #[inline]
    pub fn current_speed(&self) -> f32 {
        self.curr_speed
    }

    /// Configured speed in steps/s.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Configured acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Steps of a full ramp up and back down, `round(v² / a)`.
    #[inline]
    pub fn min_ramp_steps(&self) -> u32 {
        self.min_ramp_steps
    }

    /// Remaining steps at which the stop ramp begins.
    #[inline]
    pub fn deceleration_start(&self) -> u32 {
        self.deceleration_start
    }

    /// Remaining stop ramp time budget in ms.
    #[inline]
    pub fn deceleration_time_ms(&self) -> f32 {
        self.dec_time_ms
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Whether dynamics have been set.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Timer ticks between steps at `speed` steps/s.
///
/// Non-positive speeds map to `u64::MAX`, which the encoder saturates.
#[inline]
pub fn delay_ticks(clock_hz: u32, speed: f32) -> u64 {
    if !(speed > 0.0) {
        return u64::MAX;
    }
    roundf(clock_hz as f32 / speed) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(speed: f32, accel: f32) -> RampGenerator {
        let mut ramp = RampGenerator::new();
        ramp.set_dynamics(speed, accel, 0.1).unwrap();
        ramp
    }

    #[test]
    fn test_min_ramp_steps() {
        let ramp = ramp(1000.0, 2000.0);
        assert_eq!(ramp.min_ramp_steps(), 500);
    }

    #[test]
    fn test_rejects_bad_dynamics() {
        let mut ramp = RampGenerator::new();
        assert_eq!(
            ramp.set_dynamics(1000.0, 0.0, 0.1),
            Err(MotionError::InvalidAcceleration(0.0))
        );
        assert_eq!(
            ramp.set_dynamics(-5.0, 100.0, 0.1),
            Err(MotionError::InvalidSpeed(-5.0))
        );
        assert!(matches!(
            ramp.set_dynamics(0.05, 100.0, 0.1),
            Err(MotionError::SpeedBelowMinimum { .. })
        ));
        assert!(!ramp.is_configured());
    }

    #[test]
    fn test_full_ramp_from_rest() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(2000, 0);
        // min_ramp / 2 = v² / 2a
        assert_eq!(ramp.deceleration_start(), 250);
        // v / a = 0.5 s
        assert_eq!(ramp.deceleration_time_ms(), 500.0);
    }

    #[test]
    fn test_triangular_ramp_from_rest() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(200, 0);
        assert_eq!(ramp.deceleration_start(), 100);
        // sqrt(200 / 2000) s
        assert_eq!(ramp.deceleration_time_ms(), 316.0);
    }

    #[test]
    fn test_emergency_stop_case() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(10_000, 0);
        for t in 1..=500 {
            ramp.update(10_000, t);
        }
        assert_eq!(ramp.current_speed(), 1000.0);

        // 250 steps needed to stop, only 100 left
        ramp.calculate_move(100, 500);
        assert_eq!(ramp.deceleration_start(), 100);
        assert_eq!(ramp.deceleration_time_ms(), 200.0);
        let v = ramp.update(100, 500);
        assert!((v - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_slow_to_cruise_case() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(10_000, 0);
        for t in 1..=500 {
            ramp.update(10_000, t);
        }
        ramp.set_dynamics(500.0, 2000.0, 0.1).unwrap();
        ramp.calculate_move(10_000, 500);
        assert_eq!(ramp.deceleration_start(), 62);
        assert_eq!(ramp.deceleration_time_ms(), 250.0);

        let v = ramp.update(10_000, 600);
        assert_eq!(ramp.phase(), MotionPhase::SlowingToCruise);
        assert!((v - 800.0).abs() < 1e-3);

        ramp.update(10_000, 1000);
        assert_eq!(ramp.current_speed(), 500.0);
        ramp.update(10_000, 1010);
        assert_eq!(ramp.phase(), MotionPhase::Cruising);
    }

    #[test]
    fn test_acceleration_clamps_to_speed() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(5000, 0);
        let v = ramp.update(5000, 100);
        assert_eq!(ramp.phase(), MotionPhase::Accelerating);
        assert!((v - 200.0).abs() < 1e-3);
        let v = ramp.update(5000, 10_000);
        assert_eq!(v, 1000.0);
    }

    #[test]
    fn test_time_budget_floor() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(200, 0);
        let v = ramp.update(3, 100_000);
        assert_eq!(ramp.deceleration_time_ms(), 1.0);
        assert_eq!(v, 6000.0);
    }

    #[test]
    fn test_slow_speed_is_not_floored() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(500, 0);
        let v = ramp.update(500, 4);
        // 2000 steps/s² for 4 ms
        assert_eq!(v, 8.0);
        assert_eq!(ramp.step_speed(), 8.0);
        assert_eq!(delay_ticks(16_000_000, ramp.step_speed()), 2_000_000);
    }

    #[test]
    fn test_step_speed_floor() {
        let mut ramp = ramp(1000.0, 2000.0);
        ramp.calculate_move(500, 0);
        ramp.update(500, 0);
        assert_eq!(ramp.current_speed(), 0.0);
        // sqrt(2 * 2000)
        assert!((ramp.step_speed() - 63.245).abs() < 0.01);

        ramp.stop();
        assert_eq!(ramp.current_speed(), 0.0);
        assert_eq!(ramp.phase(), MotionPhase::Idle);
    }

    #[test]
    fn test_delay_ticks() {
        assert_eq!(delay_ticks(16_000_000, 1000.0), 16_000);
        assert_eq!(delay_ticks(16_000_000, 4.0), 4_000_000);
        assert_eq!(delay_ticks(16_000_000, 0.0), u64::MAX);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::from_steps(5), Direction::Forward);
        assert_eq!(Direction::from_steps(-5), Direction::Reverse);
        assert_eq!(Direction::Reverse.sign(), -1);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-fan hysteresis and stepping (spec §4.5.2). Keeps a fan's target pinned
//! to its current temperature bucket until the reading moves far enough away,
//! and ratchets the applied speed toward the curve target in multiples of the
//! configured fan step instead of jumping straight to it.

use std::time::{Duration, Instant};

/// Minimum time between two outbound writes for the same fan.
pub const MIN_WRITE_INTERVAL: Duration = Duration::from_millis(100);

/// Per-fan memory the controller keeps between ticks. Cleared whenever the
/// owning assignment is created, modified, deleted, or its system goes
/// offline, so the next tick writes unconditionally.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    last_applied_speed: Option<i64>,
    last_applied_temp_bucket: Option<f64>,
    last_write_at: Option<Instant>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied_speed(&self) -> Option<i64> {
        self.last_applied_speed
    }

    /// Decides whether the curve target at `temperature` (already rounded to
    /// the nearest integer by `curve::interpolate`) should turn into an
    /// outbound write, and if so returns the stepped, clamped speed to send.
    ///
    /// `hysteresis_temp` of 0 disables bucketing (every tick re-evaluates).
    /// `fan_step` of 100 collapses stepping to on/off.
    pub fn decide(
        &mut self,
        temperature: f64,
        curve_target: i64,
        min_speed: i64,
        max_speed: i64,
        fan_step: i64,
        hysteresis_temp: f64,
        now: Instant,
    ) -> Option<i64> {
        let bucket_changed = match self.last_applied_temp_bucket {
            None => true,
            Some(bucket) if hysteresis_temp <= 0.0 => bucket != temperature,
            Some(bucket) => (temperature - bucket).abs() > hysteresis_temp,
        };

        let last_applied = self.last_applied_speed.unwrap_or(0);
        let step_triggered = (curve_target - last_applied).abs() >= fan_step.max(1);

        if !bucket_changed && !step_triggered {
            return None;
        }

        if let Some(last_write_at) = self.last_write_at {
            if now.duration_since(last_write_at) < MIN_WRITE_INTERVAL {
                return None;
            }
        }

        let stepped = quantize_to_step(last_applied, curve_target, fan_step);
        let clamped = stepped.clamp(min_speed, max_speed);

        if self.last_applied_speed == Some(clamped) {
            self.last_applied_temp_bucket = Some(temperature);
            return None;
        }

        self.last_applied_speed = Some(clamped);
        self.last_applied_temp_bucket = Some(temperature);
        self.last_write_at = Some(now);
        Some(clamped)
    }

    /// Emergency overrides bypass stepping and hysteresis entirely.
    pub fn force(&mut self, speed: i64, temperature: f64, now: Instant) {
        self.last_applied_speed = Some(speed);
        self.last_applied_temp_bucket = Some(temperature);
        self.last_write_at = Some(now);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Moves `last_applied` toward `target` in whole multiples of `step`,
/// rounding the distance away from zero so a target that's any amount past
/// the next step boundary is fully reached rather than left short.
fn quantize_to_step(last_applied: i64, target: i64, step: i64) -> i64 {
    let step = step.max(1);
    let delta = target - last_applied;
    if delta == 0 {
        return last_applied;
    }
    let magnitude = delta.abs();
    let steps = (magnitude + step - 1) / step;
    last_applied + steps * step * delta.signum()
}

#[cfg(test)]
#[path = "hysteresis_tests.rs"]
mod tests;

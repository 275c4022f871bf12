//! Rate-limited smoothing of discrete key input.
//!
//! Steering ramps linearly toward the held direction and recenters faster
//! than it engages. Throttle ramps linearly while a key is held and decays
//! geometrically when released. Braking bypasses the ramp entirely.

use crate::core::SmoothingConfig;

use super::command::{clamp_unit, ControlCommand, KeyState};

/// Stateful steer/throttle smoother. One `update` per simulation tick.
#[derive(Clone, Debug)]
pub struct InputSmoother {
    config: SmoothingConfig,
    current_steer: f32,
    current_throttle: f32,
}

impl InputSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            current_steer: 0.0,
            current_throttle: 0.0,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn current_steer(&self) -> f32 {
        self.current_steer
    }

    pub fn current_throttle(&self) -> f32 {
        self.current_throttle
    }

    /// Return both controls to neutral.
    pub fn reset(&mut self) {
        self.current_steer = 0.0;
        self.current_throttle = 0.0;
    }

    /// Advance one tick.
    ///
    /// `signed_speed` is only consulted while the brake is held.
    pub fn update(&mut self, keys: KeyState, signed_speed: f32) -> ControlCommand {
        self.current_steer = clamp_unit(self.next_steer(keys.steer_target()));
        self.current_throttle = clamp_unit(self.next_throttle(keys, signed_speed));
        ControlCommand::new(self.current_steer, self.current_throttle)
    }

    fn next_steer(&self, target: f32) -> f32 {
        if target == 0.0 {
            approach(self.current_steer, 0.0, self.config.steer_return_rate)
        } else {
            approach(self.current_steer, target, self.config.steer_approach_rate)
        }
    }

    fn next_throttle(&self, keys: KeyState, signed_speed: f32) -> f32 {
        if keys.brake {
            let threshold = self.config.brake_speed_threshold;
            return if signed_speed > threshold {
                -1.0
            } else if signed_speed < -threshold {
                1.0
            } else {
                0.0
            };
        }

        let target = keys.throttle_target();
        if target == 0.0 {
            self.current_throttle * self.config.throttle_idle_decay
        } else {
            approach(self.current_throttle, target, self.config.throttle_approach_rate)
        }
    }
}

impl Default for InputSmoother {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

/// Move `current` toward `target` by at most `max_step`, never overshooting.
fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    if target > current {
        (current + max_step).min(target)
    } else if target < current {
        (current - max_step).max(target)
    } else {
        current
    }
}

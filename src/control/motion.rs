//! Forward/reverse inference from vehicle telemetry.
//!
//! The simulator reports an unsigned speed; the sign comes from whether the
//! velocity points along or against the vehicle's heading.

use crate::core::MotionConfig;
use crate::env::Telemetry;

/// Per-tick motion summary. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionState {
    /// Unsigned speed after dead-zone snapping.
    pub speed_magnitude: f32,

    /// Negative while reversing.
    pub signed_speed: f32,

    /// Velocity points against the heading.
    pub is_reversing: bool,
}

/// Derives signed speed from heading, velocity and raw speed.
#[derive(Clone, Debug, Default)]
pub struct MotionClassifier {
    config: MotionConfig,
}

impl MotionClassifier {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Classify one telemetry sample.
    pub fn classify(&self, heading: f32, velocity: [f32; 2], raw_speed: f32) -> MotionState {
        let speed = if raw_speed.abs() < self.config.dead_zone {
            0.0
        } else {
            raw_speed
        };

        let (sin, cos) = heading.sin_cos();
        let along_heading = velocity[0] * cos + velocity[1] * sin;
        let is_reversing = along_heading < 0.0;

        let signed_speed = if speed > 0.0 && is_reversing {
            -speed
        } else {
            speed
        };

        MotionState {
            speed_magnitude: speed.abs(),
            signed_speed,
            is_reversing,
        }
    }

    pub fn classify_telemetry(&self, telemetry: &Telemetry) -> MotionState {
        self.classify(telemetry.heading, telemetry.velocity, telemetry.speed)
    }
}

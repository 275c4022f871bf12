//! Configuration types.
//!
//! Every component takes its own config struct in its constructor:
//! - `SmoothingConfig`: rate limits for the input smoother
//! - `MotionConfig`: speed dead zone for the motion classifier
//! - `RecorderConfig`: sample filter, session target and output path
//! - `TrainerConfig`: behavioral-cloning hyperparameters
//! - `DriveConfig`: all of the above, loadable from a JSON file
//!
//! Missing JSON fields fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // written so that NaN is rejected too
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Rate limits for turning key presses into continuous steer/throttle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Max steer change per tick while a steering key is held.
    pub steer_approach_rate: f32,

    /// Max steer change per tick back toward center when no key is held.
    /// Must exceed `steer_approach_rate`.
    pub steer_return_rate: f32,

    /// Max throttle change per tick while a throttle key is held.
    pub throttle_approach_rate: f32,

    /// Multiplicative throttle decay per idle tick, in (0, 1).
    pub throttle_idle_decay: f32,

    /// Signed speed beyond which the brake applies full counter-throttle.
    pub brake_speed_threshold: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            steer_approach_rate: 0.08,
            steer_return_rate: 0.15,
            throttle_approach_rate: 0.05,
            throttle_idle_decay: 0.9,
            brake_speed_threshold: 2.0,
        }
    }
}

impl SmoothingConfig {
    #[must_use]
    pub fn with_steer_rates(mut self, approach: f32, ret: f32) -> Self {
        self.steer_approach_rate = approach;
        self.steer_return_rate = ret;
        self
    }

    #[must_use]
    pub fn with_throttle_approach_rate(mut self, rate: f32) -> Self {
        self.throttle_approach_rate = rate;
        self
    }

    #[must_use]
    pub fn with_throttle_idle_decay(mut self, decay: f32) -> Self {
        self.throttle_idle_decay = decay;
        self
    }

    #[must_use]
    pub fn with_brake_speed_threshold(mut self, threshold: f32) -> Self {
        self.brake_speed_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("steer_approach_rate", self.steer_approach_rate.into())?;
        positive("steer_return_rate", self.steer_return_rate.into())?;
        positive("throttle_approach_rate", self.throttle_approach_rate.into())?;
        positive("brake_speed_threshold", self.brake_speed_threshold.into())?;
        if self.steer_return_rate <= self.steer_approach_rate {
            return Err(ConfigError::ReturnNotFaster {
                approach_rate: self.steer_approach_rate,
                return_rate: self.steer_return_rate,
            });
        }
        if !(self.throttle_idle_decay > 0.0 && self.throttle_idle_decay < 1.0) {
            return Err(ConfigError::IdleDecayOutOfRange(self.throttle_idle_decay));
        }
        Ok(())
    }
}

/// Sensor-noise handling for the motion classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Raw speeds within `±dead_zone` are treated as standing still.
    pub dead_zone: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { dead_zone: 0.1 }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // zero disables the dead zone
        if self.dead_zone.is_finite() && self.dead_zone >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::DeadZoneOutOfRange(self.dead_zone))
        }
    }
}

/// Recording session parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Samples with `|motion| <= motion_threshold` are dropped.
    pub motion_threshold: f32,

    /// Session ends once this many samples were accepted.
    pub target_count: usize,

    /// Emit a progress line every this many acceptances.
    pub progress_interval: usize,

    /// Where the finalized dataset is written.
    pub output_path: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            motion_threshold: 0.5,
            target_count: 50_000,
            progress_interval: 1_000,
            output_path: PathBuf::from("data/driving_data.bin"),
        }
    }
}

impl RecorderConfig {
    #[must_use]
    pub fn with_motion_threshold(mut self, threshold: f32) -> Self {
        self.motion_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("motion_threshold", self.motion_threshold.into())?;
        positive("target_count", self.target_count as f64)?;
        positive("progress_interval", self.progress_interval as f64)?;
        Ok(())
    }
}

/// Behavioral-cloning hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Step size handed to the policy optimizer.
    pub learning_rate: f32,

    /// Number of full passes over the dataset. No early stopping.
    pub epoch_count: usize,

    /// Minibatch size; the last batch of an epoch may be smaller.
    pub batch_size: usize,

    /// Seed for the per-epoch shuffles.
    pub seed: u64,

    /// Where the trained policy artifact is written, if anywhere.
    pub artifact_path: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            epoch_count: 15,
            batch_size: 256,
            seed: 42,
            artifact_path: None,
        }
    }
}

impl TrainerConfig {
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epoch_count = epochs;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("learning_rate", self.learning_rate.into())?;
        positive("epoch_count", self.epoch_count as f64)?;
        positive("batch_size", self.batch_size as f64)?;
        Ok(())
    }
}

/// Complete configuration for a collection session plus pretraining run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub smoothing: SmoothingConfig,
    pub motion: MotionConfig,
    pub recorder: RecorderConfig,
    pub trainer: TrainerConfig,
}

impl DriveConfig {
    /// Read a JSON config file. Absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_err = |reason: String| ConfigError::Read {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| read_err(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.smoothing.validate()?;
        self.motion.validate()?;
        self.recorder.validate()?;
        self.trainer.validate()?;
        Ok(())
    }
}

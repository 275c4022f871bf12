//! Per-tick action sources.
//!
//! A [`Driver`] picks the command for the coming tick. The session loop does
//! not care whether a human, a scripted expert or a trained policy is behind
//! it.

use crate::control::{ControlCommand, InputSmoother, MotionClassifier};
use crate::core::{EnvError, MotionConfig, SmoothingConfig};
use crate::nn::ActingPolicy;

use super::{InputSource, Telemetry};

/// Chooses the command to apply from the current observation.
pub trait Driver {
    fn act(
        &mut self,
        observation: &[f32],
        telemetry: &Telemetry,
    ) -> Result<ControlCommand, EnvError>;

    /// Name shown in the status overlay.
    fn label(&self) -> &str {
        "Driving"
    }
}

impl<F> Driver for F
where
    F: FnMut(&[f32], &Telemetry) -> Result<ControlCommand, EnvError>,
{
    fn act(
        &mut self,
        observation: &[f32],
        telemetry: &Telemetry,
    ) -> Result<ControlCommand, EnvError> {
        self(observation, telemetry)
    }
}

/// Human driving: each tick smooths the held keys against the current motion.
pub struct ManualDriver<I: InputSource> {
    input: I,
    classifier: MotionClassifier,
    smoother: InputSmoother,
}

impl<I: InputSource> ManualDriver<I> {
    pub fn new(input: I, smoothing: SmoothingConfig, motion: MotionConfig) -> Self {
        Self {
            input,
            classifier: MotionClassifier::new(motion),
            smoother: InputSmoother::new(smoothing),
        }
    }

    pub fn smoother(&self) -> &InputSmoother {
        &self.smoother
    }
}

impl<I: InputSource> Driver for ManualDriver<I> {
    fn act(
        &mut self,
        _observation: &[f32],
        telemetry: &Telemetry,
    ) -> Result<ControlCommand, EnvError> {
        let keys = self.input.snapshot();
        let motion = self.classifier.classify_telemetry(telemetry);
        Ok(self.smoother.update(keys, motion.signed_speed))
    }

    fn label(&self) -> &str {
        "Manual"
    }
}

/// Drives with a trained policy's mean action.
pub struct PolicyDriver<P: ActingPolicy> {
    policy: P,
}

impl<P: ActingPolicy> PolicyDriver<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn into_inner(self) -> P {
        self.policy
    }
}

impl<P: ActingPolicy> Driver for PolicyDriver<P> {
    fn act(
        &mut self,
        observation: &[f32],
        _telemetry: &Telemetry,
    ) -> Result<ControlCommand, EnvError> {
        let action = self
            .policy
            .act(observation)
            .map_err(|e| EnvError::Driver(e.to_string()))?;
        Ok(ControlCommand::from_action(&action))
    }

    fn label(&self) -> &str {
        "Policy"
    }
}

//! Policy capability traits.
//!
//! The trainer never sees a network architecture. It hands minibatches to a
//! [`PolicyModel`], reads back log-probabilities, and asks the model to take
//! one optimizer step. Any backend (a GPU framework binding, a remote
//! trainer, the bundled linear baseline) plugs in here.

use serde::{Deserialize, Serialize};

use crate::control::ActionVec;
use crate::core::PolicyError;

/// A minibatch of aligned state/action rows borrowed from a dataset.
#[derive(Clone, Debug, Default)]
pub struct TrainingBatch<'a> {
    pub states: Vec<&'a [f32]>,
    pub actions: Vec<&'a [f32]>,
}

impl<'a> TrainingBatch<'a> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, state: &'a [f32], action: &'a [f32]) {
        self.states.push(state);
        self.actions.push(action);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Stochastic policy trainable by maximum likelihood.
pub trait PolicyModel {
    /// Log-probability of each expert action under the current policy.
    ///
    /// Returns one value per row. Implementations keep whatever they need
    /// (activations, gradients) for the following [`optimizer_step`].
    ///
    /// [`optimizer_step`]: PolicyModel::optimizer_step
    fn evaluate_actions(&mut self, batch: &TrainingBatch<'_>) -> Result<Vec<f32>, PolicyError>;

    /// One optimizer update lowering `-mean(log_prob)` of the most recently
    /// evaluated batch.
    fn optimizer_step(&mut self, learning_rate: f32) -> Result<(), PolicyError>;

    /// Serialized parameters, written verbatim as the model artifact.
    fn export(&self) -> Result<Vec<u8>, PolicyError>;
}

/// A policy that can choose actions, used when evaluating a trained model.
pub trait ActingPolicy {
    /// Deterministic (mean) action for one observation.
    fn act(&self, observation: &[f32]) -> Result<ActionVec, PolicyError>;
}

/// Policy that assigns the same log-probability to every action (baseline
/// for testing the training loop).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConstantPolicy {
    log_prob: f32,
    evaluated_rows: usize,
    steps_taken: usize,
    pending: bool,
}

impl ConstantPolicy {
    pub fn new(log_prob: f32) -> Self {
        Self {
            log_prob,
            ..Self::default()
        }
    }

    /// Total rows passed through `evaluate_actions`.
    pub fn evaluated_rows(&self) -> usize {
        self.evaluated_rows
    }

    /// Number of optimizer steps taken.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}

impl PolicyModel for ConstantPolicy {
    fn evaluate_actions(&mut self, batch: &TrainingBatch<'_>) -> Result<Vec<f32>, PolicyError> {
        if batch.states.len() != batch.actions.len() {
            return Err(PolicyError::ShapeMismatch(format!(
                "{} states vs {} actions",
                batch.states.len(),
                batch.actions.len()
            )));
        }
        self.evaluated_rows += batch.len();
        self.pending = true;
        Ok(vec![self.log_prob; batch.len()])
    }

    fn optimizer_step(&mut self, _learning_rate: f32) -> Result<(), PolicyError> {
        if !self.pending {
            return Err(PolicyError::NoPendingGradient);
        }
        self.pending = false;
        self.steps_taken += 1;
        Ok(())
    }

    fn export(&self) -> Result<Vec<u8>, PolicyError> {
        bincode::serialize(self).map_err(|e| PolicyError::Artifact(e.to_string()))
    }
}

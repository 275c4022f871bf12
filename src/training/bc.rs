//! Behavioral cloning by maximum likelihood.
//!
//! Each epoch shuffles the dataset with a seeded RNG, walks it in
//! contiguous minibatches, and minimizes `-mean(log_prob)` of the expert
//! actions. Epoch count is fixed: there is no validation split and no early
//! stopping, apart from cancellation.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::{
    CancelToken, ConfigError, LoadError, PolicyError, TrainError, TrainRng, TrainerConfig,
};
use crate::nn::{PolicyModel, TrainingBatch};

use super::dataset::write_atomic;

/// Outcome of a training run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingReport {
    /// Mean batch loss of each completed epoch.
    pub epoch_losses: Vec<f32>,

    /// Optimizer steps taken.
    pub steps: usize,

    /// Cancelled before the configured epoch count was reached.
    pub stopped_early: bool,

    /// Where the policy artifact was written, if anywhere.
    pub artifact_path: Option<PathBuf>,
}

impl TrainingReport {
    pub fn epochs_completed(&self) -> usize {
        self.epoch_losses.len()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// Offline pretraining loop over a recorded dataset.
#[derive(Clone, Debug)]
pub struct BehavioralCloningTrainer {
    config: TrainerConfig,
}

impl BehavioralCloningTrainer {
    pub fn new(config: TrainerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit `policy` to the aligned `(states, actions)` rows.
    ///
    /// The artifact (if a path is configured) is written once at the end,
    /// including when the run is cancelled. A non-finite batch loss aborts
    /// the run without writing anything.
    pub fn train<S, A, P>(
        &self,
        states: &[S],
        actions: &[A],
        policy: &mut P,
        cancel: &CancelToken,
    ) -> Result<TrainingReport, TrainError>
    where
        S: AsRef<[f32]>,
        A: AsRef<[f32]>,
        P: PolicyModel + ?Sized,
    {
        if states.len() != actions.len() {
            return Err(LoadError::LengthMismatch {
                states: states.len(),
                actions: actions.len(),
            }
            .into());
        }
        if states.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let epochs = self.config.epoch_count;
        let batch_size = self.config.batch_size;
        let mut rng = TrainRng::new(self.config.seed);
        let mut report = TrainingReport::default();

        info!(
            samples = states.len(),
            epochs,
            batch_size,
            lr = self.config.learning_rate,
            "starting behavioral cloning"
        );

        'epochs: for epoch in 1..=epochs {
            let order = rng.permutation(states.len());
            let mut loss_sum = 0.0f64;
            let mut batches = 0usize;

            for (batch_index, chunk) in order.chunks(batch_size).enumerate() {
                if cancel.is_cancelled() {
                    warn!(epoch, batch = batch_index, "training cancelled");
                    report.stopped_early = true;
                    break 'epochs;
                }

                let mut batch = TrainingBatch::with_capacity(chunk.len());
                for &i in chunk {
                    batch.push(states[i].as_ref(), actions[i].as_ref());
                }

                let log_probs = policy.evaluate_actions(&batch)?;
                if log_probs.len() != batch.len() {
                    return Err(PolicyError::ShapeMismatch(format!(
                        "{} log-probs for {} rows",
                        log_probs.len(),
                        batch.len()
                    ))
                    .into());
                }
                let loss = -log_probs.iter().map(|&lp| f64::from(lp)).sum::<f64>()
                    / log_probs.len() as f64;
                if !loss.is_finite() {
                    return Err(TrainError::NonFiniteLoss {
                        epoch,
                        batch: batch_index,
                    });
                }

                policy.optimizer_step(self.config.learning_rate)?;
                report.steps += 1;
                loss_sum += loss;
                batches += 1;
            }

            let epoch_loss = (loss_sum / batches as f64) as f32;
            info!("Epoch {}/{} | NLL Loss: {:.4}", epoch, epochs, epoch_loss);
            report.epoch_losses.push(epoch_loss);
        }

        if let Some(path) = &self.config.artifact_path {
            let bytes = policy.export()?;
            write_atomic(path, &bytes)?;
            info!(path = %path.display(), bytes = bytes.len(), "saved policy artifact");
            report.artifact_path = Some(path.clone());
        }

        Ok(report)
    }
}

//! Demonstration recorder.
//!
//! Filters near-stationary samples and buffers the rest until the session
//! reaches its target or is closed.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::control::ActionVec;
use crate::core::{ConfigError, PersistError, RecorderConfig};

use super::dataset::save_dataset;
use super::trajectory::{Dataset, StepRecord};

/// Progress notification emitted every `progress_interval` acceptances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub accepted: usize,
    pub target: usize,
}

type ProgressObserver = Box<dyn FnMut(Progress)>;

/// Buffers accepted `(state, action)` samples for one session.
///
/// Accepts samples while open and below target. Once finalized the buffer
/// is frozen and further samples are ignored. The first accepted sample
/// fixes the state and action widths for the rest of the session.
pub struct TrajectoryRecorder {
    config: RecorderConfig,
    dataset: Dataset,
    finalized: bool,
    observer: Option<ProgressObserver>,
}

impl TrajectoryRecorder {
    pub fn new(config: RecorderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dataset: Dataset::with_capacity(config.target_count.min(65_536)),
            config,
            finalized: false,
            observer: None,
        })
    }

    /// Register a callback for periodic progress notifications.
    #[must_use]
    pub fn with_progress_observer(mut self, observer: impl FnMut(Progress) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Offer one sample. Returns whether it was kept.
    ///
    /// `motion` is the vehicle's signed speed; only its magnitude matters.
    /// Samples whose widths differ from the first accepted one are dropped.
    pub fn on_step(&mut self, pre_state: &[f32], applied_action: &[f32], motion: f32) -> bool {
        if self.finalized || self.is_complete() {
            return false;
        }
        if motion.is_nan() || motion.abs() <= self.config.motion_threshold {
            return false;
        }
        if let Some((state_dim, action_dim)) = self.dims() {
            if pre_state.len() != state_dim || applied_action.len() != action_dim {
                warn!(
                    state_dim,
                    action_dim,
                    found_state = pre_state.len(),
                    found_action = applied_action.len(),
                    "dropping sample with mismatched width"
                );
                return false;
            }
        }

        self.dataset.push(StepRecord::new(
            pre_state.to_vec(),
            ActionVec::from_slice(applied_action),
        ));

        let accepted = self.dataset.len();
        if accepted % self.config.progress_interval == 0 {
            let progress = Progress {
                accepted,
                target: self.config.target_count,
            };
            info!(
                accepted = progress.accepted,
                target_count = progress.target,
                "Recorded {}/{} steps",
                progress.accepted,
                progress.target
            );
            if let Some(observer) = self.observer.as_mut() {
                observer(progress);
            }
        }
        true
    }

    /// `(state_dim, action_dim)` fixed by the first accepted sample.
    pub fn dims(&self) -> Option<(usize, usize)> {
        self.dataset
            .records()
            .first()
            .map(|r| (r.state_dim(), r.action_dim()))
    }

    pub fn accepted(&self) -> usize {
        self.dataset.len()
    }

    pub fn target(&self) -> usize {
        self.config.target_count
    }

    pub fn is_complete(&self) -> bool {
        self.dataset.len() >= self.config.target_count
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Close the session and expose the collected dataset. Idempotent.
    pub fn finalize(&mut self) -> &Dataset {
        self.finalized = true;
        &self.dataset
    }

    /// Finalize and write the dataset to `path`.
    ///
    /// Returns the number of records written. An empty dataset writes
    /// nothing and returns 0.
    pub fn persist(&mut self, path: &Path) -> Result<usize, PersistError> {
        let dataset = self.finalize();
        if dataset.is_empty() {
            return Ok(0);
        }
        save_dataset(path, dataset)
    }

    /// Give up the buffer, finalizing first.
    pub fn into_dataset(mut self) -> Dataset {
        self.finalized = true;
        std::mem::take(&mut self.dataset)
    }
}

impl fmt::Debug for TrajectoryRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrajectoryRecorder")
            .field("config", &self.config)
            .field("accepted", &self.dataset.len())
            .field("finalized", &self.finalized)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

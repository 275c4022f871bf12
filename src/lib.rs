//! # drive-clone
//!
//! Demonstration capture and behavioral-cloning pretraining for a 2-D
//! top-down driving simulator.
//!
//! ## Design Principles
//!
//! 1. **Simulator-Agnostic**: the vehicle physics live behind the
//!    `Environment` trait. This crate only turns key presses into commands,
//!    records what was applied, and fits a policy to it.
//!
//! 2. **Configuration Over Constants**: rates, thresholds, targets and
//!    hyperparameters are config structs passed into constructors. Nothing
//!    is global.
//!
//! 3. **Always Clean Up**: every session exit path persists the recorded
//!    data and closes the environment.
//!
//! ## Modules
//!
//! - `core`: configuration, errors, cancellation, seeded RNG
//! - `control`: key state, input smoothing, motion classification
//! - `env`: simulator and input-source contracts, drivers
//! - `nn`: policy traits, Adam, linear-Gaussian baseline policy
//! - `training`: recorder, dataset file format, session loops, trainer

pub mod control;
pub mod core;
pub mod env;
pub mod nn;
pub mod training;

// Re-export commonly used types
pub use crate::core::{
    CancelToken, ConfigError, DriveConfig, EnvError, LoadError, MotionConfig, PersistError,
    PolicyError, RecorderConfig, SessionError, SmoothingConfig, TrainError, TrainRng,
    TrainerConfig,
};

pub use crate::control::{
    ActionVec, ControlCommand, InputSmoother, KeyState, MotionClassifier, MotionState,
};

pub use crate::env::{
    Driver, EnvInfo, Environment, InputSource, ManualDriver, PolicyDriver, ResetOutcome,
    StatusLine, StepOutcome, Telemetry,
};

pub use crate::nn::{
    ActingPolicy, Adam, ConstantPolicy, LinearGaussianPolicy, PolicyModel, TrainingBatch,
};

pub use crate::training::{
    evaluate_policy, run_drive, BehavioralCloningTrainer, Dataset, DriveReport, Progress,
    RecordingSession, SessionReport, StepRecord, StopReason, TrainingReport,
    TrajectoryRecorder,
};

//! Error types, one enum per concern.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected configuration, reported by `validate()` before any work starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("steer return rate ({return_rate}) must exceed steer approach rate ({approach_rate})")]
    ReturnNotFaster { approach_rate: f32, return_rate: f32 },

    #[error("throttle idle decay must lie in (0, 1), got {0}")]
    IdleDecayOutOfRange(f32),

    #[error("motion dead zone must be finite and non-negative, got {0}")]
    DeadZoneOutOfRange(f32),

    #[error("failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// Failure to read a persisted dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset not found: {0}")]
    Missing(PathBuf),

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dataset {path} is not a valid dataset file: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("dataset has {states} states but {actions} actions")]
    LengthMismatch { states: usize, actions: usize },

    #[error("dataset header declares {declared} records but body holds {found}")]
    CountMismatch { declared: usize, found: usize },

    #[error("record {index} has {kind} width {found}, expected {expected}")]
    RaggedDimension {
        index: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failure to write a dataset or model artifact.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("refusing to write {path}: record {index} has {kind} width {found}, expected {expected}")]
    RaggedDimension {
        path: PathBuf,
        index: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failure reported by an environment collaborator.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment reset failed: {0}")]
    Reset(String),

    #[error("environment step failed: {0}")]
    Step(String),

    #[error("environment close failed: {0}")]
    Close(String),

    #[error("driver failed: {0}")]
    Driver(String),
}

/// Failure reported by a policy collaborator.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("batch shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("optimizer step called before any batch was evaluated")]
    NoPendingGradient,

    #[error("policy backend error: {0}")]
    Backend(String),

    #[error("invalid policy artifact: {0}")]
    Artifact(String),
}

/// Fatal failure of a driving or recording session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("recording session already finished; start a new session")]
    AlreadyFinished,
}

/// Fatal failure of a pretraining run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("loss became non-finite in epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

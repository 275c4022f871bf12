//! Demonstration collection and behavioral-cloning pretraining.
//!
//! ## Overview
//!
//! - **StepRecord / Dataset**: recorded `(state, action)` samples
//! - **TrajectoryRecorder**: motion filter and session buffer
//! - **dataset**: on-disk format, atomic save and validated load
//! - **RecordingSession**: the per-tick loop tying environment, driver and
//!   recorder together, plus `run_drive` and `evaluate_policy`
//! - **BehavioralCloningTrainer**: offline minibatch NLL training
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drive_clone::core::{CancelToken, DriveConfig};
//! use drive_clone::env::ManualDriver;
//! use drive_clone::training::{RecordingSession, TrajectoryRecorder};
//!
//! let config = DriveConfig::default();
//! let recorder = TrajectoryRecorder::new(config.recorder.clone())?;
//! let mut session = RecordingSession::new(recorder, config.motion.clone());
//!
//! let mut driver = ManualDriver::new(keyboard, config.smoothing, config.motion);
//! let report = session.run(&mut simulator, &mut driver, &CancelToken::new())?;
//! println!("recorded {}/{}", report.accepted, report.target);
//! ```

pub mod bc;
pub mod dataset;
pub mod recorder;
pub mod session;
pub mod trajectory;

pub use bc::{BehavioralCloningTrainer, TrainingReport};
pub use dataset::{load, load_records, save_dataset, DatasetFile, DatasetHeader, DatasetLayout};
pub use recorder::{Progress, TrajectoryRecorder};
pub use session::{
    evaluate_policy, run_drive, DriveReport, RecordingSession, SessionReport, StopReason,
};
pub use trajectory::{Dataset, StepRecord};

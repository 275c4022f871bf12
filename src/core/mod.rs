//! Core building blocks: configuration, errors, cancellation, RNG.
//!
//! Nothing here knows about vehicles or policies; the control, env and
//! training modules are built on top of these.

pub mod cancel;
pub mod config;
pub mod error;
pub mod rng;

pub use cancel::CancelToken;
pub use config::{DriveConfig, MotionConfig, RecorderConfig, SmoothingConfig, TrainerConfig};
pub use error::{
    ConfigError, EnvError, LoadError, PersistError, PolicyError, SessionError, TrainError,
};
pub use rng::TrainRng;

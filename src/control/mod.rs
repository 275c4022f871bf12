//! Turning raw key state and telemetry into control commands.
//!
//! - **MotionClassifier**: signed speed from heading and velocity
//! - **InputSmoother**: rate-limited steer/throttle state machine
//!
//! ```
//! use drive_clone::control::{InputSmoother, KeyState, MotionClassifier};
//! use drive_clone::core::{MotionConfig, SmoothingConfig};
//!
//! let classifier = MotionClassifier::new(MotionConfig::default());
//! let mut smoother = InputSmoother::new(SmoothingConfig::default());
//!
//! let motion = classifier.classify(0.0, [6.0, 0.0], 6.0);
//! let cmd = smoother.update(KeyState::idle().with_left().with_brake(), motion.signed_speed);
//! assert_eq!(cmd.throttle(), -1.0);
//! assert!(cmd.steer() > 0.0);
//! ```

pub mod command;
pub mod motion;
pub mod smoother;

pub use command::{ActionVec, ControlCommand, KeyState};
pub use motion::{MotionClassifier, MotionState};
pub use smoother::InputSmoother;

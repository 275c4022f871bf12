//! Policy integration for behavioral cloning.
//!
//! ## Overview
//!
//! - **Traits**: `PolicyModel` (trainable), `ActingPolicy` (deployable)
//! - **Baselines**: `ConstantPolicy` for loop tests, `LinearGaussianPolicy`
//!   for the pretraining CLI
//! - **Optimizer**: `Adam`
//!
//! ## Usage
//!
//! ```rust
//! use drive_clone::core::TrainRng;
//! use drive_clone::nn::{LinearGaussianPolicy, PolicyModel, TrainingBatch};
//!
//! let mut policy = LinearGaussianPolicy::new(3, 2, &mut TrainRng::new(7));
//!
//! let state = [0.1, 0.2, 0.3];
//! let action = [0.5, -0.5];
//! let mut batch = TrainingBatch::default();
//! batch.push(&state, &action);
//!
//! let log_probs = policy.evaluate_actions(&batch).unwrap();
//! assert_eq!(log_probs.len(), 1);
//! policy.optimizer_step(1e-3).unwrap();
//! ```

pub mod gaussian;
pub mod optim;
pub mod traits;

pub use gaussian::LinearGaussianPolicy;
pub use optim::Adam;
pub use traits::{ActingPolicy, ConstantPolicy, PolicyModel, TrainingBatch};

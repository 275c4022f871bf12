//! Linear diagonal-Gaussian policy.
//!
//! `a ~ N(W s + b, diag(exp(log_std))^2)` with a state-independent, learnable
//! `log_std`. Gradients of the negative log-likelihood are computed in closed
//! form during `evaluate_actions` and applied by Adam in `optimizer_step`.
//! This is the baseline the `bc-pretrain` binary trains; real deployments
//! plug their own network in through [`PolicyModel`].

use serde::{Deserialize, Serialize};

use crate::control::ActionVec;
use crate::core::{PolicyError, TrainRng};

use super::optim::Adam;
use super::traits::{ActingPolicy, PolicyModel, TrainingBatch};

const LOG_STD_MIN: f32 = -5.0;
const LOG_STD_MAX: f32 = 2.0;
const HALF_LN_2PI: f32 = 0.918_938_5;

/// Serialized form of the policy; this is the model artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct GaussianParams {
    state_dim: usize,
    action_dim: usize,
    /// Row-major `[action_dim, state_dim]`.
    weights: Vec<f32>,
    bias: Vec<f32>,
    log_std: Vec<f32>,
}

#[derive(Clone, Debug)]
struct Gradients {
    weights: Vec<f32>,
    bias: Vec<f32>,
    log_std: Vec<f32>,
}

/// Linear-mean Gaussian policy with Adam.
#[derive(Clone, Debug)]
pub struct LinearGaussianPolicy {
    params: GaussianParams,
    optimizer: Adam,
    pending: Option<Gradients>,
}

impl LinearGaussianPolicy {
    /// Small random weights, zero bias, unit standard deviation.
    pub fn new(state_dim: usize, action_dim: usize, rng: &mut TrainRng) -> Self {
        let scale = 0.1 / (state_dim.max(1) as f32).sqrt();
        let weights = (0..state_dim * action_dim)
            .map(|_| rng.normal() * scale)
            .collect();
        Self::from_params(GaussianParams {
            state_dim,
            action_dim,
            weights,
            bias: vec![0.0; action_dim],
            log_std: vec![0.0; action_dim],
        })
    }

    /// Rebuild a policy from bytes produced by [`PolicyModel::export`].
    ///
    /// Optimizer state is not part of the artifact and starts fresh.
    pub fn from_artifact(bytes: &[u8]) -> Result<Self, PolicyError> {
        let params: GaussianParams =
            bincode::deserialize(bytes).map_err(|e| PolicyError::Artifact(e.to_string()))?;
        if params.weights.len() != params.state_dim * params.action_dim
            || params.bias.len() != params.action_dim
            || params.log_std.len() != params.action_dim
        {
            return Err(PolicyError::Artifact(format!(
                "parameter lengths do not match dims {}x{}",
                params.action_dim, params.state_dim
            )));
        }
        Ok(Self::from_params(params))
    }

    fn from_params(params: GaussianParams) -> Self {
        let optimizer = Adam::new(&[
            params.weights.len(),
            params.bias.len(),
            params.log_std.len(),
        ]);
        Self {
            params,
            optimizer,
            pending: None,
        }
    }

    pub fn state_dim(&self) -> usize {
        self.params.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.params.action_dim
    }

    /// Per-dimension standard deviation.
    pub fn std(&self) -> Vec<f32> {
        self.params.log_std.iter().map(|l| l.exp()).collect()
    }

    fn mean_into(&self, state: &[f32], out: &mut [f32]) {
        let n = self.params.state_dim;
        for (j, mu) in out.iter_mut().enumerate() {
            let row = &self.params.weights[j * n..(j + 1) * n];
            *mu = self.params.bias[j] + row.iter().zip(state).map(|(w, s)| w * s).sum::<f32>();
        }
    }

    fn check_row(&self, index: usize, state: &[f32], action: &[f32]) -> Result<(), PolicyError> {
        if state.len() != self.params.state_dim || action.len() != self.params.action_dim {
            return Err(PolicyError::ShapeMismatch(format!(
                "row {index}: state {} / action {}, policy expects {} / {}",
                state.len(),
                action.len(),
                self.params.state_dim,
                self.params.action_dim
            )));
        }
        Ok(())
    }
}

impl PolicyModel for LinearGaussianPolicy {
    fn evaluate_actions(&mut self, batch: &TrainingBatch<'_>) -> Result<Vec<f32>, PolicyError> {
        if batch.states.len() != batch.actions.len() {
            return Err(PolicyError::ShapeMismatch(format!(
                "{} states vs {} actions",
                batch.states.len(),
                batch.actions.len()
            )));
        }

        let state_dim = self.params.state_dim;
        let action_dim = self.params.action_dim;
        let inv_n = 1.0 / batch.len().max(1) as f32;
        let inv_std: Vec<f32> = self.params.log_std.iter().map(|l| (-l).exp()).collect();
        let log_std_sum: f32 = self.params.log_std.iter().sum();

        let mut grads = Gradients {
            weights: vec![0.0; state_dim * action_dim],
            bias: vec![0.0; action_dim],
            log_std: vec![0.0; action_dim],
        };
        let mut mean = vec![0.0; action_dim];
        let mut log_probs = Vec::with_capacity(batch.len());

        for (i, (state, action)) in batch.states.iter().zip(&batch.actions).enumerate() {
            self.check_row(i, state, action)?;
            self.mean_into(state, &mut mean);

            let mut log_prob = -log_std_sum - HALF_LN_2PI * action_dim as f32;
            for j in 0..action_dim {
                let z = (action[j] - mean[j]) * inv_std[j];
                log_prob -= 0.5 * z * z;

                // d(-mean log_prob)/d(mu_j) and d/d(log_std_j)
                let g_mu = -z * inv_std[j] * inv_n;
                grads.bias[j] += g_mu;
                for (k, s) in state.iter().enumerate() {
                    grads.weights[j * state_dim + k] += g_mu * s;
                }
                grads.log_std[j] += (1.0 - z * z) * inv_n;
            }
            log_probs.push(log_prob);
        }

        self.pending = Some(grads);
        Ok(log_probs)
    }

    fn optimizer_step(&mut self, learning_rate: f32) -> Result<(), PolicyError> {
        let grads = self.pending.take().ok_or(PolicyError::NoPendingGradient)?;
        let GaussianParams {
            weights,
            bias,
            log_std,
            ..
        } = &mut self.params;
        self.optimizer.step(
            learning_rate,
            &mut [weights.as_mut_slice(), bias.as_mut_slice(), log_std.as_mut_slice()],
            &[
                grads.weights.as_slice(),
                grads.bias.as_slice(),
                grads.log_std.as_slice(),
            ],
        );
        for l in log_std.iter_mut() {
            *l = l.clamp(LOG_STD_MIN, LOG_STD_MAX);
        }
        Ok(())
    }

    fn export(&self) -> Result<Vec<u8>, PolicyError> {
        bincode::serialize(&self.params).map_err(|e| PolicyError::Artifact(e.to_string()))
    }
}

impl ActingPolicy for LinearGaussianPolicy {
    fn act(&self, observation: &[f32]) -> Result<ActionVec, PolicyError> {
        if observation.len() != self.params.state_dim {
            return Err(PolicyError::ShapeMismatch(format!(
                "observation has {} values, policy expects {}",
                observation.len(),
                self.params.state_dim
            )));
        }
        let mut action: ActionVec = smallvec::smallvec![0.0; self.params.action_dim];
        self.mean_into(observation, &mut action);
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_row_batch<'a>(
        state: &'a [f32],
        action: &'a [f32],
        copies: usize,
    ) -> TrainingBatch<'a> {
        let mut batch = TrainingBatch::with_capacity(copies);
        for _ in 0..copies {
            batch.push(state, action);
        }
        batch
    }

    #[test]
    fn test_log_prob_at_mean_with_unit_std() {
        let mut policy = LinearGaussianPolicy::from_params(GaussianParams {
            state_dim: 1,
            action_dim: 2,
            weights: vec![0.0, 0.0],
            bias: vec![0.25, -0.5],
            log_std: vec![0.0, 0.0],
        });
        let state = [3.0];
        let action = [0.25, -0.5];
        let log_probs = policy
            .evaluate_actions(&single_row_batch(&state, &action, 1))
            .unwrap();

        // two independent standard normals evaluated at their mean
        assert!((log_probs[0] + 2.0 * HALF_LN_2PI).abs() < 1e-5);
    }

    #[test]
    fn test_log_prob_off_mean() {
        let mut policy = LinearGaussianPolicy::from_params(GaussianParams {
            state_dim: 1,
            action_dim: 1,
            weights: vec![2.0],
            bias: vec![0.0],
            log_std: vec![(0.5f32).ln()],
        });
        let state = [1.0];
        let action = [3.0];
        let lp = policy
            .evaluate_actions(&single_row_batch(&state, &action, 1))
            .unwrap()[0];

        // mean 2, std 0.5, z = 2
        let expected = -0.5 * 4.0 - (0.5f32).ln() - HALF_LN_2PI;
        assert!((lp - expected).abs() < 1e-5);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let params = GaussianParams {
            state_dim: 2,
            action_dim: 1,
            weights: vec![0.3, -0.2],
            bias: vec![0.1],
            log_std: vec![-0.4],
        };
        let states = [[1.0f32, 0.5], [-0.5, 2.0]];
        let actions = [[0.7f32], [-0.3]];
        let mut batch = TrainingBatch::default();
        for (s, a) in states.iter().zip(actions.iter()) {
            batch.push(s, a);
        }

        let loss = |p: &GaussianParams| -> f32 {
            let mut policy = LinearGaussianPolicy::from_params(p.clone());
            let lps = policy.evaluate_actions(&batch).unwrap();
            -lps.iter().sum::<f32>() / lps.len() as f32
        };

        let mut policy = LinearGaussianPolicy::from_params(params.clone());
        policy.evaluate_actions(&batch).unwrap();
        let grads = policy.pending.clone().unwrap();

        let h = 1e-2;
        let mut bumped = params.clone();
        bumped.bias[0] += h;
        let mut lowered = params.clone();
        lowered.bias[0] -= h;
        let numeric = (loss(&bumped) - loss(&lowered)) / (2.0 * h);
        assert!((numeric - grads.bias[0]).abs() < 1e-2, "{numeric} vs {}", grads.bias[0]);

        let mut bumped = params.clone();
        bumped.log_std[0] += h;
        let mut lowered = params.clone();
        lowered.log_std[0] -= h;
        let numeric = (loss(&bumped) - loss(&lowered)) / (2.0 * h);
        assert!((numeric - grads.log_std[0]).abs() < 1e-2);

        let mut bumped = params.clone();
        bumped.weights[1] += h;
        let mut lowered = params;
        lowered.weights[1] -= h;
        let numeric = (loss(&bumped) - loss(&lowered)) / (2.0 * h);
        assert!((numeric - grads.weights[1]).abs() < 1e-2);
    }

    #[test]
    fn test_optimizer_step_reduces_loss() {
        let mut rng = TrainRng::new(0);
        let mut policy = LinearGaussianPolicy::new(2, 2, &mut rng);
        let state = [1.0, 0.5];
        let action = [0.3, -0.2];
        let batch = single_row_batch(&state, &action, 8);

        let mean_nll = |lps: Vec<f32>| -lps.iter().sum::<f32>() / lps.len() as f32;
        let first = mean_nll(policy.evaluate_actions(&batch).unwrap());
        policy.optimizer_step(0.01).unwrap();
        for _ in 0..50 {
            policy.evaluate_actions(&batch).unwrap();
            policy.optimizer_step(0.01).unwrap();
        }
        let last = mean_nll(policy.evaluate_actions(&batch).unwrap());
        assert!(last < first, "{last} !< {first}");
    }

    #[test]
    fn test_step_without_evaluation_fails() {
        let mut policy = LinearGaussianPolicy::new(1, 1, &mut TrainRng::new(1));
        assert!(matches!(
            policy.optimizer_step(0.1),
            Err(PolicyError::NoPendingGradient)
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut policy = LinearGaussianPolicy::new(3, 2, &mut TrainRng::new(1));
        let state = [1.0, 2.0];
        let action = [0.0, 0.0];
        let result = policy.evaluate_actions(&single_row_batch(&state, &action, 1));
        assert!(matches!(result, Err(PolicyError::ShapeMismatch(_))));
    }

    #[test]
    fn test_log_std_is_clamped() {
        let mut policy = LinearGaussianPolicy::new(1, 1, &mut TrainRng::new(2));
        policy.params.log_std[0] = LOG_STD_MIN;
        let state = [0.0];
        let action = [0.0];
        let batch = single_row_batch(&state, &action, 4);
        for _ in 0..10 {
            policy.evaluate_actions(&batch).unwrap();
            policy.optimizer_step(1.0).unwrap();
        }
        assert!(policy.params.log_std[0] >= LOG_STD_MIN);
    }

    #[test]
    fn test_artifact_round_trip() {
        let policy = LinearGaussianPolicy::new(4, 2, &mut TrainRng::new(3));
        let bytes = policy.export().unwrap();
        let restored = LinearGaussianPolicy::from_artifact(&bytes).unwrap();

        assert_eq!(restored.params, policy.params);
        let obs = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(restored.act(&obs).unwrap(), policy.act(&obs).unwrap());
    }

    #[test]
    fn test_corrupt_artifact() {
        assert!(matches!(
            LinearGaussianPolicy::from_artifact(&[1, 2, 3]),
            Err(PolicyError::Artifact(_))
        ));
    }

    #[test]
    fn test_act_returns_mean() {
        let policy = LinearGaussianPolicy::from_params(GaussianParams {
            state_dim: 2,
            action_dim: 2,
            weights: vec![1.0, 0.0, 0.0, -1.0],
            bias: vec![0.5, 0.0],
            log_std: vec![0.0, 0.0],
        });
        let action = policy.act(&[0.25, 0.75]).unwrap();
        assert_eq!(action.as_slice(), &[0.75, -0.75]);
        assert!(policy.act(&[1.0]).is_err());
    }
}

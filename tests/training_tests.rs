//! Integration tests for dataset storage and behavioral-cloning training.

mod common;

use common::ScriptedEnv;
use drive_clone::control::{ActionVec, ControlCommand};
use drive_clone::core::{
    CancelToken, EnvError, MotionConfig, RecorderConfig, TrainError, TrainRng, TrainerConfig,
};
use drive_clone::env::{Driver, PolicyDriver, Telemetry};
use drive_clone::nn::{ActingPolicy, ConstantPolicy, LinearGaussianPolicy};
use drive_clone::training::{
    load, load_records, save_dataset, BehavioralCloningTrainer, Dataset, RecordingSession,
    StepRecord, TrajectoryRecorder,
};
use smallvec::smallvec;
use tempfile::tempdir;

fn linear_dataset(n: usize, seed: u64) -> Dataset {
    // steer = 0.5 * s0, throttle = 0.3 - 0.4 * s1
    let mut rng = TrainRng::new(seed);
    (0..n)
        .map(|_| {
            let s0 = rng.uniform(-1.0, 1.0);
            let s1 = rng.uniform(-1.0, 1.0);
            StepRecord::new(vec![s0, s1], smallvec![0.5 * s0, 0.3 - 0.4 * s1])
        })
        .collect::<Vec<_>>()
        .into()
}

// =============================================================================
// Dataset Storage
// =============================================================================

#[test]
fn test_round_trip_preserves_pairs_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pairs.bin");
    let dataset = linear_dataset(257, 1);

    assert_eq!(save_dataset(&path, &dataset).unwrap(), 257);
    let (states, actions) = load(&path).unwrap();

    assert_eq!(states.len(), 257);
    assert_eq!(actions.len(), 257);
    for (record, (state, action)) in dataset.iter().zip(states.iter().zip(&actions)) {
        assert_eq!(&record.state, state);
        assert_eq!(&record.action, action);
    }
}

#[test]
fn test_recorded_session_loads_back() {
    let dir = tempdir().unwrap();
    let config = RecorderConfig::default()
        .with_target_count(12)
        .with_output_path(dir.path().join("session.bin"));
    let mut session = RecordingSession::new(
        TrajectoryRecorder::new(config).unwrap(),
        MotionConfig::default(),
    );
    let mut env = ScriptedEnv::constant(2.5);
    let mut driver = |obs: &[f32], _: &Telemetry| -> Result<ControlCommand, EnvError> {
        // steer with the tick index so actions differ per record
        Ok(ControlCommand::new(obs[0] / 100.0, 0.5))
    };

    let report = session
        .run(&mut env, &mut driver, &CancelToken::new())
        .unwrap();
    let records = load_records(report.dataset_path.unwrap()).unwrap();

    assert_eq!(records.len(), 12);
    for (k, record) in records.iter().enumerate() {
        assert_eq!(record.state, vec![k as f32]);
        assert!((record.action[0] - k as f32 / 100.0).abs() < 1e-6);
        assert_eq!(record.action[1], 0.5);
    }
}

// =============================================================================
// Behavioral Cloning
// =============================================================================

#[test]
fn test_stub_policy_reports_negative_log_prob() {
    let states = vec![vec![0.1f32, 0.2, 0.3]; 64];
    let actions: Vec<ActionVec> = vec![smallvec![0.5, -0.5]; 64];
    let trainer = BehavioralCloningTrainer::new(
        TrainerConfig::default().with_epochs(4).with_batch_size(16),
    )
    .unwrap();

    let mut policy = ConstantPolicy::new(-0.75);
    let report = trainer
        .train(&states, &actions, &mut policy, &CancelToken::new())
        .unwrap();

    assert_eq!(report.epochs_completed(), 4);
    for loss in &report.epoch_losses {
        assert!(loss.is_finite());
        assert!((loss - 0.75).abs() < 1e-6);
    }
    assert_eq!(policy.steps_taken(), 16);
}

#[test]
fn test_linear_policy_learns_linear_expert() {
    let dir = tempdir().unwrap();
    let data_path = dir.path().join("expert.bin");
    let model_path = dir.path().join("models/policy.bin");
    save_dataset(&data_path, &linear_dataset(2_000, 7)).unwrap();

    let (states, actions) = load(&data_path).unwrap();
    let trainer = BehavioralCloningTrainer::new(
        TrainerConfig::default()
            .with_epochs(30)
            .with_batch_size(64)
            .with_learning_rate(1e-2)
            .with_artifact_path(&model_path),
    )
    .unwrap();
    let mut policy = LinearGaussianPolicy::new(2, 2, &mut TrainRng::new(11));

    let report = trainer
        .train(&states, &actions, &mut policy, &CancelToken::new())
        .unwrap();

    let first = report.epoch_losses[0];
    let last = report.final_loss().unwrap();
    assert!(last < first, "loss went from {first} to {last}");

    let restored = LinearGaussianPolicy::from_artifact(&std::fs::read(&model_path).unwrap())
        .unwrap();
    let action = restored.act(&[0.8, -0.5]).unwrap();
    assert!((action[0] - 0.4).abs() < 0.1, "steer {}", action[0]);
    assert!((action[1] - 0.5).abs() < 0.1, "throttle {}", action[1]);

    // the reloaded policy can drive
    let mut driver = PolicyDriver::new(restored);
    let command = driver.act(&[0.8, -0.5], &Telemetry::default()).unwrap();
    assert!((command.steer() - 0.4).abs() < 0.1);
}

#[test]
fn test_training_rejects_empty_input() {
    let trainer = BehavioralCloningTrainer::new(TrainerConfig::default()).unwrap();
    let states: Vec<Vec<f32>> = Vec::new();
    let actions: Vec<ActionVec> = Vec::new();
    let result = trainer.train(
        &states,
        &actions,
        &mut ConstantPolicy::new(0.0),
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(TrainError::EmptyDataset)));
}

#[test]
fn test_policy_shape_errors_surface() {
    let states = vec![vec![0.0f32; 3]; 8];
    let actions: Vec<ActionVec> = vec![smallvec![0.0, 0.0]; 8];
    let trainer = BehavioralCloningTrainer::new(TrainerConfig::default()).unwrap();
    let mut policy = LinearGaussianPolicy::new(2, 2, &mut TrainRng::new(0));

    let result = trainer.train(&states, &actions, &mut policy, &CancelToken::new());
    assert!(matches!(result, Err(TrainError::Policy(_))));
}

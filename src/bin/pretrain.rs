//! Behavioral-cloning pretraining on a recorded driving dataset.
//!
//! Fits the bundled linear-Gaussian policy and writes its artifact. Ctrl-C
//! stops after the current batch and still saves the artifact.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use drive_clone::core::{CancelToken, DriveConfig, TrainRng};
use drive_clone::nn::LinearGaussianPolicy;
use drive_clone::training::{load_records, BehavioralCloningTrainer, Dataset};

#[derive(Parser, Debug)]
#[command(name = "bc-pretrain", about = "Pretrain a driving policy from demonstrations")]
struct Cli {
    /// Recorded dataset.
    #[arg(long, default_value = "data/driving_data.bin")]
    data: PathBuf,

    /// Where to write the trained policy artifact.
    #[arg(long, default_value = "models/bc_policy.bin")]
    out: PathBuf,

    /// JSON config file; CLI flags override its `trainer` section.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    lr: Option<f32>,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DriveConfig::from_json_file(path)?,
        None => DriveConfig::default(),
    };
    let mut trainer_config = config.trainer.with_artifact_path(&cli.out);
    if let Some(epochs) = cli.epochs {
        trainer_config = trainer_config.with_epochs(epochs);
    }
    if let Some(batch_size) = cli.batch_size {
        trainer_config = trainer_config.with_batch_size(batch_size);
    }
    if let Some(lr) = cli.lr {
        trainer_config = trainer_config.with_learning_rate(lr);
    }
    if let Some(seed) = cli.seed {
        trainer_config = trainer_config.with_seed(seed);
    }
    let trainer = BehavioralCloningTrainer::new(trainer_config)?;

    let records = load_records(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))?;
    let Some(first) = records.first() else {
        bail!("dataset {} holds no records", cli.data.display());
    };
    let (state_dim, action_dim) = (first.state_dim(), first.action_dim());
    tracing::info!(
        "Loaded {} samples (state dim {}, action dim {})",
        records.len(),
        state_dim,
        action_dim
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, stopping after the current batch");
        handler_token.cancel();
    })
    .context("installing Ctrl-C handler")?;

    let mut rng = TrainRng::new(trainer.config().seed);
    let mut policy = LinearGaussianPolicy::new(state_dim, action_dim, &mut rng.fork());

    let (states, actions) = Dataset::from(records).into_columns();
    let report = trainer.train(&states, &actions, &mut policy, &cancel)?;

    if let Some(loss) = report.final_loss() {
        tracing::info!(
            "Finished {} epochs, final NLL {:.4}, policy std {:?}",
            report.epochs_completed(),
            loss,
            policy.std()
        );
    }
    if let Some(path) = &report.artifact_path {
        tracing::info!("Policy saved to {}", path.display());
    }
    Ok(())
}

//! Session loops: recording, free driving and policy evaluation.
//!
//! All three loops own the same cleanup contract. Whatever ends the loop
//! (target reached, cancellation, a collaborator error), the recorder is
//! finalized and persisted and the environment is closed before returning.
//! When cleanup fails after an earlier error, the earlier error is returned
//! and the cleanup failure is logged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::control::MotionClassifier;
use crate::core::{CancelToken, EnvError, MotionConfig, SessionError};
use crate::env::{Driver, Environment, StatusLine};

use super::recorder::TrajectoryRecorder;

/// Why a session loop ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    Cancelled,
}

/// Summary of a finished recording session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub accepted: usize,
    pub target: usize,
    pub stop: StopReason,
    pub ticks: usize,
    pub episodes: usize,
    /// `None` when nothing was recorded.
    pub dataset_path: Option<PathBuf>,
}

/// Summary of a free-driving or evaluation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriveReport {
    pub ticks: usize,
    pub episodes: usize,
}

#[derive(Default)]
struct LoopStats {
    ticks: usize,
    episodes: usize,
}

/// Drives an environment and feeds the recorder until the target is met or
/// the session is cancelled.
#[derive(Debug)]
pub struct RecordingSession {
    recorder: TrajectoryRecorder,
    classifier: MotionClassifier,
    label: String,
}

impl RecordingSession {
    pub fn new(recorder: TrajectoryRecorder, motion: MotionConfig) -> Self {
        Self {
            recorder,
            classifier: MotionClassifier::new(motion),
            label: "Recording".to_string(),
        }
    }

    /// Label shown at the start of each status line.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn recorder(&self) -> &TrajectoryRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> TrajectoryRecorder {
        self.recorder
    }

    /// Run the session to completion.
    ///
    /// Each tick: ask the driver for a command, step the environment, read
    /// the post-step motion and offer `(pre-step observation, command)` to
    /// the recorder. Finished episodes are reset and recording continues.
    ///
    /// A session runs once. Calling `run` again fails with
    /// [`SessionError::AlreadyFinished`] without stepping `env` or touching
    /// the saved dataset; `env` is still closed.
    pub fn run<E, D>(
        &mut self,
        env: &mut E,
        driver: &mut D,
        cancel: &CancelToken,
    ) -> Result<SessionReport, SessionError>
    where
        E: Environment + ?Sized,
        D: Driver + ?Sized,
    {
        if self.recorder.is_finalized() {
            warn!("recording session already finished");
            return close_after(env, Err(SessionError::AlreadyFinished));
        }

        info!(
            target_count = self.recorder.target(),
            threshold = self.recorder.config().motion_threshold,
            "recording session started"
        );

        let outcome = self.record_loop(env, driver, cancel);

        let path = self.recorder.config().output_path.clone();
        let persisted = self.recorder.persist(&path);
        let result = match (outcome, persisted) {
            (Ok(stats), Ok(written)) => Ok((stats, written)),
            (Ok(_), Err(e)) => Err(SessionError::from(e)),
            (Err(e), Ok(_)) => Err(SessionError::from(e)),
            (Err(e), Err(pe)) => {
                warn!(error = %pe, "failed to persist dataset after session error");
                Err(SessionError::from(e))
            }
        };
        let ((stats, stop), written) = close_after(env, result)?;

        let accepted = self.recorder.accepted();
        let dataset_path = if written > 0 {
            info!(records = written, path = %path.display(), "dataset saved");
            Some(path)
        } else {
            warn!("zero records collected; no dataset written");
            remove_stale_dataset(&path);
            None
        };

        Ok(SessionReport {
            accepted,
            target: self.recorder.target(),
            stop,
            ticks: stats.ticks,
            episodes: stats.episodes,
            dataset_path,
        })
    }

    fn record_loop<E, D>(
        &mut self,
        env: &mut E,
        driver: &mut D,
        cancel: &CancelToken,
    ) -> Result<(LoopStats, StopReason), EnvError>
    where
        E: Environment + ?Sized,
        D: Driver + ?Sized,
    {
        let mut stats = LoopStats::default();
        let mut observation = env.reset()?.observation;

        let stop = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if self.recorder.is_complete() {
                break StopReason::TargetReached;
            }

            let command = driver.act(&observation, &env.telemetry())?;
            let outcome = env.step(command)?;
            let motion = self.classifier.classify_telemetry(&env.telemetry());
            self.recorder
                .on_step(&observation, &command.to_action(), motion.signed_speed);

            env.render(&StatusLine {
                label: self.label.clone(),
                signed_speed: motion.signed_speed,
                command,
                reward: None,
                recorded: Some((self.recorder.accepted(), self.recorder.target())),
            });
            stats.ticks += 1;

            if outcome.done() {
                stats.episodes += 1;
                debug!(episode = stats.episodes, "episode finished, resetting");
                observation = env.reset()?.observation;
            } else {
                observation = outcome.observation;
            }
        };

        match stop {
            StopReason::Cancelled => warn!(
                accepted = self.recorder.accepted(),
                "recording cancelled before target"
            ),
            StopReason::TargetReached => info!("recording target reached"),
        }
        Ok((stats, stop))
    }
}

/// Delete a dataset left at `path` by an earlier session so it is not
/// mistaken for this one's output.
fn remove_stale_dataset(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!(path = %path.display(), "removed stale dataset from an earlier session"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale dataset"),
    }
}

/// Drive without recording until cancelled. Episodes reset automatically.
///
/// The status overlay is labelled with [`Driver::label`].
pub fn run_drive<E, D>(
    env: &mut E,
    driver: &mut D,
    motion: MotionConfig,
    cancel: &CancelToken,
) -> Result<DriveReport, SessionError>
where
    E: Environment + ?Sized,
    D: Driver + ?Sized,
{
    let result = drive_loop(env, driver, &MotionClassifier::new(motion), cancel);
    close_after(env, result.map_err(SessionError::from))
}

fn drive_loop<E, D>(
    env: &mut E,
    driver: &mut D,
    classifier: &MotionClassifier,
    cancel: &CancelToken,
) -> Result<DriveReport, EnvError>
where
    E: Environment + ?Sized,
    D: Driver + ?Sized,
{
    let mut report = DriveReport::default();
    let mut observation = env.reset()?.observation;
    while !cancel.is_cancelled() {
        let command = driver.act(&observation, &env.telemetry())?;
        let outcome = env.step(command)?;
        let motion = classifier.classify_telemetry(&env.telemetry());
        env.render(&StatusLine {
            label: driver.label().to_string(),
            signed_speed: motion.signed_speed,
            command,
            reward: None,
            recorded: None,
        });
        report.ticks += 1;

        if outcome.done() {
            report.episodes += 1;
            debug!(episode = report.episodes, "episode finished, resetting");
            observation = env.reset()?.observation;
        } else {
            observation = outcome.observation;
        }
    }
    Ok(report)
}

/// Run `episodes` full episodes and return the total reward of each.
///
/// Cancellation stops after the current tick; the unfinished episode is not
/// reported. Each tick renders the driver's label, speed and the episode's
/// reward so far.
pub fn evaluate_policy<E, D>(
    env: &mut E,
    driver: &mut D,
    episodes: usize,
    cancel: &CancelToken,
) -> Result<Vec<f32>, SessionError>
where
    E: Environment + ?Sized,
    D: Driver + ?Sized,
{
    let result = evaluate_loop(env, driver, episodes, cancel);
    close_after(env, result.map_err(SessionError::from))
}

fn evaluate_loop<E, D>(
    env: &mut E,
    driver: &mut D,
    episodes: usize,
    cancel: &CancelToken,
) -> Result<Vec<f32>, EnvError>
where
    E: Environment + ?Sized,
    D: Driver + ?Sized,
{
    let classifier = MotionClassifier::default();
    let mut totals = Vec::with_capacity(episodes);
    for episode in 1..=episodes {
        let mut observation = env.reset()?.observation;
        let mut total = 0.0f32;
        loop {
            if cancel.is_cancelled() {
                warn!(completed = totals.len(), "evaluation cancelled");
                return Ok(totals);
            }
            let command = driver.act(&observation, &env.telemetry())?;
            let outcome = env.step(command)?;
            total += outcome.reward;
            let motion = classifier.classify_telemetry(&env.telemetry());
            env.render(&StatusLine {
                label: driver.label().to_string(),
                signed_speed: motion.signed_speed,
                command,
                reward: Some(total),
                recorded: None,
            });
            if outcome.done() {
                break;
            }
            observation = outcome.observation;
        }
        info!("Episode {}: total reward = {:.2}", episode, total);
        totals.push(total);
    }
    Ok(totals)
}

/// Close `env` and combine the outcome with `result`. An earlier error wins
/// over a close failure.
fn close_after<E, T>(env: &mut E, result: Result<T, SessionError>) -> Result<T, SessionError>
where
    E: Environment + ?Sized,
{
    let closed = env.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "failed to close environment after session error");
            Err(e)
        }
    }
}

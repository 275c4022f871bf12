//! Collaborator contracts: the simulator, the key poller, and action sources.
//!
//! The crate never simulates a vehicle. A simulator binding implements
//! [`Environment`], a keyboard or gamepad binding implements
//! [`InputSource`], and the session loop drives both.

pub mod driver;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::control::{ControlCommand, KeyState};
use crate::core::EnvError;

pub use driver::{Driver, ManualDriver, PolicyDriver};

/// Free-form diagnostic values returned alongside observations.
pub type EnvInfo = FxHashMap<String, f64>;

/// Vehicle telemetry read once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Telemetry {
    /// Unsigned speed as reported by the simulator.
    pub speed: f32,
    /// Heading angle in radians.
    pub heading: f32,
    /// Planar velocity vector.
    pub velocity: [f32; 2],
}

/// Result of resetting an environment.
#[derive(Clone, Debug, Default)]
pub struct ResetOutcome {
    pub observation: Vec<f32>,
    pub info: EnvInfo,
}

/// Result of applying one command.
#[derive(Clone, Debug, Default)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: EnvInfo,
}

impl StepOutcome {
    /// Episode ended for any reason.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Text overlay handed to `render` each tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusLine {
    pub label: String,
    pub signed_speed: f32,
    pub command: ControlCommand,
    /// Reward accumulated in the current episode, shown while evaluating.
    pub reward: Option<f32>,
    pub recorded: Option<(usize, usize)>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Speed: {:.1} | S:{:.2} T:{:.2}",
            self.label,
            self.signed_speed,
            self.command.steer(),
            self.command.throttle()
        )?;
        if let Some(reward) = self.reward {
            write!(f, " | Reward: {reward:.2}")?;
        }
        if let Some((accepted, target)) = self.recorded {
            write!(f, " | Recorded: {accepted}/{target}")?;
        }
        Ok(())
    }
}

/// A simulator the control loop can drive.
///
/// `step` is the only blocking call per tick. Failures are fatal for the
/// session; nothing is retried.
pub trait Environment {
    /// Start a new episode.
    fn reset(&mut self) -> Result<ResetOutcome, EnvError>;

    /// Apply one command and advance the simulation by one tick.
    fn step(&mut self, command: ControlCommand) -> Result<StepOutcome, EnvError>;

    /// Current vehicle telemetry.
    fn telemetry(&self) -> Telemetry;

    /// Display side effect. Correctness never depends on it.
    fn render(&mut self, _status: &StatusLine) {}

    /// Release the simulator. Called exactly once by the session loop.
    fn close(&mut self) -> Result<(), EnvError>;
}

/// Non-blocking key-state poller, sampled once per tick.
pub trait InputSource {
    fn snapshot(&mut self) -> KeyState;
}

impl<F: FnMut() -> KeyState> InputSource for F {
    fn snapshot(&mut self) -> KeyState {
        self()
    }
}

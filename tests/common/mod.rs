//! Scripted environment shared by the integration tests.

#![allow(dead_code)]

use drive_clone::control::ControlCommand;
use drive_clone::core::{CancelToken, EnvError};
use drive_clone::env::{Environment, ResetOutcome, StatusLine, StepOutcome, Telemetry};

/// Deterministic stand-in for a simulator.
///
/// The observation is `[steps taken so far]`, so a recorded state tells
/// which tick it came from. The post-step speed of step `k` is
/// `speeds[k % speeds.len()]`; negative speeds drive backwards.
pub struct ScriptedEnv {
    pub speeds: Vec<f32>,
    pub episode_len: usize,
    pub reward_per_step: f32,

    pub steps: usize,
    pub episode_steps: usize,
    pub resets: usize,
    pub closed: bool,
    pub close_calls: usize,
    pub commands: Vec<ControlCommand>,
    pub rendered: Vec<String>,

    pub fail_step_at: Option<usize>,
    pub fail_close: bool,
    pub cancel_after: Option<(usize, CancelToken)>,

    telemetry: Telemetry,
}

impl ScriptedEnv {
    pub fn new(speeds: Vec<f32>) -> Self {
        Self {
            speeds,
            episode_len: usize::MAX,
            reward_per_step: 1.0,
            steps: 0,
            episode_steps: 0,
            resets: 0,
            closed: false,
            close_calls: 0,
            commands: Vec::new(),
            rendered: Vec::new(),
            fail_step_at: None,
            fail_close: false,
            cancel_after: None,
            telemetry: Telemetry::default(),
        }
    }

    pub fn constant(speed: f32) -> Self {
        Self::new(vec![speed])
    }

    pub fn with_episode_len(mut self, len: usize) -> Self {
        self.episode_len = len;
        self
    }

    pub fn failing_step_at(mut self, step: usize) -> Self {
        self.fail_step_at = Some(step);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn cancelling_after(mut self, steps: usize, token: &CancelToken) -> Self {
        self.cancel_after = Some((steps, token.clone()));
        self
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.steps as f32]
    }
}

impl Environment for ScriptedEnv {
    fn reset(&mut self) -> Result<ResetOutcome, EnvError> {
        self.resets += 1;
        self.episode_steps = 0;
        self.telemetry = Telemetry::default();
        Ok(ResetOutcome {
            observation: self.observation(),
            info: Default::default(),
        })
    }

    fn step(&mut self, command: ControlCommand) -> Result<StepOutcome, EnvError> {
        if self.fail_step_at == Some(self.steps) {
            return Err(EnvError::Step(format!("scripted failure at {}", self.steps)));
        }

        let speed = self.speeds[self.steps % self.speeds.len()];
        self.telemetry = Telemetry {
            speed: speed.abs(),
            heading: 0.0,
            velocity: [speed, 0.0],
        };
        self.commands.push(command);
        self.steps += 1;
        self.episode_steps += 1;

        if let Some((after, token)) = &self.cancel_after {
            if self.steps >= *after {
                token.cancel();
            }
        }

        Ok(StepOutcome {
            observation: self.observation(),
            reward: self.reward_per_step,
            terminated: self.episode_steps >= self.episode_len,
            truncated: false,
            info: Default::default(),
        })
    }

    fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    fn render(&mut self, status: &StatusLine) {
        self.rendered.push(status.to_string());
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.close_calls += 1;
        self.closed = true;
        if self.fail_close {
            return Err(EnvError::Close("scripted close failure".into()));
        }
        Ok(())
    }
}

/// Driver that always applies the same command.
pub fn constant_driver(
    command: ControlCommand,
) -> impl FnMut(&[f32], &Telemetry) -> Result<ControlCommand, EnvError> {
    move |_: &[f32], _: &Telemetry| Ok(command)
}

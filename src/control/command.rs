//! Control-plane value types: key snapshots and emitted commands.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Action vector as stored in datasets. Driving actions are `[steer, throttle]`.
pub type ActionVec = SmallVec<[f32; 2]>;

/// Snapshot of which logical control keys are held this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub forward: bool,
    pub reverse: bool,
    pub brake: bool,
}

impl KeyState {
    /// No keys held.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            left: false,
            right: false,
            forward: false,
            reverse: false,
            brake: false,
        }
    }

    #[must_use]
    pub const fn with_left(mut self) -> Self {
        self.left = true;
        self
    }

    #[must_use]
    pub const fn with_right(mut self) -> Self {
        self.right = true;
        self
    }

    #[must_use]
    pub const fn with_forward(mut self) -> Self {
        self.forward = true;
        self
    }

    #[must_use]
    pub const fn with_reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub const fn with_brake(mut self) -> Self {
        self.brake = true;
        self
    }

    /// Steering target: left wins when both directions are held.
    #[must_use]
    pub fn steer_target(self) -> f32 {
        if self.left {
            1.0
        } else if self.right {
            -1.0
        } else {
            0.0
        }
    }

    /// Throttle target from the forward/reverse keys alone.
    #[must_use]
    pub fn throttle_target(self) -> f32 {
        if self.forward {
            1.0
        } else if self.reverse {
            -1.0
        } else {
            0.0
        }
    }
}

/// One tick's steering and throttle, both in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    steer: f32,
    throttle: f32,
}

impl ControlCommand {
    /// Build a command, clamping both fields into `[-1, 1]`.
    ///
    /// NaN inputs become 0.
    #[must_use]
    pub fn new(steer: f32, throttle: f32) -> Self {
        Self {
            steer: clamp_unit(steer),
            throttle: clamp_unit(throttle),
        }
    }

    /// Interpret a policy action vector `[steer, throttle]`.
    ///
    /// Missing components are treated as 0.
    #[must_use]
    pub fn from_action(action: &[f32]) -> Self {
        let steer = action.first().copied().unwrap_or(0.0);
        let throttle = action.get(1).copied().unwrap_or(0.0);
        Self::new(steer, throttle)
    }

    #[must_use]
    pub fn steer(&self) -> f32 {
        self.steer
    }

    #[must_use]
    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    /// The `[steer, throttle]` action vector recorded in datasets.
    #[must_use]
    pub fn to_action(&self) -> ActionVec {
        smallvec![self.steer, self.throttle]
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steer_target_left_priority() {
        assert_eq!(KeyState::idle().with_left().with_right().steer_target(), 1.0);
        assert_eq!(KeyState::idle().with_right().steer_target(), -1.0);
        assert_eq!(KeyState::idle().steer_target(), 0.0);
    }

    #[test]
    fn test_throttle_target() {
        assert_eq!(KeyState::idle().with_forward().throttle_target(), 1.0);
        assert_eq!(KeyState::idle().with_reverse().throttle_target(), -1.0);
        assert_eq!(KeyState::idle().with_brake().throttle_target(), 0.0);
    }

    #[test]
    fn test_command_clamps() {
        let cmd = ControlCommand::new(3.0, -7.5);
        assert_eq!(cmd.steer(), 1.0);
        assert_eq!(cmd.throttle(), -1.0);

        let cmd = ControlCommand::new(f32::NAN, 0.25);
        assert_eq!(cmd.steer(), 0.0);
        assert_eq!(cmd.throttle(), 0.25);
    }

    #[test]
    fn test_command_action_vector() {
        let cmd = ControlCommand::new(0.5, -0.25);
        assert_eq!(cmd.to_action().as_slice(), &[0.5, -0.25]);
        assert_eq!(ControlCommand::from_action(&cmd.to_action()), cmd);
    }

    #[test]
    fn test_from_short_action() {
        let cmd = ControlCommand::from_action(&[0.4]);
        assert_eq!(cmd.steer(), 0.4);
        assert_eq!(cmd.throttle(), 0.0);

        assert_eq!(ControlCommand::from_action(&[]), ControlCommand::default());
    }
}

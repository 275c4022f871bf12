//! Recorded demonstration data.
//!
//! A [`StepRecord`] pairs the observation seen before a tick with the command
//! applied during that tick. A [`Dataset`] is the ordered, append-only list
//! of records collected in one session.

use serde::{Deserialize, Serialize};

use crate::control::ActionVec;

/// One demonstration sample.
///
/// `action` is exactly the command applied to transition away from `state`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Observation before the command was applied.
    pub state: Vec<f32>,

    /// Applied command as `[steer, throttle]`.
    pub action: ActionVec,
}

impl StepRecord {
    pub fn new(state: Vec<f32>, action: ActionVec) -> Self {
        Self { state, action }
    }

    pub fn state_dim(&self) -> usize {
        self.state.len()
    }

    pub fn action_dim(&self) -> usize {
        self.action.len()
    }
}

/// Ordered demonstration records from one session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<StepRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    /// Split into the aligned `(states, actions)` columns the trainer takes.
    pub fn into_columns(self) -> (Vec<Vec<f32>>, Vec<ActionVec>) {
        self.records
            .into_iter()
            .map(|r| (r.state, r.action))
            .unzip()
    }
}

impl From<Vec<StepRecord>> for Dataset {
    fn from(records: Vec<StepRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

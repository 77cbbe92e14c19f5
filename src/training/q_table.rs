//! Dense action-value table.

use serde::{Deserialize, Serialize};

use crate::core::Action;
use crate::encoding::StateId;

use super::policy::Policy;

/// Index of the first maximal value. Ties go to the lowest index.
///
/// Panics on an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    assert!(!values.is_empty(), "argmax of an empty slice");
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// `Q[state][action]`, zero-initialised, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    num_states: usize,
    values: Vec<f64>,
}

impl QTable {
    #[must_use]
    pub fn new(num_states: usize) -> Self {
        assert!(num_states > 0, "Q table needs at least one state");
        Self {
            num_states,
            values: vec![0.0; num_states * Action::COUNT],
        }
    }

    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[must_use]
    pub fn row(&self, state: StateId) -> &[f64] {
        let start = state * Action::COUNT;
        &self.values[start..start + Action::COUNT]
    }

    #[must_use]
    pub fn get(&self, state: StateId, action: Action) -> f64 {
        self.values[state * Action::COUNT + action.index()]
    }

    pub fn set(&mut self, state: StateId, action: Action, value: f64) {
        self.values[state * Action::COUNT + action.index()] = value;
    }

    /// Greedy action at `state`.
    #[must_use]
    pub fn best_action(&self, state: StateId) -> Action {
        Action::ALL[argmax(self.row(state))]
    }

    #[must_use]
    pub fn max_value(&self, state: StateId) -> f64 {
        self.row(state).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action for every state id.
    #[must_use]
    pub fn policy(&self) -> Policy {
        (0..self.num_states).map(|s| self.best_action(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[-2.0, -1.0]), 1);
    }

    #[test]
    fn test_zero_table_prefers_draw() {
        let q = QTable::new(4);
        assert_eq!(q.best_action(3), Action::Draw);
        assert_eq!(q.max_value(3), 0.0);
    }

    #[test]
    fn test_set_get_and_policy() {
        let mut q = QTable::new(3);
        q.set(1, Action::PlaySkip, 0.5);
        q.set(2, Action::Draw, -1.0);

        assert_eq!(q.get(1, Action::PlaySkip), 0.5);
        assert_eq!(q.row(1)[1], 0.5);

        let policy = q.policy();
        assert_eq!(policy.len(), 3);
        assert_eq!(policy.get(0), Some(Action::Draw));
        assert_eq!(policy.get(1), Some(Action::PlaySkip));
        assert_eq!(policy.get(2), Some(Action::PlaySkip));
    }
}

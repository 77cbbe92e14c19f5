//! Model-based planning: estimate an MDP from counts and solve it.
//!
//! Only observed `(state, action)` pairs enter the model. During value
//! iteration a state's value is the best backup over its observed actions,
//! and states never observed keep value 0.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::Action;
use crate::encoding::{StateId, DEFAULT_NUM_STATES};
use crate::error::Result;

use super::policy::Policy;
use super::q_table::argmax;
use super::transitions::{collect_transitions, CollectionConfig, TransitionCounts, TransitionRecord};

/// Maximum-likelihood estimates for one `(state, action)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionModel {
    /// Mean observed reward.
    pub reward: f64,
    /// Next-state probabilities, sorted by state id.
    pub next: Vec<(StateId, f64)>,
}

/// Estimated `T` and `R` over the observed pairs.
#[derive(Clone, Debug, Default)]
pub struct MdpModel {
    states: FxHashMap<StateId, [Option<ActionModel>; Action::COUNT]>,
}

impl MdpModel {
    /// `T[s][a][s'] = N[s][a][s'] / sum N[s][a]`, `R[s][a] = Rsum / Rcount`.
    pub fn estimate(counts: &TransitionCounts) -> Self {
        let mut states: FxHashMap<StateId, [Option<ActionModel>; Action::COUNT]> =
            FxHashMap::default();

        for (s, action, pair) in counts.iter() {
            let total = pair.visits as f64;
            let mut next: Vec<(StateId, f64)> = pair
                .next
                .iter()
                .map(|(&sp, &n)| (sp, n as f64 / total))
                .collect();
            next.sort_by_key(|&(sp, _)| sp);

            states.entry(s).or_default()[action.index()] = Some(ActionModel {
                reward: pair.mean_reward(),
                next,
            });
        }

        Self { states }
    }

    /// Observed states.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn get(&self, s: StateId, action: Action) -> Option<&ActionModel> {
        self.states.get(&s).and_then(|row| row[action.index()].as_ref())
    }

    /// `R + γ Σ T V` for each observed action at `s`, unobserved ones `None`.
    #[must_use]
    pub fn q_values(&self, s: StateId, values: &ValueFunction, gamma: f64) -> [Option<f64>; Action::COUNT] {
        let mut q = [None; Action::COUNT];
        if let Some(row) = self.states.get(&s) {
            for (slot, model) in q.iter_mut().zip(row) {
                *slot = model.as_ref().map(|m| {
                    let future: f64 = m.next.iter().map(|&(sp, p)| p * values.get(sp)).sum();
                    m.reward + gamma * future
                });
            }
        }
        q
    }

    /// Greedy action at `s` over observed actions. Draw when none were observed.
    #[must_use]
    pub fn best_action(&self, s: StateId, values: &ValueFunction, gamma: f64) -> Action {
        let q = self.q_values(s, values, gamma);
        if q.iter().all(Option::is_none) {
            return Action::Draw;
        }
        let scores: Vec<f64> = q.iter().map(|v| v.unwrap_or(f64::NEG_INFINITY)).collect();
        Action::ALL[argmax(&scores)]
    }

    /// Greedy policy over `0..num_states`.
    #[must_use]
    pub fn policy(&self, values: &ValueFunction, gamma: f64, num_states: usize) -> Policy {
        (0..num_states)
            .map(|s| self.best_action(s, values, gamma))
            .collect()
    }

    fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys().copied()
    }
}

/// Sparse state values. Missing states are worth 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueFunction {
    values: FxHashMap<StateId, f64>,
}

impl ValueFunction {
    #[must_use]
    pub fn get(&self, s: StateId) -> f64 {
        self.values.get(&s).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How value iteration ended.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueIterationReport {
    pub iterations: usize,
    pub converged: bool,
    /// Largest change in the final sweep.
    pub residual: f64,
}

/// Synchronous value iteration until the largest change drops below
/// `tolerance` or `max_iterations` sweeps have run.
pub fn value_iteration(
    model: &MdpModel,
    gamma: f64,
    tolerance: f64,
    max_iterations: usize,
) -> (ValueFunction, ValueIterationReport) {
    let mut values = ValueFunction::default();
    let mut report = ValueIterationReport {
        iterations: 0,
        converged: false,
        residual: f64::INFINITY,
    };

    while report.iterations < max_iterations {
        let mut next = FxHashMap::default();
        let mut residual: f64 = 0.0;

        for s in model.states() {
            let v = model
                .q_values(s, &values, gamma)
                .iter()
                .flatten()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            residual = residual.max((v - values.get(s)).abs());
            next.insert(s, v);
        }

        values = ValueFunction { values: next };
        report.iterations += 1;
        report.residual = residual;
        if residual < tolerance {
            report.converged = true;
            break;
        }
    }

    if report.converged {
        log::info!("value iteration converged after {} sweeps", report.iterations);
    } else {
        log::warn!(
            "value iteration stopped after {} sweeps, residual {:.3e}",
            report.iterations,
            report.residual
        );
    }
    (values, report)
}

/// Configuration for `MleTrainer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MleConfig {
    pub num_states: usize,
    pub gamma: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Used when transitions are simulated rather than loaded.
    pub collection: CollectionConfig,
}

impl Default for MleConfig {
    fn default() -> Self {
        Self {
            num_states: DEFAULT_NUM_STATES,
            gamma: 0.95,
            tolerance: 1e-6,
            max_iterations: 5000,
            collection: CollectionConfig::default(),
        }
    }
}

impl MleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also applied to the collection settings.
    pub fn with_num_states(mut self, num_states: usize) -> Self {
        self.num_states = num_states;
        self.collection.num_states = num_states;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_collection(mut self, collection: CollectionConfig) -> Self {
        self.collection = collection;
        self
    }
}

/// Count, estimate, plan.
pub struct MleTrainer {
    config: MleConfig,
    counts: TransitionCounts,
    model: MdpModel,
    values: ValueFunction,
}

impl MleTrainer {
    pub fn new(config: MleConfig) -> Self {
        Self {
            config,
            counts: TransitionCounts::new(),
            model: MdpModel::default(),
            values: ValueFunction::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MleConfig {
        &self.config
    }

    #[must_use]
    pub fn counts(&self) -> &TransitionCounts {
        &self.counts
    }

    #[must_use]
    pub fn values(&self) -> &ValueFunction {
        &self.values
    }

    /// Simulate games per the collection config and count them.
    /// Returns the records so callers can save them.
    pub fn collect(&mut self) -> Vec<TransitionRecord> {
        let records = collect_transitions(&self.config.collection);
        for r in &records {
            if let Some(action) = Action::from_index(r.a) {
                self.counts.record(r.s, action, r.r, r.sp);
            }
        }
        records
    }

    /// Count pre-recorded transitions.
    pub fn ingest(&mut self, records: &[TransitionRecord]) -> Result<()> {
        self.counts.extend(records)
    }

    /// Estimate the model from the counts so far and run value iteration.
    pub fn solve(&mut self) -> ValueIterationReport {
        self.model = MdpModel::estimate(&self.counts);
        log::info!(
            "{:<32}{:<32}",
            "estimated model",
            format!("{} states, {} pairs", self.model.num_states(), self.counts.len())
        );
        let (values, report) = value_iteration(
            &self.model,
            self.config.gamma,
            self.config.tolerance,
            self.config.max_iterations,
        );
        self.values = values;
        report
    }

    /// Greedy policy from the last `solve`.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.model
            .policy(&self.values, self.config.gamma, self.config.num_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// State 0: Draw loops back with reward 1, Skip moves to absorbing state 1 with reward 0.
    fn toy_counts() -> TransitionCounts {
        let mut counts = TransitionCounts::new();
        for _ in 0..4 {
            counts.record(0, Action::Draw, 1.0, 0);
            counts.record(0, Action::PlaySkip, 0.0, 1);
        }
        counts
    }

    #[test]
    fn test_estimate_probabilities() {
        let mut counts = TransitionCounts::new();
        counts.record(5, Action::Draw, 1.0, 6);
        counts.record(5, Action::Draw, 0.0, 6);
        counts.record(5, Action::Draw, 0.0, 7);
        counts.record(5, Action::Draw, 0.0, 8);

        let model = MdpModel::estimate(&counts);
        let draw = model.get(5, Action::Draw).unwrap();

        assert_eq!(draw.reward, 0.25);
        assert_eq!(draw.next, vec![(6, 0.5), (7, 0.25), (8, 0.25)]);
        assert!(model.get(5, Action::PlaySkip).is_none());
    }

    #[test]
    fn test_value_iteration_geometric_series() {
        let model = MdpModel::estimate(&toy_counts());
        let (values, report) = value_iteration(&model, 0.9, 1e-9, 10_000);

        assert!(report.converged);
        assert!((values.get(0) - 10.0).abs() < 1e-6);
        assert_eq!(values.get(1), 0.0);
        assert_eq!(model.best_action(0, &values, 0.9), Action::Draw);
    }

    #[test]
    fn test_iteration_cap() {
        let model = MdpModel::estimate(&toy_counts());
        let (_, report) = value_iteration(&model, 0.99, 1e-12, 3);

        assert_eq!(report.iterations, 3);
        assert!(!report.converged);
    }

    #[test]
    fn test_unvisited_states_default_to_draw() {
        let mut counts = TransitionCounts::new();
        counts.record(1, Action::PlayCat, -0.5, 2);
        counts.record(1, Action::PlayNope, -0.1, 2);

        let mut trainer = MleTrainer::new(MleConfig::new().with_num_states(3));
        trainer.counts = counts;
        trainer.solve();
        let policy = trainer.policy();

        assert_eq!(policy.len(), 3);
        assert_eq!(policy.get(0), Some(Action::Draw));
        // Only observed actions compete, even when all are negative.
        assert_eq!(policy.get(1), Some(Action::PlayNope));
        assert_eq!(policy.get(2), Some(Action::Draw));
    }

    #[test]
    fn test_trainer_from_simulation() {
        let collection = CollectionConfig::new().with_games(20).with_seed(3);
        let config = MleConfig::new()
            .with_collection(collection)
            .with_num_states(2000);
        let mut trainer = MleTrainer::new(config);

        let records = trainer.collect();
        let report = trainer.solve();

        assert_eq!(trainer.counts().total(), records.len() as u64);
        assert!(report.iterations >= 1);
        assert_eq!(trainer.policy().len(), 2000);
    }
}

//! Agent kinds and the policies that back them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{Action, GameRng};
use crate::encoding::StateId;
use crate::env::random_action;
use crate::error::Result;
use crate::training::Policy;

/// How a seat picks its moves when asked for an AI move.
///
/// Parsed leniently: anything unrecognised plays at random.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentKind {
    QLearning,
    Mle,
    #[default]
    Random,
}

impl AgentKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AgentKind::QLearning => "qlearning",
            AgentKind::Mle => "mle",
            AgentKind::Random => "random",
        }
    }
}

impl From<&str> for AgentKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "qlearning" => AgentKind::QLearning,
            "mle" => AgentKind::Mle,
            _ => AgentKind::Random,
        }
    }
}

impl From<String> for AgentKind {
    fn from(s: String) -> Self {
        AgentKind::from(s.as_str())
    }
}

impl From<AgentKind> for String {
    fn from(kind: AgentKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved way of choosing an action.
#[derive(Clone, Copy, Debug)]
pub enum Strategy<'a> {
    Table(&'a Policy),
    /// Uniform over all eight action ids.
    Uniform,
}

impl Strategy<'_> {
    /// Table lookup, or a uniform draw when the id is past the table.
    pub fn choose(&self, state: StateId, rng: &mut GameRng) -> Action {
        match self {
            Strategy::Table(policy) => match policy.get(state) {
                Some(action) => action,
                None => {
                    log::debug!("state {} outside a {} row policy", state, policy.len());
                    random_action(rng)
                }
            },
            Strategy::Uniform => random_action(rng),
        }
    }
}

/// Where the table-driven agents' policies live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyPaths {
    pub qlearning: Option<PathBuf>,
    pub mle: Option<PathBuf>,
}

impl Default for PolicyPaths {
    fn default() -> Self {
        Self {
            qlearning: Some(PathBuf::from("policy_q.txt")),
            mle: Some(PathBuf::from("policy_mle.txt")),
        }
    }
}

/// Policies loaded once at start-up.
#[derive(Clone, Debug, Default)]
pub struct PolicyBook {
    qlearning: Option<Policy>,
    mle: Option<Policy>,
}

impl PolicyBook {
    /// No policies: every table kind plays at random.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every configured path, failing on the first error.
    pub fn load(paths: &PolicyPaths) -> Result<Self> {
        let load = |path: &Option<PathBuf>| path.as_ref().map(Policy::load).transpose();
        Ok(Self {
            qlearning: load(&paths.qlearning)?,
            mle: load(&paths.mle)?,
        })
    }

    /// Load what can be loaded. Failures are logged and leave the slot empty.
    pub fn load_or_empty(paths: &PolicyPaths) -> Self {
        let load = |kind: AgentKind, path: &Option<PathBuf>| {
            let path = path.as_ref()?;
            match Policy::load(path) {
                Ok(policy) => {
                    log::info!("loaded {} policy from {}", kind, path.display());
                    Some(policy)
                }
                Err(e) => {
                    log::warn!("could not load {} policy from {}: {}", kind, path.display(), e);
                    None
                }
            }
        };
        Self {
            qlearning: load(AgentKind::QLearning, &paths.qlearning),
            mle: load(AgentKind::Mle, &paths.mle),
        }
    }

    pub fn with_policy(mut self, kind: AgentKind, policy: Policy) -> Self {
        match kind {
            AgentKind::QLearning => self.qlearning = Some(policy),
            AgentKind::Mle => self.mle = Some(policy),
            AgentKind::Random => {}
        }
        self
    }

    #[must_use]
    pub fn policy(&self, kind: AgentKind) -> Option<&Policy> {
        match kind {
            AgentKind::QLearning => self.qlearning.as_ref(),
            AgentKind::Mle => self.mle.as_ref(),
            AgentKind::Random => None,
        }
    }

    /// The strategy for `kind`. Table kinds without a policy play uniformly.
    #[must_use]
    pub fn strategy(&self, kind: AgentKind) -> Strategy<'_> {
        match (kind, self.policy(kind)) {
            (AgentKind::Random, _) => Strategy::Uniform,
            (_, Some(policy)) => Strategy::Table(policy),
            (_, None) => {
                log::warn!("no {} policy loaded, playing at random", kind);
                Strategy::Uniform
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_parsing() {
        assert_eq!(AgentKind::from("qlearning"), AgentKind::QLearning);
        assert_eq!(AgentKind::from(" MLE "), AgentKind::Mle);
        assert_eq!(AgentKind::from("random"), AgentKind::Random);
        assert_eq!(AgentKind::from("minimax"), AgentKind::Random);
        assert_eq!(AgentKind::from(""), AgentKind::Random);
    }

    #[test]
    fn test_agent_kind_json() {
        let kinds: Vec<AgentKind> = serde_json::from_str(r#"["mle", "human", "qlearning"]"#).unwrap();
        assert_eq!(kinds, vec![AgentKind::Mle, AgentKind::Random, AgentKind::QLearning]);
        assert_eq!(serde_json::to_string(&AgentKind::QLearning).unwrap(), r#""qlearning""#);
    }

    #[test]
    fn test_strategy_resolution() {
        let book = PolicyBook::empty().with_policy(AgentKind::Mle, Policy::constant(4, Action::PlayNope));
        let mut rng = GameRng::new(0);

        assert!(matches!(book.strategy(AgentKind::Random), Strategy::Uniform));
        assert!(matches!(book.strategy(AgentKind::QLearning), Strategy::Uniform));

        let mle = book.strategy(AgentKind::Mle);
        assert_eq!(mle.choose(2, &mut rng), Action::PlayNope);
        // Past the table: uniform fallback, still a valid action.
        assert!(mle.choose(99, &mut rng).index() < Action::COUNT);
    }

    #[test]
    fn test_load_missing_file() {
        let paths = PolicyPaths {
            qlearning: Some(PathBuf::from("/nonexistent/policy_q.txt")),
            mle: None,
        };
        assert!(PolicyBook::load(&paths).is_err());

        let book = PolicyBook::load_or_empty(&paths);
        assert!(book.policy(AgentKind::QLearning).is_none());
    }
}

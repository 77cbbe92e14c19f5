//! Exploration rate schedules.

use serde::{Deserialize, Serialize};

/// Exploration rate as a function of the episode index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonSchedule {
    Fixed { epsilon: f64 },

    /// Falls by `(start - end) / episodes` per episode, floored at `end`.
    Linear { start: f64, end: f64 },

    /// `max(end, start * decay^episode)`.
    Exponential { start: f64, end: f64, decay: f64 },
}

impl EpsilonSchedule {
    /// Epsilon for `episode` out of `total_episodes`.
    #[must_use]
    pub fn value(&self, episode: usize, total_episodes: usize) -> f64 {
        match *self {
            EpsilonSchedule::Fixed { epsilon } => epsilon,
            EpsilonSchedule::Linear { start, end } => {
                let step = (start - end) / total_episodes.max(1) as f64;
                (start - step * episode as f64).max(end)
            }
            EpsilonSchedule::Exponential { start, end, decay } => {
                (start * decay.powf(episode as f64)).max(end)
            }
        }
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        match *self {
            EpsilonSchedule::Fixed { epsilon } => epsilon,
            EpsilonSchedule::Linear { start, .. } | EpsilonSchedule::Exponential { start, .. } => {
                start
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed() {
        let s = EpsilonSchedule::Fixed { epsilon: 0.2 };
        assert_eq!(s.value(0, 10), 0.2);
        assert_eq!(s.value(9, 10), 0.2);
    }

    #[test]
    fn test_linear_reaches_end() {
        let s = EpsilonSchedule::Linear { start: 0.3, end: 0.05 };
        assert_eq!(s.value(0, 100), 0.3);
        assert!((s.value(50, 100) - 0.175).abs() < 1e-12);
        assert!((s.value(100, 100) - 0.05).abs() < 1e-12);
        assert_eq!(s.value(500, 100), 0.05);
    }

    #[test]
    fn test_exponential_floors() {
        let s = EpsilonSchedule::Exponential {
            start: 0.3,
            end: 0.01,
            decay: 0.9995,
        };
        assert_eq!(s.value(0, 1), 0.3);
        assert!((s.value(1, 1) - 0.3 * 0.9995).abs() < 1e-12);
        assert_eq!(s.value(100_000, 1), 0.01);
    }
}

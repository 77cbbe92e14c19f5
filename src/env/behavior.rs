//! Fixed action-selection rules for opponents and data collection.

use serde::{Deserialize, Serialize};

use crate::core::{Action, Card, GameRng};

/// Chance that `Baseline` plays a held Attack instead of drawing.
pub const BASELINE_ATTACK_PROB: f64 = 0.05;

/// A hand-written policy that needs no table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Behavior {
    /// Uniform over all eight actions, held or not.
    Random,
    /// Skip if held, occasionally Attack if held, otherwise Draw.
    #[default]
    Baseline,
    /// `Random` with probability `random_prob`, `Baseline` otherwise.
    Mixed { random_prob: f64 },
}

impl Behavior {
    /// Pick an action for a player holding `hand`.
    pub fn choose(&self, hand: &[Card], rng: &mut GameRng) -> Action {
        match *self {
            Behavior::Random => random_action(rng),
            Behavior::Baseline => baseline_action(hand, rng),
            Behavior::Mixed { random_prob } => {
                if rng.gen_bool(random_prob) {
                    random_action(rng)
                } else {
                    baseline_action(hand, rng)
                }
            }
        }
    }
}

/// Uniform over `Action::ALL`.
pub fn random_action(rng: &mut GameRng) -> Action {
    Action::ALL[rng.gen_range_usize(0..Action::COUNT)]
}

fn baseline_action(hand: &[Card], rng: &mut GameRng) -> Action {
    if hand.contains(&Card::Skip) {
        Action::PlaySkip
    } else if hand.contains(&Card::Attack) && rng.gen_bool(BASELINE_ATTACK_PROB) {
        Action::PlayAttack
    } else {
        Action::Draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_prefers_skip() {
        let mut rng = GameRng::new(1);
        let hand = [Card::Attack, Card::Skip];
        for _ in 0..20 {
            assert_eq!(Behavior::Baseline.choose(&hand, &mut rng), Action::PlaySkip);
        }
    }

    #[test]
    fn test_baseline_mostly_draws_without_skip() {
        let mut rng = GameRng::new(2);
        let hand = [Card::Attack, Card::Cat];
        let draws = (0..1000)
            .filter(|_| Behavior::Baseline.choose(&hand, &mut rng) == Action::Draw)
            .count();
        assert!(draws > 900, "draws = {draws}");
        assert!(draws < 1000);
    }

    #[test]
    fn test_baseline_never_attacks_without_card() {
        let mut rng = GameRng::new(3);
        for _ in 0..200 {
            assert_eq!(Behavior::Baseline.choose(&[Card::Cat], &mut rng), Action::Draw);
        }
    }

    #[test]
    fn test_random_covers_every_action() {
        let mut rng = GameRng::new(4);
        let mut seen = [false; Action::COUNT];
        for _ in 0..500 {
            seen[Behavior::Random.choose(&[], &mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_mixed_zero_is_baseline() {
        let mut rng = GameRng::new(5);
        let mixed = Behavior::Mixed { random_prob: 0.0 };
        assert_eq!(mixed.choose(&[Card::Skip], &mut rng), Action::PlaySkip);
    }

    #[test]
    fn test_behavior_json() {
        let json = serde_json::to_string(&Behavior::Mixed { random_prob: 0.2 }).unwrap();
        assert_eq!(json, r#"{"kind":"mixed","random_prob":0.2}"#);
        let back: Behavior = serde_json::from_str(r#"{"kind":"random"}"#).unwrap();
        assert_eq!(back, Behavior::Random);
    }
}

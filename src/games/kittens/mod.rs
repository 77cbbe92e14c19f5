//! Exploding Kittens style engine.
//!
//! A simplified rule set built for tractable learning rather than rules
//! fidelity: Nope cancels nothing, Cat has no combos, Attack only records a
//! pending draw count.
//!
//! ## Usage
//!
//! ```
//! use kitten_rl::core::Action;
//! use kitten_rl::games::kittens::KittensGameBuilder;
//!
//! let mut game = KittensGameBuilder::new().player_count(3).build(7);
//! while !game.is_over() {
//!     game.step(Action::Draw);
//! }
//! ```

mod game;
mod outcome;

pub use game::{GameSnapshot, KittensGame, KittensGameBuilder, ATTACK_DRAWS};
pub use outcome::{EndReason, GameResult, StepInfo, StepOutcome};

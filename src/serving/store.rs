//! In-memory registry of served games.
//!
//! The id map sits behind an `RwLock` and each game behind its own `Mutex`:
//! requests for different games never wait on each other, requests for the
//! same game are serialised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::{check_player_count, Action, Card, GameConfig, GameRng, GameRngState, PlayerId};
use crate::encoding::{HashedEncoder, StateEncoder, DEFAULT_NUM_STATES};
use crate::error::{Error, Result};
use crate::games::kittens::{GameResult, GameSnapshot, KittensGame, StepInfo};

use super::agent::{AgentKind, PolicyBook};
use super::GameId;

/// A served game plus its seat assignments.
struct ManagedGame {
    game: KittensGame,
    agents: Vec<AgentKind>,
    /// AI move sampling.
    rng: GameRng,
}

/// Public view of a served game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: GameId,
    pub players: usize,
    pub hands: Vec<Vec<Card>>,
    pub defuse_counts: Vec<u32>,
    pub is_alive: Vec<bool>,
    pub discard: Vec<Card>,
    pub turn: PlayerId,
    pub attack_counter: u32,
    pub deck_size: usize,
    pub agents: Vec<AgentKind>,
    pub result: Option<GameResult>,
    pub steps: u64,
}

/// Reply to a move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub player: PlayerId,
    pub action: Action,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
    pub view: GameView,
}

/// Binary export format.
#[derive(Serialize, Deserialize)]
struct StoredGame {
    snapshot: GameSnapshot,
    agents: Vec<AgentKind>,
    rng: GameRngState,
}

impl ManagedGame {
    fn view(&self, game_id: GameId) -> GameView {
        let state = self.game.state();
        GameView {
            game_id,
            players: self.game.player_count(),
            hands: state.hands.values().map(|h| h.to_vec()).collect(),
            defuse_counts: state.defuse_counts.values().copied().collect(),
            is_alive: state.alive.values().copied().collect(),
            discard: state.discard.clone(),
            turn: state.turn,
            attack_counter: state.attack_counter,
            deck_size: state.deck.len(),
            agents: self.agents.clone(),
            result: self.game.result(),
            steps: self.game.steps(),
        }
    }

    fn apply(&mut self, game_id: GameId, action: Action) -> Result<MoveResponse> {
        if self.game.is_over() {
            return Err(Error::GameOver(game_id));
        }
        let player = self.game.current_player();
        let outcome = self.game.step(action);
        Ok(MoveResponse {
            player,
            action,
            reward: outcome.reward,
            done: outcome.done,
            info: outcome.info,
            view: self.view(game_id),
        })
    }
}

/// All games currently served.
pub struct GameStore {
    games: RwLock<HashMap<GameId, Arc<Mutex<ManagedGame>>>>,
    next_id: AtomicU64,
    encoder: HashedEncoder,
    config: GameConfig,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new(GameConfig::default(), DEFAULT_NUM_STATES)
    }
}

impl GameStore {
    /// `config` is the template for new games; its player count is overridden per game.
    pub fn new(config: GameConfig, num_states: usize) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            encoder: HashedEncoder::new(num_states),
            config,
        }
    }

    fn insert(&self, managed: ManagedGame) -> GameId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.games
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(managed)));
        id
    }

    fn handle(&self, id: GameId) -> Result<Arc<Mutex<ManagedGame>>> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(Error::GameNotFound(id))
    }

    fn with_game<T>(&self, id: GameId, f: impl FnOnce(&mut ManagedGame) -> Result<T>) -> Result<T> {
        let handle = self.handle(id)?;
        let mut managed = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut managed)
    }

    /// Deal a new game. Missing agent entries default to `Random`, extras are dropped.
    pub fn create(&self, players: usize, mut agents: Vec<AgentKind>, seed: Option<u64>) -> Result<GameId> {
        check_player_count(players)?;
        agents.resize(players, AgentKind::Random);

        let seed = seed.unwrap_or_else(|| self.next_id.load(Ordering::Relaxed));
        let mut rng = GameRng::new(seed);
        let config = self.config.clone().with_player_count(players);
        let game = KittensGame::new(config, rng.fork());

        let id = self.insert(ManagedGame { game, agents, rng });
        log::info!("created game {} with {} players", id, players);
        Ok(id)
    }

    pub fn view(&self, id: GameId) -> Result<GameView> {
        self.with_game(id, |m| Ok(m.view(id)))
    }

    /// Let the current seat's agent choose and play.
    pub fn ai_move(&self, id: GameId, book: &PolicyBook) -> Result<MoveResponse> {
        let encoder = self.encoder;
        self.with_game(id, |m| {
            if m.game.is_over() {
                return Err(Error::GameOver(id));
            }
            let player = m.game.current_player();
            let kind = m.agents[player.index()];
            let state = encoder.encode(&m.game.canonical_state(player));
            let action = book.strategy(kind).choose(state, &mut m.rng);
            log::debug!("game {}: {} ({}) plays {}", id, player, kind, action);
            m.apply(id, action)
        })
    }

    /// Play `action` for the current seat.
    pub fn play(&self, id: GameId, action: Action) -> Result<MoveResponse> {
        self.with_game(id, |m| m.apply(id, action))
    }

    /// Pass to the next alive seat without stepping.
    pub fn end_turn(&self, id: GameId) -> Result<GameView> {
        self.with_game(id, |m| {
            if m.game.is_over() {
                return Err(Error::GameOver(id));
            }
            m.game.end_turn();
            Ok(m.view(id))
        })
    }

    /// Redeal with the same seats.
    pub fn reset(&self, id: GameId) -> Result<GameView> {
        self.with_game(id, |m| {
            m.game.reset();
            Ok(m.view(id))
        })
    }

    pub fn remove(&self, id: GameId) -> Result<()> {
        self.games
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|_| log::info!("removed game {}", id))
            .ok_or(Error::GameNotFound(id))
    }

    /// Serialize a game, RNG position included.
    pub fn export(&self, id: GameId) -> Result<Vec<u8>> {
        self.with_game(id, |m| {
            let stored = StoredGame {
                snapshot: m.game.snapshot(),
                agents: m.agents.clone(),
                rng: m.rng.state(),
            };
            Ok(bincode::serialize(&stored)?)
        })
    }

    /// Register an exported game under a fresh id.
    ///
    /// Seat assignments are fitted to the table like `create` does.
    pub fn import(&self, bytes: &[u8]) -> Result<GameId> {
        let stored: StoredGame = bincode::deserialize(bytes)?;
        let players = stored.snapshot.config.player_count;
        let mut agents = stored.agents;
        if agents.len() != players {
            log::warn!(
                "imported game lists {} agents for {} seats, refitting",
                agents.len(),
                players
            );
            agents.resize(players, AgentKind::Random);
        }
        let managed = ManagedGame {
            game: KittensGame::from_snapshot(stored.snapshot),
            agents,
            rng: GameRng::from_state(&stored.rng),
        };
        Ok(self.insert(managed))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

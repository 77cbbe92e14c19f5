//! Seats at the table and per-seat storage.
//!
//! ## PlayerId
//!
//! Zero-based seat index. Turn order is seat order, wrapping around.
//!
//! ## PlayerMap
//!
//! One value per seat, backed by a `Vec` and indexed by `PlayerId`.
//! The engine keeps hands, defuse counts and alive flags in these.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Seat index of a player. The first player to act after a reset is `PlayerId(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw seat index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat after this one, wrapping at `player_count`.
    ///
    /// ```
    /// use kitten_rl::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::new(1).successor(3), PlayerId::new(2));
    /// assert_eq!(PlayerId::new(2).successor(3), PlayerId::new(0));
    /// ```
    #[must_use]
    pub fn successor(self, player_count: usize) -> Self {
        Self(((self.index() + 1) % player_count) as u8)
    }

    /// Iterate over all seats of a `player_count` table.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-seat storage with O(1) access.
///
/// ```
/// use kitten_rl::core::{PlayerId, PlayerMap};
///
/// let mut alive: PlayerMap<bool> = PlayerMap::with_value(3, true);
/// alive[PlayerId::new(1)] = false;
///
/// assert_eq!(alive.count_where(|a| *a), 2);
/// assert_eq!(alive.bitmask(|a| *a), 0b101);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Build with a value per seat from a factory.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 32, "At most 32 players supported");

        let data = (0..player_count as u8).map(|i| factory(PlayerId(i))).collect();

        Self { data }
    }

    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over `(PlayerId, &T)` in seat order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over values in seat order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Number of seats whose value satisfies `predicate`.
    pub fn count_where(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.data.iter().filter(|v| predicate(v)).count()
    }

    /// First seat whose value satisfies `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<PlayerId> {
        self.data
            .iter()
            .position(predicate)
            .map(|i| PlayerId(i as u8))
    }

    /// Bit `i` is set when seat `i` satisfies `predicate`.
    pub fn bitmask(&self, predicate: impl Fn(&T) -> bool) -> u32 {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| predicate(v))
            .fold(0u32, |mask, (i, _)| mask | (1 << i))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_wraps() {
        assert_eq!(PlayerId::new(0).successor(5), PlayerId::new(1));
        assert_eq!(PlayerId::new(4).successor(5), PlayerId::new(0));
        assert_eq!(format!("{}", PlayerId::new(3)), "Player 3");
    }

    #[test]
    fn test_player_map_new() {
        let map: PlayerMap<i32> = PlayerMap::new(4, |p| p.index() as i32 * 10);

        assert_eq!(map[PlayerId::new(0)], 0);
        assert_eq!(map[PlayerId::new(3)], 30);
        assert_eq!(map.player_count(), 4);
    }

    #[test]
    fn test_player_map_queries() {
        let mut alive: PlayerMap<bool> = PlayerMap::with_value(5, true);
        alive[PlayerId::new(0)] = false;
        alive[PlayerId::new(3)] = false;

        assert_eq!(alive.count_where(|a| *a), 3);
        assert_eq!(alive.find(|a| *a), Some(PlayerId::new(1)));
        assert_eq!(alive.bitmask(|a| *a), 0b10110);
    }

    #[test]
    fn test_player_map_iter() {
        let map: PlayerMap<i32> = PlayerMap::new(3, |p| p.index() as i32);

        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs[2], (PlayerId::new(2), &2));
        assert_eq!(map.values().sum::<i32>(), 3);
    }

    #[test]
    fn test_player_map_serialization() {
        let map: PlayerMap<u32> = PlayerMap::new(2, |p| p.index() as u32 + 1);
        let json = serde_json::to_string(&map).unwrap();
        let deserialized: PlayerMap<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, deserialized);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_player_map_zero_players() {
        let _: PlayerMap<i32> = PlayerMap::with_value(0, 0);
    }
}

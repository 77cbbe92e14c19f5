//! Per-episode training statistics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Rolling-window size used by the trainers.
pub const DEFAULT_WINDOW: usize = 100;

/// When and how a trainer reports progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Episodes in the rolling window.
    pub window: usize,

    /// Log every this many episodes. 0 disables progress logging.
    pub log_interval: usize,

    /// Stop once the rolling win rate exceeds this over a full window.
    pub early_stop_win_rate: Option<f64>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            log_interval: 500,
            early_stop_win_rate: None,
        }
    }
}

impl ProgressConfig {
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_early_stop(mut self, win_rate: Option<f64>) -> Self {
        self.early_stop_win_rate = win_rate;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }
}

/// One finished episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub reward: f64,
    pub length: usize,
    pub won: bool,
    pub truncated: bool,
}

/// Training history plus the rolling window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episode_rewards: Vec<f64>,
    pub episode_lengths: Vec<usize>,
    pub wins: usize,
    pub truncations: usize,
    /// Set when training ended on the win-rate threshold.
    pub stopped_early: bool,

    #[serde(skip)]
    progress: ProgressConfig,
    #[serde(skip)]
    recent_rewards: VecDeque<f64>,
    #[serde(skip)]
    recent_wins: VecDeque<bool>,
}

impl TrainingReport {
    pub fn new(progress: ProgressConfig) -> Self {
        Self {
            episode_rewards: Vec::new(),
            episode_lengths: Vec::new(),
            wins: 0,
            truncations: 0,
            stopped_early: false,
            progress,
            recent_rewards: VecDeque::with_capacity(progress.window),
            recent_wins: VecDeque::with_capacity(progress.window),
        }
    }

    #[must_use]
    pub fn episodes(&self) -> usize {
        self.episode_rewards.len()
    }

    /// Record an episode. Returns true when training should stop early.
    pub fn record(&mut self, stats: EpisodeStats) -> bool {
        self.episode_rewards.push(stats.reward);
        self.episode_lengths.push(stats.length);
        self.wins += usize::from(stats.won);
        self.truncations += usize::from(stats.truncated);

        if self.recent_rewards.len() == self.progress.window {
            self.recent_rewards.pop_front();
            self.recent_wins.pop_front();
        }
        self.recent_rewards.push_back(stats.reward);
        self.recent_wins.push_back(stats.won);

        let full = self.recent_wins.len() == self.progress.window;
        let stop = match self.progress.early_stop_win_rate {
            Some(threshold) => full && self.rolling_win_rate() > threshold,
            None => false,
        };
        if stop {
            self.stopped_early = true;
            log::info!(
                "early stop at episode {}: rolling win rate {:.1}%",
                self.episodes(),
                self.rolling_win_rate() * 100.0
            );
        }
        stop
    }

    /// True on episodes where progress should be logged.
    #[must_use]
    pub fn should_log(&self) -> bool {
        let interval = self.progress.log_interval;
        interval > 0 && self.episodes() % interval == 0
    }

    #[must_use]
    pub fn rolling_win_rate(&self) -> f64 {
        mean(self.recent_wins.iter().map(|&w| if w { 1.0 } else { 0.0 }))
    }

    #[must_use]
    pub fn rolling_reward(&self) -> f64 {
        mean(self.recent_rewards.iter().copied())
    }

    #[must_use]
    pub fn mean_reward(&self) -> f64 {
        mean(self.episode_rewards.iter().copied())
    }

    #[must_use]
    pub fn mean_length(&self) -> f64 {
        mean(self.episode_lengths.iter().map(|&l| l as f64))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else {
        values.sum::<f64>() / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(won: bool) -> EpisodeStats {
        EpisodeStats {
            reward: if won { 1.0 } else { -1.0 },
            length: 10,
            won,
            truncated: false,
        }
    }

    #[test]
    fn test_rolling_window_slides() {
        let mut report = TrainingReport::new(ProgressConfig::default().with_window(2));
        report.record(episode(false));
        report.record(episode(true));
        report.record(episode(true));

        assert_eq!(report.episodes(), 3);
        assert_eq!(report.wins, 2);
        assert_eq!(report.rolling_win_rate(), 1.0);
        assert_eq!(report.rolling_reward(), 1.0);
        assert!((report.mean_reward() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_early_stop_needs_full_window() {
        let progress = ProgressConfig::default()
            .with_window(3)
            .with_early_stop(Some(0.95));
        let mut report = TrainingReport::new(progress);

        assert!(!report.record(episode(true)));
        assert!(!report.record(episode(true)));
        assert!(report.record(episode(true)));
        assert!(report.stopped_early);
    }

    #[test]
    fn test_no_early_stop_by_default() {
        let mut report = TrainingReport::new(ProgressConfig::default().with_window(1));
        assert!(!report.record(episode(true)));
    }

    #[test]
    fn test_should_log() {
        let mut report = TrainingReport::new(ProgressConfig::default().with_log_interval(2));
        report.record(episode(false));
        assert!(!report.should_log());
        report.record(episode(false));
        assert!(report.should_log());
    }
}

//! Player model and derived statistics.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A player record.
///
/// The win/loss/streak fields are caches written by the recalculation
/// engine. They are never read back as inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    #[serde(default)]
    pub name: String,

    /// Live rating
    #[serde(default = "default_rating")]
    pub rating: f64,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,

    #[serde(default)]
    pub games_played: u32,

    /// Percentage, two decimals
    #[serde(default)]
    pub win_rate: f64,

    #[serde(default)]
    pub current_streak: u32,

    #[serde(default)]
    pub best_streak: u32,
}

fn default_rating() -> f64 {
    1000.0
}

impl Player {
    /// Create a new player at the given rating with empty caches.
    pub fn new(id: PlayerId, name: &str, rating: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            rating,
            wins: 0,
            losses: 0,
            games_played: 0,
            win_rate: 0.0,
            current_streak: 0,
            best_streak: 0,
        }
    }

    /// Overwrite every cached field with freshly derived values.
    pub fn apply_stats(&mut self, stats: &PlayerStats) {
        self.wins = stats.wins;
        self.losses = stats.losses;
        self.games_played = stats.games_played;
        self.win_rate = stats.win_rate;
        self.current_streak = stats.current_streak;
        self.best_streak = stats.best_streak;
    }

    /// The cached fields as currently stored.
    pub fn cached_stats(&self) -> PlayerStats {
        PlayerStats {
            wins: self.wins,
            losses: self.losses,
            games_played: self.games_played,
            win_rate: self.win_rate,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
        }
    }
}

/// Derived per-player statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    /// Percentage, two decimals
    pub win_rate: f64,
    pub current_streak: u32,
    pub best_streak: u32,
}

//! Statistics and ranking computation.
//!
//! Everything in this module is a pure function of its inputs:
//! - Match normalization and chronological ordering
//! - Win/loss aggregates and win streaks
//! - Rating history compaction
//! - Tournament standings for every supported format

pub mod aggregate;
pub mod normalize;
pub mod ordering;
pub mod rating_history;
pub mod standings;
pub mod streak;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RatingConfig;
use crate::models::{
    InputIssue, MatchRecord, Player, PlayerId, PlayerStats, RatingHistoryPoint, RatingWarning,
};

pub use aggregate::{aggregate, win_rate_percent, AggregateStats};
pub use normalize::{normalize, normalize_for_player, DecidedMatch, PlayerResult};
pub use ordering::{ordered, sort_chronologically, Direction};
pub use rating_history::{build_series, compact_history, decide_live_rating, RatingSeries};
pub use standings::{compute_standings, GroupTable, StandingsOutcome};
pub use streak::{streaks, Streaks};

/// Everything derived for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComputation {
    pub player_id: PlayerId,
    pub stats: PlayerStats,
    pub rating_history: Vec<RatingHistoryPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RatingWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<InputIssue>,
}

/// Combine aggregates and streaks into the cached player fields.
pub fn player_stats(results: &[PlayerResult]) -> PlayerStats {
    let totals = aggregate(results);
    let streaks = streaks(results);

    PlayerStats {
        wins: totals.wins,
        losses: totals.losses,
        games_played: totals.games_played,
        win_rate: totals.win_rate,
        current_streak: streaks.current,
        best_streak: streaks.best,
    }
}

/// Derive a player's stats and chart series from their matches and raw
/// rating history. `as_of` is the reference time for staleness checks and
/// for any appended "current" rating point.
pub fn compute_player(
    player: &Player,
    records: &[MatchRecord],
    history: &[RatingHistoryPoint],
    rating: &RatingConfig,
    as_of: DateTime<Utc>,
) -> PlayerComputation {
    let normalized = normalize_for_player(player.id, records);
    let stats = player_stats(&normalized.matches);
    let series = build_series(history, player.rating, as_of, rating);

    let mut issues = normalized.issues;
    issues.extend(series.issues);

    PlayerComputation {
        player_id: player.id,
        stats,
        rating_history: series.points,
        warnings: series.warnings,
        issues,
    }
}

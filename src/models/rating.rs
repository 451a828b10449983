//! Rating history model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, PlayerId, TournamentId};

/// One recorded rating value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryPoint {
    pub rating: f64,

    pub recorded_at: DateTime<Utc>,

    /// Match that caused the change, if any
    #[serde(default)]
    pub match_id: Option<MatchId>,

    /// Tournament the change belongs to; `None` for synthetic and "current"
    /// points
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
}

impl RatingHistoryPoint {
    pub fn new(rating: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            rating,
            recorded_at,
            match_id: None,
            tournament_id: None,
        }
    }

    /// Builder method to set the tournament.
    pub fn with_tournament(mut self, tournament_id: TournamentId) -> Self {
        self.tournament_id = Some(tournament_id);
        self
    }

    /// Builder method to set the match.
    pub fn with_match(mut self, match_id: MatchId) -> Self {
        self.match_id = Some(match_id);
        self
    }
}

/// A stored rating history row: one point tagged with its player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryRecord {
    pub player_id: PlayerId,

    #[serde(flatten)]
    pub point: RatingHistoryPoint,
}

impl RatingHistoryRecord {
    pub fn new(player_id: PlayerId, point: RatingHistoryPoint) -> Self {
        Self { player_id, point }
    }
}

/// Anomaly between the compacted history and the live rating, surfaced to
/// the caller instead of being papered over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingWarning {
    /// Live rating is implausibly far from the last recorded point
    ImplausibleJump {
        last_rating: f64,
        live_rating: f64,
        difference: f64,
    },
    /// Sizeable change with no history point explaining it, and the last
    /// point is too recent to treat the live value as a new "current" point
    UnrecordedChange {
        last_rating: f64,
        live_rating: f64,
        difference: f64,
    },
}

impl std::fmt::Display for RatingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingWarning::ImplausibleJump {
                last_rating,
                live_rating,
                difference,
            } => write!(
                f,
                "implausible rating jump {:.1} -> {:.1} ({:.1})",
                last_rating, live_rating, difference
            ),
            RatingWarning::UnrecordedChange {
                last_rating,
                live_rating,
                difference,
            } => write!(
                f,
                "unrecorded rating change {:.1} -> {:.1} ({:.1})",
                last_rating, live_rating, difference
            ),
        }
    }
}

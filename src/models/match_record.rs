//! Match record model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, PlayerId, RoundStage, TournamentId};

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Ongoing => write!(f, "ongoing"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A raw match record as stored by the score-entry side of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Unique identifier, assigned in creation order
    pub id: MatchId,

    /// Tournament this match belongs to
    pub tournament_id: TournamentId,

    pub player1_id: PlayerId,

    pub player2_id: PlayerId,

    /// Winner, once the score is entered
    #[serde(default)]
    pub winner_id: Option<PlayerId>,

    #[serde(default)]
    pub status: MatchStatus,

    /// Free-text round label (e.g. "Quarterfinal", "Group A")
    #[serde(default)]
    pub round: Option<String>,

    /// Stage recorded at match creation; legacy records only carry `round`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<RoundStage>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Date of the parent tournament
    pub tournament_date: NaiveDate,

    #[serde(default)]
    pub player1_score: Option<u32>,

    #[serde(default)]
    pub player2_score: Option<u32>,
}

impl MatchRecord {
    /// Create a scheduled match with no timestamps or scores.
    pub fn new(
        id: MatchId,
        tournament_id: TournamentId,
        player1_id: PlayerId,
        player2_id: PlayerId,
        tournament_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            tournament_id,
            player1_id,
            player2_id,
            winner_id: None,
            status: MatchStatus::Scheduled,
            round: None,
            stage: None,
            start_time: None,
            end_time: None,
            tournament_date,
            player1_score: None,
            player2_score: None,
        }
    }

    /// Builder method to mark the match completed with a winner.
    pub fn with_winner(mut self, winner_id: PlayerId) -> Self {
        self.winner_id = Some(winner_id);
        self.status = MatchStatus::Completed;
        self
    }

    /// Builder method to set the round label.
    pub fn with_round(mut self, round: &str) -> Self {
        self.round = Some(round.to_string());
        self
    }

    /// Builder method to set the stage explicitly.
    pub fn with_stage(mut self, stage: RoundStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Builder method to set the scores.
    pub fn with_scores(mut self, player1_score: u32, player2_score: u32) -> Self {
        self.player1_score = Some(player1_score);
        self.player2_score = Some(player2_score);
        self
    }

    /// Builder method to set the start time.
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Builder method to set the end time.
    pub fn with_end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Stage of the match: the recorded stage, or the label classification
    /// for legacy records.
    pub fn stage(&self) -> RoundStage {
        self.stage.unwrap_or_else(|| {
            self.round
                .as_deref()
                .map(RoundStage::classify)
                .unwrap_or_default()
        })
    }

    /// Best-known time the match happened: end time, else start time, else
    /// midnight UTC of the tournament date.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.end_time
            .or(self.start_time)
            .unwrap_or_else(|| self.tournament_date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Whether the given player is one of the two participants.
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// The other participant, if `player_id` is one of them.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.player1_id == player_id {
            Some(self.player2_id)
        } else if self.player2_id == player_id {
            Some(self.player1_id)
        } else {
            None
        }
    }

    /// Score of the given participant.
    pub fn score_of(&self, player_id: PlayerId) -> Option<u32> {
        if self.player1_id == player_id {
            self.player1_score
        } else if self.player2_id == player_id {
            self.player2_score
        } else {
            None
        }
    }
}

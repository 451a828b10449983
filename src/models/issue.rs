//! Inconsistent input records.

use serde::{Deserialize, Serialize};

use super::{MatchId, PlayerId};

/// Why a record was excluded from computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// Winner is neither of the two participants
    WinnerNotParticipant { winner_id: PlayerId },
    /// Several records share an id but disagree on content
    ConflictingDuplicate,
    /// Match references a player outside the tournament roster
    UnknownParticipant { player_id: PlayerId },
    /// Group-stage match between members of different groups
    CrossGroupMatch,
    /// Rating value is NaN or infinite
    NonFiniteRating,
}

/// An inconsistent input, excluded from computation and reported to the
/// caller. One bad record never blocks the rest of a recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIssue {
    /// Offending match, if the issue is tied to one
    pub match_id: Option<MatchId>,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl InputIssue {
    pub fn for_match(match_id: MatchId, kind: IssueKind) -> Self {
        Self {
            match_id: Some(match_id),
            kind,
        }
    }

    pub fn general(kind: IssueKind) -> Self {
        Self {
            match_id: None,
            kind,
        }
    }
}

impl std::fmt::Display for InputIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(id) = self.match_id {
            write!(f, "match {}: ", id)?;
        }
        match &self.kind {
            IssueKind::WinnerNotParticipant { winner_id } => {
                write!(f, "winner {} is not a participant", winner_id)
            }
            IssueKind::ConflictingDuplicate => write!(f, "conflicting duplicate records"),
            IssueKind::UnknownParticipant { player_id } => {
                write!(f, "player {} is not on the roster", player_id)
            }
            IssueKind::CrossGroupMatch => {
                write!(f, "group match between players of different groups")
            }
            IssueKind::NonFiniteRating => write!(f, "non-finite rating"),
        }
    }
}

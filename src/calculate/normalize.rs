//! Match normalization: raw records to decided results.
//!
//! A match is decided when it is completed and its winner is one of its two
//! participants. Undecided and self-referential records are incomplete data
//! and are dropped silently. A winner outside the pairing, or several
//! disagreeing records under one id, is inconsistent input: the record is
//! excluded and an [`InputIssue`] is reported.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{
    InputIssue, IssueKind, MatchId, MatchRecord, MatchStatus, PlayerId, RoundStage, TournamentId,
};

/// A completed match with a valid winner.
#[derive(Debug, Clone, PartialEq)]
pub struct DecidedMatch {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub winner_score: Option<u32>,
    pub loser_score: Option<u32>,
    pub stage: RoundStage,
    pub effective_at: DateTime<Utc>,
}

impl DecidedMatch {
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.winner_id == player_id || self.loser_id == player_id
    }

    /// The match seen from one participant's side.
    pub fn for_player(&self, player_id: PlayerId) -> Option<PlayerResult> {
        let (is_win, opponent_id, own_score, opponent_score) = if self.winner_id == player_id {
            (true, self.loser_id, self.winner_score, self.loser_score)
        } else if self.loser_id == player_id {
            (false, self.winner_id, self.loser_score, self.winner_score)
        } else {
            return None;
        };

        Some(PlayerResult {
            match_id: self.match_id,
            tournament_id: self.tournament_id,
            player_id,
            opponent_id,
            is_win,
            loser_id: self.loser_id,
            own_score,
            opponent_score,
            stage: self.stage,
            effective_at: self.effective_at,
        })
    }
}

/// A decided match from one player's perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerResult {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub opponent_id: PlayerId,
    pub is_win: bool,
    pub loser_id: PlayerId,
    pub own_score: Option<u32>,
    pub opponent_score: Option<u32>,
    pub stage: RoundStage,
    pub effective_at: DateTime<Utc>,
}

/// Outcome of classifying a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Decided(DecidedMatch),
    /// Incomplete data; dropped without comment
    Undecided,
    Inconsistent(InputIssue),
}

/// Classify one record.
pub fn classify(record: &MatchRecord) -> Decision {
    if record.player1_id == record.player2_id {
        return Decision::Undecided;
    }
    if record.status != MatchStatus::Completed {
        return Decision::Undecided;
    }
    let Some(winner_id) = record.winner_id else {
        return Decision::Undecided;
    };

    let Some(loser_id) = record.opponent_of(winner_id) else {
        return Decision::Inconsistent(InputIssue::for_match(
            record.id,
            IssueKind::WinnerNotParticipant { winner_id },
        ));
    };

    Decision::Decided(DecidedMatch {
        match_id: record.id,
        tournament_id: record.tournament_id,
        winner_id,
        loser_id,
        winner_score: record.score_of(winner_id),
        loser_score: record.score_of(loser_id),
        stage: record.stage(),
        effective_at: record.effective_time(),
    })
}

/// Decided matches plus the records that had to be excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub matches: Vec<T>,
    pub issues: Vec<InputIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            matches: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// Normalize a batch of records. Output is sorted by match id, so it does
/// not depend on input order.
pub fn normalize(records: &[MatchRecord]) -> Normalized<DecidedMatch> {
    let mut by_id: BTreeMap<MatchId, Vec<&MatchRecord>> = BTreeMap::new();
    for record in records {
        by_id.entry(record.id).or_default().push(record);
    }

    let mut out = Normalized::default();
    for (id, copies) in by_id {
        let first = copies[0];
        if copies.iter().any(|c| *c != first) {
            out.issues
                .push(InputIssue::for_match(id, IssueKind::ConflictingDuplicate));
            continue;
        }

        match classify(first) {
            Decision::Decided(m) => out.matches.push(m),
            Decision::Undecided => debug!("Skipping undecided match {}", id),
            Decision::Inconsistent(issue) => out.issues.push(issue),
        }
    }

    out
}

/// Normalize the records of one player. Records not involving the player
/// are ignored.
pub fn normalize_for_player(
    player_id: PlayerId,
    records: &[MatchRecord],
) -> Normalized<PlayerResult> {
    let normalized = normalize(records);
    let matches = normalized
        .matches
        .iter()
        .filter_map(|m| m.for_player(player_id))
        .collect();

    Normalized {
        matches,
        issues: normalized.issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: MatchId, p1: PlayerId, p2: PlayerId) -> MatchRecord {
        MatchRecord::new(id, 1, p1, p2, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    #[test]
    fn test_completed_match_is_decided() {
        let m = record(1, 10, 20).with_winner(20).with_scores(1, 3);
        match classify(&m) {
            Decision::Decided(d) => {
                assert_eq!(d.winner_id, 20);
                assert_eq!(d.loser_id, 10);
                assert_eq!(d.winner_score, Some(3));
                assert_eq!(d.loser_score, Some(1));
            }
            other => panic!("expected decided, got {:?}", other),
        }
    }

    #[test]
    fn test_undecided_matches_are_dropped_silently() {
        let scheduled = record(1, 10, 20);
        let mut no_winner = record(2, 10, 20);
        no_winner.status = MatchStatus::Completed;
        let mut ongoing = record(3, 10, 20).with_winner(10);
        ongoing.status = MatchStatus::Ongoing;
        let self_match = record(4, 10, 10).with_winner(10);

        let out = normalize(&[scheduled, no_winner, ongoing, self_match]);
        assert!(out.matches.is_empty());
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_foreign_winner_is_reported() {
        let bad = record(7, 10, 20).with_winner(99);
        let good = record(8, 10, 20).with_winner(10);

        let out = normalize(&[bad, good]);
        assert_eq!(out.matches.len(), 1);
        assert_eq!(
            out.issues,
            vec![InputIssue::for_match(
                7,
                IssueKind::WinnerNotParticipant { winner_id: 99 }
            )]
        );
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let m = record(5, 10, 20).with_winner(10);
        let out = normalize(&[m.clone(), m]);
        assert_eq!(out.matches.len(), 1);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_conflicting_duplicates_are_excluded() {
        let a = record(5, 10, 20).with_winner(10);
        let b = record(5, 10, 20).with_winner(20);

        let forward = normalize(&[a.clone(), b.clone()]);
        let backward = normalize(&[b, a]);

        assert!(forward.matches.is_empty());
        assert_eq!(forward, backward);
        assert_eq!(forward.issues[0].kind, IssueKind::ConflictingDuplicate);
    }

    #[test]
    fn test_output_sorted_by_id() {
        let out = normalize(&[
            record(3, 10, 20).with_winner(10),
            record(1, 10, 20).with_winner(20),
            record(2, 10, 30).with_winner(30),
        ]);
        let ids: Vec<MatchId> = out.matches.iter().map(|m| m.match_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_player_perspective() {
        let records = vec![
            record(1, 10, 20).with_winner(10),
            record(2, 20, 10).with_winner(20),
            record(3, 30, 40).with_winner(30),
        ];

        let out = normalize_for_player(10, &records);
        assert_eq!(out.matches.len(), 2);
        assert!(out.matches[0].is_win);
        assert_eq!(out.matches[0].loser_id, 20);
        assert!(!out.matches[1].is_win);
        assert_eq!(out.matches[1].opponent_id, 20);
        assert_eq!(out.matches[1].loser_id, 10);
    }
}

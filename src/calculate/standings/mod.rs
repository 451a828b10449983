//! Tournament standings.
//!
//! Each format module decides the listing order and placements; this module
//! handles the shared parts: roster resolution, per-player tallies and the
//! final `Standing` rows.

pub mod group_stage;
pub mod round_robin;
pub mod single_elimination;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::win_rate_percent;
use super::normalize::{normalize, DecidedMatch};
use crate::config::StandingsConfig;
use crate::models::{
    InputIssue, IssueKind, MatchId, MatchRecord, Placement, PlayerId, Standing, Tournament,
    TournamentFormat, TournamentId,
};

/// Wins, losses and scores of one player over a set of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub scored: u64,
    pub conceded: u64,
}

impl Tally {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn point_difference(&self) -> i64 {
        self.scored as i64 - self.conceded as i64
    }

    pub fn points(&self, config: &StandingsConfig) -> u32 {
        self.wins * config.points_per_win + self.losses * config.points_per_loss
    }
}

/// Tally every player in `players` over `matches`. Players without matches
/// get an empty tally.
pub fn tally(players: &[PlayerId], matches: &[DecidedMatch]) -> BTreeMap<PlayerId, Tally> {
    let mut tallies: BTreeMap<PlayerId, Tally> =
        players.iter().map(|&p| (p, Tally::default())).collect();

    for m in matches {
        let winner = tallies.entry(m.winner_id).or_default();
        winner.wins += 1;
        winner.scored += u64::from(m.winner_score.unwrap_or(0));
        winner.conceded += u64::from(m.loser_score.unwrap_or(0));

        let loser = tallies.entry(m.loser_id).or_default();
        loser.losses += 1;
        loser.scored += u64::from(m.loser_score.unwrap_or(0));
        loser.conceded += u64::from(m.winner_score.unwrap_or(0));
    }

    tallies
}

/// Build standing rows for an ordered placement list.
pub fn build_rows(
    order: &[(PlayerId, Placement)],
    tallies: &BTreeMap<PlayerId, Tally>,
    config: &StandingsConfig,
) -> Vec<Standing> {
    order
        .iter()
        .map(|&(player_id, placement)| {
            let t = tallies.get(&player_id).copied().unwrap_or_default();
            Standing {
                player_id,
                placement,
                wins: t.wins,
                losses: t.losses,
                point_difference: t.point_difference(),
                win_rate: win_rate_percent(t.wins, t.games()),
                points: t.points(config),
            }
        })
        .collect()
}

/// Round-robin table of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTable {
    pub name: String,
    pub standings: Vec<Standing>,
}

/// Standings of one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsOutcome {
    pub tournament_id: TournamentId,
    pub format: TournamentFormat,
    pub standings: Vec<Standing>,
    /// Group tables, for group-stage tournaments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<InputIssue>,
}

/// Resolve the roster and drop matches that reference players outside it.
/// An empty registered roster means "everyone who played".
fn resolve_roster(
    tournament: &Tournament,
    decided: Vec<DecidedMatch>,
    issues: &mut Vec<InputIssue>,
) -> (Vec<PlayerId>, Vec<DecidedMatch>) {
    if tournament.participants.is_empty() {
        let roster: BTreeSet<PlayerId> = decided
            .iter()
            .flat_map(|m| [m.winner_id, m.loser_id])
            .collect();
        return (roster.into_iter().collect(), decided);
    }

    let roster: BTreeSet<PlayerId> = tournament.participants.iter().copied().collect();
    let mut kept = Vec::with_capacity(decided.len());
    for m in decided {
        match [m.winner_id, m.loser_id]
            .into_iter()
            .find(|p| !roster.contains(p))
        {
            Some(player_id) => issues.push(InputIssue::for_match(
                m.match_id,
                IssueKind::UnknownParticipant { player_id },
            )),
            None => kept.push(m),
        }
    }

    (roster.into_iter().collect(), kept)
}

/// Compute the standings of a tournament from its match records.
///
/// Records belonging to other tournaments are ignored. A tournament with no
/// decided matches has empty standings.
pub fn compute_standings(
    tournament: &Tournament,
    records: &[MatchRecord],
    config: &StandingsConfig,
) -> StandingsOutcome {
    let own: Vec<MatchRecord> = records
        .iter()
        .filter(|r| r.tournament_id == tournament.id)
        .cloned()
        .collect();
    let normalized = normalize(&own);
    let mut issues = normalized.issues;
    let (roster, decided) = resolve_roster(tournament, normalized.matches, &mut issues);

    let mut outcome = StandingsOutcome {
        tournament_id: tournament.id,
        format: tournament.format,
        standings: Vec::new(),
        groups: Vec::new(),
        issues: Vec::new(),
    };

    if decided.is_empty() {
        debug!("Tournament {} has no decided matches", tournament.id);
        outcome.issues = issues;
        return outcome;
    }

    match tournament.format {
        TournamentFormat::RoundRobin => {
            let order = round_robin::rank(&roster, &decided, config);
            outcome.standings = build_rows(&order, &tally(&roster, &decided), config);
        }
        TournamentFormat::SingleElimination => {
            let order = single_elimination::rank(&roster, &decided);
            outcome.standings = build_rows(&order, &tally(&roster, &decided), config);
        }
        TournamentFormat::GroupStage => {
            let result = group_stage::rank(tournament, &roster, &decided, config);
            // Matches the group stage rejected count for nobody
            let rejected: BTreeSet<MatchId> =
                result.issues.iter().filter_map(|i| i.match_id).collect();
            let counted: Vec<DecidedMatch> = decided
                .into_iter()
                .filter(|m| !rejected.contains(&m.match_id))
                .collect();
            outcome.standings = build_rows(&result.order, &tally(&roster, &counted), config);
            outcome.groups = result.groups;
            issues.extend(result.issues);
        }
    }

    outcome.issues = issues;
    outcome
}

//! Group stage followed by a single-elimination playoff.

use std::collections::BTreeSet;

use tracing::debug;

use super::{build_rows, round_robin, single_elimination, tally, GroupTable};
use crate::calculate::normalize::DecidedMatch;
use crate::config::StandingsConfig;
use crate::models::{Group, InputIssue, IssueKind, Placement, PlayerId, RoundStage, Tournament};

/// Used when a group-stage tournament does not say how many advance.
pub const DEFAULT_PLAYERS_PER_GROUP_ADVANCE: u32 = 2;

/// Listing order, group tables and the matches excluded as inconsistent.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStageResult {
    pub order: Vec<(PlayerId, Placement)>,
    pub groups: Vec<GroupTable>,
    pub issues: Vec<InputIssue>,
}

/// A group match is one staged as such, or an unstaged match between two
/// members of the same group. Everything else belongs to the playoff.
fn is_group_match(m: &DecidedMatch, groups: &[Group]) -> bool {
    if m.stage.is_knockout() {
        return false;
    }
    m.stage == RoundStage::Group
        || groups
            .iter()
            .any(|g| g.contains(m.winner_id) && g.contains(m.loser_id))
}

pub fn rank(
    tournament: &Tournament,
    roster: &[PlayerId],
    matches: &[DecidedMatch],
    config: &StandingsConfig,
) -> GroupStageResult {
    let groups = if tournament.groups.is_empty() {
        debug!(
            "Tournament {} has no groups; treating the roster as one group",
            tournament.id
        );
        vec![Group::new("Group", roster.to_vec())]
    } else {
        tournament.groups.clone()
    };
    let advance = tournament
        .players_per_group_advance
        .unwrap_or(DEFAULT_PLAYERS_PER_GROUP_ADVANCE) as usize;

    let mut issues = Vec::new();
    let (group_matches, playoff_matches): (Vec<DecidedMatch>, Vec<DecidedMatch>) = matches
        .iter()
        .filter(|m| {
            let same_group = groups
                .iter()
                .any(|g| g.contains(m.winner_id) && g.contains(m.loser_id));
            if m.stage == RoundStage::Group && !same_group {
                issues.push(InputIssue::for_match(m.match_id, IssueKind::CrossGroupMatch));
                return false;
            }
            true
        })
        .cloned()
        .partition(|m| is_group_match(m, &groups));

    // Phase 1: round-robin inside each group
    let mut tables = Vec::with_capacity(groups.len());
    let mut advancing: BTreeSet<PlayerId> = BTreeSet::new();
    // (group position, group points, player) of those who went out
    let mut eliminated: Vec<(usize, u32, PlayerId)> = Vec::new();

    for group in &groups {
        let own: Vec<DecidedMatch> = group_matches
            .iter()
            .filter(|m| group.contains(m.winner_id) && group.contains(m.loser_id))
            .cloned()
            .collect();

        let order = round_robin::rank(&group.players, &own, config);
        let group_tallies = tally(&group.players, &own);

        for (position, (player, _)) in order.iter().enumerate() {
            if position < advance {
                advancing.insert(*player);
            } else {
                let points = group_tallies
                    .get(player)
                    .map(|t| t.points(config))
                    .unwrap_or(0);
                eliminated.push((position, points, *player));
            }
        }

        tables.push(GroupTable {
            name: group.name.clone(),
            standings: build_rows(&order, &group_tallies, config),
        });
    }

    // Registered players who are in no group never reached the playoff
    for &player in roster {
        if !groups.iter().any(|g| g.contains(player)) {
            eliminated.push((usize::MAX, 0, player));
        }
    }

    // Phase 2: the playoff is a single-elimination bracket of the advancers
    let playoff: Vec<DecidedMatch> = playoff_matches
        .into_iter()
        .filter(|m| {
            match [m.winner_id, m.loser_id]
                .into_iter()
                .find(|p| !advancing.contains(p))
            {
                Some(player_id) => {
                    issues.push(InputIssue::for_match(
                        m.match_id,
                        IssueKind::UnknownParticipant { player_id },
                    ));
                    false
                }
                None => true,
            }
        })
        .collect();

    let advancing: Vec<PlayerId> = advancing.into_iter().collect();
    let mut order = single_elimination::rank(&advancing, &playoff);

    eliminated.sort_by_key(|&(position, points, player)| {
        (position, std::cmp::Reverse(points), player)
    });
    eliminated.dedup_by_key(|e| e.2);
    order.extend(
        eliminated
            .into_iter()
            .map(|(_, _, player)| (player, Placement::GroupStage)),
    );

    GroupStageResult {
        order,
        groups: tables,
        issues,
    }
}

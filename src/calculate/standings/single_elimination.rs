//! Single-elimination ranking.
//!
//! Placement comes from the round a player was knocked out in. Players
//! eliminated together form a tier; tiers take consecutive blocks of
//! placements, so a full bracket gives 1, 2, 3-4, 5-8, 9-16.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::calculate::normalize::DecidedMatch;
use crate::calculate::ordering::{ordered, Direction};
use crate::models::{MatchId, Placement, PlayerId, RoundStage};

/// How far a player got, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    /// Never lost (champion, or still in an unfinished bracket)
    Alive,
    LostFinal,
    WonThirdPlace,
    LostThirdPlace,
    /// Lost with this many rounds left before the final
    LostAtDepth(u32),
    /// Never played although the bracket is finished
    Unplaced,
}

/// Rounds needed for `n` players: ceil(log2(n)).
pub fn total_rounds(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Knockout matches of the bracket, oldest first.
///
/// Third-place matches are left out, and so is any unlabelled match between
/// two players who were both already knocked out: that is a consolation
/// game, not a bracket round.
fn bracket_matches(oldest_first: &[DecidedMatch]) -> Vec<DecidedMatch> {
    let mut knocked_out: BTreeSet<PlayerId> = BTreeSet::new();
    let mut bracket = Vec::with_capacity(oldest_first.len());

    for m in oldest_first {
        if m.stage == RoundStage::ThirdPlace {
            continue;
        }
        let consolation = m.stage.elimination_depth().is_none()
            && knocked_out.contains(&m.winner_id)
            && knocked_out.contains(&m.loser_id);
        if consolation {
            debug!(
                "Match {} is between two eliminated players; not a bracket round",
                m.match_id
            );
            continue;
        }
        knocked_out.insert(m.loser_id);
        bracket.push(m.clone());
    }

    bracket
}

/// Depth (rounds before the final) of every bracket match.
///
/// Labelled stages pin the depth. Otherwise depth is counted back from the
/// winner's next match: one more than that match's depth. A winner with no
/// later match is a survivor, whose match sits as many rounds from the
/// final as the survivors still need to play. Counting back keeps players
/// with byes in the right round.
fn match_depths(bracket: &[DecidedMatch]) -> BTreeMap<MatchId, u32> {
    let eliminated: BTreeSet<PlayerId> = bracket.iter().map(|m| m.loser_id).collect();
    let survivors: BTreeSet<PlayerId> = bracket
        .iter()
        .map(|m| m.winner_id)
        .filter(|p| !eliminated.contains(p))
        .collect();
    let rounds_left = total_rounds(survivors.len());

    // Depth of the earliest later match each player appears in
    let mut next_depth: BTreeMap<PlayerId, u32> = BTreeMap::new();
    let mut depths = BTreeMap::new();

    for m in bracket.iter().rev() {
        let depth = m.stage.elimination_depth().unwrap_or_else(|| {
            next_depth
                .get(&m.winner_id)
                .map(|d| d + 1)
                .unwrap_or(rounds_left)
        });
        next_depth.insert(m.winner_id, depth);
        next_depth.insert(m.loser_id, depth);
        depths.insert(m.match_id, depth);
    }

    depths
}

fn tier_of(
    player: PlayerId,
    matches_oldest_first: &[DecidedMatch],
    bracket: &[DecidedMatch],
    depths: &BTreeMap<MatchId, u32>,
    champion: Option<PlayerId>,
) -> Tier {
    if let Some(third) = matches_oldest_first
        .iter()
        .rev()
        .find(|m| m.stage == RoundStage::ThirdPlace && m.involves(player))
    {
        return if third.winner_id == player {
            Tier::WonThirdPlace
        } else {
            Tier::LostThirdPlace
        };
    }

    let mut losses = bracket.iter().filter(|m| m.loser_id == player);

    if let Some(first_loss) = losses.next() {
        if losses.next().is_some() {
            warn!(
                "Player {} lost more than once in a single-elimination bracket; using match {}",
                player, first_loss.match_id
            );
        }
        return match depths.get(&first_loss.match_id).copied().unwrap_or(0) {
            0 => Tier::LostFinal,
            depth => Tier::LostAtDepth(depth),
        };
    }

    match champion {
        Some(c) if c != player => Tier::Unplaced,
        _ => Tier::Alive,
    }
}

/// Order `players` by elimination round and assign placements.
pub fn rank(players: &[PlayerId], matches: &[DecidedMatch]) -> Vec<(PlayerId, Placement)> {
    let roster: BTreeSet<PlayerId> = players.iter().copied().collect();
    let oldest_first = ordered(matches, Direction::OldestFirst);
    let bracket = bracket_matches(&oldest_first);
    let depths = match_depths(&bracket);

    // The champion won a final and never lost a bracket match
    let champion = bracket
        .iter()
        .rev()
        .filter(|m| depths.get(&m.match_id) == Some(&0))
        .map(|m| m.winner_id)
        .find(|&p| !bracket.iter().any(|m| m.loser_id == p));

    let wins: BTreeMap<PlayerId, usize> = roster
        .iter()
        .map(|&p| (p, oldest_first.iter().filter(|m| m.winner_id == p).count()))
        .collect();

    let mut tiers: BTreeMap<Tier, Vec<PlayerId>> = BTreeMap::new();
    for &player in &roster {
        let tier = tier_of(player, &oldest_first, &bracket, &depths, champion);
        tiers.entry(tier).or_default().push(player);
    }

    let mut result = Vec::with_capacity(roster.len());
    let mut start = 1u32;
    for (_, mut members) in tiers {
        members.sort_by_key(|p| (std::cmp::Reverse(wins[p]), *p));
        let placement = Placement::span(start, members.len() as u32);
        start += members.len() as u32;
        result.extend(members.into_iter().map(|p| (p, placement)));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::normalize::normalize;
    use crate::models::MatchRecord;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn played(id: i64, p1: PlayerId, p2: PlayerId, winner: PlayerId, round: &str) -> MatchRecord {
        MatchRecord::new(id, 1, p1, p2, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap())
            .with_winner(winner)
            .with_round(round)
    }

    fn unlabelled(id: i64, p1: PlayerId, p2: PlayerId, winner: PlayerId) -> MatchRecord {
        MatchRecord::new(id, 1, p1, p2, NaiveDate::from_ymd_opt(2025, 9, 6).unwrap())
            .with_winner(winner)
    }

    fn labels(order: &[(PlayerId, Placement)]) -> Vec<(PlayerId, String)> {
        order.iter().map(|(p, pl)| (*p, pl.to_string())).collect()
    }

    fn eight_player_bracket(round_one_label: &str) -> Vec<MatchRecord> {
        vec![
            played(1, 1, 8, 1, round_one_label),
            played(2, 4, 5, 4, round_one_label),
            played(3, 3, 6, 3, round_one_label),
            played(4, 2, 7, 2, round_one_label),
            played(5, 1, 4, 1, "Semifinal"),
            played(6, 2, 3, 2, "Semifinal"),
            played(7, 1, 2, 1, "Final"),
        ]
    }

    #[test]
    fn test_total_rounds() {
        assert_eq!(total_rounds(0), 0);
        assert_eq!(total_rounds(1), 0);
        assert_eq!(total_rounds(2), 1);
        assert_eq!(total_rounds(4), 2);
        assert_eq!(total_rounds(5), 3);
        assert_eq!(total_rounds(8), 3);
        assert_eq!(total_rounds(16), 4);
    }

    #[test]
    fn test_four_player_bracket() {
        let matches = normalize(&[
            played(1, 1, 3, 1, "Semifinal"),
            played(2, 2, 4, 2, "Semifinal"),
            played(3, 1, 2, 1, "Final"),
        ])
        .matches;

        let order = rank(&[1, 2, 3, 4], &matches);
        assert_eq!(
            labels(&order),
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (3, "3-4".to_string()),
                (4, "3-4".to_string()),
            ]
        );
    }

    #[test]
    fn test_eight_player_bracket_ranges_double() {
        let matches = normalize(&eight_player_bracket("Quarterfinal")).matches;
        let order = rank(&[1, 2, 3, 4, 5, 6, 7, 8], &matches);
        assert_eq!(
            labels(&order),
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (3, "3-4".to_string()),
                (4, "3-4".to_string()),
                (5, "5-8".to_string()),
                (6, "5-8".to_string()),
                (7, "5-8".to_string()),
                (8, "5-8".to_string()),
            ]
        );
    }

    #[test]
    fn test_unlabelled_rounds_are_inferred() {
        let labelled = rank(
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &normalize(&eight_player_bracket("Quarterfinal")).matches,
        );
        let inferred = rank(
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &normalize(&eight_player_bracket("Round 1")).matches,
        );
        assert_eq!(labels(&labelled), labels(&inferred));
    }

    #[test]
    fn test_third_place_match_splits_semifinal_losers() {
        let mut records = eight_player_bracket("Quarterfinal");
        records.push(played(8, 3, 4, 4, "Third place"));

        let order = rank(&[1, 2, 3, 4, 5, 6, 7, 8], &normalize(&records).matches);
        assert_eq!(
            labels(&order)[..4],
            [
                (1, "1".to_string()),
                (2, "2".to_string()),
                (4, "3".to_string()),
                (3, "4".to_string()),
            ]
        );
        assert_eq!(order[4].1, Placement::Range(5, 8));
    }

    #[test]
    fn test_unfinished_bracket_keeps_survivors_together() {
        let records = vec![
            played(1, 1, 3, 1, "Semifinal"),
            played(2, 2, 4, 2, "Semifinal"),
        ];
        let order = rank(&[1, 2, 3, 4], &normalize(&records).matches);
        assert_eq!(
            labels(&order),
            vec![
                (1, "1-2".to_string()),
                (2, "1-2".to_string()),
                (3, "3-4".to_string()),
                (4, "3-4".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_show_after_final_is_placed_last() {
        let records = vec![
            played(1, 1, 3, 1, "Semifinal"),
            played(2, 2, 4, 2, "Semifinal"),
            played(3, 1, 2, 2, "Final"),
        ];
        let order = rank(&[1, 2, 3, 4, 5], &normalize(&records).matches);
        assert_eq!(order[0], (2, Placement::Rank(1)));
        assert_eq!(order[4], (5, Placement::Rank(5)));
    }

    #[test]
    fn test_unlabelled_consolation_after_final_keeps_champion() {
        let records = vec![
            unlabelled(1, 1, 3, 1),
            unlabelled(2, 2, 4, 2),
            unlabelled(3, 1, 2, 1),
            unlabelled(4, 3, 4, 3),
        ];
        let order = rank(&[1, 2, 3, 4], &normalize(&records).matches);
        assert_eq!(
            labels(&order),
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (3, "3-4".to_string()),
                (4, "3-4".to_string()),
            ]
        );
    }

    #[test]
    fn test_consolation_order_does_not_change_placements() {
        let final_first = vec![
            unlabelled(1, 1, 3, 1),
            unlabelled(2, 2, 4, 2),
            unlabelled(3, 1, 2, 1),
            unlabelled(4, 3, 4, 3),
        ];
        let consolation_first = vec![
            unlabelled(1, 1, 3, 1),
            unlabelled(2, 2, 4, 2),
            unlabelled(3, 3, 4, 3),
            unlabelled(4, 1, 2, 1),
        ];
        assert_eq!(
            labels(&rank(&[1, 2, 3, 4], &normalize(&final_first).matches)),
            labels(&rank(&[1, 2, 3, 4], &normalize(&consolation_first).matches))
        );
    }

    #[test]
    fn test_unlabelled_bracket_with_byes_matches_labelled() {
        let unlabelled_records = vec![
            unlabelled(1, 4, 5, 4),
            unlabelled(2, 1, 4, 1),
            unlabelled(3, 2, 3, 2),
            unlabelled(4, 1, 2, 1),
        ];
        let labelled_records = vec![
            played(1, 4, 5, 4, "Quarterfinal"),
            played(2, 1, 4, 1, "Semifinal"),
            played(3, 2, 3, 2, "Semifinal"),
            played(4, 1, 2, 1, "Final"),
        ];

        let inferred = rank(&[1, 2, 3, 4, 5], &normalize(&unlabelled_records).matches);
        assert_eq!(
            labels(&inferred),
            vec![
                (1, "1".to_string()),
                (2, "2".to_string()),
                (4, "3-4".to_string()),
                (3, "3-4".to_string()),
                (5, "5".to_string()),
            ]
        );
        assert_eq!(
            labels(&inferred),
            labels(&rank(&[1, 2, 3, 4, 5], &normalize(&labelled_records).matches))
        );
    }

    #[test]
    fn test_unlabelled_bracket_after_complete_round() {
        let records = vec![
            unlabelled(1, 1, 8, 1),
            unlabelled(2, 4, 5, 4),
            unlabelled(3, 3, 6, 3),
            unlabelled(4, 2, 7, 2),
        ];
        let order = rank(&[1, 2, 3, 4, 5, 6, 7, 8], &normalize(&records).matches);
        assert_eq!(order[0].1, Placement::Range(1, 4));
        assert_eq!(order[4].1, Placement::Range(5, 8));
    }
}

//! Round-robin ranking.
//!
//! Sort keys: points, then head-to-head wins among the players tied on
//! points, then point differential. Players equal on all three share a
//! placement; player id only orders the listing.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use super::tally;
use crate::calculate::normalize::DecidedMatch;
use crate::config::StandingsConfig;
use crate::models::{Placement, PlayerId};

/// Head-to-head wins of each player against others with the same points.
fn head_to_head(
    points: &BTreeMap<PlayerId, u32>,
    matches: &[DecidedMatch],
) -> BTreeMap<PlayerId, u32> {
    let mut wins: BTreeMap<PlayerId, u32> = points.keys().map(|&p| (p, 0)).collect();
    for m in matches {
        if let (Some(w), Some(l)) = (points.get(&m.winner_id), points.get(&m.loser_id)) {
            if w == l {
                *wins.entry(m.winner_id).or_default() += 1;
            }
        }
    }
    wins
}

/// Order `players` by their results in `matches` and assign dense
/// placements (1, 2, 2, 3).
pub fn rank(
    players: &[PlayerId],
    matches: &[DecidedMatch],
    config: &StandingsConfig,
) -> Vec<(PlayerId, Placement)> {
    let players: BTreeSet<PlayerId> = players.iter().copied().collect();
    let roster: Vec<PlayerId> = players.iter().copied().collect();
    let tallies = tally(&roster, matches);

    let points: BTreeMap<PlayerId, u32> = roster
        .iter()
        .map(|p| (*p, tallies[p].points(config)))
        .collect();
    let h2h = head_to_head(&points, matches);

    let merit = |p: &PlayerId| (points[p], h2h[p], tallies[p].point_difference());

    let mut ordered = roster;
    ordered.sort_by_key(|p| {
        let (pts, h2h_wins, diff) = merit(p);
        (Reverse(pts), Reverse(h2h_wins), Reverse(diff), *p)
    });

    let mut result = Vec::with_capacity(ordered.len());
    let mut placement = 0u32;
    let mut previous = None;
    for p in ordered {
        let current = merit(&p);
        if previous != Some(current) {
            placement += 1;
            previous = Some(current);
        }
        result.push((p, Placement::Rank(placement)));
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

    fn decided(records: &[MatchRecord]) -> Vec<DecidedMatch> {
        normalize(records).matches
    }

    fn played(id: i64, p1: PlayerId, p2: PlayerId, winner: PlayerId) -> MatchRecord {
        MatchRecord::new(id, 1, p1, p2, NaiveDate::from_ymd_opt(2025, 2, 2).unwrap())
            .with_winner(winner)
    }

    fn ranks(order: &[(PlayerId, Placement)]) -> Vec<(PlayerId, u32)> {
        order
            .iter()
            .map(|(p, placement)| (*p, placement.low().unwrap()))
            .collect()
    }

    #[test]
    fn test_points_decide_order() {
        let matches = decided(&[played(1, 1, 2, 1), played(2, 1, 3, 1), played(3, 2, 3, 2)]);
        let order = rank(&[3, 2, 1], &matches, &StandingsConfig::default());
        assert_eq!(ranks(&order), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_head_to_head_breaks_points_tie() {
        // 1 and 2 both win twice; 2 beat 1 directly
        let matches = decided(&[
            played(1, 1, 2, 2),
            played(2, 1, 3, 1),
            played(3, 1, 4, 1),
            played(4, 2, 3, 3),
            played(5, 2, 4, 2),
            played(6, 3, 4, 4),
        ]);
        let order = rank(&[1, 2, 3, 4], &matches, &StandingsConfig::default());
        assert_eq!(order[0].0, 2);
        assert_eq!(order[1].0, 1);
    }

    #[test]
    fn test_point_difference_breaks_circular_tie() {
        // 1 > 2 > 3 > 1, each by different margins
        let matches = decided(&[
            played(1, 1, 2, 1).with_scores(5, 0),
            played(2, 2, 3, 2).with_scores(3, 2),
            played(3, 3, 1, 3).with_scores(3, 2),
        ]);
        let order = rank(&[1, 2, 3], &matches, &StandingsConfig::default());
        // differentials: 1 => +4, 2 => -4, 3 => 0
        assert_eq!(ranks(&order), vec![(1, 1), (3, 2), (2, 3)]);
    }

    #[test]
    fn test_full_ties_share_placement_without_gaps() {
        let matches = decided(&[
            played(1, 1, 2, 1),
            played(2, 1, 3, 1),
            played(3, 1, 4, 1),
            played(4, 2, 4, 2),
            played(5, 3, 4, 3),
        ]);
        // 2 and 3 each have one win, did not meet, no scores
        let order = rank(&[1, 2, 3, 4], &matches, &StandingsConfig::default());
        assert_eq!(ranks(&order), vec![(1, 1), (2, 2), (3, 2), (4, 3)]);
    }

    #[test]
    fn test_idle_player_ranked_last() {
        let matches = decided(&[played(1, 1, 2, 1)]);
        let order = rank(&[1, 2, 3], &matches, &StandingsConfig::default());
        // 2 and 3 both have zero points and equal differential
        assert_eq!(ranks(&order), vec![(1, 1), (2, 2), (3, 2)]);
    }

    #[test]
    fn test_loss_points_count() {
        let config = StandingsConfig {
            points_per_win: 2,
            points_per_loss: 1,
        };
        let matches = decided(&[played(1, 1, 2, 1)]);
        let order = rank(&[1, 2, 3], &matches, &config);
        assert_eq!(ranks(&order), vec![(1, 1), (2, 2), (3, 3)]);
    }
}

//! Win/loss aggregates.

use super::normalize::PlayerResult;

/// Order-independent totals over a player's decided matches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateStats {
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    /// Percentage, two decimals
    pub win_rate: f64,
}

/// Win rate as a percentage rounded to two decimals; 0 with no games.
pub fn win_rate_percent(wins: u32, games_played: u32) -> f64 {
    if games_played == 0 {
        0.0
    } else {
        round_to(wins as f64 / games_played as f64 * 100.0, 2)
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Aggregate results. Each match appears once in the input whichever side
/// the player was on, so nothing is double-counted.
pub fn aggregate(results: &[PlayerResult]) -> AggregateStats {
    let wins = results.iter().filter(|r| r.is_win).count() as u32;
    let losses = results.len() as u32 - wins;
    let games_played = wins + losses;

    AggregateStats {
        wins,
        losses,
        games_played,
        win_rate: win_rate_percent(wins, games_played),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::normalize::normalize_for_player;
    use crate::models::MatchRecord;
    use chrono::NaiveDate;

    fn record(id: i64, p1: i64, p2: i64, winner: i64) -> MatchRecord {
        MatchRecord::new(id, 1, p1, p2, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_winner(winner)
    }

    #[test]
    fn test_win_rate_percent() {
        assert_eq!(win_rate_percent(2, 3), 66.67);
        assert_eq!(win_rate_percent(1, 3), 33.33);
        assert_eq!(win_rate_percent(5, 5), 100.0);
        assert_eq!(win_rate_percent(0, 0), 0.0);
    }

    #[test]
    fn test_aggregate_counts_both_sides() {
        let records = vec![
            record(1, 7, 8, 7),
            record(2, 8, 7, 7),
            record(3, 9, 7, 9),
        ];
        let results = normalize_for_player(7, &records).matches;

        let stats = aggregate(&results);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.win_rate, 66.67);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(&[]), AggregateStats::default());
    }

    #[test]
    fn test_games_played_is_wins_plus_losses() {
        let records: Vec<MatchRecord> = (1..=9)
            .map(|i| record(i, 1, 2, if i % 3 == 0 { 2 } else { 1 }))
            .collect();
        let stats = aggregate(&normalize_for_player(1, &records).matches);
        assert_eq!(stats.games_played, stats.wins + stats.losses);
        assert_eq!(stats.win_rate, round_to(6.0 / 9.0 * 100.0, 2));
    }
}

//! Win streaks.

use super::normalize::PlayerResult;
use super::ordering::{ordered, Direction};

/// Current and best win streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

/// Consecutive wins counted back from the most recent match.
/// Expects results newest first; stops at the first loss.
pub fn current_streak(newest_first: &[PlayerResult]) -> u32 {
    newest_first.iter().take_while(|r| r.is_win).count() as u32
}

/// Longest run of consecutive wins. Expects results oldest first.
pub fn best_streak(oldest_first: &[PlayerResult]) -> u32 {
    let mut run = 0u32;
    let mut best = 0u32;
    for result in oldest_first {
        if result.is_win {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Both streaks from unordered results.
pub fn streaks(results: &[PlayerResult]) -> Streaks {
    let oldest_first = ordered(results, Direction::OldestFirst);
    let newest_first = ordered(results, Direction::NewestFirst);

    Streaks {
        current: current_streak(&newest_first),
        best: best_streak(&oldest_first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoundStage;
    use chrono::{Duration, TimeZone, Utc};

    /// Results in chronological order from a string like "WWLW".
    fn history(pattern: &str) -> Vec<PlayerResult> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        pattern
            .chars()
            .enumerate()
            .map(|(i, c)| PlayerResult {
                match_id: i as i64 + 1,
                tournament_id: 1,
                player_id: 1,
                opponent_id: 2,
                is_win: c == 'W',
                loser_id: if c == 'W' { 2 } else { 1 },
                own_score: None,
                opponent_score: None,
                stage: RoundStage::Unclassified,
                effective_at: start + Duration::days(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_streaks_recent_block_is_best() {
        let s = streaks(&history("WWLWWW"));
        assert_eq!(s, Streaks { current: 3, best: 3 });
    }

    #[test]
    fn test_streaks_ending_in_loss() {
        let s = streaks(&history("WLWL"));
        assert_eq!(s, Streaks { current: 0, best: 1 });
    }

    #[test]
    fn test_streaks_empty() {
        assert_eq!(streaks(&[]), Streaks::default());
    }

    #[test]
    fn test_streaks_older_run_is_best() {
        let s = streaks(&history("WWWWLWW"));
        assert_eq!(s, Streaks { current: 2, best: 4 });
    }

    #[test]
    fn test_streaks_ignore_input_order() {
        let mut shuffled = history("LWWLWWW");
        shuffled.reverse();
        shuffled.swap(1, 4);
        assert_eq!(streaks(&shuffled), Streaks { current: 3, best: 3 });
    }

    #[test]
    fn test_best_never_below_current() {
        for pattern in ["", "W", "L", "WL", "LW", "WWLWW", "LLLW", "WLWWLWWW"] {
            let s = streaks(&history(pattern));
            assert!(s.best >= s.current, "pattern {}", pattern);
        }
    }

    #[test]
    fn test_same_day_matches_use_stage_order() {
        let day = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let make = |id: i64, stage: RoundStage, is_win: bool| PlayerResult {
            match_id: id,
            tournament_id: 1,
            player_id: 1,
            opponent_id: 2,
            is_win,
            loser_id: if is_win { 2 } else { 1 },
            own_score: None,
            opponent_score: None,
            stage,
            effective_at: day,
        };
        // The final was entered first but happened last
        let results = vec![
            make(1, RoundStage::Final, false),
            make(2, RoundStage::Quarterfinal, true),
            make(3, RoundStage::Semifinal, true),
        ];
        assert_eq!(streaks(&results), Streaks { current: 0, best: 2 });
    }
}

//! Chronological ordering of decided matches.
//!
//! Many matches only carry their tournament's date, so time alone cannot
//! order them. The composite key is, most significant first:
//! effective time, stage rank, match id.

use chrono::{DateTime, Utc};

use super::normalize::{DecidedMatch, PlayerResult};
use crate::models::{MatchId, MatchRecord};

/// Composite chronological sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChronoKey {
    pub effective_at: DateTime<Utc>,
    pub stage_rank: u8,
    pub match_id: MatchId,
}

/// Anything that can be placed on the match timeline.
pub trait Chronological {
    fn chrono_key(&self) -> ChronoKey;
}

impl Chronological for DecidedMatch {
    fn chrono_key(&self) -> ChronoKey {
        ChronoKey {
            effective_at: self.effective_at,
            stage_rank: self.stage.rank(),
            match_id: self.match_id,
        }
    }
}

impl Chronological for PlayerResult {
    fn chrono_key(&self) -> ChronoKey {
        ChronoKey {
            effective_at: self.effective_at,
            stage_rank: self.stage.rank(),
            match_id: self.match_id,
        }
    }
}

impl Chronological for MatchRecord {
    fn chrono_key(&self) -> ChronoKey {
        ChronoKey {
            effective_at: self.effective_time(),
            stage_rank: self.stage().rank(),
            match_id: self.id,
        }
    }
}

/// Sort direction. Both directions use the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    OldestFirst,
    NewestFirst,
}

/// Sort in place.
pub fn sort_chronologically<T: Chronological>(items: &mut [T], direction: Direction) {
    match direction {
        Direction::OldestFirst => items.sort_by_key(|m| m.chrono_key()),
        Direction::NewestFirst => items.sort_by_key(|m| std::cmp::Reverse(m.chrono_key())),
    }
}

/// Sorted copy.
pub fn ordered<T: Chronological + Clone>(items: &[T], direction: Direction) -> Vec<T> {
    let mut sorted = items.to_vec();
    sort_chronologically(&mut sorted, direction);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoundStage;
    use chrono::{NaiveDate, TimeZone};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 12).unwrap()
    }

    fn ids(records: &[MatchRecord]) -> Vec<MatchId> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_time_is_most_significant() {
        let early = MatchRecord::new(9, 1, 1, 2, date())
            .with_round("Final")
            .with_end_time(Utc.with_ymd_and_hms(2025, 4, 12, 9, 0, 0).unwrap());
        let late = MatchRecord::new(1, 1, 1, 3, date())
            .with_round("Group A")
            .with_end_time(Utc.with_ymd_and_hms(2025, 4, 12, 18, 0, 0).unwrap());

        let sorted = ordered(&[late, early], Direction::OldestFirst);
        assert_eq!(ids(&sorted), vec![9, 1]);
    }

    #[test]
    fn test_stage_breaks_timestamp_ties() {
        let final_match = MatchRecord::new(1, 1, 1, 2, date()).with_round("Final");
        let semi = MatchRecord::new(2, 1, 1, 3, date()).with_round("Semifinal");
        let quarter = MatchRecord::new(3, 1, 1, 4, date()).with_round("Quarterfinal");
        let unknown = MatchRecord::new(4, 1, 1, 5, date()).with_round("Table 3");

        let sorted = ordered(&[final_match, semi, quarter, unknown], Direction::OldestFirst);
        assert_eq!(ids(&sorted), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_id_is_final_tie_break() {
        let a = MatchRecord::new(12, 1, 1, 2, date()).with_stage(RoundStage::Group);
        let b = MatchRecord::new(11, 1, 1, 3, date()).with_stage(RoundStage::Group);

        let sorted = ordered(&[a, b], Direction::OldestFirst);
        assert_eq!(ids(&sorted), vec![11, 12]);
    }

    #[test]
    fn test_missing_times_sort_at_tournament_date() {
        let dated_only = MatchRecord::new(5, 1, 1, 2, date());
        let previous_day = MatchRecord::new(6, 1, 1, 3, date())
            .with_start_time(Utc.with_ymd_and_hms(2025, 4, 11, 20, 0, 0).unwrap());

        let sorted = ordered(&[dated_only, previous_day], Direction::OldestFirst);
        assert_eq!(ids(&sorted), vec![6, 5]);
    }

    #[test]
    fn test_directions_are_exact_reverses() {
        let records: Vec<MatchRecord> = (1..=6)
            .map(|id| {
                MatchRecord::new(id, 1, 1, 2, date()).with_round(match id % 3 {
                    0 => "Final",
                    1 => "Semifinal",
                    _ => "Group B",
                })
            })
            .collect();

        let oldest = ordered(&records, Direction::OldestFirst);
        let mut newest = ordered(&records, Direction::NewestFirst);
        newest.reverse();
        assert_eq!(ids(&oldest), ids(&newest));
    }
}

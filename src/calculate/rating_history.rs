//! Rating history compaction and live-rating reconciliation.
//!
//! Raw history holds one point per rating-affecting event. For trend
//! charts only the last point of each tournament matters, so the history
//! is compacted to one point per tournament, with a synthetic starting
//! point when the first retained value is not the starting rating.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::config::RatingConfig;
use crate::models::{InputIssue, IssueKind, RatingHistoryPoint, RatingWarning, TournamentId};

/// Compacted series plus anything the caller should look at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingSeries {
    pub points: Vec<RatingHistoryPoint>,
    pub warnings: Vec<RatingWarning>,
    pub issues: Vec<InputIssue>,
}

fn is_later(candidate: &RatingHistoryPoint, current: &RatingHistoryPoint) -> bool {
    (candidate.recorded_at, candidate.match_id)
        .cmp(&(current.recorded_at, current.match_id))
        .then(candidate.rating.total_cmp(&current.rating))
        .is_gt()
}

/// Keep the last point per tournament (points without a tournament share one
/// group), sort by time then tournament id, and prepend a synthetic
/// `starting_rating` point dated one day earlier if needed.
///
/// Non-finite ratings are excluded and reported.
pub fn compact_history(
    points: &[RatingHistoryPoint],
    starting_rating: f64,
) -> (Vec<RatingHistoryPoint>, Vec<InputIssue>) {
    let mut issues = Vec::new();
    let mut last_per_group: BTreeMap<Option<TournamentId>, &RatingHistoryPoint> = BTreeMap::new();

    for point in points {
        if !point.rating.is_finite() {
            issues.push(InputIssue {
                match_id: point.match_id,
                kind: IssueKind::NonFiniteRating,
            });
            continue;
        }

        last_per_group
            .entry(point.tournament_id)
            .and_modify(|current| {
                if is_later(point, current) {
                    *current = point;
                }
            })
            .or_insert(point);
    }

    let mut retained: Vec<RatingHistoryPoint> = last_per_group.into_values().cloned().collect();
    retained.sort_by(|a, b| {
        a.recorded_at
            .cmp(&b.recorded_at)
            .then(a.tournament_id.cmp(&b.tournament_id))
    });

    if let Some(first) = retained.first() {
        if first.rating != starting_rating {
            let synthetic =
                RatingHistoryPoint::new(starting_rating, first.recorded_at - Duration::days(1));
            retained.insert(0, synthetic);
        }
    }

    (retained, issues)
}

/// What to do with the live rating relative to the compacted series.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveRatingDecision {
    /// Series already reflects the live rating closely enough
    Unchanged,
    /// Append a "current" point; history is never rewritten
    AppendCurrent(RatingHistoryPoint),
    /// Leave the series alone and surface the discrepancy
    Flag(RatingWarning),
    /// Live or recorded rating is not a number
    Inconsistent(InputIssue),
}

/// Decide how the live rating relates to the last compacted point.
///
/// | difference              | last point age       | outcome        |
/// |-------------------------|----------------------|----------------|
/// | non-finite              | any                  | inconsistent   |
/// | > implausible_jump      | any                  | flag jump      |
/// | > append_max            | > long_stale_days    | append current |
/// | > append_max            | otherwise            | flag change    |
/// | >= append_min           | > stale_days         | append current |
/// | otherwise               | any                  | unchanged      |
pub fn decide_live_rating(
    series: &[RatingHistoryPoint],
    live_rating: f64,
    as_of: DateTime<Utc>,
    config: &RatingConfig,
) -> LiveRatingDecision {
    let Some(last) = series.last() else {
        return LiveRatingDecision::Unchanged;
    };

    let difference = (live_rating - last.rating).abs();
    if !difference.is_finite() {
        return LiveRatingDecision::Inconsistent(InputIssue::general(IssueKind::NonFiniteRating));
    }

    let age = as_of - last.recorded_at;
    let current_point = || RatingHistoryPoint::new(live_rating, as_of);

    if difference > config.implausible_jump {
        LiveRatingDecision::Flag(RatingWarning::ImplausibleJump {
            last_rating: last.rating,
            live_rating,
            difference,
        })
    } else if difference > config.append_max {
        if age > Duration::days(config.long_stale_days) {
            LiveRatingDecision::AppendCurrent(current_point())
        } else {
            LiveRatingDecision::Flag(RatingWarning::UnrecordedChange {
                last_rating: last.rating,
                live_rating,
                difference,
            })
        }
    } else if difference >= config.append_min && age > Duration::days(config.stale_days) {
        LiveRatingDecision::AppendCurrent(current_point())
    } else {
        LiveRatingDecision::Unchanged
    }
}

/// Compact the raw history and reconcile it with the live rating.
pub fn build_series(
    raw: &[RatingHistoryPoint],
    live_rating: f64,
    as_of: DateTime<Utc>,
    config: &RatingConfig,
) -> RatingSeries {
    let (mut points, mut issues) = compact_history(raw, config.starting_rating);
    let mut warnings = Vec::new();

    match decide_live_rating(&points, live_rating, as_of, config) {
        LiveRatingDecision::Unchanged => {}
        LiveRatingDecision::AppendCurrent(point) => points.push(point),
        LiveRatingDecision::Flag(warning) => {
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }
        LiveRatingDecision::Inconsistent(issue) => issues.push(issue),
    }

    RatingSeries {
        points,
        warnings,
        issues,
    }
}

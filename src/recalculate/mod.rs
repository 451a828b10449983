//! Recalculation orchestrator.
//!
//! Rederives a player's cached stats and rating series, or a tournament's
//! standings, from source records and overwrites the stored document:
//! 1. Fetch the relevant records from the store
//! 2. Run the pure computations in [`crate::calculate`]
//! 3. Replace the derived document in a single atomic write
//!
//! Recalculations carry a fixed `as_of` reference time, so repeating one with
//! no data change in between writes byte-identical documents.

pub mod store;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::calculate::{compute_player, compute_standings, PlayerComputation, StandingsOutcome};
use crate::config::{AppConfig, RatingConfig, StandingsConfig};
use crate::models::{
    Fingerprint, InputIssue, MatchId, MatchRecord, PlayerId, PlayerStats, RatingHistoryPoint,
    RatingWarning, TournamentId,
};
use crate::storage::StorageError;

pub use store::{InMemoryStore, JsonlStore, ResultsStore};

/// Errors that can occur during recalculation.
#[derive(Debug, Error)]
pub enum RecalcError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Recalculation task failed: {0}")]
    Task(String),
}

/// What to recalculate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum RecalcTarget {
    Player(PlayerId),
    Tournament(TournamentId),
}

impl RecalcTarget {
    /// Targets whose derived data depend on a match: both players and the
    /// tournament it belongs to.
    pub fn affected_by(record: &MatchRecord) -> Vec<RecalcTarget> {
        let mut targets = vec![
            RecalcTarget::Player(record.player1_id),
            RecalcTarget::Player(record.player2_id),
            RecalcTarget::Tournament(record.tournament_id),
        ];
        targets.sort();
        targets.dedup();
        targets
    }
}

impl fmt::Display for RecalcTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecalcTarget::Player(id) => write!(f, "player {}", id),
            RecalcTarget::Tournament(id) => write!(f, "tournament {}", id),
        }
    }
}

/// Stored derived data of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDocument {
    pub player_id: PlayerId,
    pub stats: PlayerStats,
    pub rating_history: Vec<RatingHistoryPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RatingWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<InputIssue>,
    pub fingerprint: Fingerprint,
}

impl PlayerDocument {
    pub fn from_computation(computation: PlayerComputation) -> Result<Self, serde_json::Error> {
        let fingerprint = Fingerprint::of(&computation)?;
        Ok(Self {
            player_id: computation.player_id,
            stats: computation.stats,
            rating_history: computation.rating_history,
            warnings: computation.warnings,
            issues: computation.issues,
            fingerprint,
        })
    }
}

/// Stored standings of one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsDocument {
    #[serde(flatten)]
    pub outcome: StandingsOutcome,
    pub fingerprint: Fingerprint,
}

impl StandingsDocument {
    pub fn from_outcome(outcome: StandingsOutcome) -> Result<Self, serde_json::Error> {
        let fingerprint = Fingerprint::of(&outcome)?;
        Ok(Self {
            outcome,
            fingerprint,
        })
    }
}

/// Whether a recalculation changed the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecalcStatus {
    /// No document existed, or its fingerprint differed
    Changed,
    Unchanged,
}

/// A recalculated document and how it compares with the stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculated<D> {
    pub document: D,
    pub status: RecalcStatus,
    /// False in dry-run mode
    pub written: bool,
}

/// Result of a batch recalculation.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub changed: u32,
    pub unchanged: u32,
    pub failed: u32,
    /// One line per failed target, ordered by target
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl SweepReport {
    pub fn total(&self) -> u32 {
        self.changed + self.unchanged + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

fn status_of(previous: Option<&Fingerprint>, current: &Fingerprint) -> RecalcStatus {
    match previous {
        Some(fp) if fp == current => RecalcStatus::Unchanged,
        _ => RecalcStatus::Changed,
    }
}

/// Drives recalculations against a [`ResultsStore`].
pub struct Recalculator<S> {
    store: Arc<S>,
    rating: RatingConfig,
    standings: StandingsConfig,
    workers: usize,
    as_of: DateTime<Utc>,
    dry_run: bool,
}

impl<S> Clone for Recalculator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rating: self.rating.clone(),
            standings: self.standings.clone(),
            workers: self.workers,
            as_of: self.as_of,
            dry_run: self.dry_run,
        }
    }
}

impl<S: ResultsStore + 'static> Recalculator<S> {
    /// Create a recalculator. `as_of` is the reference time for rating
    /// staleness and for any appended "current" rating point.
    pub fn new(store: Arc<S>, config: &AppConfig, as_of: DateTime<Utc>) -> Self {
        Self {
            store,
            rating: config.rating.clone(),
            standings: config.standings.clone(),
            workers: config.engine.workers.max(1),
            as_of,
            dry_run: false,
        }
    }

    /// Compute and compare without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Rederive one player's stats and rating series and overwrite their
    /// document.
    pub async fn recalculate_player(
        &self,
        player_id: PlayerId,
    ) -> Result<Recalculated<PlayerDocument>, RecalcError> {
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(RecalcError::PlayerNotFound(player_id))?;
        let records = self.store.player_matches(player_id).await?;
        let history = self.store.rating_history(player_id).await?;

        let computation = compute_player(&player, &records, &history, &self.rating, self.as_of);
        for issue in &computation.issues {
            warn!("Player {}: excluded input: {}", player_id, issue);
        }
        let document = PlayerDocument::from_computation(computation)?;

        let previous = self.store.player_document(player_id).await?;
        let status = status_of(
            previous.as_ref().map(|d| &d.fingerprint),
            &document.fingerprint,
        );
        if player.cached_stats() != document.stats {
            debug!("Player {} cached stats are stale", player_id);
        }

        if !self.dry_run {
            self.store.write_player_document(&document).await?;
        }

        debug!(
            "Recalculated player {}: {} games, {:?}",
            player_id, document.stats.games_played, status
        );
        Ok(Recalculated {
            document,
            status,
            written: !self.dry_run,
        })
    }

    /// Recompute a tournament's standings and overwrite its document.
    pub async fn recalculate_tournament_standings(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Recalculated<StandingsDocument>, RecalcError> {
        let tournament = self
            .store
            .tournament(tournament_id)
            .await?
            .ok_or(RecalcError::TournamentNotFound(tournament_id))?;
        let records = self.store.tournament_matches(tournament_id).await?;

        let outcome = compute_standings(&tournament, &records, &self.standings);
        for issue in &outcome.issues {
            warn!("Tournament {}: excluded input: {}", tournament_id, issue);
        }
        let document = StandingsDocument::from_outcome(outcome)?;

        let previous = self.store.standings_document(tournament_id).await?;
        let status = status_of(
            previous.as_ref().map(|d| &d.fingerprint),
            &document.fingerprint,
        );

        if !self.dry_run {
            self.store.write_standings_document(&document).await?;
        }

        debug!(
            "Recalculated tournament {}: {} standings, {:?}",
            tournament_id,
            document.outcome.standings.len(),
            status
        );
        Ok(Recalculated {
            document,
            status,
            written: !self.dry_run,
        })
    }

    pub async fn recalculate(&self, target: RecalcTarget) -> Result<RecalcStatus, RecalcError> {
        match target {
            RecalcTarget::Player(id) => Ok(self.recalculate_player(id).await?.status),
            RecalcTarget::Tournament(id) => {
                Ok(self.recalculate_tournament_standings(id).await?.status)
            }
        }
    }

    /// Recalculate everything a match feeds into, e.g. after a score entry.
    pub async fn recalculate_match(&self, match_id: MatchId) -> Result<SweepReport, RecalcError> {
        let records = self.store.match_records(match_id).await?;
        if records.is_empty() {
            return Err(RecalcError::MatchNotFound(match_id));
        }

        let mut targets: Vec<RecalcTarget> =
            records.iter().flat_map(RecalcTarget::affected_by).collect();
        targets.sort();
        targets.dedup();

        Ok(self.sweep(targets).await)
    }

    /// Recalculate every player and every tournament in the store.
    pub async fn recalculate_all(&self) -> Result<SweepReport, RecalcError> {
        let mut targets: Vec<RecalcTarget> = self
            .store
            .player_ids()
            .await?
            .into_iter()
            .map(RecalcTarget::Player)
            .collect();
        targets.extend(
            self.store
                .tournament_ids()
                .await?
                .into_iter()
                .map(RecalcTarget::Tournament),
        );

        info!(
            "Recalculating {} targets with {} workers{}",
            targets.len(),
            self.workers,
            if self.dry_run { " (dry run)" } else { "" }
        );
        Ok(self.sweep(targets).await)
    }

    /// Recalculate `targets` with at most `workers` in flight. A failed
    /// target is counted and logged; the rest of the sweep carries on.
    pub async fn sweep(&self, targets: Vec<RecalcTarget>) -> SweepReport {
        let start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for target in targets {
            let recalculator = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => recalculator.recalculate(target).await,
                    Err(e) => Err(RecalcError::Task(e.to_string())),
                };
                (target, result)
            });
        }

        let mut report = SweepReport::default();
        let mut failures: Vec<(Option<RecalcTarget>, String)> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(RecalcStatus::Changed))) => report.changed += 1,
                Ok((_, Ok(RecalcStatus::Unchanged))) => report.unchanged += 1,
                Ok((target, Err(e))) => {
                    error!("Failed to recalculate {}: {}", target, e);
                    report.failed += 1;
                    failures.push((Some(target), format!("{}: {}", target, e)));
                }
                Err(e) => {
                    error!("Recalculation task aborted: {}", e);
                    report.failed += 1;
                    failures.push((None, RecalcError::Task(e.to_string()).to_string()));
                }
            }
        }

        failures.sort();
        report.errors = failures.into_iter().map(|(_, message)| message).collect();
        report.duration = start.elapsed();

        info!(
            "Sweep completed: {} changed, {} unchanged, {} failed in {:?}",
            report.changed, report.unchanged, report.failed, report.duration
        );
        report
    }
}

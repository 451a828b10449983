//! Persistence seam of the recalculation engine.
//!
//! The orchestrator reads source records and writes derived documents only
//! through [`ResultsStore`]. Two backends ship with the crate: the JSONL data
//! lake used by the CLI and an in-memory store for embedding and tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

#[cfg(test)]
use super::RecalcTarget;
use super::{PlayerDocument, StandingsDocument};
use crate::models::{
    MatchId, MatchRecord, Player, PlayerId, RatingHistoryPoint, RatingHistoryRecord, Tournament,
    TournamentId,
};
use crate::storage::{
    read_document, write_document, EntityType, JsonlReader, StorageConfig, StorageError,
};

/// Source records in, derived documents out.
///
/// Every write replaces exactly one document and must be atomic: a reader
/// sees either the previous document or the new one.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StorageError>;

    /// All match records where the player is on either side.
    async fn player_matches(&self, id: PlayerId) -> Result<Vec<MatchRecord>, StorageError>;

    async fn rating_history(&self, id: PlayerId)
        -> Result<Vec<RatingHistoryPoint>, StorageError>;

    async fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError>;

    async fn tournament_matches(&self, id: TournamentId)
        -> Result<Vec<MatchRecord>, StorageError>;

    /// Every record carrying this match id (duplicates included).
    async fn match_records(&self, id: MatchId) -> Result<Vec<MatchRecord>, StorageError>;

    /// All known player ids, ascending.
    async fn player_ids(&self) -> Result<Vec<PlayerId>, StorageError>;

    /// All known tournament ids, ascending.
    async fn tournament_ids(&self) -> Result<Vec<TournamentId>, StorageError>;

    async fn player_document(&self, id: PlayerId)
        -> Result<Option<PlayerDocument>, StorageError>;

    async fn write_player_document(&self, document: &PlayerDocument)
        -> Result<(), StorageError>;

    async fn standings_document(
        &self,
        id: TournamentId,
    ) -> Result<Option<StandingsDocument>, StorageError>;

    async fn write_standings_document(
        &self,
        document: &StandingsDocument,
    ) -> Result<(), StorageError>;
}

/// Store backed by the JSONL data lake.
///
/// Source files are snapshots. For players and tournaments a later line
/// supersedes an earlier one with the same id; match lines are passed
/// through as-is so duplicate ids reach the normalizer.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn players(&self) -> JsonlReader<Player> {
        JsonlReader::for_entity(&self.config, EntityType::Player)
    }

    fn matches(&self) -> JsonlReader<MatchRecord> {
        JsonlReader::for_entity(&self.config, EntityType::Match)
    }

    fn tournaments(&self) -> JsonlReader<Tournament> {
        JsonlReader::for_entity(&self.config, EntityType::Tournament)
    }
}

#[async_trait]
impl ResultsStore for JsonlStore {
    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self.players().read_where(|p| p.id == id)?.pop())
    }

    async fn player_matches(&self, id: PlayerId) -> Result<Vec<MatchRecord>, StorageError> {
        self.matches().read_where(|m| m.involves(id))
    }

    async fn rating_history(
        &self,
        id: PlayerId,
    ) -> Result<Vec<RatingHistoryPoint>, StorageError> {
        let reader: JsonlReader<RatingHistoryRecord> =
            JsonlReader::for_entity(&self.config, EntityType::RatingHistory);
        Ok(reader
            .read_where(|r| r.player_id == id)?
            .into_iter()
            .map(|r| r.point)
            .collect())
    }

    async fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError> {
        Ok(self.tournaments().read_where(|t| t.id == id)?.pop())
    }

    async fn tournament_matches(
        &self,
        id: TournamentId,
    ) -> Result<Vec<MatchRecord>, StorageError> {
        self.matches().read_where(|m| m.tournament_id == id)
    }

    async fn match_records(&self, id: MatchId) -> Result<Vec<MatchRecord>, StorageError> {
        self.matches().read_where(|m| m.id == id)
    }

    async fn player_ids(&self) -> Result<Vec<PlayerId>, StorageError> {
        let ids: BTreeSet<PlayerId> = self.players().read_all()?.iter().map(|p| p.id).collect();
        Ok(ids.into_iter().collect())
    }

    async fn tournament_ids(&self) -> Result<Vec<TournamentId>, StorageError> {
        let ids: BTreeSet<TournamentId> = self
            .tournaments()
            .read_all()?
            .iter()
            .map(|t| t.id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn player_document(
        &self,
        id: PlayerId,
    ) -> Result<Option<PlayerDocument>, StorageError> {
        read_document(&self.config.player_document_path(id))
    }

    async fn write_player_document(
        &self,
        document: &PlayerDocument,
    ) -> Result<(), StorageError> {
        write_document(&self.config.player_document_path(document.player_id), document)
    }

    async fn standings_document(
        &self,
        id: TournamentId,
    ) -> Result<Option<StandingsDocument>, StorageError> {
        read_document(&self.config.standings_document_path(id))
    }

    async fn write_standings_document(
        &self,
        document: &StandingsDocument,
    ) -> Result<(), StorageError> {
        write_document(
            &self
                .config
                .standings_document_path(document.outcome.tournament_id),
            document,
        )
    }
}

#[derive(Debug, Default)]
struct MemoryData {
    players: BTreeMap<PlayerId, Player>,
    matches: Vec<MatchRecord>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    history: Vec<RatingHistoryRecord>,
    player_documents: BTreeMap<PlayerId, PlayerDocument>,
    standings_documents: BTreeMap<TournamentId, StandingsDocument>,
    #[cfg(test)]
    failing_writes: BTreeSet<RecalcTarget>,
}

/// Store holding everything in memory.
///
/// Writing a player document also refreshes the cached fields of the stored
/// player, the way a database-backed store would update the player row.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<MemoryData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(mut self, players: Vec<Player>) -> Self {
        let data = self.data.get_mut();
        data.players.extend(players.into_iter().map(|p| (p.id, p)));
        self
    }

    pub fn with_matches(mut self, matches: Vec<MatchRecord>) -> Self {
        self.data.get_mut().matches.extend(matches);
        self
    }

    pub fn with_tournaments(mut self, tournaments: Vec<Tournament>) -> Self {
        let data = self.data.get_mut();
        data.tournaments
            .extend(tournaments.into_iter().map(|t| (t.id, t)));
        self
    }

    pub fn with_rating_history(mut self, records: Vec<RatingHistoryRecord>) -> Self {
        self.data.get_mut().history.extend(records);
        self
    }

    /// Make every write for `target` fail with an I/O error.
    #[cfg(test)]
    pub fn with_failing_writes(mut self, target: RecalcTarget) -> Self {
        self.data.get_mut().failing_writes.insert(target);
        self
    }

    /// Record a new or updated match (later records replace earlier ones
    /// with the same id).
    pub async fn upsert_match(&self, record: MatchRecord) {
        let mut data = self.data.write().await;
        data.matches.retain(|m| m.id != record.id);
        data.matches.push(record);
    }

    #[cfg(test)]
    fn check_write(data: &MemoryData, target: RecalcTarget) -> Result<(), StorageError> {
        if data.failing_writes.contains(&target) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("write rejected for {}", target),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultsStore for InMemoryStore {
    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self.data.read().await.players.get(&id).cloned())
    }

    async fn player_matches(&self, id: PlayerId) -> Result<Vec<MatchRecord>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .matches
            .iter()
            .filter(|m| m.involves(id))
            .cloned()
            .collect())
    }

    async fn rating_history(
        &self,
        id: PlayerId,
    ) -> Result<Vec<RatingHistoryPoint>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .history
            .iter()
            .filter(|r| r.player_id == id)
            .map(|r| r.point.clone())
            .collect())
    }

    async fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError> {
        Ok(self.data.read().await.tournaments.get(&id).cloned())
    }

    async fn tournament_matches(
        &self,
        id: TournamentId,
    ) -> Result<Vec<MatchRecord>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .matches
            .iter()
            .filter(|m| m.tournament_id == id)
            .cloned()
            .collect())
    }

    async fn match_records(&self, id: MatchId) -> Result<Vec<MatchRecord>, StorageError> {
        let data = self.data.read().await;
        Ok(data.matches.iter().filter(|m| m.id == id).cloned().collect())
    }

    async fn player_ids(&self) -> Result<Vec<PlayerId>, StorageError> {
        Ok(self.data.read().await.players.keys().copied().collect())
    }

    async fn tournament_ids(&self) -> Result<Vec<TournamentId>, StorageError> {
        Ok(self.data.read().await.tournaments.keys().copied().collect())
    }

    async fn player_document(
        &self,
        id: PlayerId,
    ) -> Result<Option<PlayerDocument>, StorageError> {
        Ok(self.data.read().await.player_documents.get(&id).cloned())
    }

    async fn write_player_document(
        &self,
        document: &PlayerDocument,
    ) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        #[cfg(test)]
        Self::check_write(&data, RecalcTarget::Player(document.player_id))?;

        if let Some(player) = data.players.get_mut(&document.player_id) {
            player.apply_stats(&document.stats);
        }
        data.player_documents
            .insert(document.player_id, document.clone());
        debug!("Stored player document {}", document.player_id);
        Ok(())
    }

    async fn standings_document(
        &self,
        id: TournamentId,
    ) -> Result<Option<StandingsDocument>, StorageError> {
        Ok(self.data.read().await.standings_documents.get(&id).cloned())
    }

    async fn write_standings_document(
        &self,
        document: &StandingsDocument,
    ) -> Result<(), StorageError> {
        let tournament_id = document.outcome.tournament_id;
        let mut data = self.data.write().await;
        #[cfg(test)]
        Self::check_write(&data, RecalcTarget::Tournament(tournament_id))?;

        data.standings_documents
            .insert(tournament_id, document.clone());
        debug!("Stored standings document {}", tournament_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TournamentFormat;
    use crate::storage::JsonlWriter;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 12).unwrap()
    }

    fn seeded_lake(temp_dir: &TempDir) -> JsonlStore {
        let config = StorageConfig::new(temp_dir.path().to_path_buf());

        JsonlWriter::for_entity(&config, EntityType::Player)
            .write_all(&[
                Player::new(2, "Grace", 1000.0),
                Player::new(1, "Ada", 1000.0),
                Player::new(2, "Grace Hopper", 1010.0),
            ])
            .unwrap();
        JsonlWriter::for_entity(&config, EntityType::Match)
            .write_all(&[
                MatchRecord::new(1, 7, 1, 2, date()).with_winner(1),
                MatchRecord::new(2, 8, 2, 3, date()).with_winner(3),
                MatchRecord::new(2, 8, 2, 3, date()).with_winner(2),
            ])
            .unwrap();
        JsonlWriter::for_entity(&config, EntityType::Tournament)
            .write_all(&[
                Tournament::new(8, date(), TournamentFormat::RoundRobin),
                Tournament::new(7, date(), TournamentFormat::SingleElimination),
            ])
            .unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 4, 12, 18, 0, 0).unwrap();
        JsonlWriter::for_entity(&config, EntityType::RatingHistory)
            .write_all(&[
                RatingHistoryRecord::new(
                    1,
                    RatingHistoryPoint::new(1016.0, evening).with_tournament(7),
                ),
                RatingHistoryRecord::new(
                    2,
                    RatingHistoryPoint::new(984.0, evening).with_tournament(7),
                ),
            ])
            .unwrap();

        JsonlStore::new(config)
    }

    #[tokio::test]
    async fn test_jsonl_store_reads_source_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_lake(&temp_dir);

        assert_eq!(store.player_ids().await.unwrap(), vec![1, 2]);
        assert_eq!(store.tournament_ids().await.unwrap(), vec![7, 8]);

        // Later line wins
        let grace = store.player(2).await.unwrap().unwrap();
        assert_eq!(grace.name, "Grace Hopper");
        assert!(store.player(9).await.unwrap().is_none());

        assert_eq!(store.player_matches(2).await.unwrap().len(), 3);
        assert_eq!(store.tournament_matches(8).await.unwrap().len(), 2);
        assert_eq!(store.match_records(2).await.unwrap().len(), 2);

        let history = store.rating_history(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rating, 1016.0);
    }

    #[tokio::test]
    async fn test_jsonl_store_missing_lake_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlStore::new(StorageConfig::new(temp_dir.path().join("nowhere")));

        assert!(store.player_ids().await.unwrap().is_empty());
        assert!(store.player_matches(1).await.unwrap().is_empty());
        assert!(store.player_document(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_upsert_replaces_match() {
        let store = InMemoryStore::new()
            .with_matches(vec![MatchRecord::new(1, 7, 1, 2, date())]);

        store
            .upsert_match(MatchRecord::new(1, 7, 1, 2, date()).with_winner(2))
            .await;

        let records = store.match_records(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].winner_id, Some(2));
    }
}

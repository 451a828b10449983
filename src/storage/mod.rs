//! Filesystem data lake operations.
//!
//! Layout under the data directory:
//! - `normalized/` JSONL source records (players, matches, tournaments,
//!   rating history), written by the score-entry side
//! - `derived/players/<id>.json` recalculated player documents
//! - `derived/standings/<id>.json` recalculated tournament standings

pub mod jsonl;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{PlayerId, TournamentId};

pub use jsonl::{EntityType, JsonlReader};

#[cfg(test)]
pub use jsonl::JsonlWriter;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.data_dir.join("normalized")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }

    /// Source file for an entity type.
    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.normalized_dir().join(entity.filename())
    }

    pub fn player_document_path(&self, player_id: PlayerId) -> PathBuf {
        self.derived_dir()
            .join("players")
            .join(format!("{}.json", player_id))
    }

    pub fn standings_document_path(&self, tournament_id: TournamentId) -> PathBuf {
        self.derived_dir()
            .join("standings")
            .join(format!("{}.json", tournament_id))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Path of the staging file used while replacing `path`.
fn staging_path(path: &Path) -> Result<PathBuf, StorageError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    Ok(path.with_file_name(format!(".{}.tmp", name)))
}

/// Replace a file's content atomically: write a staging file, flush it to
/// disk, then rename it over the target. Readers see either the old or the
/// new content, never a mix.
pub fn replace_file<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), StorageError>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path)?;
    let result = (|| {
        let file = File::create(&staging)?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&staging, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

/// Atomically write a single JSON document.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    replace_file(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)?;
        Ok(())
    })?;
    debug!("Wrote document {:?}", path);
    Ok(())
}

/// Read a JSON document; `None` if it does not exist.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

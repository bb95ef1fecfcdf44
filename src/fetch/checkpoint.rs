//! Resume checkpoints.
//!
//! A checkpoint is two files in the output directory: a small metadata file
//! with the resume cursor and a records file with everything collected so far.
//! Both are written to a temporary file and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{Record, RecordCollection};

pub const CHECKPOINT_FILE: &str = ".export_checkpoint.json";
pub const RECORDS_FILE: &str = ".export_records.json";

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: &str = "1.0";

/// Checkpoint metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub user_id: String,
    pub cursor: Option<String>,
    pub total_fetched: usize,
    pub download_media: bool,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl Checkpoint {
    /// One-line summary for the console.
    pub fn progress_line(&self) -> String {
        format!(
            "{} records fetched for user {} (saved {})",
            self.total_fetched,
            self.user_id,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    pub fn is_valid_for(&self, user_id: &str) -> bool {
        self.user_id == user_id && self.version == CHECKPOINT_VERSION
    }
}

/// Reads and writes checkpoints in one output directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    pub fn exists(&self) -> bool {
        self.checkpoint_path().exists()
    }

    /// Persist the cursor and records collected so far.
    pub fn save(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        records: &RecordCollection,
        download_media: bool,
    ) -> Result<Checkpoint> {
        fs::create_dir_all(&self.dir)?;

        let checkpoint = Checkpoint {
            user_id: user_id.to_string(),
            cursor: cursor.map(str::to_string),
            total_fetched: records.len(),
            download_media,
            timestamp: Utc::now(),
            version: CHECKPOINT_VERSION.to_string(),
        };

        write_atomic(&self.records_path(), &serde_json::to_vec(records.as_slice())?)?;
        write_atomic(
            &self.checkpoint_path(),
            &serde_json::to_vec_pretty(&checkpoint)?,
        )?;

        tracing::debug!(
            "Checkpoint saved: {} records, cursor {:?}",
            checkpoint.total_fetched,
            checkpoint.cursor
        );
        Ok(checkpoint)
    }

    /// Load the checkpoint and its records.
    ///
    /// Returns `None` when no checkpoint exists or it cannot be read.
    pub fn load(&self) -> Option<(Checkpoint, RecordCollection)> {
        if !self.exists() {
            return None;
        }

        match self.read() {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                tracing::warn!("Ignoring unreadable checkpoint: {}", e);
                None
            }
        }
    }

    fn read(&self) -> Result<(Checkpoint, RecordCollection)> {
        let checkpoint: Checkpoint = serde_json::from_str(&fs::read_to_string(self.checkpoint_path())?)
            .map_err(|e| Error::Checkpoint(format!("invalid metadata: {}", e)))?;

        let records: Vec<Record> = match fs::read_to_string(self.records_path()) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| Error::Checkpoint(format!("invalid records: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok((checkpoint, RecordCollection::from_records(records)))
    }

    /// Metadata only, for `--checkpoint-info`.
    pub fn info(&self) -> Option<Checkpoint> {
        if !self.exists() {
            return None;
        }
        fs::read_to_string(self.checkpoint_path())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
    }

    /// Remove both checkpoint files. Missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        for path in [self.checkpoint_path(), self.records_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::debug!("Checkpoint cleared in {}", self.dir.display());
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

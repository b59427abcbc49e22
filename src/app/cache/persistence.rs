//! Best-effort on-disk snapshot of the schedule
//!
//! Snapshots are written in the wire format so a stored file can be served
//! or inspected directly. Writes go to a temporary sibling first and are
//! renamed into place, so a crash never leaves a half-written snapshot.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::app::models::Schedule;
use crate::constants::files;
use crate::errors::{PersistenceError, PersistenceResult};

/// Stores and loads one schedule snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(files::TEMP_FILE_SUFFIX);
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the stored snapshot
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if the file exists but cannot be read,
    /// or `PersistenceError::Corrupted` if it is not valid wire-format JSON.
    pub async fn load(&self) -> PersistenceResult<Option<Schedule>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No schedule snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let schedule: Schedule =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Corrupted {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Loaded schedule snapshot with {} presentations from {}",
            schedule.presentations.len(),
            self.path.display()
        );
        Ok(Some(schedule.normalized()))
    }

    /// Atomically write `schedule` to the snapshot file
    pub async fn save(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let content = serde_json::to_vec_pretty(schedule)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.io_error(e));
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(
            bytes = content.len(),
            "Saved schedule snapshot to {}",
            self.path.display()
        );
        Ok(())
    }
}

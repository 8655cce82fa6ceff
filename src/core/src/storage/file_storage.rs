use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, info, warn};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::LogStore;
use crate::storage::types::{newest_first, AttackStats, LogRecord, StoredLog};

/// Append-only JSON-lines store.
///
/// Every insert is written as one line and flushed before the call returns. The whole file
/// is read back when the storage is opened, so queries are answered from memory.
pub struct FileStorage {
    path: PathBuf,
    state: Mutex<State>,
}

struct State {
    file: File,
    logs: Vec<StoredLog>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create storage dir {}: {}", parent.display(), e);
                StorageError::ConnectionFailed
            })?;
        }

        let logs = if path.exists() {
            Self::load(&path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                error!("Failed to open storage file {}: {}", path.display(), e);
                StorageError::ConnectionFailed
            })?;

        info!(
            "FileStorage initialized at {} with {} record(s)",
            path.display(),
            logs.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(State { file, logs }),
        })
    }

    fn load(path: &Path) -> Result<Vec<StoredLog>, StorageError> {
        let file = File::open(path).map_err(|e| {
            error!("Failed to read storage file {}: {}", path.display(), e);
            StorageError::ReadFailed
        })?;

        let mut logs = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                error!("Read failed {}: {}", path.display(), e);
                StorageError::ReadFailed
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredLog>(&line) {
                Ok(log) => logs.push(log),
                Err(e) => warn!(
                    "Skipping corrupt line {} in {}: {}",
                    index + 1,
                    path.display(),
                    e
                ),
            }
        }
        debug!("Loaded {} record(s) from {}", logs.len(), path.display());
        Ok(logs)
    }
}

impl LogStore for FileStorage {
    fn insert(&self, record: LogRecord) -> Result<StoredLog, StorageError> {
        let stored = StoredLog::received_now(record);
        let mut line = serde_json::to_string(&stored).map_err(|e| {
            error!("Failed to encode record: {}", e);
            StorageError::WriteFailed
        })?;
        line.push('\n');

        let mut state = self.state.lock().map_err(|e| {
            error!("File storage lock poisoned: {}", e);
            StorageError::WriteFailed
        })?;
        let written = state.file.write_all(line.as_bytes());
        written.and_then(|_| state.file.flush()).map_err(|e| {
            error!("Write failed {}: {}", self.path.display(), e);
            StorageError::WriteFailed
        })?;
        state.logs.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredLog>, StorageError> {
        let state = self.state.lock().map_err(|_| StorageError::ReadFailed)?;
        Ok(newest_first(&state.logs, limit))
    }

    fn stats(&self) -> Result<AttackStats, StorageError> {
        let state = self.state.lock().map_err(|_| StorageError::ReadFailed)?;
        Ok(AttackStats::from_logs(state.logs.iter()))
    }
}

//! Storage subsystem of the collector.
//!
//! Components:
//! - `storage_trait`: the [`LogStore`] trait shared by every backend.
//! - `types`: posted records, stored rows and statistics.
//! - `memory_storage`: volatile backend.
//! - `file_storage`: JSON-lines file backend that survives restarts.

pub mod file_storage;
pub mod memory_storage;
pub mod storage_trait;
pub mod types;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use storage_trait::LogStore;
pub use types::{AttackStats, LogRecord, StoredLog};

use crate::error_handling::types::StorageError;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// File-backed store when a path is given, in-memory store otherwise.
pub fn open_store(path: Option<&Path>) -> Result<Arc<dyn LogStore>, StorageError> {
    match path {
        Some(path) => Ok(Arc::new(FileStorage::open(path)?)),
        None => {
            info!("No storage path configured, records are kept in memory only");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

//! Storage Trait
//!
//! Interface shared by the collector's log backends. All methods return a `Result` so a
//! backend can report I/O problems to the HTTP layer.

use crate::error_handling::types::StorageError;
use crate::storage::types::{AttackStats, LogRecord, StoredLog};

pub trait LogStore: Send + Sync {
    /// Stores `record`, stamped with the current time, and returns the stored row.
    fn insert(&self, record: LogRecord) -> Result<StoredLog, StorageError>;

    /// At most `limit` records, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<StoredLog>, StorageError>;

    fn stats(&self) -> Result<AttackStats, StorageError>;
}

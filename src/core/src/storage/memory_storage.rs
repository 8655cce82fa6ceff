use log::{debug, error};
use std::sync::Mutex;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::LogStore;
use crate::storage::types::{newest_first, AttackStats, LogRecord, StoredLog};

/// Volatile store, used when the collector runs without a storage path.
#[derive(Default)]
pub struct MemoryStorage {
    logs: Mutex<Vec<StoredLog>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemoryStorage {
    fn insert(&self, record: LogRecord) -> Result<StoredLog, StorageError> {
        let stored = StoredLog::received_now(record);
        let mut logs = self.logs.lock().map_err(|e| {
            error!("Memory storage lock poisoned: {}", e);
            StorageError::WriteFailed
        })?;
        logs.push(stored.clone());
        debug!("Stored log #{} in memory", logs.len());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredLog>, StorageError> {
        let logs = self.logs.lock().map_err(|_| StorageError::ReadFailed)?;
        Ok(newest_first(&logs, limit))
    }

    fn stats(&self) -> Result<AttackStats, StorageError> {
        let logs = self.logs.lock().map_err(|_| StorageError::ReadFailed)?;
        Ok(AttackStats::from_logs(logs.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ip: &str, username: &str) -> LogRecord {
        LogRecord {
            kind: Some("ssh_login".to_string()),
            source_ip: Some(ip.to_string()),
            username: Some(username.to_string()),
            password: Some(String::new()),
            timestamp: Some(0.0),
        }
    }

    #[test]
    fn test_insert_then_query() {
        let storage = MemoryStorage::new();
        storage.insert(record("192.0.2.1", "root")).unwrap();
        storage.insert(record("192.0.2.1", "admin")).unwrap();
        storage.insert(record("192.0.2.9", "pi")).unwrap();

        let recent = storage.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].record.username.as_deref(), Some("pi"));
        assert_eq!(recent[1].record.username.as_deref(), Some("admin"));

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_attacks, 3);
        assert_eq!(stats.unique_attackers, 2);
    }

    #[test]
    fn test_empty_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.recent(50).unwrap().is_empty());
        assert_eq!(storage.stats().unwrap(), AttackStats::default());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One capture as posted by an agent.
///
/// Every field is optional: the collector stores whatever it is given and leaves validation
/// to whoever reads the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source_ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timestamp: Option<f64>,
}

/// A record as stored, stamped with the time the collector received it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLog {
    #[serde(flatten)]
    pub record: LogRecord,
    pub created_at: DateTime<Utc>,
}

impl StoredLog {
    pub fn received_now(record: LogRecord) -> Self {
        Self {
            record,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStats {
    pub total_attacks: usize,
    /// Distinct source addresses; records without one are not counted.
    pub unique_attackers: usize,
}

impl AttackStats {
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a StoredLog>) -> Self {
        let mut total_attacks = 0;
        let mut sources = HashSet::new();
        for log in logs {
            total_attacks += 1;
            if let Some(ip) = &log.record.source_ip {
                sources.insert(ip.as_str());
            }
        }
        Self {
            total_attacks,
            unique_attackers: sources.len(),
        }
    }
}

/// The `limit` most recent logs, newest first. Logs received at the same instant keep
/// insertion order reversed, so the last one stored comes first.
pub fn newest_first(logs: &[StoredLog], limit: usize) -> Vec<StoredLog> {
    let mut recent: Vec<StoredLog> = logs.iter().rev().cloned().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn stored(ip: Option<&str>, secs: i64) -> StoredLog {
        StoredLog {
            record: LogRecord {
                source_ip: ip.map(str::to_string),
                ..LogRecord::default()
            },
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_record_accepts_partial_bodies() {
        let record: LogRecord = serde_json::from_value(json!({"username": "root"})).unwrap();
        assert_eq!(record.username.as_deref(), Some("root"));
        assert_eq!(record.kind, None);

        let record: LogRecord = serde_json::from_value(json!({
            "type": "ssh_login",
            "source_ip": "203.0.113.5",
            "username": "admin",
            "password": "toor",
            "timestamp": 1700000000.25
        }))
        .unwrap();
        assert_eq!(record.kind.as_deref(), Some("ssh_login"));
        assert_eq!(record.timestamp, Some(1700000000.25));
    }

    #[test]
    fn test_stored_log_is_flat() {
        let value = serde_json::to_value(stored(Some("192.0.2.1"), 0)).unwrap();
        assert_eq!(value["source_ip"], "192.0.2.1");
        assert_eq!(value["type"], serde_json::Value::Null);
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_stats_ignore_missing_sources() {
        let logs = vec![
            stored(Some("192.0.2.1"), 1),
            stored(Some("192.0.2.1"), 2),
            stored(Some("192.0.2.2"), 3),
            stored(None, 4),
        ];
        assert_eq!(
            AttackStats::from_logs(&logs),
            AttackStats {
                total_attacks: 4,
                unique_attackers: 2
            }
        );
    }

    #[test]
    fn test_newest_first() {
        let logs = vec![
            stored(Some("a"), 10),
            stored(Some("b"), 30),
            stored(Some("c"), 20),
            stored(Some("d"), 30),
        ];
        let recent = newest_first(&logs, 3);
        let order: Vec<_> = recent
            .iter()
            .map(|l| l.record.source_ip.as_deref().unwrap())
            .collect();
        assert_eq!(order, vec!["d", "b", "c"]);
    }
}

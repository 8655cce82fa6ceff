//! Records produced when an attacker tries to log in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Class of a captured event. Serialized as the `type` tag the controller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A password offered during SSH user authentication.
    #[serde(rename = "ssh_login")]
    SshLogin,
}

/// One captured authentication attempt.
///
/// Built by the authentication interceptor at the moment of interception and never changed
/// afterwards; the fields are only readable. Serializes to the controller ingestion body:
///
/// ```json
/// {"type":"ssh_login","source_ip":"203.0.113.5","username":"admin","password":"toor","timestamp":1760000000.25}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    source_ip: IpAddr,
    username: String,
    password: String,
    /// Seconds since the Unix epoch.
    timestamp: f64,
}

impl CaptureEvent {
    /// A password attempt observed now.
    pub fn ssh_login(source_ip: IpAddr, username: &str, password: &str) -> Self {
        Self::ssh_login_at(source_ip, username, password, Utc::now())
    }

    pub fn ssh_login_at(
        source_ip: IpAddr,
        username: &str,
        password: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EventKind::SshLogin,
            source_ip,
            username: username.to_string(),
            password: password.to_string(),
            timestamp: epoch_seconds(at),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_micros()) / 1_000_000.0
}

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

pub const DEFAULT_SSH_PORT: u16 = 2222;
pub const DEFAULT_CHANNEL_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_DELIVERY_WORKERS: usize = 4;
pub const DEFAULT_MAX_AUTH_ATTEMPTS: usize = 6;

#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Services {
    pub ssh: SshServiceConfig,
}

/// The fake SSH service.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct SshServiceConfig {
    pub enabled: bool,
    pub bind_address: IpAddr,
    pub port: u16,
    /// Where the host key lives; generated on first start.
    pub host_key: PathBuf,
    /// Identification string sent before key exchange, e.g.
    /// `SSH-2.0-OpenSSH_8.9p1`. The transport default is used when unset.
    pub server_id: Option<String>,
    /// How long a session may sit after the handshake waiting for a channel
    /// request before it is torn down.
    pub channel_timeout_secs: u64,
    pub max_auth_attempts: usize,
}

impl Default for SshServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_SSH_PORT,
            host_key: PathBuf::from("host.key"),
            server_id: None,
            channel_timeout_secs: DEFAULT_CHANNEL_TIMEOUT_SECS,
            max_auth_attempts: DEFAULT_MAX_AUTH_ATTEMPTS,
        }
    }
}

/// Remote telemetry towards the controller.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub remote_logging: bool,
    pub controller_url: Option<String>,
    pub delivery_timeout_secs: u64,
    pub queue_capacity: usize,
    pub workers: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            remote_logging: false,
            controller_url: None,
            delivery_timeout_secs: DEFAULT_DELIVERY_TIMEOUT_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_DELIVERY_WORKERS,
        }
    }
}

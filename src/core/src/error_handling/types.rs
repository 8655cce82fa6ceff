use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadUrl(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadUrl(e) => write!(f, "Controller URL error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum IdentityError {
    IoError(std::io::Error),
    Generate(String),
    Encode(String),
    Persist(std::io::Error),
    Corrupt(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::IoError(e) => write!(f, "Host key IO error: {}", e),
            IdentityError::Generate(e) => write!(f, "Host key generation failed: {}", e),
            IdentityError::Encode(e) => write!(f, "Host key encoding failed: {}", e),
            IdentityError::Persist(e) => write!(f, "Host key could not be persisted: {}", e),
            IdentityError::Corrupt(e) => write!(f, "Host key is corrupt: {}", e),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<std::io::Error> for IdentityError {
    fn from(err: std::io::Error) -> Self {
        IdentityError::IoError(err)
    }
}

#[derive(Debug)]
pub enum NetworkError {
    BindError(std::io::Error),
    SockError(std::io::Error),
    AcceptError(std::io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::BindError(e) => write!(f, "Network bind error: {}", e),
            NetworkError::SockError(e) => write!(f, "Socket error: {}", e),
            NetworkError::AcceptError(e) => write!(f, "Accept failed: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Per-connection failures. They end the connection they belong to and
/// nothing else.
#[derive(Debug)]
pub enum ConnectionError {
    HandshakeError(russh::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::HandshakeError(e) => write!(f, "SSH handshake error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<russh::Error> for ConnectionError {
    fn from(err: russh::Error) -> Self {
        ConnectionError::HandshakeError(err)
    }
}

#[derive(Debug)]
pub enum DeliveryError {
    Timeout,
    Transport(String),
    Rejected(u16),
    QueueFull,
    QueueClosed,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Timeout => write!(f, "Delivery timed out"),
            DeliveryError::Transport(e) => write!(f, "Delivery transport error: {}", e),
            DeliveryError::Rejected(status) => {
                write!(f, "Controller rejected the event with HTTP {}", status)
            }
            DeliveryError::QueueFull => write!(f, "Telemetry queue is full"),
            DeliveryError::QueueClosed => write!(f, "Telemetry queue is closed"),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout
        } else if let Some(status) = err.status() {
            DeliveryError::Rejected(status.as_u16())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

#[derive(Debug)]
pub enum StorageError {
    ConnectionFailed,
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed => write!(f, "Storage connection failed"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum WebError {
    StorageError(StorageError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::StorageError(e) => write!(f, "Web storage error: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

impl From<StorageError> for WebError {
    fn from(err: StorageError) -> Self {
        WebError::StorageError(err)
    }
}

#[derive(Debug)]
pub enum AgentError {
    ConfigurationError(ConfigError),
    IdentityError(IdentityError),
    NetworkError(NetworkError),
    DeliveryError(DeliveryError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            AgentError::IdentityError(e) => write!(f, "Host identity error: {}", e),
            AgentError::NetworkError(e) => write!(f, "Network error: {}", e),
            AgentError::DeliveryError(e) => write!(f, "Telemetry error: {}", e),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<ConfigError> for AgentError {
    fn from(err: ConfigError) -> Self {
        AgentError::ConfigurationError(err)
    }
}

impl From<IdentityError> for AgentError {
    fn from(err: IdentityError) -> Self {
        AgentError::IdentityError(err)
    }
}

impl From<NetworkError> for AgentError {
    fn from(err: NetworkError) -> Self {
        AgentError::NetworkError(err)
    }
}

impl From<DeliveryError> for AgentError {
    fn from(err: DeliveryError) -> Self {
        AgentError::DeliveryError(err)
    }
}

pub mod collector;
pub mod config;
pub mod types;

pub use collector::CollectorConfig;
pub use config::{Args, Config};
pub use types::{LoggingConfig, SshServiceConfig};

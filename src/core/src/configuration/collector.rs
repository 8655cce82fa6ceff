use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// Runtime parameters of the collector service.
///
/// The collector has no configuration file; everything comes from the command line, with
/// environment fallbacks for container deployments.
#[derive(Parser, Debug, Clone)]
#[command(name = "bytebrew-collector")]
#[command(version)]
#[command(about = "Collects and serves credentials captured by bytebrew honeypots")]
pub struct CollectorConfig {
    /// Network address to bind the HTTP API to.
    ///
    /// # Command Line
    /// Use `--bind-address <ADDRESS>` to set this value from the CLI
    #[arg(long, env = "COLLECTOR_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// TCP port of the HTTP API.
    ///
    /// # Command Line
    /// Use `--port <PORT>` to set this value from the CLI
    #[arg(long, env = "COLLECTOR_PORT", default_value_t = 5000)]
    pub port: u16,

    /// File receiving captured records as JSON lines.
    ///
    /// When absent, records only live in memory and are lost on restart.
    ///
    /// # Command Line
    /// Use `--storage-path <PATH>` to set this value from the CLI
    #[arg(long, env = "COLLECTOR_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,
}

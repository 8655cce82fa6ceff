use bytebrew::configuration::CollectorConfig;
use bytebrew::error_handling::types::WebError;
use bytebrew::storage::open_store;
use bytebrew::web_interface::WebServer;
use clap::Parser;
use log::{error, info};
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    let config = CollectorConfig::parse();

    if let Err(e) = run(config).await {
        error!("{}, exiting...", e);
        std::process::exit(1);
    }
}

async fn run(config: CollectorConfig) -> Result<(), WebError> {
    let storage = open_store(config.storage_path.as_deref())?;
    info!("Storage ready");

    let server = WebServer::new(storage);
    server
        .start(SocketAddr::new(config.bind_address, config.port))
        .await;
    Ok(())
}

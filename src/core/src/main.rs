use bytebrew::agent::Agent;
use bytebrew::configuration::{Args, Config};
use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() {
    // RUST_LOG still wins over the default level
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    println!(
        "
██████╗ ██╗   ██╗████████╗███████╗██████╗ ██████╗ ███████╗██╗    ██╗
██╔══██╗╚██╗ ██╔╝╚══██╔══╝██╔════╝██╔══██╗██╔══██╗██╔════╝██║    ██║
██████╔╝ ╚████╔╝    ██║   █████╗  ██████╔╝██████╔╝█████╗  ██║ █╗ ██║
██╔══██╗  ╚██╔╝     ██║   ██╔══╝  ██╔══██╗██╔══██╗██╔══╝  ██║███╗██║
██████╔╝   ██║      ██║   ███████╗██████╔╝██║  ██║███████╗╚███╔███╔╝
╚═════╝    ╚═╝      ╚═╝   ╚══════╝╚═════╝ ╚═╝  ╚═╝╚══════╝ ╚══╝╚══╝
===================================================================
          An SSH credential-capture honeypot v{}
===================================================================
",
        env!("CARGO_PKG_VERSION")
    );

    info!("Importing configuration");

    let args = Args::parse();

    let mut config = match Config::from_file(&args.config_file) {
        Ok(config) => config,
        Err(e) => {
            error!(
                "Unable to import configuration from {}: {}",
                args.config_file.display(),
                e
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = config.apply_args(&args) {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Configuration imported successfully");

    if !config.services.ssh.enabled {
        info!("SSH service disabled in configuration, nothing to do");
        return;
    }

    let agent = match Agent::new(config) {
        Ok(agent) => agent,
        Err(e) => {
            error!("Unable to create the agent: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = agent.run().await {
        error!("Error occured in the agent: {}, exiting...", e);
        std::process::exit(1);
    }
}

use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::configuration::Config;
use crate::error_handling::types::{AgentError, NetworkError};
use crate::host_identity::{acquire, HostIdentity, IdentityOrigin};
use crate::network::{server_config, ConnectionSettings, NetworkListener};
use crate::telemetry::{DispatcherSettings, HttpDelivery, TelemetryDispatcher};

/// Builds every component of the honeypot from one configuration and runs it.
pub struct Agent {
    config: Config,
}

/// Everything [`Agent::bind`] set up, ready to accept connections.
pub struct BoundAgent {
    pub identity: HostIdentity,
    pub listener: NetworkListener,
    pub dispatcher: Option<TelemetryDispatcher>,
    config: Config,
}

impl Agent {
    pub fn new(config: Config) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads the host key, starts telemetry when configured and binds the SSH port.
    ///
    /// Must be called from within a tokio runtime, the telemetry workers are spawned here.
    pub fn bind(self) -> Result<BoundAgent, AgentError> {
        let ssh = &self.config.services.ssh;

        let identity = acquire(&ssh.host_key)?;
        let origin = match identity.origin() {
            IdentityOrigin::Generated => "generated",
            IdentityOrigin::Loaded => "loaded",
        };
        info!(
            "Host key {} from {}: {}",
            origin,
            ssh.host_key.display(),
            identity.fingerprint()
        );

        let dispatcher = match self.config.controller_endpoint()? {
            Some(endpoint) => {
                info!("Remote logging to {}", endpoint);
                let delivery = HttpDelivery::new(endpoint, self.config.delivery_timeout())?;
                Some(TelemetryDispatcher::start(
                    delivery,
                    DispatcherSettings::from(&self.config),
                ))
            }
            None => {
                if self.config.logging.remote_logging {
                    warn!("Remote logging enabled but no controller URL configured");
                }
                info!("Remote logging disabled, attempts are only logged locally");
                None
            }
        };

        let settings = ConnectionSettings {
            ssh_config: Arc::new(server_config(&identity, ssh)),
            telemetry: dispatcher.as_ref().map(|d| d.sender()),
            channel_timeout: self.config.channel_timeout(),
        };
        let listener = NetworkListener::bind(SocketAddr::new(ssh.bind_address, ssh.port), settings)?;

        Ok(BoundAgent {
            identity,
            listener,
            dispatcher,
            config: self.config,
        })
    }

    /// Runs the honeypot until the process receives Ctrl-C.
    pub async fn run(self) -> Result<(), AgentError> {
        self.bind()?.serve().await
    }
}

impl BoundAgent {
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener.local_addr()
    }

    /// Accepts connections until Ctrl-C, then gives queued telemetry one delivery timeout to
    /// drain.
    pub async fn serve(self) -> Result<(), AgentError> {
        info!("SSH Honeypot listening on {}", self.local_addr()?);

        let BoundAgent {
            listener,
            dispatcher,
            config,
            ..
        } = self;

        tokio::select! {
            _ = listener.serve() => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        }

        if let Some(dispatcher) = dispatcher {
            if tokio::time::timeout(config.delivery_timeout(), dispatcher.shutdown())
                .await
                .is_err()
            {
                warn!("Pending telemetry dropped at shutdown");
            }
        }
        Ok(())
    }
}

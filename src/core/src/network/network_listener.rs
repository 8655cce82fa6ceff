//! # Network Listener Module
//!
//! Accepts TCP connections on the configured address and hands each one to
//! [`handle_connection`] on its own task. A slow, silent or hostile client therefore only ever
//! holds up its own task; the accept loop keeps going.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌────────────────────┐
//! │ Incoming        │───▶│ NetworkListener  │───▶│ handle_connection  │
//! │ Connections     │    │ (accept loop)    │    │ (one task each)    │
//! └─────────────────┘    └──────────────────┘    └────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytebrew::network::connection_handler::ConnectionSettings;
//! use bytebrew::network::network_listener::NetworkListener;
//! use std::net::{IpAddr, Ipv4Addr, SocketAddr};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run(ssh_config: russh::server::Config) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ConnectionSettings {
//!     ssh_config: Arc::new(ssh_config),
//!     telemetry: None,
//!     channel_timeout: Duration::from_secs(20),
//! };
//! let listener = NetworkListener::bind(
//!     SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 2222),
//!     settings,
//! )?;
//! listener.serve().await;
//! # Ok(())
//! # }
//! ```

use log::{error, info};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};

use super::connection_handler::{handle_connection, ConnectionSettings};
use crate::error_handling::types::NetworkError;

/// Pending connections the kernel may queue before accept.
pub const LISTEN_BACKLOG: u32 = 100;

/// Pause after a failed accept, so descriptor exhaustion does not turn into a busy loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound TCP listener serving the honeypot on one address.
pub struct NetworkListener {
    listener: TcpListener,

    /// Shared by every connection accepted on this listener
    settings: ConnectionSettings,
}

impl NetworkListener {
    /// Creates the socket, enables address reuse and starts listening.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address and port to listen on, IPv4 or IPv6
    /// * `settings` - Handed to every accepted connection
    ///
    /// # Errors
    ///
    /// - `NetworkError::SockError` if the socket cannot be created or configured
    /// - `NetworkError::BindError` if the address is in use, not local, or needs privileges
    pub fn bind(addr: SocketAddr, settings: ConnectionSettings) -> Result<Self, NetworkError> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|err| {
            error!("[!] Socket error: {:?}", err);
            NetworkError::SockError(err)
        })?;

        socket
            .set_reuseaddr(true)
            .map_err(NetworkError::SockError)?;
        socket.bind(addr).map_err(NetworkError::BindError)?;
        let listener = socket
            .listen(LISTEN_BACKLOG)
            .map_err(NetworkError::BindError)?;

        Ok(Self { listener, settings })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener.local_addr().map_err(NetworkError::SockError)
    }

    /// Accepts connections until the process stops.
    ///
    /// Accept failures are logged and retried after a short pause; they never end the loop.
    pub async fn serve(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, remote_addr)) => {
                    info!("Connection from {}", remote_addr);
                    let settings = self.settings.clone();
                    tokio::spawn(async move {
                        let _ = stream.set_nodelay(true);
                        handle_connection(stream, remote_addr, settings).await;
                    });
                }
                Err(e) => {
                    error!("{}", NetworkError::AcceptError(e));
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::SshServiceConfig;
    use crate::host_identity::acquire;
    use crate::network::ssh_handler::server_config;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    fn settings() -> ConnectionSettings {
        let dir = tempfile::tempdir().unwrap();
        let identity = acquire(&dir.path().join("host.key")).unwrap();
        ConnectionSettings {
            ssh_config: Arc::new(server_config(&identity, &SshServiceConfig::default())),
            telemetry: None,
            channel_timeout: Duration::from_secs(20),
        }
    }

    fn localhost(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = tokio_test::assert_ok!(NetworkListener::bind(localhost(0), settings()));
        let addr = listener.local_addr().unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_port_in_use() {
        // Address reuse does not allow sharing a port with an active listener
        let taken = std::net::TcpListener::bind(localhost(0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let Err(err) = NetworkListener::bind(localhost(port), settings()) else {
            panic!("bound a port that is already taken");
        };
        assert!(matches!(err, NetworkError::BindError(_)));
    }

    #[tokio::test]
    async fn test_bind_foreign_address() {
        // TEST-NET-1 is never assigned to a local interface
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 0);
        let Err(err) = NetworkListener::bind(addr, settings()) else {
            panic!("bound an address no local interface owns");
        };
        assert!(matches!(err, NetworkError::BindError(_)));
    }
}

//! SSH-facing side of the honeypot.
//!
//! - `network_listener`: TCP accept loop, one task per connection.
//! - `connection_handler`: drives one connection from handshake to disconnect.
//! - `ssh_handler`: `russh` server callbacks and transport configuration.
//! - `types`: per-connection context and outcomes.

pub mod connection_handler;
pub mod network_listener;
pub mod ssh_handler;
pub mod types;

pub use connection_handler::{handle_connection, ConnectionSettings};
pub use network_listener::NetworkListener;
pub use ssh_handler::{server_config, HoneypotHandler};
pub use types::{ConnectionContext, ConnectionOutcome};

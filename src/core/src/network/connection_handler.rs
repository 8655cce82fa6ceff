//! # Connection Handler
//!
//! Drives one accepted socket through the SSH transport: key exchange, any number of rejected
//! authentication attempts, then a bounded wait for a session channel request. Whatever
//! happens, the function returns once the connection is finished and never lets an error
//! escape to the listener.
//!
//! ```text
//! ┌──────────┐  run_stream  ┌──────────────────┐   password   ┌────────────────┐
//! │  socket  │────────────▶│ HoneypotHandler  │────────────▶│ AuthInterceptor │
//! └──────────┘              └──────────────────┘              └────────────────┘
//!                                   │ channel request (oneshot)
//!                                   ▼
//!                         await_channel_request ──▶ disconnect
//! ```

use chrono::Utc;
use log::{debug, info, warn};
use russh::server::Config;
use russh::Disconnect;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use super::ssh_handler::HoneypotHandler;
use super::types::{ChannelWait, ConnectionContext, ConnectionOutcome};
use crate::auth_interception::AuthInterceptor;
use crate::error_handling::types::ConnectionError;
use crate::telemetry::TelemetrySender;

/// How long the handler waits for a session to wind down after the disconnect message was sent.
///
/// The session itself runs on a task owned by russh, so giving up here only stops waiting.
/// A peer that ignores the disconnect is cut by the transport's inactivity timeout
/// (see [`server_config`](super::ssh_handler::server_config)).
pub const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Everything a connection needs, shared by all connections of a listener.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub ssh_config: Arc<Config>,
    pub telemetry: Option<TelemetrySender>,
    pub channel_timeout: Duration,
}

/// Waits until the client requests a channel, the session ends, or `limit` elapses.
///
/// A channel request that lands in the same poll as the deadline wins. The session future is
/// only borrowed so the caller can keep driving it afterwards, which is how a disconnect gets
/// flushed to the client.
pub async fn await_channel_request<F, E, T>(
    session: &mut F,
    channel_request: oneshot::Receiver<T>,
    limit: Duration,
) -> ChannelWait<E>
where
    F: Future<Output = Result<(), E>> + Unpin,
{
    // A dropped sender only means the handler is gone, the session branch reports why
    let requested = async {
        if channel_request.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        biased;
        _ = requested => ChannelWait::Requested,
        result = session => ChannelWait::Closed(result),
        _ = tokio::time::sleep(limit) => ChannelWait::TimedOut,
    }
}

/// Serves one connection to completion.
///
/// # Arguments
///
/// * `stream` - The accepted socket, or anything that reads and writes like one
/// * `remote_addr` - Peer address, used for logs and captured events
/// * `settings` - Transport configuration, telemetry handle and channel wait limit
///
/// # Returns
///
/// How the connection ended. Failures are logged here and only reported through the outcome.
pub async fn handle_connection<S>(
    stream: S,
    remote_addr: SocketAddr,
    settings: ConnectionSettings,
) -> ConnectionOutcome
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let context = ConnectionContext::new(remote_addr);

    let (channel_tx, channel_rx) = oneshot::channel();
    let interceptor = AuthInterceptor::new(context.clone(), settings.telemetry.clone());
    let handler = HoneypotHandler::new(interceptor, channel_tx);

    let outcome =
        match russh::server::run_stream(Arc::clone(&settings.ssh_config), stream, handler).await {
            Ok(session) => {
                let handle = session.handle();
                let mut session = Box::pin(session);

                let outcome = match await_channel_request(
                    &mut session,
                    channel_rx,
                    settings.channel_timeout,
                )
                .await
                {
                    ChannelWait::Closed(result) => session_closed(&context, result),
                    ChannelWait::Requested => {
                        debug!("[{}] Channel request refused", context.id);
                        ConnectionOutcome::ChannelRefused
                    }
                    ChannelWait::TimedOut => {
                        debug!(
                            "[{}] No channel request within {:?}",
                            context.id, settings.channel_timeout
                        );
                        ConnectionOutcome::TimedOut
                    }
                };

                if matches!(
                    outcome,
                    ConnectionOutcome::ChannelRefused | ConnectionOutcome::TimedOut
                ) {
                    let _ = handle
                        .disconnect(
                            Disconnect::ByApplication,
                            "Connection closed".to_string(),
                            "en".to_string(),
                        )
                        .await;
                    if tokio::time::timeout(CLOSE_GRACE, &mut session).await.is_err() {
                        warn!(
                            "[{}] Session with {} did not close within {:?}, leaving it to the inactivity timeout",
                            context.id, remote_addr, CLOSE_GRACE
                        );
                    }
                }
                outcome
            }
            Err(e) => {
                warn!("[{}] Handshake with {} failed: {}", context.id, remote_addr, e);
                ConnectionOutcome::HandshakeFailed
            }
        };

    let duration = (Utc::now() - context.accepted_at)
        .to_std()
        .unwrap_or_default();
    info!(
        "[{}] Connection from {} finished ({:?}) after {} attempt(s) in {:.1?}",
        context.id,
        remote_addr,
        outcome,
        context.attempts(),
        duration
    );
    outcome
}

fn session_closed(
    context: &ConnectionContext,
    result: Result<(), ConnectionError>,
) -> ConnectionOutcome {
    match result {
        Ok(()) => ConnectionOutcome::ClientClosed,
        Err(ConnectionError::HandshakeError(e)) if is_peer_gone(&e) => {
            ConnectionOutcome::ClientClosed
        }
        Err(e) => {
            warn!(
                "[{}] Session with {} ended with an error: {}",
                context.id, context.remote_addr, e
            );
            ConnectionOutcome::ProtocolError
        }
    }
}

fn is_peer_gone(e: &russh::Error) -> bool {
    match e {
        russh::Error::Disconnect | russh::Error::HUP | russh::Error::ConnectionTimeout => true,
        russh::Error::IO(e) => matches!(
            e.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}

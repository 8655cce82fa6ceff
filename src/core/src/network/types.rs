use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// State of one accepted connection.
///
/// Cloning shares the attempt counter, so the connection handler keeps a view of how many
/// attempts the interceptor saw after the transport has consumed the interceptor.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub id: Uuid,
    pub remote_addr: SocketAddr,
    /// Start of the connection, the summary line reports the duration from here.
    pub accepted_at: DateTime<Utc>,
    attempts: Arc<AtomicU32>,
}

impl ConnectionContext {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_addr,
            accepted_at: Utc::now(),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Counts one more authentication attempt and returns the new total.
    pub fn record_attempt(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }
}

/// How the wait for a channel request ended.
#[derive(Debug)]
pub enum ChannelWait<E> {
    /// The client asked for a session channel (it was refused).
    Requested,
    /// The session ended on its own: client disconnect or protocol error.
    Closed(Result<(), E>),
    /// Nothing happened before the limit.
    TimedOut,
}

/// Final state of a handled connection, used for the summary log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    HandshakeFailed,
    ClientClosed,
    ProtocolError,
    ChannelRefused,
    TimedOut,
}

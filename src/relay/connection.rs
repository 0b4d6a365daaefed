use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::relay::protocol::ServerFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a push did not reach the peer. Either way the recipient is treated as
/// offline; the message itself is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("connection closed")]
    Closed,
    #[error("push timed out")]
    TimedOut,
}

/// Write side of one live transport.
///
/// Frames go into a bounded queue that the transport's writer task drains.
/// Clones share the queue; two handles are the same connection when their
/// ids match.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerFrame>,
}

impl ConnectionHandle {
    pub(crate) fn new(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<ServerFrame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        (Self { id, outbound }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// False once the writer side has gone away.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queue `frame` for the peer, waiting at most `timeout` for room.
    pub async fn push(&self, frame: ServerFrame, timeout: Duration) -> Result<(), PushError> {
        match self.outbound.send_timeout(frame, timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(PushError::TimedOut),
            Err(SendTimeoutError::Closed(_)) => Err(PushError::Closed),
        }
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

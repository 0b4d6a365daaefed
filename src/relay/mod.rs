//! Real-time message relay.
//!
//! Each live socket gets a [`RelaySession`]. Once authenticated it is listed in
//! the [`ConnectionRegistry`]; sends are appended to the message store first
//! and only then handed to the [`Dispatcher`] for best-effort live delivery.

pub mod connection;
pub mod dispatcher;
pub mod protocol;
pub mod registry;
pub mod session;

pub use connection::{ConnectionHandle, ConnectionId, PushError};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use protocol::{ClientFrame, ServerFrame};
pub use registry::ConnectionRegistry;
pub use session::{FrameOutcome, RelaySession, SendOutcome, SessionState};

use std::sync::Arc;
use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc;

use crate::crypto::TokenSigner;

/// Everything a session needs, owned by the server and shared by handle.
#[derive(Clone)]
pub struct Relay {
    db: Pool<Sqlite>,
    tokens: Arc<TokenSigner>,
    registry: ConnectionRegistry,
    dispatcher: Dispatcher,
    outbound_capacity: usize,
}

impl Relay {
    pub fn new(
        db: Pool<Sqlite>,
        tokens: Arc<TokenSigner>,
        push_timeout: Duration,
        outbound_capacity: usize,
    ) -> Self {
        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new(registry.clone(), push_timeout);
        Self {
            db,
            tokens,
            registry,
            dispatcher,
            outbound_capacity,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Start a session for a newly accepted transport. The receiver yields the
    /// frames to write to the peer.
    pub fn open_session(&self) -> (RelaySession, mpsc::Receiver<ServerFrame>) {
        let (connection, outbound) = self.registry.open_connection(self.outbound_capacity);
        (RelaySession::new(self.clone(), connection), outbound)
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::db::UserId;
use crate::relay::connection::{ConnectionHandle, ConnectionId};
use crate::relay::protocol::ServerFrame;

/// Which connection currently speaks for each authenticated user.
///
/// At most one entry per user. A newer registration replaces the old one, and
/// removal only succeeds for the connection that is actually registered.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<UserId, ConnectionHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for a freshly accepted transport.
    pub fn open_connection(&self, capacity: usize) -> (ConnectionHandle, mpsc::Receiver<ServerFrame>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        ConnectionHandle::new(id, capacity)
    }

    /// Install `connection` for `user_id`, returning the handle it superseded.
    /// The old transport is left alone; it closes on its own schedule.
    pub async fn register(
        &self,
        user_id: UserId,
        connection: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut connections = self.connections.write().await;
        connections.insert(user_id, connection)
    }

    /// Remove the entry for `user_id` only if it is `connection`.
    pub async fn unregister(&self, user_id: UserId, connection: &ConnectionHandle) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(&user_id) {
            Some(current) if current.id() == connection.id() => {
                connections.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.read().await.get(&user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

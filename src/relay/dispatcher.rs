use std::time::Duration;

use crate::db::Message;
use crate::relay::connection::{ConnectionHandle, ConnectionId};
use crate::relay::protocol::ServerFrame;
use crate::relay::registry::ConnectionRegistry;

/// Outcome of one dispatch. Neither flag being set is not an error: the
/// message is already durable and shows up in history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub echoed: bool,
    pub delivered: bool,
}

/// Best-effort live delivery of persisted messages.
#[derive(Clone)]
pub struct Dispatcher {
    registry: ConnectionRegistry,
    push_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: ConnectionRegistry, push_timeout: Duration) -> Self {
        Self {
            registry,
            push_timeout,
        }
    }

    /// Echo `message` to `origin`, the connection it was sent on, and push it
    /// to the receiver. The echo only happens while `origin` still holds the
    /// sender's registration.
    pub async fn dispatch(&self, message: &Message, origin: ConnectionId) -> DispatchReport {
        let frame = ServerFrame::delivery(message.clone());
        let mut report = DispatchReport::default();

        match self.registry.lookup(message.sender_id).await {
            Some(sender) if sender.id() == origin => {
                report.echoed = self.push(&sender, frame.clone(), message).await;
            }
            Some(sender) => {
                tracing::debug!(
                    message_id = message.id,
                    connection_id = %origin,
                    superseded_by = %sender.id(),
                    "sending connection superseded, skipping echo"
                );
            }
            None => {}
        }

        match self.registry.lookup(message.receiver_id).await {
            // Message to self on the sending connection: the echo was the delivery.
            Some(receiver) if receiver.id() == origin => {
                report.delivered = report.echoed;
            }
            Some(receiver) if receiver.is_open() => {
                report.delivered = self.push(&receiver, frame, message).await;
            }
            _ => {
                tracing::debug!(
                    message_id = message.id,
                    receiver_id = message.receiver_id,
                    "receiver offline, message left for history"
                );
            }
        }

        report
    }

    async fn push(&self, connection: &ConnectionHandle, frame: ServerFrame, message: &Message) -> bool {
        match connection.push(frame, self.push_timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    message_id = message.id,
                    connection_id = %connection.id(),
                    error = %e,
                    "push failed, treating peer as unreachable"
                );
                false
            }
        }
    }
}

use crate::db::{Message, MessageRepository, UserId};
use crate::error::AppError;
use crate::relay::connection::ConnectionHandle;
use crate::relay::dispatcher::DispatchReport;
use crate::relay::protocol::ClientFrame;
use crate::relay::Relay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(UserId),
    Closed,
}

#[derive(Debug)]
pub enum SendOutcome {
    Sent {
        message: Message,
        report: DispatchReport,
    },
    /// Empty content or a store validation failure. Nothing is reported to the
    /// client.
    Dropped(String),
    /// The store could not record the message; it was not sent.
    Failed(AppError),
}

#[derive(Debug)]
pub enum FrameOutcome {
    Ignored,
    Authenticated(UserId),
    /// Bad token. The transport must be closed.
    Rejected,
    Send(SendOutcome),
}

/// State machine for one relay connection. Transport-agnostic: the socket
/// driver feeds it text frames and drains the connection's outbound queue.
pub struct RelaySession {
    relay: Relay,
    connection: ConnectionHandle,
    state: SessionState,
}

impl RelaySession {
    pub(crate) fn new(relay: Relay, connection: ConnectionHandle) -> Self {
        Self {
            relay,
            connection,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub async fn handle_text(&mut self, text: &str) -> FrameOutcome {
        match ClientFrame::parse(text) {
            Some(frame) => self.handle_frame(frame).await,
            None => {
                tracing::trace!(connection_id = %self.connection.id(), "ignoring unparsable frame");
                FrameOutcome::Ignored
            }
        }
    }

    pub async fn handle_frame(&mut self, frame: ClientFrame) -> FrameOutcome {
        match (self.state, frame) {
            (SessionState::Unauthenticated, ClientFrame::Auth { token }) => {
                self.authenticate(&token).await
            }
            (SessionState::Authenticated(user_id), ClientFrame::Message { receiver_id, content }) => {
                FrameOutcome::Send(self.send(user_id, receiver_id, content).await)
            }
            _ => FrameOutcome::Ignored,
        }
    }

    async fn authenticate(&mut self, token: &str) -> FrameOutcome {
        let user_id = match self.relay.tokens.verify_token(token) {
            Ok(user_id) => user_id,
            Err(e) => {
                tracing::info!(connection_id = %self.connection.id(), error = %e, "relay auth rejected");
                return FrameOutcome::Rejected;
            }
        };

        self.state = SessionState::Authenticated(user_id);
        let superseded = self
            .relay
            .registry
            .register(user_id, self.connection.clone())
            .await;

        tracing::info!(
            user_id,
            connection_id = %self.connection.id(),
            superseded = ?superseded.map(|c| c.id()),
            "relay session authenticated"
        );
        FrameOutcome::Authenticated(user_id)
    }

    async fn send(&self, user_id: UserId, receiver_id: UserId, content: Option<String>) -> SendOutcome {
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            tracing::debug!(user_id, receiver_id, "dropping send without content");
            return SendOutcome::Dropped("empty content".to_string());
        };

        let message = match MessageRepository::append(&self.relay.db, user_id, receiver_id, &content).await {
            Ok(message) => message,
            Err(AppError::Validation(reason)) => {
                tracing::debug!(user_id, receiver_id, %reason, "dropping invalid send");
                return SendOutcome::Dropped(reason);
            }
            Err(e) => {
                tracing::warn!(user_id, receiver_id, error = %e, "failed to store message");
                return SendOutcome::Failed(e);
            }
        };

        let report = self.relay.dispatcher.dispatch(&message, self.connection.id()).await;
        tracing::debug!(
            message_id = message.id,
            user_id,
            receiver_id,
            echoed = report.echoed,
            delivered = report.delivered,
            "message relayed"
        );

        SendOutcome::Sent { message, report }
    }

    /// Tear down after the transport closed. Safe to call more than once.
    pub async fn close(&mut self) {
        if let SessionState::Authenticated(user_id) = self.state {
            let removed = self.relay.registry.unregister(user_id, &self.connection).await;
            tracing::info!(
                user_id,
                connection_id = %self.connection.id(),
                removed,
                "relay session closed"
            );
        }
        self.state = SessionState::Closed;
    }
}

use serde::{Deserialize, Serialize};

use crate::db::{Message, UserId};

/// Frames a client may send over the relay socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Auth {
        token: String,
    },
    Message {
        #[serde(rename = "receiverId")]
        receiver_id: UserId,
        #[serde(default)]
        content: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Anything that is not a well-formed frame is `None`; callers ignore it.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    Message { message: Message },
}

impl ServerFrame {
    pub fn delivery(message: Message) -> Self {
        ServerFrame::Message { message }
    }
}

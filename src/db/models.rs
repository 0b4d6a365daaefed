use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing, default)]
    pub password_salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// A persisted direct message. Serializes to the wire shape shared by the
/// history endpoint and relay pushes.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

use sqlx::{Pool, Sqlite};

use crate::db::models::{Message, UserId};
use crate::error::AppError;

/// Upper bound on message content, in bytes.
pub const MAX_CONTENT_LEN: usize = 4096;

/// Durable, append-only message log. The store alone assigns message ids and
/// timestamps.
pub struct MessageRepository;

impl MessageRepository {
    /// Persist a message from `sender_id` to `receiver_id`.
    ///
    /// The participant check, the id and the timestamp are all decided inside
    /// one INSERT, under SQLite's write lock, so a message is either fully
    /// recorded or not at all. Timestamps never run backwards relative to ids:
    /// a row is stamped no earlier than the newest row before it. Once this
    /// returns `Ok` the message counts as sent.
    pub async fn append(
        pool: &Pool<Sqlite>,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
    ) -> Result<Message, AppError> {
        if content.is_empty() {
            return Err(AppError::Validation("Message content must not be empty".to_string()));
        }
        if content.len() > MAX_CONTENT_LEN {
            return Err(AppError::Validation(format!(
                "Message must be at most {} bytes",
                MAX_CONTENT_LEN
            )));
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
INSERT INTO messages (sender_id, receiver_id, content, created_at)
SELECT ?1, ?2, ?3, max(
    strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
    coalesce((SELECT created_at FROM messages ORDER BY id DESC LIMIT 1), '')
)
WHERE EXISTS (SELECT 1 FROM users WHERE id = ?1)
  AND EXISTS (SELECT 1 FROM users WHERE id = ?2)
RETURNING id, sender_id, receiver_id, content, created_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        message.ok_or_else(|| AppError::Validation("Unknown sender or receiver".to_string()))
    }

    /// Every message exchanged between the two users, oldest first.
    pub async fn history(
        pool: &Pool<Sqlite>,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
SELECT id, sender_id, receiver_id, content, created_at
FROM messages
WHERE (sender_id = ?1 AND receiver_id = ?2)
   OR (sender_id = ?2 AND receiver_id = ?1)
ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}

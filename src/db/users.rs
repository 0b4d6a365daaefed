use sqlx::{Pool, Sqlite};

use crate::crypto::PasswordDigest;
use crate::db::models::{User, UserId};
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        username: &str,
        avatar: Option<&str>,
        digest: &PasswordDigest,
    ) -> Result<User, AppError> {
        let created_at = chrono::Utc::now();

        let result = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, avatar, password_hash, password_salt, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(username)
        .bind(avatar)
        .bind(digest.hash.as_slice())
        .bind(digest.salt.as_slice())
        .bind(created_at)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("Username already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Every known user except `self_id`.
    pub async fn list_others(pool: &Pool<Sqlite>, self_id: UserId) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id != ? ORDER BY username")
            .bind(self_id)
            .fetch_all(pool)
            .await?;

        Ok(users)
    }
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{Message, MessageRepository, User, UserId, UserRepository};
use crate::error::AppError;

/// GET /api/users (requires auth)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserRepository::list_others(&state.db, user_id).await?;
    Ok(Json(users))
}

/// GET /api/messages/{user_id} (requires auth)
///
/// Full conversation with the given user, oldest first. This is how messages
/// that were not delivered live are picked up.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(other_id): Path<UserId>,
) -> Result<Json<Vec<Message>>, AppError> {
    if UserRepository::get_by_id(&state.db, other_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", other_id)));
    }

    let messages = MessageRepository::history(&state.db, user_id, other_id).await?;
    Ok(Json(messages))
}

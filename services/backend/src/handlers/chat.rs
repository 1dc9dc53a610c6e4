use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    errors::{AppError, Result},
    mapping::pick_str,
    repository::Query,
    state::AppState,
};

pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let messages = state
        .store()
        .select(
            shared::TABLE_CHAT_MESSAGES,
            &Query::new()
                .select("*")
                .order("created_at.desc")
                .limit(shared::RECENT_ROWS_LIMIT),
        )
        .await?;
    Ok(Json(messages))
}

/// The database assigns `id` and `created_at`
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let sender = pick_str(&payload, &["sender"], "");
    let content = pick_str(&payload, &["content"], "");
    if sender.is_empty() || content.is_empty() {
        return Err(AppError::invalid_input("sender and content are required"));
    }

    let message = json!({"sender": sender, "content": content});
    let stored = super::insert_one(state.store(), shared::TABLE_CHAT_MESSAGES, message).await?;
    tracing::debug!(sender = %sender, "Chat message stored");
    Ok(Json(stored))
}

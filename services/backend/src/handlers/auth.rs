use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    domain::{AuthResponse, SignInRequest, SignUpRequest},
    errors::{AppError, Result},
    extractors::ValidatedJson,
    mapping::{first_row, text},
    repository::Query,
    services::passwords,
    state::AppState,
};
use shared::errors::ServiceError;

pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<Json<AuthResponse>> {
    let store = state.store();
    let existing = store
        .select(
            shared::TABLE_USERS,
            &Query::new().select("id").eq("username", &req.username),
        )
        .await?;
    if !existing.is_empty() {
        return Err(ServiceError::duplicate_username().into());
    }

    let password_hash = passwords::hash_password(&req.password)?;
    let id = super::new_id();
    let row = json!({
        "id": id,
        "username": req.username,
        "password_hash": password_hash,
    });
    store.insert(shared::TABLE_USERS, &row).await?;

    tracing::info!(user_id = %id, username = %req.username, "User created");

    Ok(Json(AuthResponse {
        id: Value::String(id),
        username: req.username,
        message: "User created successfully",
    }))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> Result<Json<AuthResponse>> {
    let rows = state
        .store()
        .select(
            shared::TABLE_USERS,
            &Query::new()
                .select("id,username,password_hash")
                .eq("username", &req.username),
        )
        .await?;

    let Some(user) = first_row(rows) else {
        tracing::info!(username = %req.username, "Sign in for unknown user");
        return Err(AppError::unauthorized());
    };
    let stored_hash = user.get("password_hash").map(text).unwrap_or_default();
    if stored_hash.is_empty() || !passwords::verify_password(&req.password, &stored_hash) {
        tracing::info!(username = %req.username, "Sign in with wrong password");
        return Err(AppError::unauthorized());
    }

    if passwords::is_legacy_hash(&stored_hash) {
        upgrade_hash(&state, &user, &req.password).await;
    }

    Ok(Json(AuthResponse {
        id: user.get("id").cloned().unwrap_or(Value::Null),
        username: user.get("username").map(text).unwrap_or(req.username),
        message: "Sign in successful",
    }))
}

/// Replace a verified bcrypt hash with argon2; failures leave the old hash usable
async fn upgrade_hash(state: &AppState, user: &Value, password: &str) {
    let Some(user_id) = user.get("id").map(text).filter(|id| !id.is_empty()) else {
        return;
    };
    let password_hash = match passwords::hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Could not rehash legacy password");
            return;
        }
    };
    match state
        .store()
        .update(
            shared::TABLE_USERS,
            &Query::by_id(&user_id),
            &json!({"password_hash": password_hash}),
        )
        .await
    {
        Ok(_) => tracing::info!(user_id = %user_id, "Upgraded legacy password hash"),
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Could not store upgraded hash"),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let users = state
        .store()
        .select(
            shared::TABLE_USERS,
            &Query::new().select("id,username").order("username.asc"),
        )
        .await?;
    Ok(Json(users))
}

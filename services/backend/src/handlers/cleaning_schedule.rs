use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use shared::errors::{ErrorCategory, ErrorCode, ServiceError};

use crate::{
    errors::{AppError, Result},
    mapping::{strip_nulls, truthy},
    repository::Query,
    state::AppState,
};

const REQUIRED_FIELDS: [&str; 4] = ["date", "start_time", "end_time", "cleaner_name"];

/// Any failure reads as an empty schedule
pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<Value>> {
    let result = state
        .store()
        .select(
            shared::TABLE_CLEANING_SCHEDULE,
            &Query::new().select("*").order("date.asc,start_time.asc"),
        )
        .await;
    match result {
        Ok(rows) => Json(rows),
        Err(e) => {
            tracing::warn!(error = %e, "Could not fetch cleaning schedule");
            Json(Vec::new())
        }
    }
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>> {
    super::ensure_id(&mut payload);
    let complete = REQUIRED_FIELDS
        .iter()
        .all(|field| payload.get(*field).map(truthy).unwrap_or(false));
    if !complete {
        return Err(AppError::invalid_input(
            "date, start_time, end_time, and cleaner_name are required",
        ));
    }

    match super::insert_one(state.store(), shared::TABLE_CLEANING_SCHEDULE, payload).await {
        Err(AppError::Store(e)) if e.is_missing_table() => Err(ServiceError::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_TABLE,
            "Cleaning schedule table does not exist. Please create the table in the database first.",
        )
        .into()),
        other => other.map(Json),
    }
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let changes = strip_nulls(&payload);
    if changes.is_empty() {
        return Ok(Json(super::no_changes()));
    }
    let updated = super::update_by_id(
        state.store(),
        shared::TABLE_CLEANING_SCHEDULE,
        &entry_id,
        &Value::Object(changes),
    )
    .await?;
    Ok(Json(updated.unwrap_or_else(
        || json!({"id": entry_id, "message": "Updated successfully"}),
    )))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .store()
        .delete(shared::TABLE_CLEANING_SCHEDULE, &Query::by_id(&entry_id))
        .await?;
    Ok(Json(super::deleted()))
}

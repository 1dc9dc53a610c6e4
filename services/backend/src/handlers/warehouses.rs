use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    errors::Result,
    mapping::strip_nulls,
    repository::{Query, StoreResult},
    state::AppState,
};

/// A missing table reads as empty
fn or_empty(result: StoreResult<Vec<Value>>) -> Result<Vec<Value>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(e) if e.is_missing_table() => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_warehouses(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let result = state
        .store()
        .select(shared::TABLE_WAREHOUSES, &Query::new().select("*"))
        .await;
    Ok(Json(or_empty(result)?))
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>> {
    super::ensure_id(&mut payload);
    let stored = super::insert_one(state.store(), shared::TABLE_WAREHOUSES, payload).await?;
    Ok(Json(stored))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    let result = state
        .store()
        .select(
            shared::TABLE_WAREHOUSE_ITEMS,
            &Query::new().select("*").eq("warehouse_id", &warehouse_id),
        )
        .await;
    Ok(Json(or_empty(result)?))
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(warehouse_id): Path<String>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>> {
    if let Value::Object(fields) = &mut payload {
        fields.insert("warehouse_id".to_string(), Value::String(warehouse_id));
    }
    super::ensure_id(&mut payload);
    let stored = super::insert_one(state.store(), shared::TABLE_WAREHOUSE_ITEMS, payload).await?;
    Ok(Json(stored))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((_warehouse_id, item_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let changes = strip_nulls(&payload);
    if changes.is_empty() {
        return Ok(Json(super::no_changes()));
    }
    let updated = super::update_by_id(
        state.store(),
        shared::TABLE_WAREHOUSE_ITEMS,
        &item_id,
        &Value::Object(changes),
    )
    .await?;
    Ok(Json(updated.unwrap_or_else(
        || json!({"id": item_id, "message": "Updated successfully"}),
    )))
}

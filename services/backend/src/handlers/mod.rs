pub mod attendance;
pub mod auth;
pub mod chat;
pub mod cleaning_schedule;
pub mod health;
pub mod inspections;
pub mod inventory;
pub mod invoices;
pub mod maintenance;
pub mod orders;
pub mod reports;
pub mod warehouses;

use serde_json::{json, Value};

use crate::errors::Result;
use crate::mapping::{first_row, truthy};
use crate::repository::{Query, TableStore};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Give an object payload an `id` unless it already carries a truthy one
pub(crate) fn ensure_id(payload: &mut Value) {
    if let Value::Object(fields) = payload {
        if !fields.get("id").map(truthy).unwrap_or(false) {
            fields.insert("id".to_string(), Value::String(new_id()));
        }
    }
}

/// Insert one row and answer with the stored row, or the sent row when the
/// database returns no representation
pub(crate) async fn insert_one(store: &dyn TableStore, table: &str, row: Value) -> Result<Value> {
    let rows = store.insert(table, &row).await?;
    Ok(first_row(rows).unwrap_or(row))
}

/// Patch by id and answer with the first updated row, if any
pub(crate) async fn update_by_id(
    store: &dyn TableStore,
    table: &str,
    id: &str,
    patch: &Value,
) -> Result<Option<Value>> {
    let rows = store.update(table, &Query::by_id(id), patch).await?;
    Ok(first_row(rows))
}

pub(crate) fn no_changes() -> Value {
    json!({"message": "No changes provided"})
}

pub(crate) fn deleted() -> Value {
    json!({"message": "Deleted successfully"})
}

/// Lowercased `Content-Type` of a request, empty when absent
pub(crate) fn content_type(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_lowercase()
}

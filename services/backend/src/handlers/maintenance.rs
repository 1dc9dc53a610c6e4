//! Maintenance tasks
//!
//! Creation accepts JSON or `multipart/form-data`. An uploaded `media` file
//! is stored inline in `image_uri` as a data URI.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    Json,
};
use base64::Engine;
use serde_json::{Map, Value};

use crate::{
    errors::{AppError, Result},
    mapping::{strip_nulls, to_snake, truthy, MAINTENANCE_FIELDS},
    repository::Query,
    state::AppState,
};

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let tasks = state
        .store()
        .select(
            shared::TABLE_MAINTENANCE_TASKS,
            &Query::new().select("*").order("created_date.desc"),
        )
        .await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Value>> {
    let rows = state
        .store()
        .select(
            shared::TABLE_MAINTENANCE_TASKS,
            &Query::by_id(&task_id).select("*"),
        )
        .await?;
    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Task not found"))
}

/// Form fields as JSON strings plus the optional `media` upload
async fn read_form(mut multipart: Multipart) -> Result<Map<String, Value>> {
    let mut data = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "media" {
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_input(e.body_text()))?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            data.insert(
                "image_uri".to_string(),
                Value::String(format!("data:{};base64,{}", mime, encoded)),
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::invalid_input(e.body_text()))?;
            data.insert(name, Value::String(value));
        }
    }
    Ok(data)
}

/// Apply key mapping, defaults and required-field checks to a new task
fn prepare_task(payload: Map<String, Value>, today: &str) -> Result<Map<String, Value>> {
    let mut data = to_snake(&Value::Object(payload), MAINTENANCE_FIELDS);

    if data.get("assigned_to").map(|v| !truthy(v)).unwrap_or(false) {
        data.remove("assigned_to");
    }
    data.remove("category");
    data.remove("priority");
    data.insert(
        "priority".to_string(),
        Value::from(shared::MAINTENANCE_PRIORITY_MEDIUM),
    );

    if !data.get("id").map(truthy).unwrap_or(false) {
        data.insert("id".to_string(), Value::String(super::new_id()));
    }
    for field in ["unit_id", "title"] {
        if !data.get(field).map(truthy).unwrap_or(false) {
            return Err(AppError::missing_field(field));
        }
    }
    data.entry("status")
        .or_insert_with(|| Value::from(shared::MAINTENANCE_STATUS_OPEN));
    data.entry("created_date")
        .or_insert_with(|| Value::from(today));
    Ok(data)
}

pub async fn create_task(State(state): State<AppState>, request: Request) -> Result<Json<Value>> {
    let content_type = super::content_type(request.headers());

    let payload = if content_type.starts_with("application/json") {
        let Json(body) = Json::<Value>::from_request(request, &state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        match body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        }
    } else {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|_| shared::errors::ServiceError::unsupported_media(&content_type))?;
        read_form(multipart).await?
    };

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let task = prepare_task(payload, &today)?;
    tracing::info!(
        task_id = %task.get("id").map(crate::mapping::text).unwrap_or_default(),
        has_media = task.contains_key("image_uri"),
        "Creating maintenance task"
    );

    let stored =
        super::insert_one(state.store(), shared::TABLE_MAINTENANCE_TASKS, Value::Object(task)).await?;
    Ok(Json(stored))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let mut changes = to_snake(&Value::Object(strip_nulls(&payload)), MAINTENANCE_FIELDS);
    changes.remove("category");
    changes.remove("priority");
    if changes.is_empty() {
        return Ok(Json(super::no_changes()));
    }

    let updated = super::update_by_id(
        state.store(),
        shared::TABLE_MAINTENANCE_TASKS,
        &task_id,
        &Value::Object(changes),
    )
    .await?;
    Ok(Json(updated.unwrap_or_else(
        || serde_json::json!({"id": task_id, "message": "Updated successfully"}),
    )))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    state
        .store()
        .delete(shared::TABLE_MAINTENANCE_TASKS, &Query::by_id(&task_id))
        .await?;
    Ok(Json(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_prepare_task_maps_and_defaults() {
        let task = prepare_task(
            object(json!({
                "unitId": "A1",
                "title": "Leaking tap",
                "assignedTo": "",
                "category": "plumbing",
                "priority": "high",
            })),
            "2025-03-01",
        )
        .unwrap();

        assert_eq!(task["unit_id"], "A1");
        assert_eq!(task["priority"], shared::MAINTENANCE_PRIORITY_MEDIUM);
        assert_eq!(task["status"], shared::MAINTENANCE_STATUS_OPEN);
        assert_eq!(task["created_date"], "2025-03-01");
        assert!(!task.contains_key("assigned_to"));
        assert!(!task.contains_key("category"));
        assert!(task["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn test_prepare_task_requires_unit_and_title() {
        let err = prepare_task(object(json!({"title": "x"})), "2025-03-01").unwrap_err();
        assert!(err.to_string().contains("unit_id is required"));

        let err = prepare_task(object(json!({"unit_id": "A1"})), "2025-03-01").unwrap_err();
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn test_prepare_task_keeps_client_status() {
        let task = prepare_task(
            object(json!({"unit_id": "A1", "title": "x", "status": "בטיפול", "assigned_to": "Noa"})),
            "2025-03-01",
        )
        .unwrap();
        assert_eq!(task["status"], "בטיפול");
        assert_eq!(task["assigned_to"], "Noa");
    }
}

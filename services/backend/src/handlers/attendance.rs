//! Employee clock-in/clock-out log

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use shared::errors::{ErrorCategory, ErrorCode, ServiceError};

use crate::{
    domain::{AttendanceSession, AttendanceStatus},
    errors::{AppError, Result},
    mapping::{pick_str, truthy},
    repository::{Query, TableStore},
    state::AppState,
};

fn no_active_session() -> AppError {
    AppError::from(ServiceError::new(
        ErrorCategory::NotFound,
        ErrorCode::NOT_FOUND_SESSION,
        "No active attendance session found",
    ))
}

fn required_employee(payload: &Value) -> Result<String> {
    let employee = pick_str(payload, &["employee"], "");
    if employee.is_empty() {
        return Err(AppError::invalid_input("Employee name is required"));
    }
    Ok(employee)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Newest log of the employee that has no clock-out yet
async fn open_session(store: &dyn TableStore, employee: &str) -> crate::repository::StoreResult<Option<Value>> {
    let rows = store
        .select(
            shared::TABLE_ATTENDANCE_LOGS,
            &Query::new()
                .select("*")
                .eq("employee", employee)
                .is_null("clock_out")
                .order("clock_in.desc")
                .limit(1),
        )
        .await?;
    Ok(rows.into_iter().next())
}

pub async fn list_logs(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let logs = state
        .store()
        .select(
            shared::TABLE_ATTENDANCE_LOGS,
            &Query::new()
                .select("*")
                .order("clock_in.desc")
                .limit(shared::RECENT_ROWS_LIMIT),
        )
        .await?;
    Ok(Json(logs))
}

pub async fn status(
    State(state): State<AppState>,
    Path(employee): Path<String>,
) -> Result<Json<AttendanceStatus>> {
    let latest = match open_session(state.store(), &employee).await {
        Ok(latest) => latest,
        Err(e) if e.is_missing_table() => None,
        Err(e) => return Err(e.into()),
    };

    let session = latest
        .filter(|log| !log.get("clock_out").map(truthy).unwrap_or(false))
        .map(|log| AttendanceSession {
            clock_in: log.get("clock_in").cloned().unwrap_or(Value::Null),
            clock_out: log.get("clock_out").cloned().unwrap_or(Value::Null),
            id: log.get("id").cloned().unwrap_or(Value::Null),
        });

    Ok(Json(AttendanceStatus {
        is_clocked_in: session.is_some(),
        session,
    }))
}

pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let employee = required_employee(&payload)?;
    let log = json!({
        "employee": employee,
        "clock_in": now(),
        "clock_out": null,
    });

    let stored = super::insert_one(state.store(), shared::TABLE_ATTENDANCE_LOGS, log).await?;
    tracing::info!(employee = %employee, "Clocked in");
    Ok(Json(stored))
}

pub async fn stop(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let employee = required_employee(&payload)?;
    let store = state.store();

    let session = match open_session(store, &employee).await {
        Ok(Some(session)) => session,
        Ok(None) => return Err(no_active_session()),
        Err(e) if e.is_missing_table() => return Err(no_active_session()),
        Err(e) => return Err(e.into()),
    };
    let log_id = session
        .get("id")
        .map(crate::mapping::text)
        .ok_or_else(no_active_session)?;

    let patch = json!({"clock_out": now()});
    let updated = super::update_by_id(store, shared::TABLE_ATTENDANCE_LOGS, &log_id, &patch).await?;
    tracing::info!(employee = %employee, log_id = %log_id, "Clocked out");
    Ok(Json(updated.unwrap_or(patch)))
}

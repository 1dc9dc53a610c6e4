//! Exit and cleaning inspection endpoints
//!
//! Both kinds share the checklist service; the handlers only pick the kind.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::{
    domain::{ChecklistInput, ChecklistKind, ChecklistSaveResult, SyncReport},
    errors::Result,
    services::{checklist, sync},
    state::AppState,
};

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn list(state: &AppState, kind: ChecklistKind) -> Result<Json<Vec<Value>>> {
    Ok(Json(checklist::list_with_tasks(state.store(), kind).await?))
}

async fn save(state: &AppState, kind: ChecklistKind, payload: &Value) -> Result<Json<ChecklistSaveResult>> {
    let input = ChecklistInput::from_payload(payload);
    let result = checklist::save_checklist(state.store(), kind, input, today()).await?;
    Ok(Json(result))
}

async fn run_sync(state: &AppState, kind: ChecklistKind) -> Result<Json<SyncReport>> {
    Ok(Json(sync::sync_checklists(state.store(), kind, today()).await?))
}

pub async fn list_inspections(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    list(&state, ChecklistKind::Exit).await
}

pub async fn list_cleaning_inspections(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    list(&state, ChecklistKind::Cleaning).await
}

pub async fn save_inspection(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ChecklistSaveResult>> {
    save(&state, ChecklistKind::Exit, &payload).await
}

pub async fn save_cleaning_inspection(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ChecklistSaveResult>> {
    save(&state, ChecklistKind::Cleaning, &payload).await
}

pub async fn update_inspection_task(
    State(state): State<AppState>,
    Path((inspection_id, task_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    Json(
        checklist::update_task(state.store(), ChecklistKind::Exit, &inspection_id, &task_id, &payload)
            .await,
    )
}

pub async fn update_cleaning_inspection_task(
    State(state): State<AppState>,
    Path((inspection_id, task_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    Json(
        checklist::update_task(
            state.store(),
            ChecklistKind::Cleaning,
            &inspection_id,
            &task_id,
            &payload,
        )
        .await,
    )
}

pub async fn sync_inspections(State(state): State<AppState>) -> Result<Json<SyncReport>> {
    run_sync(&state, ChecklistKind::Exit).await
}

pub async fn sync_cleaning_inspections(State(state): State<AppState>) -> Result<Json<SyncReport>> {
    run_sync(&state, ChecklistKind::Cleaning).await
}

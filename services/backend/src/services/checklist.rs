//! Checklist persistence for exit and cleaning inspections
//!
//! Saving a checklist is a sequence of independent calls against the data
//! store. Each task is upserted on its own and failures are counted rather
//! than aborting the request; stale tasks are only pruned when every
//! submitted task made it to the database.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

use crate::domain::{
    compute_inspection_status, ChecklistInput, ChecklistKind, ChecklistSaveResult, ChecklistTask,
};
use crate::errors::Result;
use crate::mapping::{coerce_bool, first_row, text};
use crate::repository::{Query, StoreError, TableStore};

/// All checklists of a kind with their tasks attached
pub async fn list_with_tasks(store: &dyn TableStore, kind: ChecklistKind) -> Result<Vec<Value>> {
    let parents = match store.select(kind.parent_table(), &Query::new().select("*")).await {
        Ok(rows) => rows,
        Err(e) if e.is_missing_table() => {
            tracing::warn!(table = kind.parent_table(), "Checklist table missing, returning empty list");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    if parents.is_empty() {
        return Ok(parents);
    }

    let ids: Vec<String> = parents
        .iter()
        .filter_map(|row| row.get("id").map(text))
        .collect();
    let query = Query::new().select("*").is_in(kind.parent_key(), &ids);
    let task_rows = store
        .select(kind.task_table(), &query)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(table = kind.task_table(), error = %e, "Could not load checklist tasks");
            Vec::new()
        });

    let mut by_parent: HashMap<String, Vec<ChecklistTask>> = HashMap::new();
    for row in &task_rows {
        let parent = row.get(kind.parent_key()).map(text).unwrap_or_default();
        by_parent
            .entry(parent)
            .or_default()
            .push(ChecklistTask::from_row(row));
    }

    Ok(parents
        .into_iter()
        .map(|mut parent| {
            let id = parent.get("id").map(text).unwrap_or_default();
            let tasks = by_parent.remove(&id).unwrap_or_default();
            if let Value::Object(fields) = &mut parent {
                fields.insert("tasks".to_string(), json!(tasks));
            }
            parent
        })
        .collect())
}

/// Create or update the parent row of a checklist
async fn upsert_parent(store: &dyn TableStore, kind: ChecklistKind, row: &Value, id: &str) -> Result<()> {
    let table = kind.parent_table();
    let exists = match store.select(table, &Query::by_id(id).select("id")).await {
        Ok(rows) => !rows.is_empty(),
        Err(e) if e.is_missing_table() => false,
        Err(e) => return Err(e.into()),
    };

    let outcome = if exists {
        store.update(table, &Query::by_id(id), row).await
    } else {
        match store.insert(table, row).await {
            Err(e) if e.is_conflict() => {
                tracing::debug!(checklist_id = %id, "Checklist appeared concurrently, updating instead");
                store.update(table, &Query::by_id(id), row).await
            }
            other => other,
        }
    };

    match outcome {
        Ok(_) => Ok(()),
        Err(e) if e.is_missing_table() => {
            tracing::warn!(table, "Checklist table missing, parent row not stored");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn task_row(kind: ChecklistKind, parent_id: &str, task: &ChecklistTask) -> Value {
    json!({
        "id": task.id,
        kind.parent_key(): parent_id,
        "name": task.name,
        "completed": task.completed,
    })
}

fn task_query(kind: ChecklistKind, parent_id: &str, task_id: &str) -> Query {
    Query::by_id(task_id).eq(kind.parent_key(), parent_id)
}

/// PATCH that reports success only when a row actually matched
async fn patch_task(
    store: &dyn TableStore,
    kind: ChecklistKind,
    parent_id: &str,
    task: &ChecklistTask,
) -> std::result::Result<bool, StoreError> {
    let patch = json!({"completed": task.completed, "name": task.name});
    let rows = store
        .update(kind.task_table(), &task_query(kind, parent_id, &task.id), &patch)
        .await?;
    Ok(!rows.is_empty())
}

/// Upsert a single task; `true` when the row is stored
async fn save_task(
    store: &dyn TableStore,
    kind: ChecklistKind,
    parent_id: &str,
    task: &ChecklistTask,
    exists: bool,
) -> bool {
    let table = kind.task_table();
    if exists {
        match patch_task(store, kind, parent_id, task).await {
            Ok(true) => return true,
            Ok(false) => tracing::debug!(task_id = %task.id, "Task vanished before update, inserting"),
            Err(e) => tracing::warn!(task_id = %task.id, error = %e, "Task update failed, trying insert"),
        }
        return match store.insert(table, &task_row(kind, parent_id, task)).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "Task insert after failed update also failed");
                false
            }
        };
    }

    match store.insert(table, &task_row(kind, parent_id, task)).await {
        Ok(_) => true,
        Err(e) if e.is_conflict() => match patch_task(store, kind, parent_id, task).await {
            Ok(stored) => {
                if !stored {
                    tracing::warn!(task_id = %task.id, "Task id belongs to another checklist");
                }
                stored
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "Task update after conflict failed");
                false
            }
        },
        Err(e) => {
            tracing::warn!(task_id = %task.id, error = %e, "Task insert failed");
            false
        }
    }
}

async fn existing_task_ids(store: &dyn TableStore, kind: ChecklistKind, parent_id: &str) -> HashSet<String> {
    let query = Query::new().select("id").eq(kind.parent_key(), parent_id);
    match store.select(kind.task_table(), &query).await {
        Ok(rows) => rows.iter().filter_map(|r| r.get("id").map(text)).collect(),
        Err(e) => {
            tracing::warn!(checklist_id = %parent_id, error = %e, "Could not load existing tasks");
            HashSet::new()
        }
    }
}

/// Save a checklist and its tasks, pruning tasks that are no longer listed
#[tracing::instrument(
    skip_all,
    fields(checklist.kind = kind.label(), checklist.id = %input.id, checklist.tasks = input.tasks.len())
)]
pub async fn save_checklist(
    store: &dyn TableStore,
    kind: ChecklistKind,
    input: ChecklistInput,
    today: NaiveDate,
) -> Result<ChecklistSaveResult> {
    let status = input.status.clone().unwrap_or_else(|| {
        compute_inspection_status(&input.departure_date, &input.tasks, today)
            .label()
            .to_string()
    });

    let parent = json!({
        "id": input.id,
        "order_id": input.order_id,
        "unit_number": input.unit_number,
        "guest_name": input.guest_name,
        "departure_date": input.departure_date,
        "status": status,
    });
    upsert_parent(store, kind, &parent, &input.id).await?;

    let mut saved: Vec<ChecklistTask> = Vec::new();
    let mut failed = 0usize;

    if !input.tasks.is_empty() {
        let existing = existing_task_ids(store, kind, &input.id).await;

        for task in &input.tasks {
            let exists = existing.contains(&task.id);
            if save_task(store, kind, &input.id, task, exists).await {
                saved.push(task.clone());
            } else {
                failed += 1;
            }
        }

        metrics::counter!("checklist_tasks_saved_total", "kind" => kind.label())
            .increment(saved.len() as u64);
        metrics::counter!("checklist_tasks_failed_total", "kind" => kind.label())
            .increment(failed as u64);

        if !saved.is_empty() && saved.len() == input.tasks.len() && failed == 0 {
            let keep: HashSet<&str> = saved.iter().map(|t| t.id.as_str()).collect();
            for orphan in existing.iter().filter(|id| !keep.contains(id.as_str())) {
                let query = task_query(kind, &input.id, orphan);
                if let Err(e) = store.delete(kind.task_table(), &query).await {
                    tracing::warn!(task_id = %orphan, error = %e, "Could not delete stale task");
                }
            }
        } else if failed > 0 {
            tracing::warn!(failed, saved = saved.len(), "Some tasks were not stored, skipping cleanup");
        }
    }

    let saved_count = saved.len();
    let tasks = if saved.is_empty() { input.tasks.clone() } else { saved };
    let completed = tasks.iter().filter(|t| t.completed).count();

    tracing::info!(saved = saved_count, failed, "Checklist saved");

    Ok(ChecklistSaveResult {
        id: input.id,
        order_id: input.order_id,
        unit_number: input.unit_number,
        guest_name: input.guest_name,
        departure_date: input.departure_date,
        status,
        saved_tasks_count: saved_count,
        total_tasks_count: input.tasks.len(),
        completed_tasks_count: completed,
        failed_tasks_count: failed,
        tasks,
    })
}

/// Toggle or rename a single task.
///
/// Never fails: staff tick boxes on a phone and the UI must not block on a
/// flaky database. The answer echoes the best known task state.
pub async fn update_task(
    store: &dyn TableStore,
    kind: ChecklistKind,
    parent_id: &str,
    task_id: &str,
    payload: &Value,
) -> Value {
    let mut changes = Map::new();
    if let Some(completed) = payload.get("completed") {
        changes.insert("completed".to_string(), Value::Bool(coerce_bool(completed)));
    }
    if let Some(name) = payload.get("name").filter(|v| !v.is_null()) {
        changes.insert("name".to_string(), Value::String(text(name)));
    }
    if changes.is_empty() {
        return json!({"message": "No changes provided"});
    }

    let table = kind.task_table();
    let query = task_query(kind, parent_id, task_id);
    let current = match store.select(table, &query.clone().select("*")).await {
        Ok(rows) => first_row(rows),
        Err(e) => {
            tracing::warn!(task_id, error = %e, "Could not look up task");
            None
        }
    };

    let echo = |base: Option<&Value>| {
        let mut task = base.map(ChecklistTask::from_row).unwrap_or(ChecklistTask {
            id: task_id.to_string(),
            name: String::new(),
            completed: false,
        });
        task.id = task_id.to_string();
        if let Some(Value::Bool(done)) = changes.get("completed") {
            task.completed = *done;
        }
        if let Some(Value::String(name)) = changes.get("name") {
            task.name = name.clone();
        }
        json!(task)
    };

    if current.is_some() {
        match store.update(table, &query, &Value::Object(changes.clone())).await {
            Ok(rows) if !rows.is_empty() => return json!(ChecklistTask::from_row(&rows[0])),
            Ok(_) => tracing::debug!(task_id, "Task disappeared during update, recreating"),
            Err(e) => tracing::warn!(task_id, error = %e, "Task update failed, recreating"),
        }
    }

    let created = echo(current.as_ref());
    let mut row = json!({
        "id": task_id,
        kind.parent_key(): parent_id,
        "name": created["name"],
        "completed": created["completed"],
    });
    if let Value::Object(fields) = &mut row {
        fields.retain(|_, v| !v.is_null());
    }
    match store.insert(table, &row).await {
        Ok(rows) => rows
            .first()
            .map(|r| json!(ChecklistTask::from_row(r)))
            .unwrap_or(created),
        Err(e) => {
            tracing::warn!(task_id, error = %e, "Task could not be stored, answering optimistically");
            created
        }
    }
}

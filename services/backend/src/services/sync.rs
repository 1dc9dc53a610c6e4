//! Derived checklist synchronization
//!
//! Exit inspections mirror active orders one to one; cleaning inspections
//! mirror the distinct departure dates of active orders. Planning is a pure
//! set difference between desired and existing keys, and execution applies
//! the plan step by step, counting failures instead of aborting.

use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{compute_inspection_status, ChecklistKind, SyncReport};
use crate::errors::Result;
use crate::mapping::text;
use crate::repository::{Query, TableStore};

/// Checklist the orders table says should exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredChecklist {
    pub key: String,
    pub id: String,
    pub order_id: Option<String>,
    pub unit_number: String,
    pub guest_name: String,
    pub departure_date: String,
}

impl DesiredChecklist {
    fn differs_from(&self, row: &ExistingChecklist) -> bool {
        self.order_id != row.order_id
            || self.unit_number != row.unit_number
            || self.guest_name != row.guest_name
            || self.departure_date != row.departure_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingChecklist {
    pub id: String,
    /// `None` for rows the sync job does not manage
    pub key: Option<String>,
    pub order_id: Option<String>,
    pub unit_number: String,
    pub guest_name: String,
    pub departure_date: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub create: Vec<DesiredChecklist>,
    /// Existing id paired with the fields it should carry
    pub refresh: Vec<(String, DesiredChecklist)>,
    pub remove: Vec<String>,
    pub unchanged: usize,
}

fn field(row: &Value, key: &str) -> String {
    row.get(key).map(text).unwrap_or_default()
}

fn optional_field(row: &Value, key: &str) -> Option<String> {
    row.get(key).map(text).filter(|s| !s.is_empty())
}

fn is_active(order: &Value) -> bool {
    field(order, "status") != shared::ORDER_STATUS_CANCELLED
}

/// Desired checklists for the given orders
pub fn desired_checklists(kind: ChecklistKind, orders: &[Value]) -> Vec<DesiredChecklist> {
    let active = orders.iter().filter(|order| is_active(order));

    match kind {
        ChecklistKind::Exit => active
            .filter_map(|order| {
                let order_id = optional_field(order, "id")?;
                Some(DesiredChecklist {
                    id: kind.derived_id(&order_id),
                    key: order_id.clone(),
                    order_id: Some(order_id),
                    unit_number: field(order, "unit_number"),
                    guest_name: field(order, "guest_name"),
                    departure_date: shared::normalize_date_prefix(&field(order, "departure_date"))
                        .to_string(),
                })
            })
            .collect(),
        ChecklistKind::Cleaning => {
            let mut by_date: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
            for order in active {
                let raw = field(order, "departure_date");
                let date = shared::normalize_date_prefix(&raw);
                if !date.is_empty() {
                    by_date.entry(date.to_string()).or_default().push(order);
                }
            }

            by_date
                .into_iter()
                .map(|(date, mut orders)| {
                    orders.sort_by_key(|order| field(order, "id"));
                    let units: BTreeSet<String> = orders
                        .iter()
                        .map(|o| field(o, "unit_number"))
                        .filter(|u| !u.is_empty())
                        .collect();
                    let guests: BTreeSet<String> = orders
                        .iter()
                        .map(|o| field(o, "guest_name"))
                        .filter(|g| !g.is_empty())
                        .collect();
                    DesiredChecklist {
                        id: kind.derived_id(&date),
                        key: date.clone(),
                        order_id: orders.first().and_then(|o| optional_field(o, "id")),
                        unit_number: units.into_iter().collect::<Vec<_>>().join(", "),
                        guest_name: guests.into_iter().collect::<Vec<_>>().join(", "),
                        departure_date: date,
                    }
                })
                .collect()
        }
    }
}

/// Read an existing checklist row, keyed the way `kind` keys them
pub fn existing_checklist(kind: ChecklistKind, row: &Value) -> Option<ExistingChecklist> {
    let id = optional_field(row, "id")?;
    let order_id = optional_field(row, "order_id");
    let departure_date = shared::normalize_date_prefix(&field(row, "departure_date")).to_string();
    let key = match kind {
        ChecklistKind::Exit => order_id.clone(),
        ChecklistKind::Cleaning => Some(departure_date.clone()).filter(|d| !d.is_empty()),
    };
    Some(ExistingChecklist {
        id,
        key,
        order_id,
        unit_number: field(row, "unit_number"),
        guest_name: field(row, "guest_name"),
        departure_date,
    })
}

/// Set difference between desired and existing checklists.
///
/// Each desired key claims at most one existing row, preferring the row
/// whose id is the derived id. Unclaimed keyed rows (orphans and
/// duplicates) are removed; rows without a key are left alone.
pub fn plan(desired: Vec<DesiredChecklist>, mut existing: Vec<ExistingChecklist>) -> SyncPlan {
    let mut wanted: BTreeMap<String, DesiredChecklist> =
        desired.into_iter().map(|d| (d.key.clone(), d)).collect();
    let derived_ids: HashSet<String> = wanted.values().map(|d| d.id.clone()).collect();

    existing.sort_by(|a, b| {
        let a_derived = derived_ids.contains(&a.id);
        let b_derived = derived_ids.contains(&b.id);
        b_derived.cmp(&a_derived).then_with(|| a.id.cmp(&b.id))
    });

    let mut result = SyncPlan::default();
    for row in existing {
        let Some(key) = row.key.clone() else {
            continue;
        };
        match wanted.remove(&key) {
            Some(target) => {
                if target.differs_from(&row) {
                    result.refresh.push((row.id, target));
                } else {
                    result.unchanged += 1;
                }
            }
            None => result.remove.push(row.id),
        }
    }
    result.create = wanted.into_values().collect();
    result
}

fn parent_row(target: &DesiredChecklist, today: NaiveDate) -> Value {
    let status = compute_inspection_status(&target.departure_date, &[], today);
    json!({
        "id": target.id,
        "order_id": target.order_id,
        "unit_number": target.unit_number,
        "guest_name": target.guest_name,
        "departure_date": target.departure_date,
        "status": status.label(),
    })
}

fn refresh_patch(target: &DesiredChecklist) -> Value {
    json!({
        "order_id": target.order_id,
        "unit_number": target.unit_number,
        "guest_name": target.guest_name,
        "departure_date": target.departure_date,
    })
}

async fn create_checklist(
    store: &dyn TableStore,
    kind: ChecklistKind,
    target: &DesiredChecklist,
    today: NaiveDate,
) -> bool {
    match store.insert(kind.parent_table(), &parent_row(target, today)).await {
        Ok(_) => {}
        Err(e) if e.is_conflict() => {
            tracing::debug!(checklist_id = %target.id, "Checklist already exists, refreshing");
            return store
                .update(kind.parent_table(), &Query::by_id(&target.id), &refresh_patch(target))
                .await
                .is_ok();
        }
        Err(e) => {
            tracing::warn!(checklist_id = %target.id, error = %e, "Could not create checklist");
            return false;
        }
    }

    let tasks = Value::Array(kind.default_task_rows(&target.id));
    match store.insert(kind.task_table(), &tasks).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(checklist_id = %target.id, error = %e, "Checklist created without default tasks");
            false
        }
    }
}

async fn remove_checklist(store: &dyn TableStore, kind: ChecklistKind, id: &str) -> bool {
    let tasks = Query::new().eq(kind.parent_key(), id);
    if let Err(e) = store.delete(kind.task_table(), &tasks).await {
        tracing::warn!(checklist_id = %id, error = %e, "Could not delete checklist tasks");
        return false;
    }
    match store.delete(kind.parent_table(), &Query::by_id(id)).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(checklist_id = %id, error = %e, "Could not delete checklist");
            false
        }
    }
}

/// Bring the derived checklist table of `kind` in line with the orders table
#[tracing::instrument(skip_all, fields(kind = kind.label()))]
pub async fn sync_checklists(
    store: &dyn TableStore,
    kind: ChecklistKind,
    today: NaiveDate,
) -> Result<SyncReport> {
    let orders = store
        .select(
            shared::TABLE_ORDERS,
            &Query::new().select("id,unit_number,guest_name,departure_date,status"),
        )
        .await?;

    let existing_rows = match store.select(kind.parent_table(), &Query::new().select("*")).await {
        Ok(rows) => rows,
        Err(e) if e.is_missing_table() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let existing = existing_rows
        .iter()
        .filter_map(|row| existing_checklist(kind, row))
        .collect();

    let plan = plan(desired_checklists(kind, &orders), existing);
    tracing::debug!(
        create = plan.create.len(),
        refresh = plan.refresh.len(),
        remove = plan.remove.len(),
        "Sync planned"
    );

    let mut report = SyncReport {
        kind: kind.label(),
        unchanged: plan.unchanged,
        ..SyncReport::default()
    };

    for target in &plan.create {
        if create_checklist(store, kind, target, today).await {
            report.created += 1;
        } else {
            report.failed += 1;
        }
    }

    for (id, target) in &plan.refresh {
        match store
            .update(kind.parent_table(), &Query::by_id(id), &refresh_patch(target))
            .await
        {
            Ok(_) => report.refreshed += 1,
            Err(e) => {
                tracing::warn!(checklist_id = %id, error = %e, "Could not refresh checklist");
                report.failed += 1;
            }
        }
    }

    for id in &plan.remove {
        if remove_checklist(store, kind, id).await {
            report.removed += 1;
        } else {
            report.failed += 1;
        }
    }

    metrics::counter!("checklist_sync_runs_total", "kind" => kind.label()).increment(1);
    tracing::info!(
        created = report.created,
        refreshed = report.refreshed,
        removed = report.removed,
        unchanged = report.unchanged,
        failed = report.failed,
        "Checklist sync finished"
    );

    Ok(report)
}

/// Periodically sync both checklist kinds until the process exits
pub async fn run_periodic_sync(store: Arc<dyn TableStore>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "Starting periodic checklist sync");
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let today = chrono::Local::now().date_naive();
        for kind in [ChecklistKind::Exit, ChecklistKind::Cleaning] {
            if let Err(e) = sync_checklists(store.as_ref(), kind, today).await {
                tracing::error!(kind = kind.label(), error = %e, "Periodic checklist sync failed");
            }
        }
    }
}

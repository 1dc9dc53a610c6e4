//! In-process table store
//!
//! Behaves like the subset of PostgREST the handlers rely on: unknown tables
//! answer 404, duplicate ids answer 409, generated `id`/`created_at` columns,
//! `eq`/`in`/`is.null` filters, multi-column ordering, limits and column
//! projection. Failures can be injected per table and operation.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use super::{Filter, Query, Rows, StoreError, StoreResult, TableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failures: RwLock<HashMap<(String, Operation), u16>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Store with no tables at all; every request answers 404
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store with every table the service uses, all empty
    pub fn with_tables(names: &[&str]) -> Self {
        let tables = names
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
            failures: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn drop_table(&self, table: &str) {
        self.tables.write().await.remove(table);
    }

    /// Make every `op` on `table` answer with `status` until healed
    pub async fn fail(&self, table: &str, op: Operation, status: u16) {
        self.failures
            .write()
            .await
            .insert((table.to_string(), op), status);
    }

    pub async fn heal(&self, table: &str) {
        self.failures.write().await.retain(|(t, _), _| t != table);
    }

    /// Snapshot of a table's rows in insertion order
    pub async fn rows(&self, table: &str) -> Rows {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn check_failure(&self, table: &str, op: Operation) -> StoreResult<()> {
        match self.failures.read().await.get(&(table.to_string(), op)) {
            Some(status) => Err(StoreError::Status {
                status: *status,
                body: format!("injected failure on {}", table),
            }),
            None => Ok(()),
        }
    }

    fn missing_table(table: &str) -> StoreError {
        StoreError::Status {
            status: 404,
            body: format!(
                "{{\"code\":\"42P01\",\"message\":\"relation \\\"public.{}\\\" does not exist\"}}",
                table
            ),
        }
    }

    fn complete_row(&self, row: &Value) -> StoreResult<Value> {
        let Value::Object(fields) = row else {
            return Err(StoreError::Status {
                status: 400,
                body: "row must be a JSON object".to_string(),
            });
        };
        let mut fields = fields.clone();
        if !fields.contains_key("id") || fields["id"].is_null() {
            let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
            fields.insert("id".to_string(), Value::from(id));
        }
        if !fields.contains_key("created_at") {
            fields.insert(
                "created_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        Ok(Value::Object(fields))
    }
}

/// Text form of a cell as PostgREST compares it against filter values
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query.filters.iter().all(|(column, filter)| {
        let cell = row.get(column).unwrap_or(&Value::Null);
        match filter {
            Filter::Eq(expected) => !cell.is_null() && cell_text(cell) == *expected,
            Filter::In(options) => !cell.is_null() && options.contains(&cell_text(cell)),
            Filter::IsNull => cell.is_null(),
        }
    })
}

/// Nulls sort after every value, like PostgreSQL's default
fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => cell_text(a).cmp(&cell_text(b)),
    }
}

fn sort_rows(rows: &mut [Value], clause: &str) {
    let keys: Vec<(String, bool)> = clause
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let mut pieces = part.trim().split('.');
            let column = pieces.next().unwrap_or_default().to_string();
            let descending = pieces.any(|p| p == "desc");
            (column, descending)
        })
        .collect();

    rows.sort_by(|a, b| {
        for (column, descending) in &keys {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ordering = compare_cells(left, right);
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(row: &Value, select: Option<&str>) -> Value {
    match select.map(str::trim) {
        None | Some("*") | Some("") => row.clone(),
        Some(columns) => {
            let picked: Map<String, Value> = columns
                .split(',')
                .map(str::trim)
                .filter_map(|column| row.get(column).map(|v| (column.to_string(), v.clone())))
                .collect();
            Value::Object(picked)
        }
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Rows> {
        self.check_failure(table, Operation::Select).await?;
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| Self::missing_table(table))?;

        let mut selected: Rows = rows.iter().filter(|row| matches(row, query)).cloned().collect();
        if let Some(order) = &query.order {
            sort_rows(&mut selected, order);
        }
        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }
        Ok(selected
            .iter()
            .map(|row| project(row, query.select.as_deref()))
            .collect())
    }

    async fn insert(&self, table: &str, rows: &Value) -> StoreResult<Rows> {
        self.check_failure(table, Operation::Insert).await?;
        let incoming: Vec<Value> = match rows {
            Value::Array(items) => items.iter().map(|r| self.complete_row(r)).collect::<StoreResult<_>>()?,
            single => vec![self.complete_row(single)?],
        };

        let mut tables = self.tables.write().await;
        let existing = tables.get_mut(table).ok_or_else(|| Self::missing_table(table))?;

        let mut seen: HashSet<String> = existing
            .iter()
            .filter_map(|row| row.get("id").map(cell_text))
            .collect();
        for row in &incoming {
            let id = row.get("id").map(cell_text).unwrap_or_default();
            if !seen.insert(id.clone()) {
                return Err(StoreError::Status {
                    status: 409,
                    body: format!(
                        "{{\"code\":\"23505\",\"message\":\"duplicate key value violates unique constraint\",\"details\":\"Key (id)=({}) already exists.\"}}",
                        id
                    ),
                });
            }
        }

        existing.extend(incoming.iter().cloned());
        Ok(incoming)
    }

    async fn update(&self, table: &str, query: &Query, patch: &Value) -> StoreResult<Rows> {
        self.check_failure(table, Operation::Update).await?;
        let Value::Object(changes) = patch else {
            return Err(StoreError::Status {
                status: 400,
                body: "patch must be a JSON object".to_string(),
            });
        };

        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| Self::missing_table(table))?;

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches(row, query)) {
            if let Value::Object(fields) = row {
                for (key, value) in changes {
                    fields.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> StoreResult<Rows> {
        self.check_failure(table, Operation::Delete).await?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| Self::missing_table(table))?;

        let (removed, kept): (Rows, Rows) = rows.drain(..).partition(|row| matches(row, query));
        *rows = kept;
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

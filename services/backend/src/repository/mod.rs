//! Data access layer
//!
//! Every handler talks to the database through [`TableStore`], a thin
//! row-oriented interface shaped after PostgREST. Two implementations exist:
//! [`PostgrestStore`] for the hosted database and [`MemoryStore`] for tests
//! and offline development.

pub mod memory;
pub mod postgrest;
pub mod retry;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Display;

pub type Rows = Vec<Value>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// PostgREST answers 404 when the table does not exist.
    pub fn is_missing_table(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        StoreError::Transport(error.to_string())
    }
}

/// Row filter on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String),
    In(Vec<String>),
    IsNull,
}

impl Filter {
    fn render(&self) -> String {
        match self {
            Filter::Eq(value) => format!("eq.{}", value),
            Filter::In(values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote_list_value(v)).collect();
                format!("in.({})", quoted.join(","))
            }
            Filter::IsNull => "is.null".to_string(),
        }
    }
}

/// Double-quote a list member so `,`, `(` and `)` stay inside the value
fn quote_list_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Select/filter/order/limit description of a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub select: Option<String>,
    pub filters: Vec<(String, Filter)>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `id=eq.<id>`
    pub fn by_id(id: impl Display) -> Self {
        Self::new().eq("id", id)
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters
            .push((column.to_string(), Filter::Eq(value.to_string())));
        self
    }

    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.filters.push((column.to_string(), Filter::In(values)));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), Filter::IsNull));
        self
    }

    /// PostgREST order clause, e.g. `date.asc,start_time.asc`
    pub fn order(mut self, clause: &str) -> Self {
        self.order = Some(clause.to_string());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.clone()));
        }
        for (column, filter) in &self.filters {
            params.push((column.clone(), filter.render()));
        }
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Row-level access to the hosted database
///
/// Every call returns the affected rows, mirroring
/// `Prefer: return=representation`.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Rows>;

    /// Insert one row (JSON object) or several (JSON array).
    async fn insert(&self, table: &str, rows: &Value) -> StoreResult<Rows>;

    async fn update(&self, table: &str, query: &Query, patch: &Value) -> StoreResult<Rows>;

    async fn delete(&self, table: &str, query: &Query) -> StoreResult<Rows>;

    /// Cheap reachability probe for health checks
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_renders_postgrest_params() {
        let query = Query::new()
            .select("id,username")
            .eq("username", "dana")
            .is_in("inspection_id", ["a", "b"])
            .is_null("clock_out")
            .order("clock_in.desc")
            .limit(1);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "id,username".to_string()),
                ("username".to_string(), "eq.dana".to_string()),
                ("inspection_id".to_string(), r#"in.("a","b")"#.to_string()),
                ("clock_out".to_string(), "is.null".to_string()),
                ("order".to_string(), "clock_in.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_filter_keeps_reserved_characters_inside_values() {
        let query = Query::new().is_in("inspection_id", ["INSP-a,b", "x(1)", r#"say "hi""#]);
        assert_eq!(
            query.to_params(),
            vec![(
                "inspection_id".to_string(),
                r#"in.("INSP-a,b","x(1)","say \"hi\"")"#.to_string(),
            )]
        );
    }

    #[test]
    fn test_store_error_classification() {
        let missing = StoreError::Status { status: 404, body: String::new() };
        assert!(missing.is_missing_table());
        assert!(!missing.is_conflict());

        let conflict = StoreError::Status { status: 409, body: "duplicate key".into() };
        assert!(conflict.is_conflict());

        let transport = StoreError::Transport("connection refused".into());
        assert_eq!(transport.status(), None);
        assert!(!transport.is_bad_request());
    }
}

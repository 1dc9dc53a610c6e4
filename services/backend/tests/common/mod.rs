//! Common test utilities and fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use backend::{
    build_router,
    config::Config,
    repository::{MemoryStore, TableStore},
    services::invoices::InvoiceExtractor,
    state::AppState,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Vision client double; replies with a canned answer or fails
pub struct StubExtractor {
    reply: Option<String>,
    pub seen: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl InvoiceExtractor for StubExtractor {
    async fn extract(&self, image_data_uri: &str) -> anyhow::Result<String> {
        self.seen
            .lock()
            .expect("extractor lock poisoned")
            .push(image_data_uri.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => anyhow::bail!("vision service unavailable"),
        }
    }
}

/// Router over an in-memory store with every table created
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub extractor: Option<Arc<StubExtractor>>,
    pub server: TestServer,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_extractor(extractor: StubExtractor) -> Self {
        Self::build(Some(Arc::new(extractor)))
    }

    fn build(extractor: Option<Arc<StubExtractor>>) -> Self {
        let store = Arc::new(MemoryStore::with_tables(shared::ALL_TABLES));
        let state = AppState::new(
            Config::default(),
            store.clone() as Arc<dyn TableStore>,
            extractor
                .clone()
                .map(|e| e as Arc<dyn InvoiceExtractor>),
        );
        let server = TestServer::new(build_router(state)).expect("Failed to start test server");
        Self {
            store,
            extractor,
            server,
        }
    }

    /// Insert rows directly, bypassing the handlers
    pub async fn seed(&self, table: &str, rows: Value) {
        self.store
            .insert(table, &rows)
            .await
            .expect("Failed to seed table");
    }

    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.store.rows(table).await
    }

    pub async fn seed_order(&self, id: &str, unit: &str, guest: &str, departure: &str) {
        self.seed(
            shared::TABLE_ORDERS,
            json!({
                "id": id,
                "guest_name": guest,
                "unit_number": unit,
                "arrival_date": "2025-01-01",
                "departure_date": departure,
                "status": shared::ORDER_STATUS_NEW,
                "guests_count": 2,
                "paid_amount": 0,
                "total_amount": 0,
            }),
        )
        .await;
    }
}

/// Pull `(code, message, category)` out of an error response
pub fn parse_error(response: &TestResponse) -> (String, String, String) {
    let body: Value = response.json();
    let error = &body["error"];
    assert_eq!(
        body["detail"], error["message"],
        "error body must repeat the message as top-level detail"
    );
    (
        error["code"].as_str().unwrap_or_default().to_string(),
        error["message"].as_str().unwrap_or_default().to_string(),
        error["category"].as_str().unwrap_or_default().to_string(),
    )
}

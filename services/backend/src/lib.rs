// Library interface for backend - exposes modules for testing

pub mod config;
pub mod domain;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod mapping;
pub mod repository;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use config::{Config, DataBackend};
use repository::{retry::RetryStrategy, MemoryStore, PostgrestStore, TableStore};
use services::invoices::{InvoiceExtractor, OpenAiExtractor};
use state::AppState;
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Invoice photos and maintenance media travel inline as base64
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Wire the data store and the optional vision client from configuration
pub fn build_state(config: Config) -> anyhow::Result<AppState> {
    let store: Arc<dyn TableStore> = match config.database.backend {
        DataBackend::Postgrest => Arc::new(PostgrestStore::new(
            &config.database.url,
            config.database.service_key.clone(),
            Duration::from_secs(config.database.timeout_secs),
            RetryStrategy::new(config.database.retry_max_elapsed_ms),
        )?),
        DataBackend::Memory => {
            tracing::warn!("Using the in-memory data store; data is lost on restart");
            Arc::new(MemoryStore::with_tables(shared::ALL_TABLES))
        }
    };

    let extractor = OpenAiExtractor::from_config(&config.vision)?
        .map(|client| Arc::new(client) as Arc<dyn InvoiceExtractor>);
    if extractor.is_none() {
        tracing::warn!("No vision API key configured; invoice processing is disabled");
    }

    Ok(AppState::new(config, store, extractor))
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    use handlers::*;

    Router::new()
        // Health
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::detailed_health))
        // Users
        .route("/auth/signup", post(auth::sign_up))
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/api/auth/login", post(auth::sign_in))
        .route("/users", get(auth::list_users))
        .route("/api/users", get(auth::list_users))
        // Orders
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/:id", patch(orders::update_order).delete(orders::delete_order))
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_client_order),
        )
        .route("/api/orders/:id", patch(orders::update_order))
        // Exit inspections
        .route("/inspections", get(inspections::list_inspections))
        .route(
            "/api/inspections",
            get(inspections::list_inspections).post(inspections::save_inspection),
        )
        .route("/api/inspections/sync", post(inspections::sync_inspections))
        .route(
            "/api/inspections/:id/tasks/:task_id",
            patch(inspections::update_inspection_task),
        )
        // Cleaning inspections
        .route(
            "/cleaning-inspections",
            get(inspections::list_cleaning_inspections),
        )
        .route(
            "/api/cleaning-inspections",
            get(inspections::list_cleaning_inspections)
                .post(inspections::save_cleaning_inspection),
        )
        .route(
            "/api/cleaning-inspections/sync",
            post(inspections::sync_cleaning_inspections),
        )
        .route(
            "/api/cleaning-inspections/:id/tasks/:task_id",
            patch(inspections::update_cleaning_inspection_task),
        )
        // Inventory
        .route(
            "/inventory/items",
            get(inventory::list_items).post(inventory::create_item),
        )
        .route("/api/inventory/items", get(inventory::list_items))
        .route(
            "/inventory/items/:id",
            patch(inventory::update_item).delete(inventory::delete_item),
        )
        .route(
            "/inventory/orders",
            get(inventory::list_orders).post(inventory::create_order_raw),
        )
        .route(
            "/api/inventory/orders",
            get(inventory::list_orders).post(inventory::create_order),
        )
        .route(
            "/inventory/orders/:id",
            patch(inventory::update_order).delete(inventory::delete_order),
        )
        .route("/api/inventory/orders/:id", patch(inventory::update_order))
        // Warehouses
        .route(
            "/api/warehouses",
            get(warehouses::list_warehouses).post(warehouses::create_warehouse),
        )
        .route(
            "/api/warehouses/:id/items",
            get(warehouses::list_items).post(warehouses::create_item),
        )
        .route(
            "/api/warehouses/:id/items/:item_id",
            patch(warehouses::update_item),
        )
        // Maintenance
        .route(
            "/maintenance/tasks",
            get(maintenance::list_tasks).post(maintenance::create_task),
        )
        .route(
            "/api/maintenance/tasks",
            get(maintenance::list_tasks).post(maintenance::create_task),
        )
        .route(
            "/maintenance/tasks/:id",
            get(maintenance::get_task)
                .patch(maintenance::update_task)
                .delete(maintenance::delete_task),
        )
        .route("/api/maintenance/tasks/:id", patch(maintenance::update_task))
        // Reports
        .route("/reports/summary", get(reports::summary))
        .route("/api/reports/summary", get(reports::summary))
        .route(
            "/api/reports/monthly-income-expenses",
            get(reports::monthly_income_expenses),
        )
        // Invoices
        .route("/invoices", get(invoices::list_invoices))
        .route("/api/invoices", get(invoices::list_invoices))
        .route("/api/invoices/process", post(invoices::process_invoice))
        .route(
            "/api/invoices/:id",
            get(invoices::get_invoice)
                .patch(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        // Chat
        .route("/chat/messages", get(chat::list_messages))
        .route(
            "/api/chat/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        // Attendance
        .route("/attendance/logs", get(attendance::list_logs))
        .route("/api/attendance/logs", get(attendance::list_logs))
        .route("/attendance/status/:employee", get(attendance::status))
        .route("/attendance/start", post(attendance::start))
        .route("/attendance/stop", post(attendance::stop))
        // Cleaning schedule
        .route(
            "/api/cleaning-schedule",
            get(cleaning_schedule::list_entries).post(cleaning_schedule::create_entry),
        )
        .route(
            "/api/cleaning-schedule/:id",
            patch(cleaning_schedule::update_entry).delete(cleaning_schedule::delete_entry),
        )
        // State
        .with_state(state)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

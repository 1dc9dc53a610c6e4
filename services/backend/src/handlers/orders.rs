use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::{
    domain::{OrderCreate, OrderUpdate},
    errors::{AppError, Result},
    extractors::ValidatedJson,
    repository::Query,
    state::AppState,
};

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let orders = state
        .store()
        .select(shared::TABLE_ORDERS, &Query::new().select("*"))
        .await?;
    Ok(Json(orders))
}

async fn store_order(state: &AppState, mut order: OrderCreate) -> Result<Value> {
    if order.id.as_deref().map_or(true, str::is_empty) {
        order.id = Some(super::new_id());
    }
    let row = serde_json::to_value(&order).map_err(|e| AppError::Internal(e.into()))?;
    let stored = super::insert_one(state.store(), shared::TABLE_ORDERS, row).await?;

    metrics::counter!("orders_created_total").increment(1);
    tracing::info!(
        order_id = ?order.id,
        unit_number = %order.unit_number,
        departure_date = %order.departure_date,
        "Order created"
    );
    Ok(stored)
}

/// Create from the snake_case shape
pub async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(order): ValidatedJson<OrderCreate>,
) -> Result<Json<Value>> {
    Ok(Json(store_order(&state, order).await?))
}

/// Create from the camelCase shape the clients send
pub async fn create_client_order(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let order = OrderCreate::from_client(&payload);
    Ok(Json(store_order(&state, order).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    ValidatedJson(update): ValidatedJson<OrderUpdate>,
) -> Result<Json<Vec<Value>>> {
    let patch = serde_json::to_value(&update).map_err(|e| AppError::Internal(e.into()))?;
    if patch.as_object().map_or(true, |fields| fields.is_empty()) {
        return Ok(Json(Vec::new()));
    }

    let rows = state
        .store()
        .update(shared::TABLE_ORDERS, &Query::by_id(&order_id), &patch)
        .await?;
    tracing::info!(order_id = %order_id, fields = ?patch.as_object().map(|f| f.keys().collect::<Vec<_>>()), "Order updated");
    Ok(Json(rows))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    let rows = state
        .store()
        .delete(shared::TABLE_ORDERS, &Query::by_id(&order_id))
        .await?;
    tracing::info!(order_id = %order_id, deleted = rows.len(), "Order deleted");
    Ok(Json(rows))
}

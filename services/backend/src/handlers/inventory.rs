//! Inventory items and supply orders
//!
//! Supply orders live in two tables: `inventory_orders` and one row per
//! line in `inventory_order_items`. Orders written before the split keep a
//! single line in legacy columns on the order row itself.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::{
    errors::{AppError, Result},
    mapping::{coerce_i64, pick, pick_str, strip_nulls, text, truthy},
    repository::Query,
    state::AppState,
};

pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let items = state
        .store()
        .select(shared::TABLE_INVENTORY_ITEMS, &Query::new().select("*"))
        .await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>> {
    super::ensure_id(&mut payload);
    let stored = super::insert_one(state.store(), shared::TABLE_INVENTORY_ITEMS, payload).await?;
    Ok(Json(stored))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let changes = strip_nulls(&payload);
    if changes.is_empty() {
        return Ok(Json(super::no_changes()));
    }
    let updated = super::update_by_id(
        state.store(),
        shared::TABLE_INVENTORY_ITEMS,
        &item_id,
        &Value::Object(changes),
    )
    .await?;
    Ok(Json(updated.unwrap_or_else(
        || json!({"id": item_id, "message": "Updated successfully"}),
    )))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    state
        .store()
        .delete(shared::TABLE_INVENTORY_ITEMS, &Query::by_id(&item_id))
        .await?;
    Ok(Json(Vec::new()))
}

fn line_view(row: &Value) -> Value {
    json!({
        "id": row.get("id").cloned().unwrap_or(Value::Null),
        "item_id": row.get("item_id").cloned().unwrap_or(Value::Null),
        "item_name": row.get("item_name").cloned().unwrap_or(Value::Null),
        "quantity": row.get("quantity").cloned().unwrap_or(Value::Null),
        "unit": row.get("unit").cloned().unwrap_or_else(|| Value::from("")),
    })
}

/// Single line synthesized from the legacy columns of an order row
fn legacy_lines(order: &Value) -> Vec<Value> {
    if !order.get("item_name").map(truthy).unwrap_or(false) {
        return Vec::new();
    }
    let order_id = order.get("id").map(text).unwrap_or_default();
    vec![json!({
        "id": format!("{}-item", order_id),
        "item_id": order.get("item_id").cloned().unwrap_or(Value::Null),
        "item_name": order.get("item_name").cloned().unwrap_or(Value::Null),
        "quantity": order.get("quantity").cloned().unwrap_or_else(|| Value::from(0)),
        "unit": order.get("unit").cloned().unwrap_or_else(|| Value::from("")),
    })]
}

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let store = state.store();
    let orders = store
        .select(
            shared::TABLE_INVENTORY_ORDERS,
            &Query::new().select("*").order("order_date.desc"),
        )
        .await?;

    let mut lines: HashMap<String, Vec<Value>> = HashMap::new();
    match store
        .select(shared::TABLE_INVENTORY_ORDER_ITEMS, &Query::new().select("*"))
        .await
    {
        Ok(rows) => {
            for row in &rows {
                let Some(order_id) = row.get("order_id").filter(|v| truthy(v)).map(text) else {
                    continue;
                };
                lines.entry(order_id).or_default().push(line_view(row));
            }
        }
        Err(e) => tracing::info!(error = %e, "Order lines unavailable, using legacy columns"),
    }

    let result = orders
        .into_iter()
        .map(|mut order| {
            let order_id = order.get("id").map(text).unwrap_or_default();
            let items = lines
                .remove(&order_id)
                .unwrap_or_else(|| legacy_lines(&order));
            if let Value::Object(fields) = &mut order {
                fields.insert("items".to_string(), Value::Array(items));
            }
            order
        })
        .collect();
    Ok(Json(result))
}

/// Raw insert; any client supplied id is replaced
pub async fn create_order_raw(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let mut row = strip_nulls(&payload);
    row.insert("id".to_string(), Value::String(super::new_id()));
    let stored =
        super::insert_one(state.store(), shared::TABLE_INVENTORY_ORDERS, Value::Object(row)).await?;
    Ok(Json(stored))
}

/// A requested order line, from either key spelling
struct OrderLine {
    item_id: Value,
    item_name: String,
    quantity: i64,
    unit: String,
}

impl OrderLine {
    fn from_payload(item: &Value) -> Self {
        OrderLine {
            item_id: pick(item, &["itemId", "item_id"]).cloned().unwrap_or(Value::Null),
            item_name: pick_str(item, &["itemName", "item_name"], ""),
            quantity: item.get("quantity").and_then(coerce_i64).unwrap_or(0),
            unit: pick_str(item, &["unit"], ""),
        }
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let mut lines: Vec<OrderLine> = payload
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(OrderLine::from_payload).collect())
        .unwrap_or_default();
    if lines.is_empty() && pick(&payload, &["itemName", "item_name"]).is_some() {
        lines.push(OrderLine::from_payload(&payload));
    }
    let Some(first) = lines.first() else {
        return Err(AppError::invalid_input("Order must have at least one item"));
    };

    let order_id = super::new_id();
    let mut order = Map::new();
    order.insert("id".into(), json!(order_id));
    order.insert("order_date".into(), json!(pick_str(&payload, &["orderDate", "order_date"], "")));
    order.insert(
        "status".into(),
        json!(pick_str(&payload, &["status"], shared::INVENTORY_ORDER_STATUS_PENDING)),
    );
    order.insert(
        "order_type".into(),
        json!(pick_str(&payload, &["orderType", "order_type"], shared::INVENTORY_ORDER_TYPE_GENERAL)),
    );
    order.insert("item_id".into(), first.item_id.clone());
    order.insert("item_name".into(), json!(first.item_name));
    order.insert("quantity".into(), json!(first.quantity));
    order.insert("unit".into(), json!(first.unit));
    for (camel, snake) in [
        ("deliveryDate", "delivery_date"),
        ("orderedBy", "ordered_by"),
        ("unitNumber", "unit_number"),
    ] {
        if let Some(value) = pick(&payload, &[camel, snake]) {
            order.insert(snake.to_string(), value.clone());
        }
    }

    let store = state.store();
    let mut created =
        super::insert_one(store, shared::TABLE_INVENTORY_ORDERS, Value::Object(order)).await?;

    let mut created_lines = Vec::with_capacity(lines.len());
    for line in &lines {
        let row = json!({
            "id": super::new_id(),
            "order_id": order_id,
            "item_id": line.item_id,
            "item_name": line.item_name,
            "quantity": line.quantity,
            "unit": line.unit,
        });
        let stored = super::insert_one(store, shared::TABLE_INVENTORY_ORDER_ITEMS, row).await?;
        created_lines.push(line_view(&stored));
    }

    tracing::info!(order_id = %order_id, lines = created_lines.len(), "Inventory order created");

    if let Value::Object(fields) = &mut created {
        fields.insert("items".to_string(), Value::Array(created_lines));
    }
    Ok(Json(created))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Vec<Value>>> {
    let mut changes = Map::new();
    for (camel, snake) in [
        ("status", "status"),
        ("deliveryDate", "delivery_date"),
        ("orderType", "order_type"),
        ("orderedBy", "ordered_by"),
        ("unitNumber", "unit_number"),
    ] {
        if let Some(value) = payload.get(camel).or_else(|| payload.get(snake)) {
            changes.insert(snake.to_string(), value.clone());
        }
    }
    if changes.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rows = state
        .store()
        .update(
            shared::TABLE_INVENTORY_ORDERS,
            &Query::by_id(&order_id),
            &Value::Object(changes),
        )
        .await?;
    Ok(Json(rows))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    state
        .store()
        .delete(shared::TABLE_INVENTORY_ORDERS, &Query::by_id(&order_id))
        .await?;
    Ok(Json(Vec::new()))
}

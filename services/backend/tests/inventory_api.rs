/// Integration tests for inventory items, supply orders and warehouses
mod common;

use axum::http::StatusCode;
use backend::repository::memory::Operation;
use common::{parse_error, TestContext};
use serde_json::{json, Value};

#[tokio::test]
async fn test_item_crud() {
    let ctx = TestContext::new();

    let created: Value = ctx
        .server
        .post("/inventory/items")
        .json(&json!({"name": "Towels", "quantity": 40, "unit": "pcs"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap_or_default().to_string();
    assert!(!id.is_empty());

    let updated: Value = ctx
        .server
        .patch(&format!("/inventory/items/{id}"))
        .json(&json!({"quantity": 35, "unit": null}))
        .await
        .json();
    assert_eq!(updated["quantity"], 35);
    assert_eq!(updated["unit"], "pcs");

    let unchanged: Value = ctx
        .server
        .patch(&format!("/inventory/items/{id}"))
        .json(&json!({"unit": null}))
        .await
        .json();
    assert_eq!(unchanged["message"], "No changes provided");

    let deleted = ctx.server.delete(&format!("/inventory/items/{id}")).await;
    deleted.assert_status_ok();
    assert_eq!(deleted.json::<Value>(), json!([]));
    assert!(ctx.rows(shared::TABLE_INVENTORY_ITEMS).await.is_empty());
}

#[tokio::test]
async fn test_create_order_with_items() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/inventory/orders")
        .json(&json!({
            "orderDate": "2025-05-01",
            "orderedBy": "Noa",
            "items": [
                {"itemId": "i1", "itemName": "Soap", "quantity": "3", "unit": "box"},
                {"item_id": "i2", "item_name": "Sponges", "quantity": 10},
            ],
        }))
        .await;

    response.assert_status_ok();
    let order: Value = response.json();
    assert_eq!(order["status"], shared::INVENTORY_ORDER_STATUS_PENDING);
    assert_eq!(order["order_type"], shared::INVENTORY_ORDER_TYPE_GENERAL);
    assert_eq!(order["ordered_by"], "Noa");
    assert_eq!(order["item_name"], "Soap");
    assert_eq!(order["quantity"], 3);
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(order["items"][1]["unit"], "");

    let lines = ctx.rows(shared::TABLE_INVENTORY_ORDER_ITEMS).await;
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line["order_id"] == order["id"]));
}

#[tokio::test]
async fn test_create_order_from_legacy_fields() {
    let ctx = TestContext::new();

    let order: Value = ctx
        .server
        .post("/api/inventory/orders")
        .json(&json!({"item_name": "Bleach", "quantity": 2, "unit": "l"}))
        .await
        .json();

    assert_eq!(order["items"][0]["item_name"], "Bleach");
    assert_eq!(order["order_date"], "");
}

#[tokio::test]
async fn test_create_order_without_items_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/inventory/orders")
        .json(&json!({"orderDate": "2025-05-01", "items": []}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(parse_error(&response).1, "Order must have at least one item");
    assert!(ctx.rows(shared::TABLE_INVENTORY_ORDERS).await.is_empty());
}

#[tokio::test]
async fn test_list_orders_joins_lines_and_legacy_rows() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_INVENTORY_ORDERS,
        json!([
            {"id": "o-old", "order_date": "2024-12-01", "item_name": "Mops", "quantity": 4},
            {"id": "o-new", "order_date": "2025-02-01", "item_name": "Soap", "quantity": 1},
            {"id": "o-empty", "order_date": "2025-01-01"},
        ]),
    )
    .await;
    ctx.seed(
        shared::TABLE_INVENTORY_ORDER_ITEMS,
        json!([
            {"id": "l1", "order_id": "o-new", "item_id": "i1", "item_name": "Soap", "quantity": 1, "unit": "box"},
            {"id": "l2", "order_id": "o-new", "item_id": "i2", "item_name": "Gloves", "quantity": 2},
        ]),
    )
    .await;

    let orders: Vec<Value> = ctx.server.get("/api/inventory/orders").await.json();
    let ids: Vec<&str> = orders.iter().filter_map(|o| o["id"].as_str()).collect();
    assert_eq!(ids, vec!["o-new", "o-empty", "o-old"]);

    assert_eq!(orders[0]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(orders[1]["items"], json!([]));
    assert_eq!(orders[2]["items"][0]["id"], "o-old-item");
    assert_eq!(orders[2]["items"][0]["unit"], "");
}

#[tokio::test]
async fn test_list_orders_falls_back_when_line_table_fails() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_INVENTORY_ORDERS,
        json!({"id": "o1", "order_date": "2025-02-01", "item_name": "Soap", "quantity": 1}),
    )
    .await;
    ctx.store
        .fail(shared::TABLE_INVENTORY_ORDER_ITEMS, Operation::Select, 404)
        .await;

    let orders: Vec<Value> = ctx.server.get("/inventory/orders").await.json();
    assert_eq!(orders[0]["items"][0]["id"], "o1-item");
}

#[tokio::test]
async fn test_raw_order_gets_fresh_id_and_updates_are_filtered() {
    let ctx = TestContext::new();

    let order: Value = ctx
        .server
        .post("/inventory/orders")
        .json(&json!({"id": "client-id", "item_name": "Soap", "status": "ממתין לאישור"}))
        .await
        .json();
    let id = order["id"].as_str().unwrap_or_default().to_string();
    assert_ne!(id, "client-id");

    let rows: Vec<Value> = ctx
        .server
        .patch(&format!("/api/inventory/orders/{id}"))
        .json(&json!({"status": "סופק", "deliveryDate": "2025-05-03", "item_name": "ignored"}))
        .await
        .json();
    assert_eq!(rows[0]["status"], "סופק");
    assert_eq!(rows[0]["delivery_date"], "2025-05-03");
    assert_eq!(rows[0]["item_name"], "Soap");

    let nothing: Value = ctx
        .server
        .patch(&format!("/inventory/orders/{id}"))
        .json(&json!({"item_name": "ignored"}))
        .await
        .json();
    assert_eq!(nothing, json!([]));
}

#[tokio::test]
async fn test_warehouse_items_are_scoped() {
    let ctx = TestContext::new();

    let warehouse: Value = ctx
        .server
        .post("/api/warehouses")
        .json(&json!({"name": "Main storage"}))
        .await
        .json();
    let wid = warehouse["id"].as_str().unwrap_or_default().to_string();

    let item: Value = ctx
        .server
        .post(&format!("/api/warehouses/{wid}/items"))
        .json(&json!({"name": "Pillows", "quantity": 12, "warehouse_id": "other"}))
        .await
        .json();
    assert_eq!(item["warehouse_id"], wid.as_str());

    ctx.seed(
        shared::TABLE_WAREHOUSE_ITEMS,
        json!({"id": "elsewhere", "warehouse_id": "other", "name": "Chairs"}),
    )
    .await;

    let items: Vec<Value> = ctx
        .server
        .get(&format!("/api/warehouses/{wid}/items"))
        .await
        .json();
    assert_eq!(items.len(), 1);

    let item_id = item["id"].as_str().unwrap_or_default();
    let updated: Value = ctx
        .server
        .patch(&format!("/api/warehouses/{wid}/items/{item_id}"))
        .json(&json!({"quantity": 10}))
        .await
        .json();
    assert_eq!(updated["quantity"], 10);
}

#[tokio::test]
async fn test_missing_warehouse_tables_read_as_empty() {
    let ctx = TestContext::new();
    ctx.store.drop_table(shared::TABLE_WAREHOUSES).await;
    ctx.store.drop_table(shared::TABLE_WAREHOUSE_ITEMS).await;

    let warehouses = ctx.server.get("/api/warehouses").await;
    warehouses.assert_status_ok();
    assert_eq!(warehouses.json::<Value>(), json!([]));

    let items = ctx.server.get("/api/warehouses/w1/items").await;
    items.assert_status_ok();
    assert_eq!(items.json::<Value>(), json!([]));
}

/// Integration tests for order and user endpoints
mod common;

use axum::http::StatusCode;
use common::{parse_error, TestContext};
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_client_order_applies_defaults() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/orders")
        .json(&json!({
            "guestName": "Dana Levi",
            "unitNumber": "7",
            "arrivalDate": "2025-06-01",
            "departureDate": "2025-06-04",
            "totalAmount": "1200",
        }))
        .await;

    response.assert_status_ok();
    let order: Value = response.json();
    assert_eq!(order["guest_name"], "Dana Levi");
    assert_eq!(order["status"], shared::ORDER_STATUS_NEW);
    assert_eq!(order["payment_method"], shared::PAYMENT_METHOD_UNDECIDED);
    assert_eq!(order["total_amount"], 1200.0);
    assert_eq!(order["paid_amount"], 0.0);
    assert!(order["id"].as_str().is_some_and(|id| !id.is_empty()));

    assert_eq!(ctx.rows(shared::TABLE_ORDERS).await.len(), 1);
}

#[tokio::test]
async fn test_create_order_requires_typed_fields() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/orders")
        .json(&json!({"guest_name": "Dana", "unit_number": "7"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let (code, message, category) = parse_error(&response);
    assert_eq!(code, "VALIDATION_MISSING_FIELD");
    assert!(message.contains("arrival_date"), "unexpected message: {message}");
    assert_eq!(category, "VALIDATION");
    assert!(ctx.rows(shared::TABLE_ORDERS).await.is_empty());
}

#[tokio::test]
async fn test_create_order_keeps_client_id() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/orders")
        .json(&json!({
            "id": "ord-1",
            "guest_name": "Dana",
            "unit_number": "7",
            "arrival_date": "2025-06-01",
            "departure_date": "2025-06-04",
            "status": "שולם",
        }))
        .await;

    response.assert_status_ok();
    let order: Value = response.json();
    assert_eq!(order["id"], "ord-1");
    assert_eq!(order["guests_count"], 0);
}

#[tokio::test]
async fn test_update_order_with_nothing_skips_database() {
    let ctx = TestContext::new();
    ctx.seed_order("ord-1", "7", "Dana", "2025-06-04").await;

    let response = ctx
        .server
        .patch("/api/orders/ord-1")
        .json(&json!({"status": null}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_update_and_delete_order() {
    let ctx = TestContext::new();
    ctx.seed_order("ord-1", "7", "Dana", "2025-06-04").await;

    let response = ctx
        .server
        .patch("/orders/ord-1")
        .json(&json!({"paid_amount": 300.0, "status": "שולם חלקית"}))
        .await;
    response.assert_status_ok();
    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["paid_amount"], 300.0);
    assert_eq!(rows[0]["status"], "שולם חלקית");

    let response = ctx.server.delete("/orders/ord-1").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 1);
    assert!(ctx.rows(shared::TABLE_ORDERS).await.is_empty());
}

#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let ctx = TestContext::new();
    ctx.store
        .fail(shared::TABLE_ORDERS, backend::repository::memory::Operation::Select, 500)
        .await;

    let response = ctx.server.get("/api/orders").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let (code, message, category) = parse_error(&response);
    assert_eq!(code, "UPSTREAM_DATABASE_STATUS");
    assert!(message.starts_with("Database error: HTTP 500"));
    assert_eq!(category, "UPSTREAM");
}

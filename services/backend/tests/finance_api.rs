/// Integration tests for invoices and financial reports
mod common;

use axum::http::StatusCode;
use backend::repository::memory::Operation;
use common::{parse_error, StubExtractor, TestContext};
use serde_json::{json, Value};

const EXTRACTION: &str = r#"```json
{"total_price": 120.5, "product_description": "Cleaning supplies"}
```"#;

#[tokio::test]
async fn test_process_invoice_from_data_uri() {
    let ctx = TestContext::with_extractor(StubExtractor::replying(EXTRACTION));

    let response = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": "data:image/png;base64,iVBORw0KGgo="}))
        .await;

    response.assert_status_ok();
    let processed: Value = response.json();
    assert_eq!(processed["total_price"], 120.5);
    assert_eq!(processed["product_description"], "Cleaning supplies");
    assert_eq!(processed["saved"], true);
    assert!(processed["id"].is_string());
    assert_eq!(processed["image_data"], "data:image/png;base64,iVBORw0KGgo=");

    let seen = ctx
        .extractor
        .as_ref()
        .map(|e| e.seen.lock().map(|s| s.clone()).unwrap_or_default())
        .unwrap_or_default();
    assert_eq!(seen, vec!["data:image/png;base64,iVBORw0KGgo=".to_string()]);

    let invoices: Vec<Value> = ctx.server.get("/api/invoices").await.json();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0]["total_price"], 120.5);
    assert_eq!(invoices[0]["currency"], "ILS");
    assert_eq!(invoices[0]["extracted_data"]["product_description"], "Cleaning supplies");
}

#[tokio::test]
async fn test_bare_base64_defaults_to_jpeg() {
    let ctx = TestContext::with_extractor(StubExtractor::replying(EXTRACTION));

    let processed: Value = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": "/9j/4AAQ"}))
        .await
        .json();

    assert_eq!(processed["image_data"], "data:image/jpeg;base64,/9j/4AAQ");
}

#[tokio::test]
async fn test_extraction_failure_still_saves_invoice() {
    let ctx = TestContext::with_extractor(StubExtractor::failing());

    let processed: Value = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": "data:image/png;base64,AAAA"}))
        .await
        .json();

    assert!(processed["total_price"].is_null());
    assert!(processed["product_description"].is_null());
    assert_eq!(processed["saved"], true);
    assert_eq!(ctx.rows(shared::TABLE_INVOICES).await.len(), 1);
}

#[tokio::test]
async fn test_storage_failure_is_reported_not_raised() {
    let ctx = TestContext::with_extractor(StubExtractor::replying(EXTRACTION));
    ctx.store
        .fail(shared::TABLE_INVOICES, Operation::Insert, 400)
        .await;

    let response = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": "data:image/png;base64,AAAA"}))
        .await;

    response.assert_status_ok();
    let processed: Value = response.json();
    assert_eq!(processed["saved"], false);
    assert!(processed["id"].is_null());
    assert_eq!(processed["total_price"], 120.5);
}

#[tokio::test]
async fn test_process_request_validation() {
    let ctx = TestContext::with_extractor(StubExtractor::replying(EXTRACTION));

    let response = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": ""}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(parse_error(&response).1, "Image data is required");

    let response = ctx
        .server
        .post("/api/invoices/process")
        .text("not an image")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(parse_error(&response).0, "VALIDATION_UNSUPPORTED_MEDIA");
}

#[tokio::test]
async fn test_process_without_vision_key() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/invoices/process")
        .json(&json!({"image": "data:image/png;base64,AAAA"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let (code, message, _) = parse_error(&response);
    assert_eq!(code, "INTERNAL_CONFIGURATION");
    assert_eq!(message, "OpenAI API key not configured");
}

#[tokio::test]
async fn test_legacy_invoices_are_mapped() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_INVOICES,
        json!({
            "id": 42,
            "file_url": "https://files.example/inv-42.pdf",
            "amount": 310,
            "issued_at": "2025-02-14",
            "vendor": "Super Clean",
            "invoice_number": "A-17",
        }),
    )
    .await;

    let invoice: Value = ctx.server.get("/api/invoices/42").await.json();
    assert_eq!(invoice["id"], "42");
    assert_eq!(invoice["image_data"], "https://files.example/inv-42.pdf");
    assert_eq!(invoice["total_price"], 310);
    assert_eq!(invoice["date"], "2025-02-14");
    assert!(invoice["extracted_data"].is_null());

    ctx.server
        .get("/api/invoices/43")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_patch_and_delete() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_INVOICES,
        json!({"id": "inv-1", "file_url": "x", "amount": 10, "issued_at": "2025-02-14"}),
    )
    .await;

    let updated: Value = ctx
        .server
        .patch("/api/invoices/inv-1")
        .json(&json!({"total_price": 99, "date": "2025-03-01", "vendor": "Hardware Co"}))
        .await
        .json();
    assert_eq!(updated["total_price"], 99);
    assert_eq!(updated["date"], "2025-03-01");
    assert_eq!(updated["vendor"], "Hardware Co");

    let stored = ctx.rows(shared::TABLE_INVOICES).await;
    assert_eq!(stored[0]["amount"], 99);
    assert_eq!(stored[0]["issued_at"], "2025-03-01");

    let nothing: Value = ctx
        .server
        .patch("/api/invoices/inv-1")
        .json(&json!({"unknown": 1}))
        .await
        .json();
    assert_eq!(nothing["message"], "No changes provided");

    let deleted: Value = ctx.server.delete("/api/invoices/inv-1").await.json();
    assert_eq!(deleted["message"], "Deleted successfully");
    assert!(ctx.rows(shared::TABLE_INVOICES).await.is_empty());
}

#[tokio::test]
async fn test_invoice_list_degrades_on_bad_request() {
    let ctx = TestContext::new();
    ctx.store
        .fail(shared::TABLE_INVOICES, Operation::Select, 400)
        .await;

    let response = ctx.server.get("/invoices").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));

    ctx.store.heal(shared::TABLE_INVOICES).await;
    ctx.store
        .fail(shared::TABLE_INVOICES, Operation::Select, 500)
        .await;
    ctx.server
        .get("/invoices")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_revenue_summary() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_ORDERS,
        json!([
            {"id": "o1", "total_amount": 1000, "paid_amount": 400},
            {"id": "o2", "total_amount": "500", "paid_amount": null},
        ]),
    )
    .await;
    ctx.seed(
        shared::TABLE_EXPENSES,
        json!([{"id": "e1", "amount": 120}, {"id": "e2", "amount": 30.5}]),
    )
    .await;

    let summary: Value = ctx.server.get("/api/reports/summary").await.json();
    assert_eq!(
        summary,
        json!({"totalRevenue": 1500.0, "totalPaid": 400.0, "totalExpenses": 150.5})
    );
}

#[tokio::test]
async fn test_monthly_income_expenses() {
    let ctx = TestContext::new();
    ctx.seed(
        shared::TABLE_ORDERS,
        json!([
            {"id": "o1", "arrival_date": "2025-01-20", "total_amount": 1000, "paid_amount": 600},
            {"id": "o2", "arrival_date": "2025-01-28T14:00:00", "total_amount": 300, "paid_amount": 0},
            {"id": "o3", "arrival_date": "2025-02-02", "total_amount": 800},
        ]),
    )
    .await;
    ctx.seed(
        shared::TABLE_INVOICES,
        json!([
            {"id": "i1", "issued_at": "2025-01-05", "amount": 200},
            {"id": "i2", "extracted_data": "{\"total_price\": 50, \"invoice\": {\"invoice_date\": \"2025-02-10\"}}"},
        ]),
    )
    .await;

    let report: Value = ctx
        .server
        .get("/api/reports/monthly-income-expenses")
        .await
        .json();

    assert_eq!(
        report["monthly_data"],
        json!([
            {"month": "2025-02", "income": 800.0, "expenses": 50.0, "net": 750.0},
            {"month": "2025-01", "income": 900.0, "expenses": 200.0, "net": 700.0},
        ])
    );
    assert_eq!(report["total_income"], 1700.0);
    assert_eq!(report["total_expenses"], 250.0);
    assert_eq!(report["total_net"], 1450.0);
}

#[tokio::test]
async fn test_monthly_report_survives_missing_tables() {
    let ctx = TestContext::new();
    ctx.store.drop_table(shared::TABLE_INVOICES).await;
    ctx.seed(
        shared::TABLE_ORDERS,
        json!({"id": "o1", "arrival_date": "2025-03-01", "total_amount": 100}),
    )
    .await;

    let response = ctx.server.get("/api/reports/monthly-income-expenses").await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["total_expenses"], 0.0);
    assert_eq!(report["total_income"], 100.0);
}

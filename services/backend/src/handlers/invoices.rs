//! Invoice listing, editing and image processing
//!
//! Two row shapes coexist in the `invoices` table, see
//! [`crate::domain::invoice_view`].

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    Json,
};
use serde_json::{json, Map, Value};
use shared::errors::ServiceError;

use crate::{
    domain::{invoice_view, ProcessedInvoice},
    errors::{AppError, Result},
    mapping::{text, truthy},
    repository::Query,
    services::invoices::{process_invoice as run_extraction, InvoiceImage},
    state::AppState,
};

/// Client field -> legacy column accepted by PATCH
const INVOICE_PATCH_FIELDS: &[(&str, &str)] = &[
    ("total_price", "amount"),
    ("image_data", "file_url"),
    ("vendor", "vendor"),
    ("invoice_number", "invoice_number"),
    ("date", "issued_at"),
    ("payment_method", "payment_method"),
];

/// Ordered by issue date when the column exists; unordered otherwise
pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let store = state.store();
    let rows = match store
        .select(
            shared::TABLE_INVOICES,
            &Query::new().select("*").order("issued_at.desc"),
        )
        .await
    {
        Ok(rows) => rows,
        Err(e) if e.is_bad_request() || e.is_missing_table() => {
            tracing::info!(error = %e, "Ordered invoice query rejected, retrying unordered");
            store
                .select(shared::TABLE_INVOICES, &Query::new().select("*"))
                .await
                .unwrap_or_else(|e| {
                    tracing::info!(error = %e, "Invoices table unavailable");
                    Vec::new()
                })
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(rows.iter().map(invoice_view).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<Value>> {
    let rows = state
        .store()
        .select(shared::TABLE_INVOICES, &Query::by_id(&invoice_id).select("*"))
        .await?;
    rows.first()
        .map(|row| Json(invoice_view(row)))
        .ok_or_else(|| AppError::not_found("Invoice not found"))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let mut changes = Map::new();
    for (field, column) in INVOICE_PATCH_FIELDS {
        if let Some(value) = payload.get(*field) {
            changes.insert(column.to_string(), value.clone());
        }
    }
    if changes.is_empty() {
        return Ok(Json(super::no_changes()));
    }

    let updated = super::update_by_id(
        state.store(),
        shared::TABLE_INVOICES,
        &invoice_id,
        &Value::Object(changes),
    )
    .await?;
    Ok(Json(match updated {
        Some(row) => invoice_view(&row),
        None => json!({"id": invoice_id, "message": "Updated successfully"}),
    }))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<Value>> {
    state
        .store()
        .delete(shared::TABLE_INVOICES, &Query::by_id(&invoice_id))
        .await?;
    Ok(Json(super::deleted()))
}

async fn image_from_form(mut multipart: Multipart) -> Result<InvoiceImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mime = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        if bytes.is_empty() {
            break;
        }
        return Ok(InvoiceImage::from_bytes(&bytes, mime.as_deref()));
    }
    Err(AppError::invalid_input("Image file is required"))
}

fn image_from_json(payload: &Value) -> Result<InvoiceImage> {
    payload
        .get("image")
        .filter(|v| truthy(v))
        .map(|image| InvoiceImage::from_data_uri(&text(image)))
        .ok_or_else(|| AppError::invalid_input("Image data is required"))
}

/// Extract the total and description from an uploaded invoice image, then
/// store it. Extraction and storage failures are reported in the body.
pub async fn process_invoice(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ProcessedInvoice>> {
    let Some(extractor) = state.extractor.clone() else {
        return Err(AppError::configuration("OpenAI API key not configured"));
    };

    let content_type = super::content_type(request.headers());
    let image = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        image_from_form(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(payload) = Json::<Value>::from_request(request, &state)
            .await
            .map_err(|e| AppError::invalid_input(e.body_text()))?;
        image_from_json(&payload)?
    } else {
        return Err(ServiceError::unsupported_media(&content_type).into());
    };

    tracing::info!(mime = %image.mime, "Processing invoice image");
    Ok(Json(run_extraction(state.store(), extractor.as_ref(), image).await))
}

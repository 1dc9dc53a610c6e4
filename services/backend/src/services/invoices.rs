//! Invoice extraction through a vision model and invoice persistence

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::VisionConfig;
use crate::domain::{ExtractedInvoice, ProcessedInvoice};
use crate::mapping::{coerce_f64, text, truthy};
use crate::repository::TableStore;

const EXTRACTION_PROMPT: &str = r#"Extract invoice data from this image and return it as a JSON object with only 2 fields.

CRITICAL: You MUST respond with ONLY valid JSON. No markdown, no code blocks, no explanations, no text before or after the JSON. Just the raw JSON object.

The JSON structure MUST be exactly:
{
  "total_price": <number or null>,
  "product_description": "<string or null>"
}

Rules:
- total_price: Extract the final total amount to pay from the invoice (look for "Total", "סה\"כ", "Amount Due", etc.). Must be a number or null.
- product_description: Extract a description of what products/services are on the invoice. This should be a summary of the main items or services. Must be a string or null.
- If a field is not found, use null (not empty string, not 0, use null)
- Be thorough and extract all available information

Return ONLY the JSON object, nothing else."#;

/// Reads invoice images and answers with the model's raw text
#[async_trait]
pub trait InvoiceExtractor: Send + Sync {
    async fn extract(&self, image_data_uri: &str) -> anyhow::Result<String>;
}

/// OpenAI Responses API client
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &VisionConfig) -> anyhow::Result<Option<Self>> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(key.clone(), config.model.clone(), &config.base_url))
            .transpose()
    }
}

/// Concatenated `output_text` parts of a Responses API answer
fn response_text(body: &Value) -> Option<String> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let parts: Vec<&str> = body
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[async_trait]
impl InvoiceExtractor for OpenAiExtractor {
    async fn extract(&self, image_data_uri: &str) -> anyhow::Result<String> {
        let payload = json!({
            "model": self.model,
            "input": [{
                "role": "user",
                "content": [
                    {"type": "input_text", "text": EXTRACTION_PROMPT},
                    {"type": "input_image", "image_url": image_data_uri}
                ]
            }]
        });

        let response = self
            .client
            .post(format!("{}/v1/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("vision request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, error_text));
        }

        let body: Value = response.json().await?;
        response_text(&body).ok_or_else(|| anyhow!("No output text in OpenAI response"))
    }
}

/// Locate the JSON object in a model answer.
///
/// Accepts a fenced code block, a bare object, or an object surrounded by
/// prose.
fn json_candidate(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let block = after[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }
    let first = trimmed.find('{')?;
    let last = trimmed.rfind('}')?;
    (last > first).then(|| &trimmed[first..=last])
}

/// Parse the model text into the two extracted fields; junk yields nulls
pub fn parse_extraction(content: &str) -> ExtractedInvoice {
    let parsed = json_candidate(content).and_then(|raw| serde_json::from_str::<Value>(raw).ok());
    let Some(Value::Object(fields)) = parsed else {
        let preview: String = content.chars().take(500).collect();
        tracing::warn!(preview = %preview, "Could not parse invoice extraction");
        return ExtractedInvoice::default();
    };

    ExtractedInvoice {
        total_price: fields.get("total_price").and_then(coerce_f64),
        product_description: fields
            .get("product_description")
            .filter(|v| truthy(v))
            .map(text),
    }
}

/// Image payload normalized to a data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceImage {
    pub mime: String,
    pub base64: String,
}

impl InvoiceImage {
    pub fn from_bytes(bytes: &[u8], mime: Option<&str>) -> Self {
        Self {
            mime: mime.unwrap_or("image/jpeg").to_string(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Accepts `data:<mime>;base64,<data>` or bare base64
    pub fn from_data_uri(raw: &str) -> Self {
        match raw.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            Some((header, data)) => {
                let mime = header.split(';').next().filter(|m| !m.is_empty());
                Self {
                    mime: mime.unwrap_or("image/jpeg").to_string(),
                    base64: data.to_string(),
                }
            }
            None => Self {
                mime: "image/jpeg".to_string(),
                base64: raw.to_string(),
            },
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Extract, then store the invoice; neither step failing aborts the request
pub async fn process_invoice(
    store: &dyn TableStore,
    extractor: &dyn InvoiceExtractor,
    image: InvoiceImage,
) -> ProcessedInvoice {
    let image_data = image.data_uri();

    let extracted = match extractor.extract(&image_data).await {
        Ok(content) => parse_extraction(&content),
        Err(e) => {
            tracing::warn!(error = %e, "Vision extraction failed, saving invoice with empty fields");
            ExtractedInvoice::default()
        }
    };

    let record = json!({
        "image_data": image_data,
        "total_price": extracted.total_price,
        "currency": shared::DEFAULT_CURRENCY,
        "vendor": null,
        "date": null,
        "invoice_number": null,
        "extracted_data": extracted,
    });
    let legacy_record = json!({
        "file_url": image_data,
        "amount": extracted.total_price,
        "vendor": null,
        "invoice_number": null,
        "issued_at": null,
        "payment_method": null,
    });

    let stored = match store.insert(shared::TABLE_INVOICES, &record).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            tracing::info!(error = %e, "Invoice table rejected extraction columns, using legacy columns");
            store.insert(shared::TABLE_INVOICES, &legacy_record).await
        }
    };

    let (saved, id) = match stored {
        Ok(rows) => {
            let id = rows
                .first()
                .and_then(|row| row.get("id"))
                .filter(|v| truthy(v))
                .map(text);
            tracing::info!(invoice_id = ?id, "Invoice saved");
            (true, id)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not save invoice");
            (false, None)
        }
    };
    metrics::counter!("invoices_processed_total", "saved" => saved.to_string()).increment(1);

    ProcessedInvoice {
        total_price: extracted.total_price,
        product_description: extracted.product_description,
        saved,
        id,
        image_data,
    }
}

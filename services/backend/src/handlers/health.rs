use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE_NAME: &str = "bolavila-backend";

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "bolavila-backend API",
        "status": "running",
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "ok": true,
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn detailed_health(State(state): State<AppState>) -> Json<Value> {
    let db_healthy = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Data store health probe failed");
            false
        }
    };
    let vision_configured = state.extractor.is_some();

    Json(json!({
        "status": if db_healthy { "healthy" } else { "degraded" },
        "ok": db_healthy,
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {
            "database": if db_healthy { "healthy" } else { "unhealthy" },
            "invoice_extraction": if vision_configured { "configured" } else { "disabled" },
        }
    }))
}

use axum::{extract::State, Json};

use crate::{
    domain::{MonthlyReport, RevenueSummary},
    errors::Result,
    services::reports,
    state::AppState,
};

pub async fn summary(State(state): State<AppState>) -> Result<Json<RevenueSummary>> {
    Ok(Json(reports::revenue_summary(state.store()).await?))
}

pub async fn monthly_income_expenses(State(state): State<AppState>) -> Json<MonthlyReport> {
    let today = chrono::Local::now().date_naive();
    Json(reports::monthly_income_expenses(state.store(), today).await)
}

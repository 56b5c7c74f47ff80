use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        CategoryBreakdown, MonthlyQuery, MonthlyReport, SummaryQuery, TransactionSummary,
        YearlyQuery, YearlyReport,
    },
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::AppQuery,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions/summary", get(transaction_summary))
        .route("/reports/monthly", get(monthly_report))
        .route("/reports/yearly", get(yearly_report))
        .route("/reports/category-breakdown", get(category_breakdown))
}

#[instrument(skip(state))]
pub async fn transaction_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<SummaryQuery>,
) -> AppResult<Json<TransactionSummary>> {
    Ok(Json(services::transaction_summary(&state, user_id, q).await?))
}

#[instrument(skip(state))]
pub async fn monthly_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<MonthlyQuery>,
) -> AppResult<Json<MonthlyReport>> {
    Ok(Json(services::monthly_report(&state, user_id, q).await?))
}

#[instrument(skip(state))]
pub async fn yearly_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<YearlyQuery>,
) -> AppResult<Json<YearlyReport>> {
    Ok(Json(services::yearly_report(&state, user_id, q).await?))
}

#[instrument(skip(state))]
pub async fn category_breakdown(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<MonthlyQuery>,
) -> AppResult<Json<CategoryBreakdown>> {
    Ok(Json(services::category_breakdown(&state, user_id, q).await?))
}

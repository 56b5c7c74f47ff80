use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        BudgetPerformance, BudgetQuery, BudgetView, CreateBudgetRequest, PerformanceQuery,
        UpdateBudgetRequest,
    },
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/performance", get(performance))
        .route(
            "/budgets/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

#[instrument(skip(state))]
pub async fn list_budgets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<BudgetQuery>,
) -> AppResult<Json<Vec<BudgetView>>> {
    Ok(Json(services::list_budgets(&state, user_id, q).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateBudgetRequest>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<BudgetView>)> {
    let view = services::create_budget(&state, user_id, payload).await?;
    let location = format!("/api/v1/budgets/{}", view.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(view)))
}

#[instrument(skip(state))]
pub async fn performance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<PerformanceQuery>,
) -> AppResult<Json<Vec<BudgetPerformance>>> {
    Ok(Json(services::performance(&state, user_id, q.date).await?))
}

#[instrument(skip(state))]
pub async fn get_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BudgetView>> {
    Ok(Json(services::get_budget(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBudgetRequest>,
) -> AppResult<Json<BudgetView>> {
    Ok(Json(services::update_budget(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_budget(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_budget(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

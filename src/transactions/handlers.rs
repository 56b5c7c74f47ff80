use axum::{
    extract::State,
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateTransactionRequest, TransactionPage, TransactionQuery, UpdateTransactionRequest},
    repo_types::Transaction,
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
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(q): AppQuery<TransactionQuery>,
) -> AppResult<Json<TransactionPage>> {
    Ok(Json(services::list_transactions(&state, user_id, q).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTransactionRequest>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<Transaction>)> {
    let transaction = services::create_transaction(&state, user_id, payload).await?;
    let location = format!("/api/v1/transactions/{}", transaction.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(transaction)))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Transaction>> {
    Ok(Json(services::get_transaction(&state, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTransactionRequest>,
) -> AppResult<Json<Transaction>> {
    Ok(Json(
        services::update_transaction(&state, user_id, id, payload).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_transaction(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

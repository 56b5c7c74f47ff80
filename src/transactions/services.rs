use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        CreateTransactionRequest, Pagination, TransactionPage, TransactionQuery,
        UpdateTransactionRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
    },
    repo::TransactionRepo,
    repo_types::{NewTransaction, Transaction, TransactionFilter},
};
use crate::{
    categories::repo::CategoryRepo,
    error::{AppError, AppResult},
    money::round2,
    state::AppState,
    validation::{Validator, DESCRIPTION_MAX},
};

fn validate(v: &mut Validator, amount: Decimal, description: &str) {
    v.amount("amount", amount)
        .length("description", description, 1, DESCRIPTION_MAX);
}

async fn ensure_category(state: &AppState, user_id: Uuid, category_id: Uuid) -> AppResult<()> {
    if state.store.find_category(user_id, category_id).await?.is_none() {
        warn!(user_id = %user_id, category_id = %category_id, "unknown category");
        return Err(AppError::NotFound("Category"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    state: &AppState,
    user_id: Uuid,
    payload: CreateTransactionRequest,
) -> AppResult<Transaction> {
    let description = payload.description.trim().to_string();
    let mut v = Validator::new();
    validate(&mut v, payload.amount, &description);
    v.finish()?;

    ensure_category(state, user_id, payload.category_id).await?;

    let transaction = state
        .store
        .create_transaction(NewTransaction {
            user_id,
            category_id: payload.category_id,
            amount: round2(payload.amount),
            kind: payload.kind,
            description,
            date: payload.date,
        })
        .await?;

    info!(user_id = %user_id, transaction_id = %transaction.id, "transaction created");
    Ok(transaction)
}

/// Validates paging and turns the query into a store filter.
fn filter_for(query: TransactionQuery) -> AppResult<(i64, i64, TransactionFilter)> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let mut v = Validator::new();
    v.check(page >= 1, "page", "Page must be at least 1").check(
        (1..=MAX_PAGE_LIMIT).contains(&limit),
        "limit",
        "Limit must be between 1 and 100",
    );
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        v.check(start <= end, "endDate", "End date must not be before start date");
    }
    v.finish()?;

    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::validation("page", "Page is out of range"))?;

    let filter = TransactionFilter {
        kind: query.kind,
        category_id: query.category_id,
        start: query.start_date,
        end: query.end_date,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        limit: Some(limit),
        offset: Some(offset),
    };
    Ok((page, limit, filter))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    state: &AppState,
    user_id: Uuid,
    query: TransactionQuery,
) -> AppResult<TransactionPage> {
    let (page, limit, filter) = filter_for(query)?;
    let items = state.store.find_transactions(user_id, &filter).await?;
    let total = state.store.count_transactions(user_id, &filter).await?;
    Ok(TransactionPage {
        items,
        pagination: Pagination::new(page, limit, total),
    })
}

#[instrument(skip(state))]
pub async fn get_transaction(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Transaction> {
    state
        .store
        .find_transaction(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Transaction"))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    payload: UpdateTransactionRequest,
) -> AppResult<Transaction> {
    let mut transaction = get_transaction(state, user_id, id).await?;

    if let Some(amount) = payload.amount {
        transaction.amount = amount;
    }
    if let Some(description) = payload.description {
        transaction.description = description.trim().to_string();
    }
    if let Some(kind) = payload.kind {
        transaction.kind = kind;
    }
    if let Some(date) = payload.date {
        transaction.date = date;
    }

    let mut v = Validator::new();
    validate(&mut v, transaction.amount, &transaction.description);
    v.finish()?;
    transaction.amount = round2(transaction.amount);

    if let Some(category_id) = payload.category_id {
        if category_id != transaction.category_id {
            ensure_category(state, user_id, category_id).await?;
            transaction.category_id = category_id;
        }
    }

    let updated = state.store.update_transaction(&transaction).await?;
    info!(user_id = %user_id, transaction_id = %id, "transaction updated");
    Ok(updated)
}

#[instrument(skip(state))]
pub async fn delete_transaction(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !state.store.delete_transaction(user_id, id).await? {
        return Err(AppError::NotFound("Transaction"));
    }
    info!(user_id = %user_id, transaction_id = %id, "transaction deleted");
    Ok(())
}

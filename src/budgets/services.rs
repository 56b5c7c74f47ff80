use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{BudgetPerformance, BudgetQuery, BudgetView, CreateBudgetRequest, UpdateBudgetRequest},
    evaluator::evaluate,
    repo::BudgetRepo,
    repo_types::{Budget, BudgetPeriod, NewBudget},
};
use crate::{
    categories::repo::CategoryRepo,
    error::{AppError, AppResult},
    money::round2,
    state::AppState,
    transactions::{repo::TransactionRepo, TransactionFilter},
    validation::{Validator, NAME_MAX},
};

/// The single rule for budget windows: the end must fall strictly after the start.
fn check_window(v: &mut Validator, start: Date, end: Date) {
    v.check(end > start, "endDate", "End date must be after start date");
}

fn check_fields(v: &mut Validator, name: &str, amount: Decimal) {
    v.length("name", name, 1, NAME_MAX).amount("amount", amount);
}

fn resolve_end(period: BudgetPeriod, start: Date, end: Option<Date>) -> AppResult<Date> {
    match end {
        Some(end) => Ok(end),
        None => period
            .end_for(start)
            .ok_or_else(|| AppError::validation("endDate", "End date is out of range")),
    }
}

async fn ensure_category(state: &AppState, user_id: Uuid, category_id: Uuid) -> AppResult<()> {
    if state.store.find_category(user_id, category_id).await?.is_none() {
        warn!(user_id = %user_id, category_id = %category_id, "unknown category");
        return Err(AppError::NotFound("Category"));
    }
    Ok(())
}

/// Evaluates `budgets` against the user's ledger using one query spanning every window.
pub async fn evaluate_all(state: &AppState, budgets: Vec<Budget>) -> AppResult<Vec<BudgetView>> {
    let (Some(start), Some(end)) = (
        budgets.iter().map(|b| b.start_date).min(),
        budgets.iter().map(|b| b.end_date).max(),
    ) else {
        return Ok(Vec::new());
    };
    let user_id = budgets[0].user_id;

    let expenses = state
        .store
        .find_transactions(user_id, &TransactionFilter::expenses_between(start, end))
        .await?;
    debug!(user_id = %user_id, budgets = budgets.len(), expenses = expenses.len(), "evaluating budgets");

    Ok(budgets
        .into_iter()
        .map(|b| {
            let eval = evaluate(&b, &expenses);
            BudgetView::new(b, eval)
        })
        .collect())
}

async fn evaluate_one(state: &AppState, budget: Budget) -> AppResult<BudgetView> {
    let mut views = evaluate_all(state, vec![budget]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("budget evaluation returned nothing")))
}

#[instrument(skip(state, payload))]
pub async fn create_budget(
    state: &AppState,
    user_id: Uuid,
    payload: CreateBudgetRequest,
) -> AppResult<BudgetView> {
    let name = payload.name.trim().to_string();
    let end_date = resolve_end(payload.period, payload.start_date, payload.end_date)?;

    let mut v = Validator::new();
    check_fields(&mut v, &name, payload.amount);
    check_window(&mut v, payload.start_date, end_date);
    v.finish()?;

    ensure_category(state, user_id, payload.category_id).await?;

    let budget = state
        .store
        .create_budget(NewBudget {
            user_id,
            category_id: payload.category_id,
            name,
            amount: round2(payload.amount),
            period: payload.period,
            start_date: payload.start_date,
            end_date,
        })
        .await?;

    info!(user_id = %user_id, budget_id = %budget.id, "budget created");
    evaluate_one(state, budget).await
}

#[instrument(skip(state))]
pub async fn list_budgets(
    state: &AppState,
    user_id: Uuid,
    query: BudgetQuery,
) -> AppResult<Vec<BudgetView>> {
    let budgets = state.store.list_budgets(user_id, query.period).await?;
    let mut views = evaluate_all(state, budgets).await?;
    if let Some(status) = query.status {
        views.retain(|v| v.status == status);
    }
    Ok(views)
}

async fn load(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Budget> {
    state
        .store
        .find_budget(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Budget"))
}

#[instrument(skip(state))]
pub async fn get_budget(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<BudgetView> {
    let budget = load(state, user_id, id).await?;
    evaluate_one(state, budget).await
}

#[instrument(skip(state, payload))]
pub async fn update_budget(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    payload: UpdateBudgetRequest,
) -> AppResult<BudgetView> {
    let mut budget = load(state, user_id, id).await?;

    if let Some(name) = payload.name {
        budget.name = name.trim().to_string();
    }
    if let Some(amount) = payload.amount {
        budget.amount = amount;
    }
    if let Some(period) = payload.period {
        budget.period = period;
    }
    if let Some(start) = payload.start_date {
        budget.start_date = start;
    }
    if let Some(end) = payload.end_date {
        budget.end_date = end;
    }

    // Re-check the record as a whole, not just the changed fields.
    let mut v = Validator::new();
    check_fields(&mut v, &budget.name, budget.amount);
    check_window(&mut v, budget.start_date, budget.end_date);
    v.finish()?;
    budget.amount = round2(budget.amount);

    if let Some(category_id) = payload.category_id {
        if category_id != budget.category_id {
            ensure_category(state, user_id, category_id).await?;
            budget.category_id = category_id;
        }
    }

    let updated = state.store.update_budget(&budget).await?;
    info!(user_id = %user_id, budget_id = %id, "budget updated");
    evaluate_one(state, updated).await
}

#[instrument(skip(state))]
pub async fn delete_budget(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !state.store.delete_budget(user_id, id).await? {
        return Err(AppError::NotFound("Budget"));
    }
    info!(user_id = %user_id, budget_id = %id, "budget deleted");
    Ok(())
}

/// Budgets whose window overlaps `start..=end`, evaluated.
pub async fn budgets_overlapping(
    state: &AppState,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> AppResult<Vec<BudgetView>> {
    let budgets = state
        .store
        .list_budgets(user_id, None)
        .await?
        .into_iter()
        .filter(|b| b.overlaps(start, end))
        .collect();
    evaluate_all(state, budgets).await
}

#[instrument(skip(state))]
pub async fn performance(
    state: &AppState,
    user_id: Uuid,
    date: Option<Date>,
) -> AppResult<Vec<BudgetPerformance>> {
    let on = date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let views = budgets_overlapping(state, user_id, on, on).await?;
    Ok(views.iter().map(BudgetPerformance::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budgets::evaluator::BudgetStatus;
    use crate::categories::{dto::CreateCategoryRequest, services::create_category, EntryType};
    use crate::transactions::{dto::CreateTransactionRequest, services::create_transaction};
    use rust_decimal_macros::dec;
    use time::macros::date;

    async fn setup() -> (AppState, Uuid, Uuid) {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let category = create_category(
            &state,
            user,
            CreateCategoryRequest {
                name: "Food".into(),
                color: "#EF4444".into(),
                icon: None,
                kind: EntryType::Expense,
            },
        )
        .await
        .unwrap();
        (state, user, category.id)
    }

    fn monthly(category_id: Uuid, amount: Decimal) -> CreateBudgetRequest {
        CreateBudgetRequest {
            name: "Groceries".into(),
            category_id,
            amount,
            period: BudgetPeriod::Monthly,
            start_date: date!(2024 - 01 - 01),
            end_date: None,
        }
    }

    async fn spend(state: &AppState, user: Uuid, category_id: Uuid, amount: Decimal, date: Date) {
        create_transaction(
            state,
            user,
            CreateTransactionRequest {
                category_id,
                amount,
                kind: EntryType::Expense,
                description: "spend".into(),
                date,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn missing_end_date_is_derived_from_period() {
        let (state, user, category) = setup().await;
        let view = create_budget(&state, user, monthly(category, dec!(1000))).await.unwrap();
        assert_eq!(view.end_date, date!(2024 - 01 - 31));
        assert_eq!(view.status, BudgetStatus::OnTrack);
        assert_eq!(view.spent, Decimal::ZERO);
    }

    #[tokio::test]
    async fn end_date_must_be_after_start() {
        let (state, user, category) = setup().await;
        for end in [date!(2024 - 01 - 01), date!(2023 - 12 - 31)] {
            let mut req = monthly(category, dec!(1000));
            req.end_date = Some(end);
            let err = create_budget(&state, user, req).await.unwrap_err();
            let AppError::Validation(fields) = err else {
                panic!("expected validation error");
            };
            assert_eq!(fields[0].field, "endDate");
        }
    }

    #[tokio::test]
    async fn create_requires_own_category_and_valid_amount() {
        let (state, user, category) = setup().await;
        let err = create_budget(&state, user, monthly(Uuid::new_v4(), dec!(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Category")));

        let err = create_budget(&state, user, monthly(category, dec!(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn evaluation_reflects_ledger_at_read_time() {
        let (state, user, category) = setup().await;
        let view = create_budget(&state, user, monthly(category, dec!(1000))).await.unwrap();

        spend(&state, user, category, dec!(500), date!(2024 - 01 - 05)).await;
        spend(&state, user, category, dec!(300), date!(2024 - 01 - 25)).await;
        spend(&state, user, category, dec!(999), date!(2024 - 02 - 01)).await;

        let view = get_budget(&state, user, view.id).await.unwrap();
        assert_eq!(view.spent, dec!(800));
        assert_eq!(view.remaining, dec!(200));
        assert_eq!(view.percentage_used, dec!(80));
        assert_eq!(view.status, BudgetStatus::CloseToLimit);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (state, user, category) = setup().await;
        create_budget(&state, user, monthly(category, dec!(500))).await.unwrap();
        let mut roomy = monthly(category, dec!(10000));
        roomy.name = "Roomy".into();
        create_budget(&state, user, roomy).await.unwrap();
        spend(&state, user, category, dec!(600), date!(2024 - 01 - 10)).await;

        let over = list_budgets(
            &state,
            user,
            BudgetQuery {
                status: Some(BudgetStatus::OverBudget),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].remaining, Decimal::ZERO);
        assert_eq!(over[0].percentage_used, dec!(120));

        let all = list_budgets(&state, user, BudgetQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn update_rechecks_the_whole_window() {
        let (state, user, category) = setup().await;
        let view = create_budget(&state, user, monthly(category, dec!(100))).await.unwrap();
        let err = update_budget(
            &state,
            user,
            view.id,
            UpdateBudgetRequest {
                start_date: Some(date!(2024 - 03 - 01)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let updated = update_budget(
            &state,
            user,
            view.id,
            UpdateBudgetRequest {
                amount: Some(dec!(250)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.amount, dec!(250));
    }

    #[tokio::test]
    async fn performance_only_includes_active_budgets() {
        let (state, user, category) = setup().await;
        create_budget(&state, user, monthly(category, dec!(100))).await.unwrap();
        spend(&state, user, category, dec!(85), date!(2024 - 01 - 02)).await;

        let active = performance(&state, user, Some(date!(2024 - 01 - 15))).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].allocated, dec!(100));
        assert_eq!(active[0].percentage, dec!(85));
        assert_eq!(active[0].status, BudgetStatus::CloseToLimit);

        let later = performance(&state, user, Some(date!(2024 - 02 - 15))).await.unwrap();
        assert!(later.is_empty());
    }

    #[tokio::test]
    async fn other_users_budget_is_not_found() {
        let (state, user, category) = setup().await;
        let view = create_budget(&state, user, monthly(category, dec!(100))).await.unwrap();
        let err = get_budget(&state, Uuid::new_v4(), view.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Budget")));
        let err = delete_budget(&state, Uuid::new_v4(), view.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

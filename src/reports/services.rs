use std::collections::HashMap;

use time::{Month, OffsetDateTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    aggregator::{summarize, PeriodRange, Summary},
    dto::{
        CategoryBreakdown, CategorySummary, MonthTotals, MonthlyQuery, MonthlyReport,
        SummaryQuery, TransactionSummary, YearlyQuery, YearlyReport,
    },
};
use crate::{
    budgets::{dto::BudgetPerformance, services::budgets_overlapping},
    categories::repo::CategoryRepo,
    error::{AppError, AppResult},
    state::AppState,
    transactions::{repo::TransactionRepo, Transaction, TransactionFilter},
    validation::Validator,
};

const YEAR_MIN: i32 = 2000;
const YEAR_MAX: i32 = 2100;
const UNKNOWN_CATEGORY_COLOR: &str = "#6B7280";

/// Month and year from the query, defaulting to the current month.
fn month_range(month: Option<u8>, year: Option<i32>) -> AppResult<(Month, i32, PeriodRange)> {
    let today = OffsetDateTime::now_utc().date();
    let month = month.unwrap_or(u8::from(today.month()));
    let year = year.unwrap_or(today.year());

    let mut v = Validator::new();
    v.check((1..=12).contains(&month), "month", "Month must be between 1 and 12");
    v.check((YEAR_MIN..=YEAR_MAX).contains(&year), "year", "Year must be between 2000 and 2100");
    v.finish()?;

    let month = Month::try_from(month).map_err(|_| AppError::validation("month", "Invalid month"))?;
    let range = PeriodRange::month(year, month)
        .ok_or_else(|| AppError::validation("year", "Invalid year"))?;
    Ok((month, year, range))
}

fn year_range(year: Option<i32>) -> AppResult<(i32, PeriodRange)> {
    let year = year.unwrap_or_else(|| OffsetDateTime::now_utc().year());
    let mut v = Validator::new();
    v.check((YEAR_MIN..=YEAR_MAX).contains(&year), "year", "Year must be between 2000 and 2100");
    v.finish()?;
    let range = PeriodRange::year(year).ok_or_else(|| AppError::validation("year", "Invalid year"))?;
    Ok((year, range))
}

async fn ledger(state: &AppState, user_id: Uuid, range: &PeriodRange) -> AppResult<Vec<Transaction>> {
    let filter = TransactionFilter {
        start: Some(range.start),
        end: Some(range.end),
        ..TransactionFilter::default()
    };
    let mut transactions = state.store.find_transactions(user_id, &filter).await?;
    // Oldest first, so breakdowns list categories in the order they were first used.
    transactions.reverse();
    debug!(user_id = %user_id, count = transactions.len(), "ledger loaded");
    Ok(transactions)
}

/// Attaches category names and colours to the aggregator's breakdown.
async fn enrich(state: &AppState, user_id: Uuid, summary: &Summary) -> AppResult<Vec<CategorySummary>> {
    let lookup: HashMap<Uuid, (String, String)> = state
        .store
        .list_categories(user_id, None)
        .await?
        .into_iter()
        .map(|c| (c.id, (c.name, c.color)))
        .collect();

    Ok(summary
        .categories
        .iter()
        .map(|total| {
            let (name, color) = lookup
                .get(&total.category_id)
                .cloned()
                .unwrap_or_else(|| ("Unknown".into(), UNKNOWN_CATEGORY_COLOR.into()));
            CategorySummary {
                category_id: total.category_id,
                category_name: name,
                color,
                amount: total.amount,
                percentage: total.percentage,
                transaction_count: total.transaction_count,
            }
        })
        .collect())
}

#[instrument(skip(state))]
pub async fn transaction_summary(
    state: &AppState,
    user_id: Uuid,
    query: SummaryQuery,
) -> AppResult<TransactionSummary> {
    let (_, _, current) = month_range(None, None)?;
    let start = query.start_date.unwrap_or(current.start);
    let end = query.end_date.unwrap_or(current.end);
    let range = PeriodRange::new(start, end)
        .ok_or_else(|| AppError::validation("endDate", "End date must not be before start date"))?;

    let transactions = ledger(state, user_id, &range).await?;
    Ok(TransactionSummary::new(&summarize(&transactions, &range), &range))
}

#[instrument(skip(state))]
pub async fn monthly_report(
    state: &AppState,
    user_id: Uuid,
    query: MonthlyQuery,
) -> AppResult<MonthlyReport> {
    let (month, year, range) = month_range(query.month, query.year)?;
    let transactions = ledger(state, user_id, &range).await?;
    let summary = summarize(&transactions, &range);
    let categories = enrich(state, user_id, &summary).await?;
    let budget_performance = budgets_overlapping(state, user_id, range.start, range.end)
        .await?
        .iter()
        .map(BudgetPerformance::from)
        .collect();

    Ok(MonthlyReport {
        month: month.to_string(),
        year,
        summary: TransactionSummary::new(&summary, &range),
        categories,
        budget_performance,
    })
}

#[instrument(skip(state))]
pub async fn yearly_report(
    state: &AppState,
    user_id: Uuid,
    query: YearlyQuery,
) -> AppResult<YearlyReport> {
    let (year, range) = year_range(query.year)?;
    let transactions = ledger(state, user_id, &range).await?;
    let summary = summarize(&transactions, &range);

    let mut months = Vec::with_capacity(12);
    let mut month = Month::January;
    for _ in 0..12 {
        let month_range = PeriodRange::month(year, month)
            .ok_or_else(|| AppError::validation("year", "Invalid year"))?;
        let totals = summarize(&transactions, &month_range);
        months.push(MonthTotals {
            month: u8::from(month),
            total_income: totals.total_income,
            total_expenses: totals.total_expenses,
            balance: totals.balance,
        });
        month = month.next();
    }

    Ok(YearlyReport {
        year,
        summary: TransactionSummary::new(&summary, &range),
        months,
        categories: enrich(state, user_id, &summary).await?,
    })
}

/// Whole year when `month` is absent.
#[instrument(skip(state))]
pub async fn category_breakdown(
    state: &AppState,
    user_id: Uuid,
    query: MonthlyQuery,
) -> AppResult<CategoryBreakdown> {
    let range = match query.month {
        Some(_) => month_range(query.month, query.year)?.2,
        None => year_range(query.year)?.1,
    };
    let transactions = ledger(state, user_id, &range).await?;
    let summary = summarize(&transactions, &range);

    Ok(CategoryBreakdown {
        start_date: range.start,
        end_date: range.end,
        total_expenses: summary.total_expenses,
        categories: enrich(state, user_id, &summary).await?,
    })
}

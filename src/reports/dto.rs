use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::aggregator::{PeriodRange, Summary};
use crate::budgets::dto::BudgetPerformance;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// `month` is 1..=12; both default to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub month: Option<u8>,
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YearlyQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    pub start_date: Date,
    pub end_date: Date,
}

impl TransactionSummary {
    pub fn new(summary: &Summary, range: &PeriodRange) -> Self {
        Self {
            total_income: summary.total_income,
            total_expenses: summary.total_expenses,
            balance: summary.balance,
            transaction_count: summary.transaction_count,
            start_date: range.start,
            end_date: range.end,
        }
    }
}

/// Breakdown entry with the category's display fields attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub category_name: String,
    pub color: String,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month: String,
    pub year: i32,
    pub summary: TransactionSummary,
    pub categories: Vec<CategorySummary>,
    pub budget_performance: Vec<BudgetPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub month: u8,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReport {
    pub year: i32,
    pub summary: TransactionSummary,
    pub months: Vec<MonthTotals>,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub start_date: Date,
    pub end_date: Date,
    pub total_expenses: Decimal,
    pub categories: Vec<CategorySummary>,
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{
    evaluator::{BudgetEvaluation, BudgetStatus},
    repo_types::{Budget, BudgetPeriod},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub name: String,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: Date,
    /// Derived from `period` when omitted.
    #[serde(default)]
    pub end_date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BudgetQuery {
    pub period: Option<BudgetPeriod>,
    pub status: Option<BudgetStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub date: Option<Date>,
}

/// A stored budget together with its read-time evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub period: BudgetPeriod,
    pub start_date: Date,
    pub end_date: Date,
    pub amount: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
    pub status: BudgetStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BudgetView {
    pub fn new(budget: Budget, eval: BudgetEvaluation) -> Self {
        Self {
            id: budget.id,
            name: budget.name,
            category_id: budget.category_id,
            period: budget.period,
            start_date: budget.start_date,
            end_date: budget.end_date,
            amount: budget.amount,
            spent: eval.spent,
            remaining: eval.remaining,
            percentage_used: eval.percentage_used,
            status: eval.status,
            created_at: budget.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPerformance {
    pub budget_id: Uuid,
    pub budget_name: String,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub status: BudgetStatus,
}

impl From<&BudgetView> for BudgetPerformance {
    fn from(v: &BudgetView) -> Self {
        Self {
            budget_id: v.id,
            budget_name: v.name.clone(),
            allocated: v.amount,
            spent: v.spent,
            remaining: v.remaining,
            percentage: v.percentage_used,
            status: v.status,
        }
    }
}

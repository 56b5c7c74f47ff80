//! Read-time budget consumption. Nothing here touches the store; callers hand
//! in the ledger entries and get the derived figures back.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo_types::Budget;
use crate::{
    categories::EntryType,
    money::{percentage, round2},
    transactions::Transaction,
};

const OVER_BUDGET_AT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
const CLOSE_TO_LIMIT_AT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStatus {
    OnTrack,
    CloseToLimit,
    OverBudget,
}

impl BudgetStatus {
    /// First match wins: 100 and up is over budget, 80 and up is close to the limit.
    pub fn from_percentage(percentage_used: Decimal) -> Self {
        if percentage_used >= OVER_BUDGET_AT {
            BudgetStatus::OverBudget
        } else if percentage_used >= CLOSE_TO_LIMIT_AT {
            BudgetStatus::CloseToLimit
        } else {
            BudgetStatus::OnTrack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::OnTrack => "on-track",
            BudgetStatus::CloseToLimit => "close-to-limit",
            BudgetStatus::OverBudget => "over-budget",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-track" => Ok(BudgetStatus::OnTrack),
            "close-to-limit" => Ok(BudgetStatus::CloseToLimit),
            "over-budget" => Ok(BudgetStatus::OverBudget),
            other => anyhow::bail!("unknown budget status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetEvaluation {
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
    pub status: BudgetStatus,
}

/// Whether `t` is spending against `budget`: same owner and category, an
/// expense, dated inside the budget window (both ends inclusive).
pub fn counts_toward(budget: &Budget, t: &Transaction) -> bool {
    t.user_id == budget.user_id
        && t.category_id == budget.category_id
        && t.kind == EntryType::Expense
        && budget.is_active_on(t.date)
}

/// Derives spent, remaining, percentage used and status for `budget`.
///
/// `transactions` may be any superset of the matching entries; anything that
/// does not count toward the budget is ignored.
pub fn evaluate(budget: &Budget, transactions: &[Transaction]) -> BudgetEvaluation {
    let spent: Decimal = transactions
        .iter()
        .filter(|t| counts_toward(budget, t))
        .map(|t| t.amount)
        .sum();
    let remaining = (budget.amount - spent).max(Decimal::ZERO);
    let percentage_used = percentage(spent, budget.amount);

    BudgetEvaluation {
        spent: round2(spent),
        remaining: round2(remaining),
        percentage_used,
        // Status follows the rounded figure so the two never disagree.
        status: BudgetStatus::from_percentage(percentage_used),
    }
}

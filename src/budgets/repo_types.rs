use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }

    /// Last day of a period starting on `start`: one month (or year) later, minus a day.
    /// The anniversary day is clamped to the target month's length before stepping back.
    pub fn end_for(&self, start: Date) -> Option<Date> {
        let (year, month) = match self {
            BudgetPeriod::Monthly => {
                let next = start.month().next();
                let year = if next == Month::January {
                    start.year() + 1
                } else {
                    start.year()
                };
                (year, next)
            }
            BudgetPeriod::Yearly => (start.year() + 1, start.month()),
        };
        let day = start
            .day()
            .min(time::util::days_in_year_month(year, month));
        Date::from_calendar_date(year, month, day)
            .ok()?
            .previous_day()
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => anyhow::bail!("unknown budget period {other:?}"),
        }
    }
}

/// Stored budget. Spending is never stored; see `budgets::evaluator`.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: Date,
    pub end_date: Date,
    pub created_at: OffsetDateTime,
}

impl Budget {
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: Date, end: Date) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[derive(Debug, FromRow)]
pub struct BudgetRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub period: String,
    pub start_date: Date,
    pub end_date: Date,
    pub created_at: OffsetDateTime,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = anyhow::Error;

    fn try_from(r: BudgetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            category_id: r.category_id,
            name: r.name,
            amount: r.amount,
            period: r.period.parse()?,
            start_date: r.start_date,
            end_date: r.end_date,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: Date,
    pub end_date: Date,
}

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::categories::EntryType;

/// A dated ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub description: String,
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub kind: String,
    pub description: String,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            category_id: r.category_id,
            amount: r.amount,
            kind: r.kind.parse()?,
            description: r.description,
            date: r.date,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub kind: EntryType,
    pub description: String,
    pub date: Date,
}

/// Ledger query. Every `None` field means "don't filter on it"; date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<EntryType>,
    pub category_id: Option<Uuid>,
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionFilter {
    pub fn expenses_between(start: Date, end: Date) -> Self {
        Self {
            kind: Some(EntryType::Expense),
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    /// Same predicate the SQL query applies, minus paging.
    pub fn matches(&self, t: &Transaction) -> bool {
        self.kind.map_or(true, |k| t.kind == k)
            && self.category_id.map_or(true, |c| t.category_id == c)
            && self.start.map_or(true, |s| t.date >= s)
            && self.end.map_or(true, |e| t.date <= e)
            && self.search.as_deref().map_or(true, |q| {
                t.description.to_lowercase().contains(&q.to_lowercase())
            })
    }
}

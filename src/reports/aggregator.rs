//! Totals and per-category breakdowns over a slice of the ledger.

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Month};
use uuid::Uuid;

use crate::{categories::EntryType, money::percentage, transactions::Transaction};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: Date,
    pub end: Date,
}

impl PeriodRange {
    /// `None` when `end` is before `start`.
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn month(year: i32, month: Month) -> Option<Self> {
        let start = Date::from_calendar_date(year, month, 1).ok()?;
        let last = time::util::days_in_year_month(year, month);
        let end = Date::from_calendar_date(year, month, last).ok()?;
        Some(Self { start, end })
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: Date::from_calendar_date(year, Month::January, 1).ok()?,
            end: Date::from_calendar_date(year, Month::December, 31).ok()?,
        })
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    /// Expense totals per category, in order of first appearance.
    pub categories: Vec<CategoryTotal>,
}

pub fn summarize(transactions: &[Transaction], range: &PeriodRange) -> Summary {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut transaction_count = 0;
    let mut categories: Vec<CategoryTotal> = Vec::new();

    for t in transactions.iter().filter(|t| range.contains(t.date)) {
        transaction_count += 1;
        match t.kind {
            EntryType::Income => total_income += t.amount,
            EntryType::Expense => {
                total_expenses += t.amount;
                // Linear scan keeps first-seen order; a user has few categories.
                match categories.iter_mut().find(|c| c.category_id == t.category_id) {
                    Some(c) => {
                        c.amount += t.amount;
                        c.transaction_count += 1;
                    }
                    None => categories.push(CategoryTotal {
                        category_id: t.category_id,
                        amount: t.amount,
                        percentage: Decimal::ZERO,
                        transaction_count: 1,
                    }),
                }
            }
        }
    }

    for c in &mut categories {
        c.percentage = percentage(c.amount, total_expenses);
    }

    Summary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        transaction_count,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::{macros::date, OffsetDateTime};

    fn tx(category: u128, kind: EntryType, amount: Decimal, date: Date) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category_id: Uuid::from_u128(category),
            amount,
            kind,
            description: "x".into(),
            date,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn january() -> PeriodRange {
        PeriodRange::month(2024, Month::January).unwrap()
    }

    #[test]
    fn totals_and_breakdown() {
        let txs = vec![
            tx(3, EntryType::Expense, dec!(30), date!(2024 - 01 - 02)),
            tx(1, EntryType::Income, dec!(1000), date!(2024 - 01 - 01)),
            tx(2, EntryType::Expense, dec!(60), date!(2024 - 01 - 03)),
            tx(3, EntryType::Expense, dec!(10), date!(2024 - 01 - 31)),
            tx(2, EntryType::Expense, dec!(500), date!(2024 - 02 - 01)),
        ];
        let s = summarize(&txs, &january());
        assert_eq!(s.total_income, dec!(1000));
        assert_eq!(s.total_expenses, dec!(100));
        assert_eq!(s.balance, dec!(900));
        assert_eq!(s.transaction_count, 4);

        let order: Vec<_> = s.categories.iter().map(|c| c.category_id).collect();
        assert_eq!(order, vec![Uuid::from_u128(3), Uuid::from_u128(2)]);
        assert_eq!(s.categories[0].amount, dec!(40));
        assert_eq!(s.categories[0].percentage, dec!(40));
        assert_eq!(s.categories[0].transaction_count, 2);
        assert_eq!(s.categories[1].percentage, dec!(60));
    }

    #[test]
    fn no_expenses_gives_zero_percentages() {
        let txs = vec![tx(1, EntryType::Income, dec!(50), date!(2024 - 01 - 10))];
        let s = summarize(&txs, &january());
        assert_eq!(s.total_expenses, Decimal::ZERO);
        assert!(s.categories.is_empty());
        assert_eq!(s.balance, dec!(50));
    }

    #[test]
    fn repeated_calls_match_and_leave_input_alone() {
        let txs = vec![
            tx(2, EntryType::Expense, dec!(1), date!(2024 - 01 - 05)),
            tx(1, EntryType::Expense, dec!(2), date!(2024 - 01 - 06)),
            tx(2, EntryType::Income, dec!(3), date!(2024 - 01 - 07)),
        ];
        let snapshot = txs.clone();
        let a = summarize(&txs, &january());
        let b = summarize(&txs, &january());
        assert_eq!(a, b);
        assert_eq!(txs, snapshot);
    }

    #[test]
    fn thirds_round_to_two_places() {
        let txs = vec![
            tx(1, EntryType::Expense, dec!(1), date!(2024 - 01 - 05)),
            tx(2, EntryType::Expense, dec!(2), date!(2024 - 01 - 06)),
        ];
        let s = summarize(&txs, &january());
        assert_eq!(s.categories[0].percentage, dec!(33.33));
        assert_eq!(s.categories[1].percentage, dec!(66.67));
    }

    #[test]
    fn period_ranges() {
        let feb = PeriodRange::month(2024, Month::February).unwrap();
        assert_eq!(feb.end, date!(2024 - 02 - 29));
        let year = PeriodRange::year(2023).unwrap();
        assert!(year.contains(date!(2023 - 12 - 31)));
        assert!(!year.contains(date!(2024 - 01 - 01)));
        assert!(PeriodRange::new(date!(2024 - 01 - 02), date!(2024 - 01 - 01)).is_none());
        assert!(PeriodRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 01)).is_some());
    }
}

use rust_decimal::{Decimal, RoundingStrategy};

/// Smallest accepted transaction or budget amount (0.01).
pub const AMOUNT_MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Largest accepted transaction or budget amount (999999.99).
pub const AMOUNT_MAX: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Rounds to two decimals, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / total * 100` rounded to two decimals; zero when `total` is not positive.
pub fn percentage(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(part / total * HUNDRED)
}

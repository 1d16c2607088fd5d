//! Margin estimate and budget filter.
//!
//! "Margin" here is the premium outlay for one lot, not the exchange's
//! regulatory margin.
use rust_decimal::Decimal;

/// Default budget: rows at or above this amount are dropped.
pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(20000, 0, 0, false, 0);

/// Capital needed to buy one lot at `premium`. Full precision is kept.
pub fn margin(premium: Decimal, lot_size: u32) -> Decimal {
    premium * Decimal::from(lot_size)
}

/// Strict "under" comparison against the budget.
pub fn within_threshold(margin: Decimal, threshold: Decimal) -> bool {
    margin < threshold
}

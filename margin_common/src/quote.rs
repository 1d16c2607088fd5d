//! Per-symbol results: the fetched quotes and the report rows derived from them.
use rust_decimal::Decimal;

use crate::margin::margin;
use crate::side::{OptionSide, SidePolicy};

/// Premium of one listed ATM contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractQuote {
    /// Brokerage contract symbol (e.g. `NSE:BANKNIFTY25JUL56500CE`).
    pub contract: String,
    /// Last traded premium.
    pub premium: Decimal,
}

/// Everything fetched for one underlying. At least one side is present.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    /// Underlying name.
    pub symbol: String,
    /// Units per contract.
    pub lot_size: u32,
    /// Underlying last traded price.
    pub spot: Decimal,
    /// ATM strike, a multiple of the symbol's strike interval.
    pub atm_strike: Decimal,
    /// Call quote, if it could be fetched.
    pub call: Option<ContractQuote>,
    /// Put quote, if it could be fetched.
    pub put: Option<ContractQuote>,
}

impl QuoteResult {
    /// Quote for `side`.
    pub fn side(&self, side: OptionSide) -> Option<&ContractQuote> {
        match side {
            OptionSide::Call => self.call.as_ref(),
            OptionSide::Put => self.put.as_ref(),
        }
    }

    /// Rows for the sides chosen by `policy`, in call-then-put order.
    pub fn margin_rows(&self, policy: SidePolicy) -> Vec<MarginRow> {
        let premium = |side| self.side(side).map(|q| q.premium);
        policy
            .select(premium(OptionSide::Call), premium(OptionSide::Put))
            .into_iter()
            .filter_map(|side| {
                self.side(side).map(|quote| MarginRow {
                    symbol: self.symbol.clone(),
                    spot: self.spot,
                    side,
                    strike: self.atm_strike,
                    premium: quote.premium,
                    margin: margin(quote.premium, self.lot_size),
                })
            })
            .collect()
    }
}

/// One report line: a single side of a symbol's ATM pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginRow {
    /// Underlying name.
    pub symbol: String,
    /// Underlying last traded price.
    pub spot: Decimal,
    /// Contract side.
    pub side: OptionSide,
    /// ATM strike.
    pub strike: Decimal,
    /// Contract premium.
    pub premium: Decimal,
    /// `premium * lot_size`.
    pub margin: Decimal,
}

impl MarginRow {
    /// Strike followed by the side suffix, e.g. `56500CE`.
    pub fn contract_label(&self) -> String {
        format!("{}{}", self.strike.normalize(), self.side)
    }
}

/// Why a symbol, or one side of it, is missing from the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipNote {
    /// Underlying name.
    pub symbol: String,
    /// `None` when the whole symbol was skipped.
    pub side: Option<OptionSide>,
    /// Human-readable cause.
    pub reason: String,
}

impl SkipNote {
    /// The whole symbol was dropped.
    pub fn symbol(symbol: &str, reason: impl Into<String>) -> Self {
        SkipNote {
            symbol: symbol.to_string(),
            side: None,
            reason: reason.into(),
        }
    }

    /// One side failed while the symbol is still reported.
    pub fn side(symbol: &str, side: OptionSide, reason: impl Into<String>) -> Self {
        SkipNote {
            symbol: symbol.to_string(),
            side: Some(side),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn banknifty() -> QuoteResult {
        QuoteResult {
            symbol: "BANKNIFTY".into(),
            lot_size: 35,
            spot: dec!(56407.80),
            atm_strike: dec!(56400),
            call: Some(ContractQuote {
                contract: "NSE:BANKNIFTY25JUL56400CE".into(),
                premium: dec!(519.00),
            }),
            put: Some(ContractQuote {
                contract: "NSE:BANKNIFTY25JUL56400PE".into(),
                premium: dec!(498.50),
            }),
        }
    }

    #[test]
    fn both_sides_give_two_rows() {
        let rows = banknifty().margin_rows(SidePolicy::Both);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].side, OptionSide::Call);
        assert_eq!(rows[0].margin, dec!(18165.00));
        assert_eq!(rows[1].margin, dec!(17447.50));
    }

    #[test]
    fn cheaper_gives_put() {
        let rows = banknifty().margin_rows(SidePolicy::Cheaper);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contract_label(), "56400PE");
    }

    #[test]
    fn missing_side_produces_no_row() {
        let mut quote = banknifty();
        quote.call = None;
        assert!(quote.margin_rows(SidePolicy::Call).is_empty());
        assert_eq!(quote.margin_rows(SidePolicy::Both).len(), 1);
    }

    #[test]
    fn contract_label_trims_scale() {
        let mut row = banknifty().margin_rows(SidePolicy::Call).remove(0);
        row.strike = dec!(212.50);
        assert_eq!(row.contract_label(), "212.5CE");
    }
}

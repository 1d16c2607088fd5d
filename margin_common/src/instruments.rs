//! Instrument naming and strike-interval tables.
//!
//! Underlyings are configured by their plain exchange name (`NIFTY`, `SBIN`);
//! the brokerage addresses them as `EXCHANGE:NAME-SERIES`. Strike gaps come
//! from the exchange's published gap file, with a small built-in table for the
//! index products and a price-band fallback for anything else.
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::MarginError;
use crate::result::Result;

/// Index underlyings and their brokerage tickers.
const INDEX_TICKERS: [(&str, &str); 6] = [
    ("NIFTY", "NSE:NIFTY50-INDEX"),
    ("BANKNIFTY", "NSE:NIFTYBANK-INDEX"),
    ("FINNIFTY", "NSE:FINNIFTY-INDEX"),
    ("MIDCPNIFTY", "NSE:MIDCPNIFTY-INDEX"),
    ("NIFTY NEXT 50", "NSE:NIFTYNXT50-INDEX"),
    ("SENSEX", "BSE:SENSEX-INDEX"),
];

/// Strike gaps of the index products.
const INDEX_INTERVALS: [(&str, i64); 6] = [
    ("NIFTY", 50),
    ("BANKNIFTY", 100),
    ("FINNIFTY", 50),
    ("MIDCPNIFTY", 25),
    ("NIFTY NEXT 50", 100),
    ("SENSEX", 100),
];

/// Brokerage ticker for an underlying. Equities default to the NSE `-EQ` series.
pub fn brokerage_symbol(underlying: &str) -> String {
    let upper = underlying.trim().to_uppercase();
    INDEX_TICKERS
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, ticker)| ticker.to_string())
        .unwrap_or_else(|| format!("NSE:{}-EQ", upper))
}

/// Built-in strike gap for index underlyings.
pub fn index_interval(underlying: &str) -> Option<Decimal> {
    let upper = underlying.trim().to_uppercase();
    INDEX_INTERVALS
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, gap)| Decimal::from(*gap))
}

/// Strike gap guessed from the price level when nothing else is known.
pub fn interval_by_price(spot: Decimal) -> Decimal {
    let gap = if spot < Decimal::from(500) {
        5
    } else if spot < Decimal::from(1000) {
        10
    } else if spot < Decimal::from(2000) {
        20
    } else if spot < Decimal::from(5000) {
        50
    } else {
        100
    };
    Decimal::from(gap)
}

#[derive(Debug, Deserialize)]
struct GapRow {
    #[serde(rename = "Symbol", alias = "symbol")]
    symbol: String,
    #[serde(rename = "Gap", alias = "gap", alias = "Step Value")]
    gap: String,
}

/// Strike gaps keyed by upper-cased underlying.
#[derive(Debug, Clone, Default)]
pub struct IntervalTable {
    gaps: HashMap<String, Decimal>,
}

impl IntervalTable {
    /// Parses a gap file with `Symbol` and `Gap` columns.
    ///
    /// A leading line that is not the header (the exchange prefixes a date) is
    /// skipped. When a symbol is listed several times the smallest gap wins.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut first = String::new();
        reader.read_line(&mut first)?;
        let first = first.trim_start_matches('\u{feff}');
        let header = if first.trim_start().to_lowercase().starts_with("symbol") {
            first.to_string()
        } else {
            String::new()
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(header.as_bytes().chain(reader));

        let mut gaps: HashMap<String, Decimal> = HashMap::new();
        for row in csv_reader.deserialize::<GapRow>() {
            let row = row?;
            let gap: Decimal = row.gap.parse().map_err(|e| {
                MarginError::ParseSymbolsFile(format!("gap '{}' for {}: {}", row.gap, row.symbol, e))
            })?;
            if gap <= Decimal::ZERO {
                return Err(MarginError::ParseSymbolsFile(format!(
                    "gap for {} must be positive, got {}",
                    row.symbol, gap
                )));
            }
            gaps.entry(row.symbol.to_uppercase())
                .and_modify(|current| {
                    if gap < *current {
                        *current = gap;
                    }
                })
                .or_insert(gap);
        }
        Ok(Self { gaps })
    }

    /// Gap for `underlying`, if listed.
    pub fn get(&self, underlying: &str) -> Option<Decimal> {
        self.gaps.get(&underlying.trim().to_uppercase()).copied()
    }

    /// Number of listed underlyings.
    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    /// `true` when nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn maps_indices_and_equities() {
        assert_eq!(brokerage_symbol("NIFTY"), "NSE:NIFTY50-INDEX");
        assert_eq!(brokerage_symbol("banknifty"), "NSE:NIFTYBANK-INDEX");
        assert_eq!(brokerage_symbol("SENSEX"), "BSE:SENSEX-INDEX");
        assert_eq!(brokerage_symbol(" sbin "), "NSE:SBIN-EQ");
    }

    #[test]
    fn index_intervals() {
        assert_eq!(index_interval("NIFTY"), Some(dec!(50)));
        assert_eq!(index_interval("MIDCPNIFTY"), Some(dec!(25)));
        assert_eq!(index_interval("RELIANCE"), None);
    }

    #[test]
    fn price_bands() {
        assert_eq!(interval_by_price(dec!(212)), dec!(5));
        assert_eq!(interval_by_price(dec!(500)), dec!(10));
        assert_eq!(interval_by_price(dec!(1999.95)), dec!(20));
        assert_eq!(interval_by_price(dec!(4200)), dec!(50));
        assert_eq!(interval_by_price(dec!(56407.8)), dec!(100));
    }

    #[test]
    fn gap_file_with_date_line_keeps_smallest_gap() {
        let data = "01-Jul-2025\nSymbol,Gap\nSBIN,5\nSBIN,2.5\nTCS, 20\n";
        let table = IntervalTable::parse(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("sbin"), Some(dec!(2.5)));
        assert_eq!(table.get("TCS"), Some(dec!(20)));
        assert_eq!(table.get("INFY"), None);
    }

    #[test]
    fn gap_file_without_date_line() {
        let data = "Symbol,Gap\nINFY,20\n";
        let table = IntervalTable::parse(data.as_bytes()).unwrap();
        assert_eq!(table.get("INFY"), Some(dec!(20)));
    }

    #[test]
    fn gap_file_with_byte_order_mark() {
        let data = "\u{feff}Symbol,Gap\nSBIN,2.5\nTCS,20\n";
        let table = IntervalTable::parse(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("SBIN"), Some(dec!(2.5)));
        assert_eq!(table.get("TCS"), Some(dec!(20)));
    }

    #[test]
    fn gap_file_rejects_bad_values() {
        assert!(IntervalTable::parse("Symbol,Gap\nINFY,abc\n".as_bytes()).is_err());
        assert!(IntervalTable::parse("Symbol,Gap\nINFY,0\n".as_bytes()).is_err());
    }
}

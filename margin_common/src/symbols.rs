//! Per-symbol run configuration and the symbols-file parser.
//!
//! The symbols file is a CSV with a header row. `Symbol` and `Lot Size` are
//! required; `Strike Interval`, `Expiry` and `Side` may be left out or blank.
//!
//! ```text
//! Symbol,Lot Size,Strike Interval,Expiry,Side
//! BANKNIFTY,35,100,nearest,
//! SBIN,750,,2025-07-31,cheaper
//! ```
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::MarginError;
use crate::instruments::{IntervalTable, index_interval, interval_by_price};
use crate::result::Result;
use crate::side::SidePolicy;

/// Where a symbol's strike gap comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeStep {
    /// Known gap.
    Fixed(Decimal),
    /// Derived from the spot price once it is fetched.
    ByPrice,
}

/// Which listed expiry to take contracts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiry {
    /// The first expiry in the brokerage's listing.
    #[default]
    Nearest,
    /// A specific expiry date.
    On(NaiveDate),
}

impl FromStr for Expiry {
    type Err = MarginError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nearest") {
            return Ok(Expiry::Nearest);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
            .map(Expiry::On)
            .map_err(|_| MarginError::ParseSymbolsFile(format!("unrecognised expiry '{}'", s)))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Nearest => write!(f, "nearest"),
            Expiry::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Static configuration for one underlying, immutable for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolConfig {
    /// Underlying name as listed by the exchange (e.g. `BANKNIFTY`).
    pub symbol: String,
    /// Units per contract.
    pub lot_size: u32,
    /// Strike gap source.
    pub strike_step: StrikeStep,
    /// Contract expiry.
    pub expiry: Expiry,
    /// Per-symbol override of the global side policy.
    pub side: Option<SidePolicy>,
}

impl SymbolConfig {
    /// Config with a fixed gap, nearest expiry and no side override.
    pub fn new(symbol: &str, lot_size: u32, interval: Decimal) -> Self {
        SymbolConfig {
            symbol: symbol.to_uppercase(),
            lot_size,
            strike_step: StrikeStep::Fixed(interval),
            expiry: Expiry::Nearest,
            side: None,
        }
    }

    /// Strike gap to use at `spot`.
    pub fn interval_for(&self, spot: Decimal) -> Decimal {
        match self.strike_step {
            StrikeStep::Fixed(gap) => gap,
            StrikeStep::ByPrice => interval_by_price(spot),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SymbolRow {
    #[serde(rename = "Symbol", alias = "symbol")]
    symbol: String,
    #[serde(rename = "Lot Size", alias = "lot_size")]
    lot_size: String,
    #[serde(rename = "Strike Interval", alias = "strike_interval", default)]
    strike_interval: Option<String>,
    #[serde(rename = "Expiry", alias = "expiry", default)]
    expiry: Option<String>,
    #[serde(rename = "Side", alias = "side", default)]
    side: Option<String>,
}

/// Trait providing file parsing for symbol configurations.
pub trait SymbolParser {
    /// Parses every row of a symbols CSV.
    ///
    /// Rows without a `Strike Interval` take their gap from `intervals`, then
    /// from the built-in index table, and otherwise fall back to the price band.
    /// An empty file is a configuration error.
    fn parse_from_file<R: Read>(reader: R, intervals: &IntervalTable) -> Result<Vec<SymbolConfig>>;
}

impl SymbolParser for SymbolConfig {
    fn parse_from_file<R: Read>(reader: R, intervals: &IntervalTable) -> Result<Vec<Self>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut symbols = Vec::new();
        for row in csv_reader.deserialize::<SymbolRow>() {
            let row = row?;
            if row.symbol.is_empty() {
                continue;
            }
            symbols.push(row.into_config(intervals)?);
        }

        if symbols.is_empty() {
            return Err(MarginError::Config("symbol configuration is empty".into()));
        }
        Ok(symbols)
    }
}

impl SymbolRow {
    fn into_config(self, intervals: &IntervalTable) -> Result<SymbolConfig> {
        let symbol = self.symbol.to_uppercase();

        let lot_size: u32 = self.lot_size.parse().map_err(|e| {
            MarginError::ParseSymbolsFile(format!("lot size '{}' for {}: {}", self.lot_size, symbol, e))
        })?;
        if lot_size == 0 {
            return Err(MarginError::ParseSymbolsFile(format!("lot size for {} must be positive", symbol)));
        }

        let strike_step = match non_blank(self.strike_interval) {
            Some(raw) => {
                let gap: Decimal = raw.parse().map_err(|e| {
                    MarginError::ParseSymbolsFile(format!("strike interval '{}' for {}: {}", raw, symbol, e))
                })?;
                if gap <= Decimal::ZERO {
                    return Err(MarginError::ParseSymbolsFile(format!(
                        "strike interval for {} must be positive",
                        symbol
                    )));
                }
                StrikeStep::Fixed(gap)
            }
            None => intervals
                .get(&symbol)
                .or_else(|| index_interval(&symbol))
                .map(StrikeStep::Fixed)
                .unwrap_or(StrikeStep::ByPrice),
        };

        let expiry = match non_blank(self.expiry) {
            Some(raw) => raw.parse()?,
            None => Expiry::Nearest,
        };

        let side = match non_blank(self.side) {
            Some(raw) => Some(raw.parse::<SidePolicy>().map_err(|_| {
                MarginError::ParseSymbolsFile(format!("unknown side '{}' for {}", raw, symbol))
            })?),
            None => None,
        };

        Ok(SymbolConfig {
            symbol,
            lot_size,
            strike_step,
            expiry,
            side,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

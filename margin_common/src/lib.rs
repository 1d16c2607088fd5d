//!
//! Domain types and pure logic for the ATM option margin scanner.
//!
//! This crate aggregates:
//! - `error` — unified error type `MarginError` used across the workspace.
//! - `result` — handy `Result<T, MarginError>` alias.
//! - `symbols` — per-symbol configuration and the symbols-file parser.
//! - `instruments` — brokerage tickers and strike-interval tables.
//! - `side` — call/put sides and the report side-selection policy.
//! - `strike` — ATM strike calculator.
//! - `margin` — premium-times-lot estimate and the budget filter.
//! - `quote` — fetched quotes and the report rows derived from them.
//! - `market` — the market-data collaborator trait and option-chain listing.
//! - `report` — fixed-width text report.
#![warn(missing_docs)]
pub mod error;
pub mod instruments;
pub mod margin;
pub mod market;
pub mod quote;
pub mod report;
pub mod result;
pub mod side;
pub mod strike;
pub mod symbols;

pub use error::MarginError;
pub use market::MarketData;
pub use result::Result;
pub use symbols::SymbolConfig;

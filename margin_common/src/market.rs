//! The market-data collaborator and the option-chain listing it returns.
//!
//! Option contract symbols are never assembled by hand; they are looked up in
//! the brokerage's listing so a mistyped contract can't be quoted silently.
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::MarginError;
use crate::result::Result;
use crate::side::OptionSide;
use crate::symbols::Expiry;

/// An expiry advertised by the brokerage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedExpiry {
    /// Calendar date of the expiry.
    pub date: NaiveDate,
    /// Brokerage token used to request this expiry's chain.
    pub token: String,
}

/// A tradable contract from the option-chain listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedContract {
    /// Brokerage contract symbol.
    pub symbol: String,
    /// Strike price.
    pub strike: Decimal,
    /// Call or put.
    pub side: OptionSide,
}

/// Contracts of one underlying for one expiry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    /// Listed expiries, nearest first.
    pub expiries: Vec<ListedExpiry>,
    /// Contracts of the requested expiry.
    pub contracts: Vec<ListedContract>,
}

impl OptionChain {
    /// Contract at `strike` on `side`, if listed.
    pub fn find(&self, strike: Decimal, side: OptionSide) -> Option<&ListedContract> {
        self.contracts
            .iter()
            .find(|c| c.side == side && c.strike == strike)
    }
}

/// Authenticated access to quotes and option-chain listings.
///
/// Implementations validate every payload at the boundary: a missing, zero or
/// malformed price is a [`MarginError::QuoteUnavailable`], never a zero.
pub trait MarketData {
    /// Last traded price of `symbol` (brokerage ticker).
    fn last_traded_price(&self, symbol: &str) -> Result<Decimal>;

    /// Option-chain listing of `underlying` (brokerage ticker) for `expiry`.
    fn option_chain(&self, underlying: &str, expiry: Expiry) -> Result<OptionChain>;
}

/// Picks the listed expiry matching `wanted`.
pub fn resolve_expiry<'a>(
    underlying: &str,
    listed: &'a [ListedExpiry],
    wanted: Expiry,
) -> Result<&'a ListedExpiry> {
    let found = match wanted {
        Expiry::Nearest => listed.iter().min_by_key(|e| e.date),
        Expiry::On(date) => listed.iter().find(|e| e.date == date),
    };
    found.ok_or_else(|| {
        MarginError::quote_unavailable(underlying, format!("expiry {} is not listed", wanted))
    })
}

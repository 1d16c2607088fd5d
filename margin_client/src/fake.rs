//! In-memory market used by the tests.
use std::collections::HashMap;
use std::sync::Mutex;

use margin_common::market::{ListedContract, ListedExpiry, OptionChain};
use margin_common::side::OptionSide;
use margin_common::symbols::Expiry;
use margin_common::{MarginError, MarketData, Result};
use rust_decimal::Decimal;

/// Fixed prices and chains; anything unknown is `QuoteUnavailable`.
#[derive(Default)]
pub struct FakeMarket {
    prices: HashMap<String, Decimal>,
    chains: HashMap<String, OptionChain>,
    reject_session: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    /// Lists CE and PE at `strike` and prices them.
    pub fn contracts(self, underlying: &str, strike: Decimal, call: Decimal, put: Decimal) -> Self {
        self.listed(underlying, strike, OptionSide::Call, Some(call))
            .listed(underlying, strike, OptionSide::Put, Some(put))
    }

    /// Lists one contract, priced at `premium` when given.
    pub fn listed(mut self, underlying: &str, strike: Decimal, side: OptionSide, premium: Option<Decimal>) -> Self {
        let symbol = format!("{}:{}{}", underlying, strike, side);
        if let Some(premium) = premium {
            self.prices.insert(symbol.clone(), premium);
        }
        self.chains
            .entry(underlying.to_string())
            .or_default()
            .contracts
            .push(ListedContract { symbol, strike, side });
        self
    }

    pub fn expiry(mut self, underlying: &str, expiry: ListedExpiry) -> Self {
        self.chains
            .entry(underlying.to_string())
            .or_default()
            .expiries
            .push(expiry);
        self
    }

    pub fn reject_session(mut self) -> Self {
        self.reject_session = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl MarketData for FakeMarket {
    fn last_traded_price(&self, symbol: &str) -> Result<Decimal> {
        self.record(format!("ltp {}", symbol));
        if self.reject_session {
            return Err(MarginError::Authentication("token expired".into()));
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| MarginError::quote_unavailable(symbol, "no data returned"))
    }

    fn option_chain(&self, underlying: &str, expiry: Expiry) -> Result<OptionChain> {
        self.record(format!("chain {} {}", underlying, expiry));
        let chain = self
            .chains
            .get(underlying)
            .cloned()
            .ok_or_else(|| MarginError::quote_unavailable(underlying, "option chain missing"))?;
        if let Expiry::On(date) = expiry {
            if !chain.expiries.iter().any(|e| e.date == date) {
                return Err(MarginError::quote_unavailable(underlying, "expiry not listed"));
            }
        }
        Ok(chain)
    }
}

//! Bounded retries with exponential backoff around a market-data source.
//!
//! With zero retries the wrapper is transparent and a failed call is reported
//! straight away. Fatal errors (e.g. a rejected session) are never retried.
use std::thread;
use std::time::Duration;

use log::warn;
use margin_common::market::OptionChain;
use margin_common::symbols::Expiry;
use margin_common::{MarketData, Result};
use rust_decimal::Decimal;

/// Retry budget and backoff curve.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first call.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(retry);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `call` until it succeeds, fails fatally, or the budget is spent.
    pub fn run<T>(&self, what: &str, mut call: impl FnMut() -> Result<T>) -> Result<T> {
        let mut retry = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_fatal() || retry >= self.max_retries => return Err(e),
                Err(e) => {
                    let delay = self.delay(retry);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        what,
                        e,
                        retry + 1,
                        self.max_retries,
                        delay
                    );
                    thread::sleep(delay);
                    retry += 1;
                }
            }
        }
    }
}

/// A [`MarketData`] source whose calls are retried under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Retrying<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: MarketData> Retrying<M> {
    /// Wraps `inner`.
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<M: MarketData> MarketData for Retrying<M> {
    fn last_traded_price(&self, symbol: &str) -> Result<Decimal> {
        self.policy
            .run(symbol, || self.inner.last_traded_price(symbol))
    }

    fn option_chain(&self, underlying: &str, expiry: Expiry) -> Result<OptionChain> {
        self.policy
            .run(underlying, || self.inner.option_chain(underlying, expiry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_common::MarginError;
    use std::cell::Cell;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2,
        }
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(4000));
        assert_eq!(policy.delay(4), Duration::from_millis(8000));
        assert_eq!(policy.delay(40), Duration::from_millis(8000));
    }

    #[test]
    fn zero_retries_fails_on_first_error() {
        let calls = Cell::new(0);
        let result: Result<()> = fast(0).run("x", || {
            calls.set(calls.get() + 1);
            Err(MarginError::Http("timed out".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recovers_after_transient_errors() {
        let calls = Cell::new(0);
        let result = fast(3).run("x", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(MarginError::Http("reset".into()))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn stops_when_budget_is_spent() {
        let calls = Cell::new(0);
        let result: Result<()> = fast(2).run("x", || {
            calls.set(calls.get() + 1);
            Err(MarginError::quote_unavailable("x", "empty"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn authentication_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = fast(5).run("x", || {
            calls.set(calls.get() + 1);
            Err(MarginError::Authentication("expired".into()))
        });
        assert!(matches!(result, Err(MarginError::Authentication(_))));
        assert_eq!(calls.get(), 1);
    }
}

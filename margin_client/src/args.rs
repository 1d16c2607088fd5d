//! Command-line arguments for the margin scanner.
//!
//! This module defines the CLI interface using `clap`. Credentials may also be
//! supplied through `FYERS_APP_ID` and `FYERS_ACCESS_TOKEN`.
use std::time::Duration;

use clap::Parser;
use margin_common::margin::DEFAULT_THRESHOLD;
use margin_common::side::SidePolicy;
use margin_common::strike::Rounding;
use rust_decimal::Decimal;

use crate::fyers::DEFAULT_BASE_URL;
use crate::pipeline::ScanOptions;
use crate::retry::RetryPolicy;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Lists ATM options whose one-lot premium fits a budget", long_about = None)]
pub struct Args {
    /// CSV with `Symbol` and `Lot Size` columns, and optionally
    /// `Strike Interval`, `Expiry` and `Side`.
    #[clap(long)]
    pub symbols: String,

    /// CSV of exchange strike gaps (`Symbol`, `Gap`).
    #[clap(long)]
    pub intervals: Option<String>,

    /// Keep rows whose margin is strictly under this amount (INR).
    #[clap(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: Decimal,

    /// Report file, overwritten on every run.
    #[clap(long, default_value = "fyers_margin_results.txt")]
    pub output: String,

    /// Which side(s) of the ATM pair to report.
    #[clap(long, value_enum, default_value_t = SidePolicy::Both)]
    pub side_policy: SidePolicy,

    /// How the spot is snapped to a strike.
    #[clap(long, value_enum, default_value_t = Rounding::Nearest)]
    pub rounding: Rounding,

    /// Timeout of every API call, in seconds.
    #[clap(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Extra attempts per API call after a failure.
    #[clap(long, default_value_t = 0)]
    pub retries: u32,

    /// Delay before the first retry, in milliseconds; doubles per retry.
    #[clap(long, default_value_t = 500)]
    pub backoff_ms: u64,

    /// Upper bound on a retry delay, in milliseconds.
    #[clap(long, default_value_t = 8000)]
    pub max_backoff_ms: u64,

    /// Pause between symbols, in milliseconds.
    #[clap(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Symbols fetched in parallel. 1 processes them one after another.
    #[clap(long, default_value_t = 1)]
    pub workers: usize,

    /// Strikes listed on each side of the ATM when reading the option chain.
    #[clap(long, default_value_t = 10)]
    pub strike_count: u32,

    /// Brokerage app id.
    #[clap(long, env = "FYERS_APP_ID")]
    pub app_id: String,

    /// Access token of a logged-in session.
    #[clap(long, env = "FYERS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// REST host.
    #[clap(long, env = "FYERS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl Args {
    /// Retry settings derived from the flags.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retries,
            initial_delay: Duration::from_millis(self.backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    /// Scan settings derived from the flags.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            rounding: self.rounding,
            delay: Duration::from_millis(self.delay_ms),
            workers: self.workers.max(1),
        }
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

//! Per-symbol pipeline: spot → ATM strike → listed contracts → premiums.
//!
//! Every non-fatal error inside a symbol becomes a [`SkipNote`]; only fatal
//! errors (a rejected session, broken worker channels) leave this module as
//! `Err`. The pure steps live in `margin_common`, so this file only sequences
//! calls and decides what to skip.
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{info, warn};
use margin_common::instruments::brokerage_symbol;
use margin_common::quote::{ContractQuote, QuoteResult, SkipNote};
use margin_common::report::Report;
use margin_common::side::{OptionSide, SidePolicy};
use margin_common::strike::{Rounding, atm_with};
use margin_common::{MarginError, MarketData, Result, SymbolConfig};
use rust_decimal::Decimal;

use crate::worker;

/// Reason recorded for symbols not started before Ctrl+C.
pub const INTERRUPTED: &str = "interrupted before fetch";

/// Knobs of a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How spots snap onto the strike grid.
    pub rounding: Rounding,
    /// Pause after each symbol, per worker.
    pub delay: Duration,
    /// Worker threads; 1 keeps the run sequential.
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            rounding: Rounding::Nearest,
            delay: Duration::ZERO,
            workers: 1,
        }
    }
}

/// What happened to one configured symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    /// At least one side was priced; `notes` explain a missing side.
    Quoted {
        /// Fetched quotes.
        quote: QuoteResult,
        /// Side failures.
        notes: Vec<SkipNote>,
    },
    /// Nothing usable was fetched.
    Skipped(SkipNote),
}

/// Runs the pipeline for one symbol.
pub fn process_symbol<M: MarketData + ?Sized>(
    market: &M,
    config: &SymbolConfig,
    rounding: Rounding,
) -> Result<SymbolOutcome> {
    let symbol = config.symbol.as_str();
    let underlying = brokerage_symbol(symbol);

    let spot = match market.last_traded_price(&underlying) {
        Ok(spot) => spot,
        Err(e) => return skip(symbol, e),
    };
    let atm_strike = match atm_with(spot, config.interval_for(spot), rounding) {
        Ok(strike) => strike,
        Err(e) => return skip(symbol, e),
    };
    info!("{}: LTP ₹{:.2} ATM {}", symbol, spot, atm_strike);

    let chain = match market.option_chain(&underlying, config.expiry) {
        Ok(chain) => chain,
        Err(e) => return skip(symbol, e),
    };

    let mut quote = QuoteResult {
        symbol: symbol.to_string(),
        lot_size: config.lot_size,
        spot,
        atm_strike,
        call: None,
        put: None,
    };
    let mut failures = Vec::new();

    for side in OptionSide::ALL {
        let fetched = chain
            .find(atm_strike, side)
            .ok_or_else(|| MarginError::ContractNotListed {
                underlying: symbol.to_string(),
                strike: atm_strike,
                side,
            })
            .and_then(|contract| {
                market
                    .last_traded_price(&contract.symbol)
                    .map(|premium| ContractQuote {
                        contract: contract.symbol.clone(),
                        premium,
                    })
            });

        match fetched {
            Ok(contract_quote) => match side {
                OptionSide::Call => quote.call = Some(contract_quote),
                OptionSide::Put => quote.put = Some(contract_quote),
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{} {}: {}", symbol, side, e);
                failures.push(SkipNote::side(symbol, side, e.to_string()));
            }
        }
    }

    if quote.call.is_none() && quote.put.is_none() {
        let reasons: Vec<String> = failures
            .iter()
            .map(|n| n.reason.clone())
            .collect();
        return Ok(SymbolOutcome::Skipped(SkipNote::symbol(
            symbol,
            format!("no ATM premium available ({})", reasons.join("; ")),
        )));
    }

    Ok(SymbolOutcome::Quoted {
        quote,
        notes: failures,
    })
}

fn skip(symbol: &str, err: MarginError) -> Result<SymbolOutcome> {
    if err.is_fatal() {
        return Err(err);
    }
    warn!("Skipping {}: {}", symbol, err);
    Ok(SymbolOutcome::Skipped(SkipNote::symbol(symbol, err.to_string())))
}

/// Processes every symbol and returns outcomes in configuration order.
///
/// Once `shutdown` is set, symbols that have not started are recorded as
/// interrupted rather than fetched.
pub fn scan<M: MarketData + Sync>(
    market: &M,
    symbols: &[SymbolConfig],
    options: &ScanOptions,
    shutdown: &AtomicBool,
) -> Result<Vec<SymbolOutcome>> {
    info!("Processing {} symbols with {} worker(s)", symbols.len(), options.workers.max(1));
    if options.workers > 1 {
        return worker::scan_parallel(market, symbols, options, shutdown);
    }

    let mut outcomes = Vec::with_capacity(symbols.len());
    for (i, config) in symbols.iter().enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            outcomes.push(SymbolOutcome::Skipped(SkipNote::symbol(&config.symbol, INTERRUPTED)));
            continue;
        }
        info!("Processing {} ({}/{})", config.symbol, i + 1, symbols.len());
        outcomes.push(process_symbol(market, config, options.rounding)?);

        if i + 1 < symbols.len() && !options.delay.is_zero() {
            thread::sleep(options.delay);
        }
    }
    Ok(outcomes)
}

/// Turns outcomes into a report, applying each symbol's side policy.
///
/// `symbols` and `outcomes` are parallel slices in configuration order.
pub fn build_report(
    symbols: &[SymbolConfig],
    outcomes: Vec<SymbolOutcome>,
    policy: SidePolicy,
    threshold: Decimal,
    generated_at: NaiveDateTime,
) -> Report {
    let mut report = Report::new(threshold, generated_at);
    for (config, outcome) in symbols.iter().zip(outcomes) {
        match outcome {
            SymbolOutcome::Quoted { quote, notes } => {
                for row in quote.margin_rows(config.side.unwrap_or(policy)) {
                    report.add_row(row);
                }
                for note in notes {
                    report.add_note(note);
                }
            }
            SymbolOutcome::Skipped(note) => report.add_note(note),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeMarket;
    use chrono::NaiveDate;
    use margin_common::market::ListedExpiry;
    use margin_common::symbols::Expiry;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 21)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn market() -> FakeMarket {
        FakeMarket::new()
            .price("NSE:NIFTYBANK-INDEX", dec!(56407.80))
            .contracts("NSE:NIFTYBANK-INDEX", dec!(56400), dec!(519.00), dec!(498.50))
            .price("NSE:SBIN-EQ", dec!(812.35))
            .contracts("NSE:SBIN-EQ", dec!(810), dec!(14.20), dec!(11.60))
    }

    fn symbols() -> Vec<SymbolConfig> {
        vec![
            SymbolConfig::new("BANKNIFTY", 35, dec!(100)),
            SymbolConfig::new("TCS", 175, dec!(20)),
            SymbolConfig::new("SBIN", 750, dec!(5)),
        ]
    }

    #[test]
    fn quotes_both_sides_of_atm() {
        let outcome = process_symbol(&market(), &symbols()[0], Rounding::Nearest).unwrap();
        let SymbolOutcome::Quoted { quote, notes } = outcome else {
            panic!("expected a quote");
        };
        assert!(notes.is_empty());
        assert_eq!(quote.atm_strike, dec!(56400));
        assert_eq!(quote.call.unwrap().premium, dec!(519.00));
        assert_eq!(quote.put.unwrap().contract, "NSE:NIFTYBANK-INDEX:56400PE");
    }

    #[test]
    fn missing_spot_skips_symbol() {
        let outcome = process_symbol(&market(), &symbols()[1], Rounding::Nearest).unwrap();
        let SymbolOutcome::Skipped(note) = outcome else {
            panic!("expected a skip");
        };
        assert_eq!(note.symbol, "TCS");
        assert_eq!(note.side, None);
        assert!(note.reason.contains("NSE:TCS-EQ"));
    }

    #[test]
    fn unlisted_strike_skips_symbol() {
        let outcome = process_symbol(&market(), &symbols()[0], Rounding::Ceiling).unwrap();
        let SymbolOutcome::Skipped(note) = outcome else {
            panic!("expected a skip");
        };
        assert!(note.reason.contains("No CE contract listed"));
        assert!(note.reason.contains("No PE contract listed"));
    }

    #[test]
    fn one_failed_side_keeps_the_other() {
        let market = FakeMarket::new()
            .price("NSE:INFY-EQ", dec!(1581.2))
            .listed("NSE:INFY-EQ", dec!(1580), OptionSide::Call, None)
            .listed("NSE:INFY-EQ", dec!(1580), OptionSide::Put, Some(dec!(22.4)));
        let config = SymbolConfig::new("INFY", 400, dec!(20));
        let SymbolOutcome::Quoted { quote, notes } =
            process_symbol(&market, &config, Rounding::Nearest).unwrap()
        else {
            panic!("expected a quote");
        };
        assert!(quote.call.is_none());
        assert_eq!(quote.put.unwrap().premium, dec!(22.4));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].side, Some(OptionSide::Call));
    }

    #[test]
    fn rejected_session_aborts() {
        let err = process_symbol(&market().reject_session(), &symbols()[0], Rounding::Nearest).unwrap_err();
        assert!(matches!(err, MarginError::Authentication(_)));
    }

    #[test]
    fn scan_keeps_order_and_continues_after_failure() {
        let shutdown = AtomicBool::new(false);
        let outcomes = scan(&market(), &symbols(), &ScanOptions::default(), &shutdown).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], SymbolOutcome::Quoted { .. }));
        assert!(matches!(outcomes[1], SymbolOutcome::Skipped(_)));
        assert!(matches!(outcomes[2], SymbolOutcome::Quoted { .. }));
    }

    #[test]
    fn interrupted_scan_fetches_nothing() {
        let market = market();
        let shutdown = AtomicBool::new(true);
        let outcomes = scan(&market, &symbols(), &ScanOptions::default(), &shutdown).unwrap();
        assert!(market.calls().is_empty());
        assert!(outcomes.iter().all(|o| matches!(o, SymbolOutcome::Skipped(n) if n.reason == INTERRUPTED)));
    }

    #[test]
    fn dated_expiry_is_passed_through() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        let market = market().expiry(
            "NSE:SBIN-EQ",
            ListedExpiry {
                date,
                token: "1753955400".into(),
            },
        );
        let mut config = SymbolConfig::new("SBIN", 750, dec!(5));
        config.expiry = Expiry::On(date);
        let outcome = process_symbol(&market, &config, Rounding::Nearest).unwrap();
        assert!(matches!(outcome, SymbolOutcome::Quoted { .. }));
        assert!(market.calls().contains(&"chain NSE:SBIN-EQ 2025-07-31".to_string()));
    }

    #[test]
    fn report_filters_and_notes_skips() {
        let shutdown = AtomicBool::new(false);
        let symbols = symbols();
        let outcomes = scan(&market(), &symbols, &ScanOptions::default(), &shutdown).unwrap();
        let report = build_report(&symbols, outcomes, SidePolicy::Both, dec!(20000), at());

        let labels: Vec<(String, String)> = report
            .rows()
            .iter()
            .map(|r| (r.symbol.clone(), r.contract_label()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("BANKNIFTY".to_string(), "56400CE".to_string()),
                ("BANKNIFTY".to_string(), "56400PE".to_string()),
                ("SBIN".to_string(), "810CE".to_string()),
                ("SBIN".to_string(), "810PE".to_string()),
            ]
        );
        assert_eq!(report.skipped(), 1);
        assert!(report.render().contains("Skipped TCS: Quote unavailable for NSE:TCS-EQ"));
    }

    #[test]
    fn per_symbol_side_overrides_global_policy() {
        let shutdown = AtomicBool::new(false);
        let mut symbols = symbols();
        symbols[2].side = Some(SidePolicy::Cheaper);
        let outcomes = scan(&market(), &symbols, &ScanOptions::default(), &shutdown).unwrap();
        let report = build_report(&symbols, outcomes, SidePolicy::Call, dec!(20000), at());

        let labels: Vec<String> = report.rows().iter().map(|r| r.contract_label()).collect();
        assert_eq!(labels, vec!["56400CE", "810PE"]);
    }

    #[test]
    fn rows_at_threshold_are_dropped() {
        let market = FakeMarket::new()
            .price("NSE:ITC-EQ", dec!(421))
            .contracts("NSE:ITC-EQ", dec!(420), dec!(12.5), dec!(12.49));
        let symbols = vec![SymbolConfig::new("ITC", 1600, dec!(5))];
        let shutdown = AtomicBool::new(false);
        let outcomes = scan(&market, &symbols, &ScanOptions::default(), &shutdown).unwrap();
        let report = build_report(&symbols, outcomes, SidePolicy::Both, dec!(20000), at());

        // 12.50 * 1600 = 20000.00, 12.49 * 1600 = 19984.00
        assert_eq!(report.rows().len(), 1);
        assert_eq!(report.rows()[0].side, OptionSide::Put);
    }
}

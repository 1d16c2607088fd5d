//! Fyers margin scanner: finds at-the-money options whose one-lot premium
//! stays under a budget.
//!
//! For every symbol in the configuration file it fetches the spot price,
//! snaps it to the ATM strike, looks the ATM call and put up in the option
//! chain, prices them and keeps the contracts where `premium × lot size` is
//! strictly under the threshold. The result is printed and written to a
//! report file that is replaced on every run.
//!
//! Usage example (CLI):
//! ```bash
//! export FYERS_APP_ID=XXXXXXXX-100
//! export FYERS_ACCESS_TOKEN=eyJ0eXAiOi...
//! fyers_margin --symbols ./fo_mktlots.csv --intervals ./sos_scheme.csv --threshold 20000
//! ```
//!
//! A symbol that cannot be priced is noted in the report and skipped; a
//! rejected session or an unwritable output path stops the run.
#![warn(missing_docs)]
mod args;
mod fyers;
mod model;
mod pipeline;
mod retry;
mod session;
mod worker;
mod writer;

#[cfg(test)]
mod fake;

use crate::args::Args;
use crate::fyers::FyersClient;
use crate::pipeline::{build_report, scan};
use crate::retry::Retrying;
use crate::session::Session;
use crate::writer::ReportWriter;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use log::{info, warn};
use margin_common::instruments::IntervalTable;
use margin_common::report::Report;
use margin_common::symbols::SymbolParser;
use margin_common::{MarginError, MarketData, Result, SymbolConfig};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

fn main() -> Result<(), MarginError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Ctrl+C received. Finishing the current symbol...");
            shutdown.store(true, Ordering::SeqCst);
        }) {
            warn!("Ctrl+C handler not installed: {}", e);
        }
    }

    run(&args, &shutdown)
}

/// Loads configuration, opens the session and runs one scan.
fn run(args: &Args, shutdown: &AtomicBool) -> Result<()> {
    validate(args)?;

    let intervals = match &args.intervals {
        Some(raw) => {
            let table = IntervalTable::parse(open_input(&normalize_path(raw))?)?;
            info!("Loaded {} strike gaps", table.len());
            table
        }
        None => IntervalTable::default(),
    };
    let symbols = SymbolConfig::parse_from_file(open_input(&normalize_path(&args.symbols))?, &intervals)?;
    info!("Loaded {} symbols", symbols.len());

    let writer = ReportWriter::new(normalize_path(&args.output))?;

    let session = Session::new(&args.app_id, &args.access_token)?;
    let client = FyersClient::new(session, &args.base_url, args.timeout(), args.strike_count)?;
    client.validate_session()?;
    info!("Session accepted by {}", args.base_url);

    let market = Retrying::new(client, args.retry_policy());
    execute(&market, &symbols, args, &writer, shutdown, Local::now().naive_local())?;
    Ok(())
}

/// Rejects numeric flags that would make every fetch or row fail.
fn validate(args: &Args) -> Result<()> {
    if args.threshold <= Decimal::ZERO {
        return Err(MarginError::Config(format!(
            "threshold must be positive, got {}",
            args.threshold
        )));
    }
    if args.timeout_secs == 0 {
        return Err(MarginError::Config("timeout must be at least one second".into()));
    }
    Ok(())
}

/// Scans `symbols`, prints the report and writes it to `writer`.
///
/// The file is written even when no row qualifies, so a stale report never
/// survives a run.
fn execute<M: MarketData + Sync>(
    market: &M,
    symbols: &[SymbolConfig],
    args: &Args,
    writer: &ReportWriter,
    shutdown: &AtomicBool,
    generated_at: NaiveDateTime,
) -> Result<Report> {
    let outcomes = scan(market, symbols, &args.scan_options(), shutdown)?;
    let report = build_report(symbols, outcomes, args.side_policy, args.threshold, generated_at);

    let text = report.render();
    print!("{}", text);
    writer.write(&text)?;

    info!(
        "{} contract(s) under ₹{}, {} symbol(s) skipped",
        report.rows().len(),
        args.threshold,
        report.skipped()
    );
    if shutdown.load(Ordering::Relaxed) {
        warn!("Run interrupted; {} holds a partial report", writer.path().display());
    }
    Ok(report)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    if !is_file_exist(path) {
        return Err(MarginError::Config(format!("file not found: {}", path.display())));
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

/// Returns `true` if the provided path exists and is a regular file.
fn is_file_exist(path: &Path) -> bool {
    path.exists() && path.is_file()
}

//! Error types shared between the library and the client binary.
//!
//! The `MarginError` enum unifies setup failures, per-symbol quote failures and
//! report output failures so that every layer can propagate a single error type.
//! Whether an error aborts the run or only skips a symbol is decided by
//! [`MarginError::is_fatal`].
use std::io;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::side::OptionSide;

/// Unified error type shared by the library and the client.
#[derive(Error, Debug)]
pub enum MarginError {
    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while reading a CSV configuration file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid or empty run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while parsing a row of the symbols or intervals file.
    #[error("Parse symbols file error: {0}")]
    ParseSymbolsFile(String),

    /// The brokerage rejected the session.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No usable price was returned for an instrument.
    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable {
        /// Instrument that was queried.
        symbol: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The computed ATM contract does not appear in the option-chain listing.
    #[error("No {side} contract listed for {underlying} at strike {strike}")]
    ContractNotListed {
        /// Underlying symbol.
        underlying: String,
        /// Strike that was looked up.
        strike: Decimal,
        /// Contract side.
        side: OptionSide,
    },

    /// The report could not be written to its destination.
    #[error("Cannot write report to {path}: {reason}")]
    OutputWrite {
        /// Destination path.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// Crossbeam/channel send failed; contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed; contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),
}

impl MarginError {
    /// Shorthand for a [`MarginError::QuoteUnavailable`].
    pub fn quote_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        MarginError::QuoteUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that must abort the whole run.
    ///
    /// Everything else is scoped to a single symbol and becomes a skip note.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MarginError::Authentication(_)
                | MarginError::Config(_)
                | MarginError::OutputWrite { .. }
                | MarginError::ChannelSend(_)
                | MarginError::ChannelRecv(_)
        )
    }
}

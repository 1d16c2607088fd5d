//! Fyers REST payloads.
//!
//! Responses are decoded with `serde_json` into these loosely-shaped structs and
//! immediately converted into typed values by `fyers`. Fields the scanner does
//! not use are left out.
use serde::Deserialize;

/// Status value of a successful envelope or entry.
pub const STATUS_OK: &str = "ok";

/// Fields shared by every response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// `ok` or `error`.
    pub s: String,
    /// API status code; negative on errors.
    #[serde(default)]
    pub code: Option<i64>,
    /// Error description.
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /data/quotes` response.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesResponse {
    /// Status envelope.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// One entry per requested symbol.
    #[serde(default)]
    pub d: Vec<QuoteEntry>,
}

/// Quote of a single symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteEntry {
    /// Symbol the entry belongs to.
    pub n: String,
    /// `ok` or `error` for this symbol.
    pub s: String,
    /// Quote values.
    pub v: QuoteValues,
}

/// Price fields of a quote entry.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteValues {
    /// Last traded price.
    #[serde(default)]
    pub lp: Option<f64>,
    /// Error text when the entry failed.
    #[serde(default)]
    pub errmsg: Option<String>,
}

/// `GET /data/options-chain-v3` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionChainResponse {
    /// Status envelope.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Chain body; absent on errors.
    #[serde(default)]
    pub data: Option<OptionChainData>,
}

/// Body of the option-chain response.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionChainData {
    /// Listed expiries.
    #[serde(rename = "expiryData", default)]
    pub expiry_data: Vec<ExpiryEntry>,
    /// Underlying row followed by CE/PE rows around the ATM strike.
    #[serde(rename = "optionsChain", default)]
    pub options_chain: Vec<ChainEntry>,
}

/// An expiry of the option-chain listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpiryEntry {
    /// Date as `DD-MM-YYYY`.
    pub date: String,
    /// Epoch-seconds token accepted by the `timestamp` query parameter.
    pub expiry: String,
}

/// One row of the option chain.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainEntry {
    /// Contract symbol (or the underlying for the first row).
    pub symbol: String,
    /// `CE`, `PE` or empty for the underlying.
    #[serde(default)]
    pub option_type: String,
    /// Strike; `-1` for the underlying.
    #[serde(default)]
    pub strike_price: f64,
}

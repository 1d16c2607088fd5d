//! Fyers REST market-data client.
//!
//! Three endpoints are used: `data/quotes` for last traded prices,
//! `data/options-chain-v3` for the contract listing and `api/v3/profile` to
//! validate the session once before any quote is requested. Every request
//! carries the per-call timeout configured on the HTTP client.
//!
//! Decoding is split from transport: `decode_*` take the HTTP status and the
//! raw body and either return typed values or a `MarginError`, so the
//! boundary checks are testable without a network.
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, info};
use margin_common::market::{ListedContract, ListedExpiry, OptionChain, resolve_expiry};
use margin_common::side::OptionSide;
use margin_common::symbols::Expiry;
use margin_common::{MarginError, MarketData, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::model::response::{
    Envelope, OptionChainResponse, QuotesResponse, STATUS_OK,
};
use crate::session::Session;

/// Production REST host.
pub const DEFAULT_BASE_URL: &str = "https://api-t1.fyers.in";

const QUOTES_PATH: &str = "/data/quotes";
const OPTION_CHAIN_PATH: &str = "/data/options-chain-v3";
const PROFILE_PATH: &str = "/api/v3/profile";

/// API codes meaning the token is invalid or expired.
const AUTH_ERROR_CODES: [i64; 4] = [-8, -15, -16, -17];

/// Blocking client bound to one authenticated session.
#[derive(Debug)]
pub struct FyersClient {
    http: Client,
    session: Session,
    base_url: String,
    strike_count: u32,
}

impl FyersClient {
    /// Builds the HTTP client with `timeout` applied to every call.
    ///
    /// `strike_count` is the number of strikes requested on each side of the
    /// ATM strike when listing the option chain.
    pub fn new(session: Session, base_url: &str, timeout: Duration, strike_count: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarginError::Http(e.to_string()))?;
        Ok(FyersClient {
            http,
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
            strike_count,
        })
    }

    /// Checks the session against the profile endpoint.
    ///
    /// Any failure here is reported as `Authentication`, since no quote can
    /// be trusted without a working session.
    pub fn validate_session(&self) -> Result<()> {
        let (status, body) = self
            .get(PROFILE_PATH, &[])
            .map_err(|e| MarginError::Authentication(format!("cannot reach profile endpoint: {}", e)))?;
        decode_profile(status, &body)?;
        info!("Session validated against {}", self.base_url);
        Ok(())
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, self.session.authorization())
            .send()
            .map_err(|e| MarginError::Http(e.to_string()))?;
        let status = response.status();
        let body = response.text().map_err(|e| MarginError::Http(e.to_string()))?;
        Ok((status, body))
    }

    fn fetch_chain(&self, underlying: &str, token: Option<&str>) -> Result<OptionChain> {
        let mut query = vec![
            ("symbol", underlying.to_string()),
            ("strikecount", self.strike_count.to_string()),
        ];
        if let Some(token) = token {
            query.push(("timestamp", token.to_string()));
        }
        let (status, body) = self.get(OPTION_CHAIN_PATH, &query)?;
        decode_option_chain(underlying, status, &body)
    }
}

impl MarketData for FyersClient {
    fn last_traded_price(&self, symbol: &str) -> Result<Decimal> {
        let (status, body) = self.get(QUOTES_PATH, &[("symbols", symbol.to_string())])?;
        decode_quote(symbol, status, &body)
    }

    fn option_chain(&self, underlying: &str, expiry: Expiry) -> Result<OptionChain> {
        let nearest = self.fetch_chain(underlying, None)?;
        if expiry == Expiry::Nearest {
            return Ok(nearest);
        }
        let listed = resolve_expiry(underlying, &nearest.expiries, expiry)?;
        let chain = self.fetch_chain(underlying, Some(&listed.token))?;
        Ok(OptionChain {
            expiries: nearest.expiries,
            contracts: chain.contracts,
        })
    }
}

/// Maps HTTP and envelope failures onto the error kinds of the scanner.
fn check_envelope(symbol: &str, status: StatusCode, envelope: Option<&Envelope>) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(MarginError::Authentication(format!("HTTP {}", status)));
    }
    match envelope {
        Some(env) if env.s == STATUS_OK => Ok(()),
        Some(env) => {
            let message = env.message.clone().unwrap_or_else(|| "unknown error".into());
            match env.code {
                Some(code) if AUTH_ERROR_CODES.contains(&code) => {
                    Err(MarginError::Authentication(format!("{} (code {})", message, code)))
                }
                Some(code) => Err(MarginError::quote_unavailable(symbol, format!("{} (code {})", message, code))),
                None => Err(MarginError::quote_unavailable(symbol, message)),
            }
        }
        None => Err(MarginError::quote_unavailable(symbol, format!("HTTP {}", status))),
    }
}

/// Last traded price from a quotes response. Zero or missing prices are errors.
pub fn decode_quote(symbol: &str, status: StatusCode, body: &str) -> Result<Decimal> {
    let response = serde_json::from_str::<QuotesResponse>(body);
    check_envelope(symbol, status, response.as_ref().ok().map(|r| &r.envelope))?;
    let response = response?;

    let entry = response
        .d
        .into_iter()
        .find(|e| e.n == symbol)
        .ok_or_else(|| MarginError::quote_unavailable(symbol, "no data returned"))?;
    if entry.s != STATUS_OK {
        let reason = entry.v.errmsg.unwrap_or_else(|| "symbol rejected".into());
        return Err(MarginError::quote_unavailable(symbol, reason));
    }

    let lp = entry
        .v
        .lp
        .ok_or_else(|| MarginError::quote_unavailable(symbol, "last traded price missing"))?;
    let price = Decimal::from_f64(lp)
        .ok_or_else(|| MarginError::quote_unavailable(symbol, format!("invalid price {}", lp)))?;
    if price <= Decimal::ZERO {
        return Err(MarginError::quote_unavailable(symbol, format!("non-positive price {}", price)));
    }
    Ok(price)
}

/// Expiries and CE/PE contracts from an option-chain response.
pub fn decode_option_chain(underlying: &str, status: StatusCode, body: &str) -> Result<OptionChain> {
    let response = serde_json::from_str::<OptionChainResponse>(body);
    check_envelope(underlying, status, response.as_ref().ok().map(|r| &r.envelope))?;
    let data = response?
        .data
        .ok_or_else(|| MarginError::quote_unavailable(underlying, "option chain missing"))?;

    let mut expiries = Vec::with_capacity(data.expiry_data.len());
    for entry in data.expiry_data {
        let date = NaiveDate::parse_from_str(&entry.date, "%d-%m-%Y").map_err(|_| {
            MarginError::quote_unavailable(underlying, format!("unparseable expiry date '{}'", entry.date))
        })?;
        expiries.push(ListedExpiry {
            date,
            token: entry.expiry,
        });
    }

    let contracts = data
        .options_chain
        .into_iter()
        .filter_map(|entry| {
            let side = entry.option_type.parse::<OptionSide>().ok()?;
            let strike = Decimal::from_f64(entry.strike_price)?;
            Some(ListedContract {
                symbol: entry.symbol,
                strike: strike.normalize(),
                side,
            })
        })
        .collect();

    Ok(OptionChain { expiries, contracts })
}

/// Accepts any successful profile response.
pub fn decode_profile(status: StatusCode, body: &str) -> Result<()> {
    let envelope = serde_json::from_str::<Envelope>(body).ok();
    check_envelope("profile", status, envelope.as_ref()).map_err(|e| match e {
        MarginError::QuoteUnavailable { reason, .. } => MarginError::Authentication(reason),
        other => other,
    })
}

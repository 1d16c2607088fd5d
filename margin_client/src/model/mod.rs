//! Data model types exchanged with the brokerage.
//!
//! - `response` — JSON payloads of the quotes, option-chain and profile endpoints.
pub mod response;

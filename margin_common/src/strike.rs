//! At-the-money strike calculation.
//!
//! Pure arithmetic on `Decimal`, no I/O. The default [`Rounding::Nearest`]
//! snaps the spot to the closest multiple of the strike interval, resolving an
//! exact midpoint upwards. [`Rounding::Ceiling`] always moves up to the next
//! multiple.
use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use strum_macros::{Display, EnumString};

use crate::error::MarginError;
use crate::result::Result;

/// How a spot price is snapped onto the strike grid.
#[derive(
    Debug, Clone, Copy, Default, ValueEnum, Display, EnumString, Eq, PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Rounding {
    /// Nearest multiple, half up.
    #[default]
    Nearest,
    /// Smallest multiple not below the spot.
    Ceiling,
}

/// Nearest strike to `spot` on a grid of `interval`, ties rounded up.
pub fn atm(spot: Decimal, interval: Decimal) -> Result<Decimal> {
    atm_with(spot, interval, Rounding::Nearest)
}

/// ATM strike using an explicit rounding mode.
///
/// Fails with [`MarginError::Config`] when `interval` is not positive.
pub fn atm_with(spot: Decimal, interval: Decimal, rounding: Rounding) -> Result<Decimal> {
    if interval <= Decimal::ZERO {
        return Err(MarginError::Config(format!(
            "strike interval must be positive, got {}",
            interval
        )));
    }
    let steps = spot / interval;
    let steps = match rounding {
        // spot is non-negative, so away-from-zero is half up
        Rounding::Nearest => steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        Rounding::Ceiling => steps.ceil(),
    };
    Ok((steps * interval).normalize())
}

//! Option sides and the policy that decides which side(s) a report row shows.
use clap::ValueEnum;
use rust_decimal::Decimal;
use strum_macros::{Display, EnumString};

/// Call (`CE`) or put (`PE`) contract.
#[derive(Debug, Clone, Copy, Display, EnumString, Hash, Eq, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum OptionSide {
    /// Call option.
    #[strum(to_string = "CE", serialize = "call")]
    Call,
    /// Put option.
    #[strum(to_string = "PE", serialize = "put")]
    Put,
}

impl OptionSide {
    /// Both sides in report order.
    pub const ALL: [OptionSide; 2] = [OptionSide::Call, OptionSide::Put];
}

/// Which side(s) of the ATM pair end up in the report.
#[derive(
    Debug, Clone, Copy, Default, ValueEnum, Display, EnumString, Eq, PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum SidePolicy {
    /// One row per side that was fetched successfully.
    #[default]
    Both,
    /// Only the side with the lower premium.
    Cheaper,
    /// Only the call.
    Call,
    /// Only the put.
    Put,
}

impl SidePolicy {
    /// Picks the sides to report given the premiums that were actually fetched.
    ///
    /// Sides without a premium are never selected. `Call` and `Put` do not fall
    /// back to the other side.
    pub fn select(self, call: Option<Decimal>, put: Option<Decimal>) -> Vec<OptionSide> {
        match self {
            SidePolicy::Both => OptionSide::ALL
                .into_iter()
                .filter(|side| match side {
                    OptionSide::Call => call.is_some(),
                    OptionSide::Put => put.is_some(),
                })
                .collect(),
            SidePolicy::Cheaper => match (call, put) {
                (Some(c), Some(p)) if p < c => vec![OptionSide::Put],
                (Some(_), _) => vec![OptionSide::Call],
                (None, Some(_)) => vec![OptionSide::Put],
                (None, None) => Vec::new(),
            },
            SidePolicy::Call => call.map(|_| vec![OptionSide::Call]).unwrap_or_default(),
            SidePolicy::Put => put.map(|_| vec![OptionSide::Put]).unwrap_or_default(),
        }
    }
}

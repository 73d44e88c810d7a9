use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// One displayed financial quantity on the board.
///
/// The set is fixed at compile time; identity is the [`Instrument::id`] string.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum Instrument {
    #[serde(rename = "btc")]
    #[display("btc")]
    Btc,
    #[serde(rename = "eth")]
    #[display("eth")]
    Eth,
    #[serde(rename = "gold")]
    #[display("gold")]
    Gold,
    #[serde(rename = "oil")]
    #[display("oil")]
    Oil,
    #[serde(rename = "usd-cbr")]
    #[display("usd-cbr")]
    UsdCbr,
    #[serde(rename = "usd-mb")]
    #[display("usd-mb")]
    UsdMb,
}

impl Instrument {
    /// Every [`Instrument`] in board display order.
    pub const ALL: [Instrument; 6] = [
        Instrument::Btc,
        Instrument::Eth,
        Instrument::Gold,
        Instrument::Oil,
        Instrument::UsdCbr,
        Instrument::UsdMb,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Instrument::Btc => "btc",
            Instrument::Eth => "eth",
            Instrument::Gold => "gold",
            Instrument::Oil => "oil",
            Instrument::UsdCbr => "usd-cbr",
            Instrument::UsdMb => "usd-mb",
        }
    }

    /// Short label rendered next to the value.
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Btc => "BTC",
            Instrument::Eth => "ETH",
            Instrument::Gold => "GOLD",
            Instrument::Oil => "OIL WTI",
            Instrument::UsdCbr => "USD CBR",
            Instrument::UsdMb => "USD MB",
        }
    }

    /// The [`FeedKind`] that supplies this instrument.
    pub fn feed(&self) -> FeedKind {
        match self {
            Instrument::Btc | Instrument::Eth => FeedKind::Crypto,
            Instrument::Gold => FeedKind::Gold,
            Instrument::Oil => FeedKind::Oil,
            Instrument::UsdCbr | Instrument::UsdMb => FeedKind::Fx,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown instrument id: {0}")]
pub struct UnknownInstrument(pub String);

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.id() == input)
            .ok_or_else(|| UnknownInstrument(input.to_string()))
    }
}

/// Logical external data source queried once per refresh cycle.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    #[display("crypto")]
    Crypto,
    #[display("gold")]
    Gold,
    #[display("oil")]
    Oil,
    #[display("fx")]
    Fx,
}

impl FeedKind {
    /// Every [`FeedKind`] in the order refresh outcomes are settled.
    pub const ALL: [FeedKind; 4] = [FeedKind::Crypto, FeedKind::Gold, FeedKind::Oil, FeedKind::Fx];

    /// Instruments supplied by this feed. They succeed or fall back together.
    pub fn instruments(&self) -> &'static [Instrument] {
        match self {
            FeedKind::Crypto => &[Instrument::Btc, Instrument::Eth],
            FeedKind::Gold => &[Instrument::Gold],
            FeedKind::Oil => &[Instrument::Oil],
            FeedKind::Fx => &[Instrument::UsdCbr, Instrument::UsdMb],
        }
    }
}

use crate::instrument::Instrument;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Normalised observation of one [`Instrument`] for one refresh cycle.
///
/// `display` is the exact string handed to renderers. Downstream trend comparison re-parses
/// it with [`parse_display`], so its format is part of the contract.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct NormalizedValue {
    pub instrument: Instrument,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub display: String,
    pub observed_at: DateTime<Utc>,
}

impl NormalizedValue {
    /// Crypto instruments: thousands-grouped integer, eg/ "67,523".
    pub fn grouped(instrument: Instrument, value: Decimal, observed_at: DateTime<Utc>) -> Self {
        let value = round_integer(value);
        Self {
            instrument,
            value,
            display: format_grouped_integer(value),
            observed_at,
        }
    }

    /// Every other instrument: fixed two decimal places, eg/ "91.80".
    pub fn fixed(instrument: Instrument, value: Decimal, observed_at: DateTime<Utc>) -> Self {
        let value = round_2dp(value);
        Self {
            instrument,
            value,
            display: format_fixed_2(value),
            observed_at,
        }
    }

    /// Build a value from a configured fallback string, kept verbatim for display.
    ///
    /// Returns `None` if the fallback does not parse as a decimal.
    pub fn fallback(
        instrument: Instrument,
        display: &str,
        observed_at: DateTime<Utc>,
    ) -> Option<Self> {
        parse_display(display).map(|value| Self {
            instrument,
            value,
            display: display.to_string(),
            observed_at,
        })
    }
}

/// Round half away from zero to two decimal places.
pub fn round_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round half away from zero to an integer.
pub fn round_integer(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Format as a fixed two decimal place string, eg/ `80` -> "80.00".
pub fn format_fixed_2(value: Decimal) -> String {
    format!("{:.2}", round_2dp(value))
}

/// Format as an en-US thousands-grouped integer, eg/ `67523.6` -> "67,524".
pub fn format_grouped_integer(value: Decimal) -> String {
    let rounded = round_integer(value);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Parse a display string back into a [`Decimal`], stripping thousands separators.
pub fn parse_display(display: &str) -> Option<Decimal> {
    let stripped: String = display.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(stripped.trim()).ok()
}

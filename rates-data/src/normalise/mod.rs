use crate::{error::MalformedResponse, instrument::FeedKind, value::NormalizedValue};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde_json::Value;

/// CoinGecko simple price normaliser (btc, eth).
pub mod crypto;

/// gold-api.com XAU normaliser.
pub mod gold;

/// Alpha Vantage WTI series normaliser.
pub mod oil;

/// Central Bank of Russia daily rates normaliser (usd-cbr, derived usd-mb).
pub mod fx;

/// Inputs shared by every normaliser besides the raw body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NormaliseContext {
    /// Markup added to the CBR USD rate to derive usd-mb.
    pub fx_markup: Decimal,
    /// Observation timestamp attached to every produced value.
    pub observed_at: DateTime<Utc>,
}

/// Normalise the raw JSON `body` of `feed` into one value per supplied instrument.
///
/// Pure: the same body and context always yield identical values.
pub fn normalise(
    feed: FeedKind,
    body: &Value,
    context: &NormaliseContext,
) -> Result<Vec<NormalizedValue>, MalformedResponse> {
    match feed {
        FeedKind::Crypto => crypto::normalise(body, context.observed_at),
        FeedKind::Gold => gold::normalise(body, context.observed_at),
        FeedKind::Oil => oil::normalise(body, context.observed_at),
        FeedKind::Fx => fx::normalise(body, context.fx_markup, context.observed_at),
    }
}

/// Convert a JSON float into a [`Decimal`] using its shortest round-trip representation.
pub(crate) fn decimal_from_f64(
    field: &'static str,
    value: f64,
) -> Result<Decimal, MalformedResponse> {
    Decimal::from_f64(value).ok_or_else(|| {
        MalformedResponse::Schema(format!("{field} value {value} is not representable"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{instrument::Instrument, test_utils::json};
    use rust_decimal_macros::dec;

    fn context() -> NormaliseContext {
        NormaliseContext {
            fx_markup: dec!(0.25),
            observed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_normalise_dispatches_to_feed_instruments() {
        struct TestCase {
            feed: FeedKind,
            body: &'static str,
            expected: Vec<(Instrument, &'static str)>,
        }

        let tests = vec![
            TestCase {
                // TC0: crypto supplies btc and eth
                feed: FeedKind::Crypto,
                body: r#"{"bitcoin":{"usd":67523.4},"ethereum":{"usd":3450.6}}"#,
                expected: vec![(Instrument::Btc, "67,523"), (Instrument::Eth, "3,451")],
            },
            TestCase {
                // TC1: gold supplies gold
                feed: FeedKind::Gold,
                body: r#"{"name":"Gold","price":2345.678,"symbol":"XAU"}"#,
                expected: vec![(Instrument::Gold, "2345.68")],
            },
            TestCase {
                // TC2: oil supplies oil
                feed: FeedKind::Oil,
                body: r#"{"data":[{"date":"2024-02-01","value":"82.5"}]}"#,
                expected: vec![(Instrument::Oil, "82.50")],
            },
            TestCase {
                // TC3: fx supplies usd-cbr and derives usd-mb
                feed: FeedKind::Fx,
                body: r#"{"Valute":{"USD":{"Value":91.8}}}"#,
                expected: vec![(Instrument::UsdCbr, "91.80"), (Instrument::UsdMb, "92.05")],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = normalise(test.feed, &json(test.body), &context())
                .unwrap()
                .into_iter()
                .map(|value| (value.instrument, value.display))
                .collect::<Vec<_>>();
            let expected = test
                .expected
                .into_iter()
                .map(|(instrument, display)| (instrument, display.to_string()))
                .collect::<Vec<_>>();
            assert_eq!(actual, expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_normalised_value_matches_display() {
        let bodies = [
            (FeedKind::Crypto, r#"{"bitcoin":{"usd":67523.12},"ethereum":{"usd":3450.5}}"#),
            (FeedKind::Gold, r#"{"price":2345.678}"#),
            (FeedKind::Oil, r#"{"data":[{"date":"2024-02-01","value":"78.456"}]}"#),
            (FeedKind::Fx, r#"{"Valute":{"USD":{"Value":91.8765}}}"#),
        ];

        for (feed, body) in bodies {
            for value in normalise(feed, &json(body), &context()).unwrap() {
                assert_eq!(
                    Some(value.value),
                    crate::value::parse_display(&value.display),
                    "{} value differs from its display {}",
                    value.instrument,
                    value.display
                );
            }
        }
    }

    #[test]
    fn test_normalise_is_idempotent() {
        let bodies = [
            (FeedKind::Crypto, r#"{"bitcoin":{"usd":67523.4},"ethereum":{"usd":3450.6}}"#),
            (FeedKind::Gold, r#"{"price":2345.678}"#),
            (
                FeedKind::Oil,
                r#"{"data":[{"date":"2024-01-01","value":"80.00"},{"date":"2024-02-01","value":"82.50"}]}"#,
            ),
            (FeedKind::Fx, r#"{"Valute":{"USD":{"Value":91.8}}}"#),
        ];

        for (feed, body) in bodies {
            let body = json(body);
            let first = normalise(feed, &body, &context()).unwrap();
            let second = normalise(feed, &body, &context()).unwrap();
            assert_eq!(first, second, "{feed} normalisation not idempotent");
        }
    }
}

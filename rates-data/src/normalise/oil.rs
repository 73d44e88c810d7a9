//! WTI crude oil normalisation.
//!
//! The Alpha Vantage series is the most fragile input on the board, so every validation step
//! fails with its own [`MalformedResponse`] variant:
//! 1. the `data` list exists ([`MalformedResponse::OilSeriesMissing`])
//! 2. the list is non-empty ([`MalformedResponse::OilSeriesEmpty`])
//! 3. every entry has a parseable date, sorted descending ([`MalformedResponse::OilDateInvalid`])
//! 4. the most recent entry has a string value ([`MalformedResponse::OilValueMissing`])
//! 5. that value parses as a decimal ([`MalformedResponse::OilValueNotNumeric`])

use crate::{error::MalformedResponse, instrument::Instrument, value::NormalizedValue};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Select the most recent observation of `{"data":[{"date":..,"value":..}]}`, regardless of
/// list order.
///
/// #### Raw Payload Examples
/// See docs: <https://www.alphavantage.co/documentation/#wti>
/// ```json
/// {"name":"Crude Oil Prices WTI","interval":"weekly","unit":"dollars per barrel",
///  "data":[{"date":"2024-02-01","value":"82.50"},{"date":"2024-01-01","value":"80.00"}]}
/// ```
pub fn normalise(
    body: &Value,
    observed_at: DateTime<Utc>,
) -> Result<Vec<NormalizedValue>, MalformedResponse> {
    let series = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or(MalformedResponse::OilSeriesMissing)?;

    if series.is_empty() {
        return Err(MalformedResponse::OilSeriesEmpty);
    }

    let mut dated = series
        .iter()
        .map(|entry| Ok((observation_date(entry)?, entry)))
        .collect::<Result<Vec<_>, MalformedResponse>>()?;

    // Stable sort, so the first listed of several same-dated entries wins
    dated.sort_by(|(a, _), (b, _)| b.cmp(a));

    let (_, latest) = dated[0];
    let raw = latest
        .get("value")
        .and_then(Value::as_str)
        .ok_or(MalformedResponse::OilValueMissing)?;

    let price = Decimal::from_str(raw.trim())
        .map_err(|_| MalformedResponse::OilValueNotNumeric(raw.to_string()))?;

    Ok(vec![NormalizedValue::fixed(Instrument::Oil, price, observed_at)])
}

/// Parse the observation date as `YYYY-MM-DD`, also accepting a full RFC 3339 timestamp.
fn observation_date(entry: &Value) -> Result<DateTime<Utc>, MalformedResponse> {
    let raw = match entry.get("date") {
        Some(Value::String(raw)) => raw.as_str(),
        Some(other) => return Err(MalformedResponse::OilDateInvalid(other.to_string())),
        None => return Err(MalformedResponse::OilDateInvalid(String::new())),
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| MalformedResponse::OilDateInvalid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::json;
    use rust_decimal_macros::dec;

    #[test]
    fn test_oil_most_recent_date_wins_regardless_of_order() {
        let ascending = json(
            r#"{"data":[{"date":"2024-01-01","value":"80.00"},{"date":"2024-02-01","value":"82.50"}]}"#,
        );
        let descending = json(
            r#"{"data":[{"date":"2024-02-01","value":"82.50"},{"date":"2024-01-01","value":"80.00"}]}"#,
        );

        for body in [ascending, descending] {
            let values = normalise(&body, Utc::now()).unwrap();
            assert_eq!(values.len(), 1);
            assert_eq!(values[0].instrument, Instrument::Oil);
            assert_eq!(values[0].display, "82.50");
            assert_eq!(values[0].value, dec!(82.50));
        }
    }

    #[test]
    fn test_oil_every_validation_step_fails_distinctly() {
        struct TestCase {
            input: &'static str,
            expected: MalformedResponse,
        }

        let tests = vec![
            TestCase {
                // TC0: no data field at all (eg/ API rate limit note)
                input: r#"{"Information":"Thank you for using Alpha Vantage!"}"#,
                expected: MalformedResponse::OilSeriesMissing,
            },
            TestCase {
                // TC1: data is not a list
                input: r#"{"data":{"date":"2024-01-01","value":"80.00"}}"#,
                expected: MalformedResponse::OilSeriesMissing,
            },
            TestCase {
                // TC2: empty list is not mistaken for a missing list
                input: r#"{"data":[]}"#,
                expected: MalformedResponse::OilSeriesEmpty,
            },
            TestCase {
                // TC3: unparseable date
                input: r#"{"data":[{"date":"yesterday","value":"80.00"}]}"#,
                expected: MalformedResponse::OilDateInvalid("yesterday".to_string()),
            },
            TestCase {
                // TC4: latest value missing
                input: r#"{"data":[{"date":"2024-02-01"},{"date":"2024-01-01","value":"80.00"}]}"#,
                expected: MalformedResponse::OilValueMissing,
            },
            TestCase {
                // TC5: latest value is a number rather than a string
                input: r#"{"data":[{"date":"2024-02-01","value":82.5}]}"#,
                expected: MalformedResponse::OilValueMissing,
            },
            TestCase {
                // TC6: Alpha Vantage placeholder for a missing observation
                input: r#"{"data":[{"date":"2024-02-01","value":"."},{"date":"2024-01-01","value":"80.00"}]}"#,
                expected: MalformedResponse::OilValueNotNumeric(".".to_string()),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = normalise(&json(test.input), Utc::now()).unwrap_err();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_oil_value_rounded_to_2dp() {
        let values = normalise(
            &json(r#"{"data":[{"date":"2024-03-04T00:00:00Z","value":"78.456"}]}"#),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(values[0].display, "78.46");
    }
}

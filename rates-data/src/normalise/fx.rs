use super::decimal_from_f64;
use crate::{error::MalformedResponse, instrument::Instrument, value::NormalizedValue};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// [CBR daily rates](https://www.cbr-xml-daily.ru/daily_json.js) response subset.
///
/// #### Raw Payload Examples
/// ```json
/// {"Date":"2024-05-01T11:30:00+03:00","Valute":{"USD":{"CharCode":"USD","Nominal":1,"Value":91.8}}}
/// ```
#[derive(Debug, Deserialize)]
struct CbrDaily {
    #[serde(rename = "Valute")]
    valute: CbrValute,
}

#[derive(Debug, Deserialize)]
struct CbrValute {
    #[serde(rename = "USD")]
    usd: CbrRate,
}

#[derive(Debug, Deserialize)]
struct CbrRate {
    #[serde(rename = "Value")]
    value: f64,
}

/// usd-cbr is the official rate, usd-mb is the same rate plus `markup`. Both are rounded to
/// 2 decimal places and fail together.
pub fn normalise(
    body: &Value,
    markup: Decimal,
    observed_at: DateTime<Utc>,
) -> Result<Vec<NormalizedValue>, MalformedResponse> {
    let CbrDaily { valute } = CbrDaily::deserialize(body)?;
    let official = decimal_from_f64("Valute.USD.Value", valute.usd.value)?;

    Ok(vec![
        NormalizedValue::fixed(Instrument::UsdCbr, official, observed_at),
        NormalizedValue::fixed(Instrument::UsdMb, official + markup, observed_at),
    ])
}

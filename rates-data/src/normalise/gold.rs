use super::decimal_from_f64;
use crate::{error::MalformedResponse, instrument::Instrument, value::NormalizedValue};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// [gold-api.com](https://gold-api.com) XAU price response.
///
/// #### Raw Payload Examples
/// ```json
/// {"name":"Gold","price":2345.67,"symbol":"XAU","updatedAt":"2024-05-01T10:00:00Z"}
/// ```
#[derive(Debug, Deserialize)]
struct GoldPrice {
    #[serde(default)]
    price: Option<f64>,
}

/// Gold price rounded to 2 decimal places. A zero price is treated like an absent one.
pub fn normalise(
    body: &Value,
    observed_at: DateTime<Utc>,
) -> Result<Vec<NormalizedValue>, MalformedResponse> {
    let GoldPrice { price } = GoldPrice::deserialize(body)?;
    let price = price.ok_or(MalformedResponse::MissingField("price"))?;
    let price = decimal_from_f64("price", price)?;

    if price <= Decimal::ZERO {
        return Err(MalformedResponse::NotPositive("price"));
    }

    Ok(vec![NormalizedValue::fixed(Instrument::Gold, price, observed_at)])
}

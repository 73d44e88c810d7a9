use super::decimal_from_f64;
use crate::{error::MalformedResponse, instrument::Instrument, value::NormalizedValue};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// [CoinGecko simple price](https://docs.coingecko.com/reference/simple-price) response.
///
/// #### Raw Payload Examples
/// ```json
/// {"bitcoin":{"usd":67523.12},"ethereum":{"usd":3450.61}}
/// ```
#[derive(Debug, Deserialize)]
struct CoinGeckoSimplePrice {
    bitcoin: UsdQuote,
    ethereum: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

/// Both coins are required: a missing or malformed field fails btc and eth together.
pub fn normalise(
    body: &Value,
    observed_at: DateTime<Utc>,
) -> Result<Vec<NormalizedValue>, MalformedResponse> {
    let CoinGeckoSimplePrice { bitcoin, ethereum } = CoinGeckoSimplePrice::deserialize(body)?;

    Ok(vec![
        NormalizedValue::grouped(
            Instrument::Btc,
            decimal_from_f64("bitcoin.usd", bitcoin.usd)?,
            observed_at,
        ),
        NormalizedValue::grouped(
            Instrument::Eth,
            decimal_from_f64("ethereum.usd", ethereum.usd)?,
            observed_at,
        ),
    ])
}

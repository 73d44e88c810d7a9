use crate::{
    client::{DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY, RetryPolicy},
    error::ConfigError,
    instrument::{FeedKind, Instrument},
    presentation::PresentationMode,
    value::parse_display,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr, time::Duration};
use tracing::warn;

/// Default time between refresh cycles (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(300_000);

/// Default [`ChartBuffer`](crate::presentation::chart::ChartBuffer) capacity.
pub const DEFAULT_CHART_CAPACITY: usize = 20;

/// Default time between simulated chart ticks.
pub const DEFAULT_CHART_TICK: Duration = Duration::from_millis(30_000);

/// Default spacing of the points used to seed each chart at startup.
pub const DEFAULT_CHART_SEED_SPACING: Duration = Duration::from_millis(60_000);

/// Alpha Vantage key used when `ALPHAVANTAGE_API_KEY` is not set.
///
/// The demo key does not serve the WTI series, so oil stays on its fallback value.
pub const ALPHA_VANTAGE_DEMO_KEY: &str = "demo";

/// Upper bound of every configured interval (7 days).
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upper bound of the [`ChartBuffer`](crate::presentation::chart::ChartBuffer) capacity.
pub const MAX_CHART_CAPACITY: usize = 10_000;

/// Feed URL per [`FeedKind`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedUrls {
    pub crypto: String,
    pub gold: String,
    pub oil: String,
    pub fx: String,
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            crypto: "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin,ethereum&vs_currencies=usd"
                .to_string(),
            gold: "https://api.gold-api.com/price/XAU".to_string(),
            oil: alpha_vantage_wti_url(ALPHA_VANTAGE_DEMO_KEY),
            fx: "https://www.cbr-xml-daily.ru/daily_json.js".to_string(),
        }
    }
}

impl FeedUrls {
    pub fn url(&self, feed: FeedKind) -> &str {
        match feed {
            FeedKind::Crypto => &self.crypto,
            FeedKind::Gold => &self.gold,
            FeedKind::Oil => &self.oil,
            FeedKind::Fx => &self.fx,
        }
    }
}

/// Weekly WTI series URL for the provided Alpha Vantage `api_key`.
pub fn alpha_vantage_wti_url(api_key: &str) -> String {
    format!("https://www.alphavantage.co/query?function=WTI&interval=weekly&apikey={api_key}")
}

/// Static, load-time configuration of the board.
///
/// Intervals are expressed in milliseconds so a JSON config file stays flat, eg/
/// ```json
/// {"refresh_interval_ms":60000,"mode":"trend","fx_markup":"0.30","fallbacks":{"btc":"70,000"}}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardConfig {
    pub refresh_interval_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub chart_capacity: usize,
    pub chart_tick_ms: u64,
    pub chart_seed_spacing_ms: u64,
    pub mode: PresentationMode,
    #[serde(with = "rust_decimal::serde::str")]
    pub fx_markup: Decimal,
    pub fallbacks: BTreeMap<Instrument, String>,
    pub urls: FeedUrls,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            retry_attempts: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            chart_capacity: DEFAULT_CHART_CAPACITY,
            chart_tick_ms: DEFAULT_CHART_TICK.as_millis() as u64,
            chart_seed_spacing_ms: DEFAULT_CHART_SEED_SPACING.as_millis() as u64,
            mode: PresentationMode::Chart,
            fx_markup: Decimal::new(25, 2),
            fallbacks: default_fallbacks(),
            urls: FeedUrls::default(),
        }
    }
}

fn default_fallbacks() -> BTreeMap<Instrument, String> {
    [
        (Instrument::Btc, "67,500"),
        (Instrument::Eth, "3,450"),
        (Instrument::Gold, "2,340.00"),
        (Instrument::Oil, "87.50"),
        (Instrument::UsdCbr, "92.10"),
        (Instrument::UsdMb, "92.35"),
    ]
    .into_iter()
    .map(|(instrument, display)| (instrument, display.to_string()))
    .collect()
}

impl BoardConfig {
    /// Load from the process environment, see [`BoardConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve environment variables.
    ///
    /// Starts from the JSON file named by `RATES_CONFIG` (or [`BoardConfig::default`]), applies
    /// any `RATES_*` overrides and finally [`BoardConfig::validate`]s the result.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("RATES_CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(api_key) = lookup("ALPHAVANTAGE_API_KEY")
            && config.uses_alpha_vantage_demo_key()
        {
            config.urls.oil = alpha_vantage_wti_url(&api_key);
        }

        if let Some(value) = parse_env(&lookup, "RATES_REFRESH_MS")? {
            config.refresh_interval_ms = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_RETRY_ATTEMPTS")? {
            config.retry_attempts = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_RETRY_DELAY_MS")? {
            config.retry_delay_ms = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_CHART_CAPACITY")? {
            config.chart_capacity = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_CHART_TICK_MS")? {
            config.chart_tick_ms = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_MODE")? {
            config.mode = value;
        }
        if let Some(value) = parse_env(&lookup, "RATES_FX_MARKUP")? {
            config.fx_markup = value;
        }

        for (key, url) in [
            ("RATES_URL_CRYPTO", &mut config.urls.crypto),
            ("RATES_URL_GOLD", &mut config.urls.gold),
            ("RATES_URL_OIL", &mut config.urls.oil),
            ("RATES_URL_FX", &mut config.urls.fx),
        ] {
            if let Some(value) = lookup(key) {
                *url = value;
            }
        }

        config.validate()?;

        if config.uses_alpha_vantage_demo_key() {
            warn!("ALPHAVANTAGE_API_KEY not set, oil will show its fallback value");
        }

        Ok(config)
    }

    /// Parse a JSON config file. Fallbacks it omits keep their default values.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|error| file_error(error.to_string()))?;
        let mut config =
            serde_json::from_str::<Self>(&raw).map_err(|error| file_error(error.to_string()))?;

        for (instrument, display) in default_fallbacks() {
            config.fallbacks.entry(instrument).or_insert(display);
        }

        Ok(config)
    }

    /// Check every interval is non-zero and every [`Instrument`] has a numeric fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Zero("refresh interval"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Zero("request timeout"));
        }
        if self.chart_capacity == 0 {
            return Err(ConfigError::Zero("chart capacity"));
        }
        if self.chart_tick_ms == 0 {
            return Err(ConfigError::Zero("chart tick interval"));
        }

        let max_interval_ms = MAX_INTERVAL.as_millis() as u64;
        for (field, value_ms) in [
            ("refresh interval", self.refresh_interval_ms),
            ("request timeout", self.request_timeout_ms),
            ("retry delay", self.retry_delay_ms),
            ("chart tick interval", self.chart_tick_ms),
            ("chart seed spacing", self.chart_seed_spacing_ms),
        ] {
            if value_ms > max_interval_ms {
                return Err(ConfigError::TooLarge {
                    field,
                    max: max_interval_ms,
                });
            }
        }
        if self.chart_capacity > MAX_CHART_CAPACITY {
            return Err(ConfigError::TooLarge {
                field: "chart capacity",
                max: MAX_CHART_CAPACITY as u64,
            });
        }

        for instrument in Instrument::ALL {
            let display = self.fallbacks.get(&instrument).map(String::as_str);
            if display.and_then(parse_display).is_none() {
                return Err(ConfigError::InvalidFallback {
                    instrument: instrument.to_string(),
                    value: display.unwrap_or_default().to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn chart_tick(&self) -> Duration {
        Duration::from_millis(self.chart_tick_ms)
    }

    pub fn chart_seed_spacing(&self) -> Duration {
        Duration::from_millis(self.chart_seed_spacing_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// True while the oil feed still points at the Alpha Vantage demo key.
    pub fn uses_alpha_vantage_demo_key(&self) -> bool {
        self.urls.oil == alpha_vantage_wti_url(ALPHA_VANTAGE_DEMO_KEY)
    }

    /// Configured fallback display string for `instrument`.
    pub fn fallback(&self, instrument: Instrument) -> Option<&str> {
        self.fallbacks.get(&instrument).map(String::as_str)
    }

    /// Set the presentation mode.
    pub fn with_mode(mut self, mode: PresentationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the feed URLs.
    pub fn with_urls(mut self, urls: FeedUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Set the fixed-delay retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_attempts = policy.max_retries;
        self.retry_delay_ms = policy.delay.as_millis() as u64;
        self
    }

    /// Set the chart ring buffer capacity.
    pub fn with_chart_capacity(mut self, capacity: usize) -> Self {
        self.chart_capacity = capacity;
        self
    }
}

fn parse_env<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| ConfigError::InvalidEnv {
                    key,
                    value: value.clone(),
                    reason: error.to_string(),
                })
        })
        .transpose()
}

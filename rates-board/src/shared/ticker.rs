//! News / advert ticker line under the rates

use rand::Rng;
use std::{fmt, time::Duration};

/// Time between ticker rotations
pub const DEFAULT_TICKER_INTERVAL: Duration = Duration::from_millis(8000);

pub const DEFAULT_ADVERT: &str = "Simple Exchange: trusted crypto exchange with offices in \
    Moscow and Nizhny Novgorod, working worldwide. Buy and sell USDT, pay invoices from foreign \
    counterparties. Fast and secure crypto deals.";

pub fn default_news() -> Vec<String> {
    [
        "Bitcoin breaks above $70,000",
        "Ethereum prepares for the Dencun upgrade",
        "Crypto market stabilises after volatility",
        "Simple Exchange opens a new office in Dubai",
        "Institutions increase their BTC positions",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TickerItem {
    News(String),
    Advert(String),
}

impl fmt::Display for TickerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerItem::News(text) => write!(f, "NEWS: {text}"),
            TickerItem::Advert(text) => write!(f, "AD: {text}"),
        }
    }
}

/// Each rotation shows the advert with probability ½, otherwise the current news item.
///
/// The news index advances on every rotation, including advert rotations.
#[derive(Debug)]
pub struct TickerRotation<R> {
    news: Vec<String>,
    advert: String,
    news_index: usize,
    current: Option<TickerItem>,
    rng: R,
}

impl<R> TickerRotation<R>
where
    R: Rng,
{
    pub fn new(news: Vec<String>, advert: impl Into<String>, rng: R) -> Self {
        Self {
            news,
            advert: advert.into(),
            news_index: 0,
            current: None,
            rng,
        }
    }

    pub fn rotate(&mut self) -> &TickerItem {
        let item = match self.news.get(self.news_index) {
            Some(news) if !self.rng.random_bool(0.5) => TickerItem::News(news.clone()),
            _ => TickerItem::Advert(self.advert.clone()),
        };

        if !self.news.is_empty() {
            self.news_index = (self.news_index + 1) % self.news.len();
        }

        self.current.insert(item)
    }

    pub fn current(&self) -> Option<&TickerItem> {
        self.current.as_ref()
    }

    pub fn news_index(&self) -> usize {
        self.news_index
    }
}

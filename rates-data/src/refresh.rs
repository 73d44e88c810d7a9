use crate::{
    client::{FeedClient, RetryPolicy, fetch_with_retry},
    config::BoardConfig,
    error::DataError,
    instrument::{FeedKind, Instrument},
    normalise::{NormaliseContext, normalise},
    presentation::{PresentationBook, PresentationMode},
    sink::PresentationSink,
    value::NormalizedValue,
};
use chrono::{DateTime, Utc};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Observable phase of the most recent refresh cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Settled,
}

/// How the instruments of one feed were published in a cycle.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Live,
    /// Fallback values published, with the cause.
    Fallback(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct FeedReport {
    pub feed: FeedKind,
    pub status: FeedStatus,
}

/// Outcome of one refresh cycle. A cycle always settles, so this is not a `Result`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
}

impl CycleReport {
    pub fn status(&self, feed: FeedKind) -> Option<&FeedStatus> {
        self.feeds
            .iter()
            .find(|report| report.feed == feed)
            .map(|report| &report.status)
    }

    pub fn fallback_count(&self) -> usize {
        self.feeds
            .iter()
            .filter(|report| matches!(report.status, FeedStatus::Fallback(_)))
            .count()
    }
}

/// Runs refresh cycles: fetch every feed concurrently, normalise, substitute fallbacks and
/// publish into the owned [`PresentationBook`].
#[derive(Debug)]
pub struct RefreshOrchestrator<C, S> {
    config: BoardConfig,
    client: C,
    sink: S,
    book: PresentationBook,
    phase: CyclePhase,
}

impl<C, S> RefreshOrchestrator<C, S>
where
    C: FeedClient,
    S: PresentationSink,
{
    pub fn new(config: BoardConfig, client: C, sink: S) -> Self {
        let book = PresentationBook::new(config.mode, config.chart_capacity);
        Self::with_book(config, client, sink, book)
    }

    pub fn with_book(config: BoardConfig, client: C, sink: S, book: PresentationBook) -> Self {
        Self {
            config,
            client,
            sink,
            book,
            phase: CyclePhase::Idle,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn book(&self) -> &PresentationBook {
        &self.book
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Seed every chart from the configured fallbacks. No-op outside chart mode.
    pub fn seed_charts(&mut self) {
        if self.book.mode() != PresentationMode::Chart {
            return;
        }

        self.book.seed_charts(
            &self.config.fallbacks,
            Utc::now(),
            self.config.chart_seed_spacing(),
            &mut self.sink,
        );
    }

    /// Append one simulated point to every chart. No-op outside chart mode.
    pub fn simulate_chart_tick(&mut self) {
        if self.book.mode() != PresentationMode::Chart {
            return;
        }

        self.book.simulate_tick(Utc::now(), &mut self.sink);
    }

    /// Run one refresh cycle.
    ///
    /// All feeds are in flight concurrently on the current task. Outcomes are settled in
    /// [`FeedKind::ALL`] order once every feed has completed, so completion order never
    /// affects the resulting presentation state. Every [`Instrument`] is published exactly
    /// once, with its configured fallback if its feed failed.
    pub async fn refresh(&mut self) -> CycleReport {
        let started_at = Utc::now();
        self.phase = CyclePhase::Fetching;
        debug!("refresh cycle fetching");

        let policy = self.config.retry_policy();
        let (client, config) = (&self.client, &self.config);
        let (crypto, gold, oil, fx) = tokio::join!(
            fetch_feed(client, config, &policy, FeedKind::Crypto),
            fetch_feed(client, config, &policy, FeedKind::Gold),
            fetch_feed(client, config, &policy, FeedKind::Oil),
            fetch_feed(client, config, &policy, FeedKind::Fx),
        );

        let feeds = self.settle([
            (FeedKind::Crypto, crypto),
            (FeedKind::Gold, gold),
            (FeedKind::Oil, oil),
            (FeedKind::Fx, fx),
        ]);

        self.phase = CyclePhase::Settled;
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            feeds,
        };

        info!(
            fallbacks = report.fallback_count(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "refresh cycle settled"
        );

        report
    }

    /// Publish feed outcomes in the order given, substituting fallbacks for failed feeds and
    /// for any [`Instrument`] no outcome supplied.
    fn settle(
        &mut self,
        outcomes: [(FeedKind, Result<Vec<NormalizedValue>, DataError>); 4],
    ) -> Vec<FeedReport> {
        let mut published = FnvHashSet::default();
        let mut feeds = Vec::with_capacity(outcomes.len());

        for (feed, outcome) in outcomes {
            let status = match outcome {
                Ok(values) => {
                    for value in &values {
                        if published.insert(value.instrument) {
                            self.book.apply(value, &mut self.sink);
                        }
                    }
                    FeedStatus::Live
                }
                Err(error) => {
                    warn!(%feed, %error, "feed failed, publishing fallback values");
                    self.publish_fallbacks(feed.instruments(), &mut published);
                    FeedStatus::Fallback(error.to_string())
                }
            };
            feeds.push(FeedReport { feed, status });
        }

        let unpublished = Instrument::ALL
            .into_iter()
            .filter(|instrument| !published.contains(instrument))
            .collect::<Vec<_>>();
        if !unpublished.is_empty() {
            warn!(
                ?unpublished,
                "instruments missing after settling, publishing fallback values"
            );
            self.publish_fallbacks(&unpublished, &mut published);
        }

        feeds
    }

    fn publish_fallbacks(
        &mut self,
        instruments: &[Instrument],
        published: &mut FnvHashSet<Instrument>,
    ) {
        let now = Utc::now();

        for &instrument in instruments {
            if !published.insert(instrument) {
                continue;
            }

            let fallback = self
                .config
                .fallback(instrument)
                .and_then(|display| NormalizedValue::fallback(instrument, display, now));

            match fallback {
                Some(value) => self.book.apply(&value, &mut self.sink),
                None => error!(%instrument, "no numeric fallback configured"),
            }
        }
    }
}

/// Fetch and normalise a single feed.
async fn fetch_feed<C>(
    client: &C,
    config: &BoardConfig,
    policy: &RetryPolicy,
    feed: FeedKind,
) -> Result<Vec<NormalizedValue>, DataError>
where
    C: FeedClient,
{
    let body = fetch_with_retry(client, config.urls.url(feed), policy).await?;

    let context = NormaliseContext {
        fx_markup: config.fx_markup,
        observed_at: Utc::now(),
    };

    normalise(feed, &body, &context).map_err(|source| DataError::malformed(feed, source))
}

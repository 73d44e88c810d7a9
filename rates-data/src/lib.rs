//! # Rates-Data
//! Polling pipeline behind a kiosk rates board. Four public feeds (crypto, gold, oil and
//! USD/RUB) are fetched concurrently, each response is validated and normalised into
//! [`NormalizedValue`]s, failures are replaced by configured fallback values, and the result
//! is pushed into per-[`Instrument`] presentation state (trend arrows or a rolling chart).
//!
//! ## Overview
//! * [`client`]: one HTTP GET per attempt, with a fixed-delay [`RetryPolicy`].
//! * [`normalise`]: pure `RawBody -> Result<Vec<NormalizedValue>, MalformedResponse>`
//!   functions, one per [`FeedKind`].
//! * [`refresh`]: the [`RefreshOrchestrator`] that runs a refresh cycle and never fails.
//! * [`presentation`]: pluggable trend / chart strategies over a [`PresentationBook`].
//! * [`schedule`]: a cancellable task that serialises refresh cycles and chart ticks.
//!
//! ## Example
//! ```rust,no_run
//! use rates_data::{
//!     client::HttpFeedClient,
//!     config::BoardConfig,
//!     refresh::RefreshOrchestrator,
//!     schedule::{RefreshSchedule, spawn_refresh_loop},
//!     sink::ChannelSink,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BoardConfig::from_env()?;
//!     let client = HttpFeedClient::new(config.request_timeout())?;
//!     let (sink, mut events) = ChannelSink::new();
//!
//!     let schedule = RefreshSchedule::from(&config);
//!     let orchestrator = RefreshOrchestrator::new(config, client, sink);
//!     let handle = spawn_refresh_loop(orchestrator, schedule);
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!
//!     handle.stop().await?;
//!     Ok(())
//! }
//! ```

/// [`Instrument`] and [`FeedKind`] identities.
pub mod instrument;

/// All errors generated in `rates-data`.
pub mod error;

/// [`NormalizedValue`] and the display formatting rules shared by every feed.
pub mod value;

/// [`FeedClient`](client::FeedClient) abstraction, reqwest implementation and retry policy.
pub mod client;

/// Per-feed response validation and normalisation.
pub mod normalise;

/// Load-time [`BoardConfig`](config::BoardConfig).
pub mod config;

/// Per-instrument presentation state and the trend / chart strategies.
pub mod presentation;

/// Push interface towards renderers.
pub mod sink;

/// Refresh cycle orchestration.
pub mod refresh;

/// Cancellable scheduling of refresh cycles.
pub mod schedule;

pub use client::RetryPolicy;
pub use error::{DataError, MalformedResponse};
pub use instrument::{FeedKind, Instrument};
pub use presentation::PresentationBook;
pub use refresh::RefreshOrchestrator;
pub use value::NormalizedValue;

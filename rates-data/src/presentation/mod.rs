use crate::{
    instrument::Instrument,
    sink::PresentationSink,
    value::{NormalizedValue, parse_display},
};
use chart::{ChartBuffer, ChartPoint, ChartStrategy};
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use fnv::FnvHashMap;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::debug;
use trend::{TrendSign, TrendStrategy};

/// Rolling chart buffer and the chart strategy.
pub mod chart;

/// Trend arrow strategy.
pub mod trend;

/// Maximum relative change of one simulated chart tick (±1%).
pub const SIMULATED_TICK_MAX_CHANGE: f64 = 0.01;

/// Per-[`Instrument`] presentation state owned by a [`PresentationBook`].
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    /// Display string of the most recent observation.
    pub previous: Option<String>,
    /// `None` only before the first observation under the trend strategy.
    pub trend: Option<TrendSign>,
    pub chart: ChartBuffer,
}

impl PresentationState {
    pub fn new(chart_capacity: usize) -> Self {
        Self {
            previous: None,
            trend: None,
            chart: ChartBuffer::new(chart_capacity),
        }
    }
}

/// Turns one [`NormalizedValue`] into presentation state and pushes the matching sink events.
///
/// Implementations must record `value.display` as the new [`PresentationState::previous`].
pub trait PresentationStrategy: Send {
    fn apply(
        &mut self,
        state: &mut PresentationState,
        value: &NormalizedValue,
        sink: &mut dyn PresentationSink,
    );
}

/// Selects the [`PresentationStrategy`] at configuration time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    #[display("trend")]
    Trend,
    #[default]
    #[display("chart")]
    Chart,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown presentation mode {0:?}, expected trend or chart")]
pub struct UnknownPresentationMode(pub String);

impl FromStr for PresentationMode {
    type Err = UnknownPresentationMode;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "trend" => Ok(PresentationMode::Trend),
            "chart" => Ok(PresentationMode::Chart),
            _ => Err(UnknownPresentationMode(input.to_string())),
        }
    }
}

/// Presentation state of every [`Instrument`], updated through one [`PresentationStrategy`].
///
/// Every instrument has a [`PresentationState`] from construction onwards.
pub struct PresentationBook {
    mode: PresentationMode,
    states: FnvHashMap<Instrument, PresentationState>,
    strategy: Box<dyn PresentationStrategy>,
    rng: StdRng,
}

impl std::fmt::Debug for PresentationBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationBook")
            .field("mode", &self.mode)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl PresentationBook {
    /// Construct a book for `mode`, seeded from the operating system.
    pub fn new(mode: PresentationMode, chart_capacity: usize) -> Self {
        Self::with_rng(mode, chart_capacity, StdRng::from_os_rng())
    }

    /// Construct a book for `mode` with a deterministic random source.
    pub fn with_seed(mode: PresentationMode, chart_capacity: usize, seed: u64) -> Self {
        Self::with_rng(mode, chart_capacity, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(mode: PresentationMode, chart_capacity: usize, mut rng: StdRng) -> Self {
        let strategy: Box<dyn PresentationStrategy> = match mode {
            PresentationMode::Trend => Box::new(TrendStrategy::new(StdRng::from_rng(&mut rng))),
            PresentationMode::Chart => Box::new(ChartStrategy),
        };

        Self::with_strategy(mode, chart_capacity, strategy, rng)
    }

    /// Construct a book driven by a custom `strategy`.
    pub fn with_strategy(
        mode: PresentationMode,
        chart_capacity: usize,
        strategy: Box<dyn PresentationStrategy>,
        rng: StdRng,
    ) -> Self {
        let states = Instrument::ALL
            .into_iter()
            .map(|instrument| (instrument, PresentationState::new(chart_capacity)))
            .collect();

        Self {
            mode,
            states,
            strategy,
            rng,
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn state(&self, instrument: Instrument) -> Option<&PresentationState> {
        self.states.get(&instrument)
    }

    /// Publish `value`: notify the sink of the new display string, then run the strategy.
    pub fn apply(&mut self, value: &NormalizedValue, sink: &mut dyn PresentationSink) {
        sink.on_instrument_update(value.instrument, &value.display);

        let capacity = self.chart_capacity();
        let state = self
            .states
            .entry(value.instrument)
            .or_insert_with(|| PresentationState::new(capacity));

        self.strategy.apply(state, value, sink);
    }

    /// Fill every chart with `capacity` copies of its fallback value, spaced `spacing` apart
    /// and ending one `spacing` before `now`.
    ///
    /// Fallbacks that do not parse are skipped, leaving that chart empty. Points whose time
    /// would overflow [`DateTime`] are skipped.
    pub fn seed_charts(
        &mut self,
        fallbacks: &BTreeMap<Instrument, String>,
        now: DateTime<Utc>,
        spacing: Duration,
        sink: &mut dyn PresentationSink,
    ) {
        let Ok(spacing) = TimeDelta::from_std(spacing) else {
            debug!(?spacing, "skipping chart seeding, spacing out of range");
            return;
        };

        for instrument in Instrument::ALL {
            let Some(value) = fallbacks
                .get(&instrument)
                .and_then(|display| parse_display(display))
                .and_then(|value| value.to_f64())
            else {
                debug!(%instrument, "skipping chart seed without numeric fallback");
                continue;
            };

            let Some(state) = self.states.get_mut(&instrument) else {
                continue;
            };

            let capacity = state.chart.capacity();
            for index in 0..capacity {
                let Some(time) = i32::try_from(capacity - index)
                    .ok()
                    .and_then(|steps_back| spacing.checked_mul(steps_back))
                    .and_then(|back| now.checked_sub_signed(back))
                else {
                    // Out of the representable time range
                    continue;
                };

                let point = ChartPoint::new(time, value);
                state.chart.push(point);
                sink.on_chart_point(instrument, point);
            }
        }
    }

    /// Append a random walk point `last × (1 + u)`, `u` uniform in ±1%, to every non-empty
    /// chart. Display strings and previous values are left untouched.
    pub fn simulate_tick(&mut self, now: DateTime<Utc>, sink: &mut dyn PresentationSink) {
        for instrument in Instrument::ALL {
            let Some(state) = self.states.get_mut(&instrument) else {
                continue;
            };
            let Some(last) = state.chart.last() else {
                continue;
            };

            let change = self
                .rng
                .random_range(-SIMULATED_TICK_MAX_CHANGE..SIMULATED_TICK_MAX_CHANGE);
            let point = ChartPoint::new(now, last.value * (1.0 + change));

            state.chart.push(point);
            sink.on_chart_point(instrument, point);
        }
    }

    fn chart_capacity(&self) -> usize {
        self.states
            .values()
            .next()
            .map(|state| state.chart.capacity())
            .unwrap_or_default()
    }
}

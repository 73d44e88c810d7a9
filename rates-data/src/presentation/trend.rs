use super::{PresentationState, PresentationStrategy};
use crate::{sink::PresentationSink, value::NormalizedValue, value::parse_display};
use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Direction arrow shown next to a value. There is no "unchanged" sign.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TrendSign {
    #[display("up")]
    Up,
    #[display("down")]
    Down,
}

/// Compares each new display string against the previous one.
///
/// Strictly greater is [`TrendSign::Up`], strictly less is [`TrendSign::Down`]. Ties, a missing
/// previous value or an unparseable string are resolved by a coin flip from `R`.
#[derive(Debug)]
pub struct TrendStrategy<R> {
    rng: R,
}

impl<R> TrendStrategy<R>
where
    R: Rng,
{
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn coin_flip(&mut self) -> TrendSign {
        if self.rng.random_bool(0.5) {
            TrendSign::Up
        } else {
            TrendSign::Down
        }
    }
}

impl<R> PresentationStrategy for TrendStrategy<R>
where
    R: Rng + Send,
{
    fn apply(
        &mut self,
        state: &mut PresentationState,
        value: &NormalizedValue,
        sink: &mut dyn PresentationSink,
    ) {
        let current = parse_display(&value.display);
        let previous = state.previous.as_deref().and_then(parse_display);

        let sign = match current.zip(previous).map(|(current, previous)| current.cmp(&previous)) {
            Some(Ordering::Greater) => TrendSign::Up,
            Some(Ordering::Less) => TrendSign::Down,
            Some(Ordering::Equal) | None => self.coin_flip(),
        };

        state.trend = Some(sign);
        state.previous = Some(value.display.clone());
        sink.on_trend_change(value.instrument, sign);
    }
}

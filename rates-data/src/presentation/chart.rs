use super::{PresentationState, PresentationStrategy};
use crate::{sink::PresentationSink, value::NormalizedValue};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One timestamped chart observation.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Colour of a chart line, derived from its last two points.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendColour {
    Rising,
    Falling,
}

/// Ring buffer storing the `capacity` most recent [`ChartPoint`]s in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBuffer {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl ChartBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity,
        }
    }

    /// Append a point, evicting the oldest once `capacity` is exceeded.
    pub fn push(&mut self, point: ChartPoint) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = &ChartPoint> + DoubleEndedIterator {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Non-decreasing last pair is [`TrendColour::Rising`]. Fewer than two points has no colour.
    pub fn trend_colour(&self) -> Option<TrendColour> {
        let mut recent = self.points.iter().rev();
        let last = recent.next()?;
        let prev = recent.next()?;

        if last.value >= prev.value {
            Some(TrendColour::Rising)
        } else {
            Some(TrendColour::Falling)
        }
    }

    /// (min, max) of the buffered values, used to scale the chart.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |range, point| match range {
            None => Some((point.value, point.value)),
            Some((min, max)) => Some((min.min(point.value), max.max(point.value))),
        })
    }
}

/// Appends every observation to the [`ChartBuffer`] of its instrument.
#[derive(Debug, Copy, Clone, Default)]
pub struct ChartStrategy;

impl PresentationStrategy for ChartStrategy {
    fn apply(
        &mut self,
        state: &mut PresentationState,
        value: &NormalizedValue,
        sink: &mut dyn PresentationSink,
    ) {
        // Chart points are f64, display strings remain the source of truth
        let point = ChartPoint::new(value.observed_at, value.value.to_f64().unwrap_or_default());

        state.chart.push(point);
        state.previous = Some(value.display.clone());
        sink.on_chart_point(value.instrument, point);
    }
}

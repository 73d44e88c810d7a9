use crate::{
    instrument::Instrument,
    presentation::{chart::ChartPoint, trend::TrendSign},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Push-only, fire-and-forget interface towards presentation collaborators.
pub trait PresentationSink {
    /// Called once per instrument per refresh cycle, after any fallback substitution.
    fn on_instrument_update(&mut self, instrument: Instrument, display: &str);

    /// Called for every point appended to a chart.
    fn on_chart_point(&mut self, instrument: Instrument, point: ChartPoint);

    /// Called for every trend sign computed by the trend strategy.
    fn on_trend_change(&mut self, instrument: Instrument, sign: TrendSign);
}

/// Owned form of a [`PresentationSink`] callback.
///
/// #### Serialised Examples
/// ```json
/// {"event":"instrument_update","instrument":"usd-mb","display":"92.05"}
/// {"event":"chart_point","instrument":"btc","point":{"time":"2024-05-01T10:00:00Z","value":67523.12}}
/// {"event":"trend_change","instrument":"gold","sign":"up"}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    InstrumentUpdate {
        instrument: Instrument,
        display: String,
    },
    ChartPoint {
        instrument: Instrument,
        point: ChartPoint,
    },
    TrendChange {
        instrument: Instrument,
        sign: TrendSign,
    },
}

impl BoardEvent {
    pub fn instrument(&self) -> Instrument {
        match self {
            BoardEvent::InstrumentUpdate { instrument, .. }
            | BoardEvent::ChartPoint { instrument, .. }
            | BoardEvent::TrendChange { instrument, .. } => *instrument,
        }
    }
}

impl PresentationSink for Vec<BoardEvent> {
    fn on_instrument_update(&mut self, instrument: Instrument, display: &str) {
        self.push(BoardEvent::InstrumentUpdate {
            instrument,
            display: display.to_string(),
        });
    }

    fn on_chart_point(&mut self, instrument: Instrument, point: ChartPoint) {
        self.push(BoardEvent::ChartPoint { instrument, point });
    }

    fn on_trend_change(&mut self, instrument: Instrument, sign: TrendSign) {
        self.push(BoardEvent::TrendChange { instrument, sign });
    }
}

/// [`PresentationSink`] forwarding [`BoardEvent`]s to a renderer task.
///
/// A dropped receiver is ignored: presentation is fire-and-forget.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BoardEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BoardEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: BoardEvent) {
        let _ = self.tx.send(event);
    }
}

impl PresentationSink for ChannelSink {
    fn on_instrument_update(&mut self, instrument: Instrument, display: &str) {
        self.send(BoardEvent::InstrumentUpdate {
            instrument,
            display: display.to_string(),
        });
    }

    fn on_chart_point(&mut self, instrument: Instrument, point: ChartPoint) {
        self.send(BoardEvent::ChartPoint { instrument, point });
    }

    fn on_trend_change(&mut self, instrument: Instrument, sign: TrendSign) {
        self.send(BoardEvent::TrendChange { instrument, sign });
    }
}

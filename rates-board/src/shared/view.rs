//! Renderer-side mirror of the presentation state, rebuilt from [`BoardEvent`]s

use chrono::{DateTime, Utc};
use rates_data::{
    Instrument,
    config::BoardConfig,
    presentation::{PresentationMode, chart::ChartBuffer, trend::TrendSign},
    sink::BoardEvent,
};
use std::collections::BTreeMap;

/// What one rate tile shows
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub display: String,
    pub trend: Option<TrendSign>,
    pub chart: ChartBuffer,
    /// `None` while still showing the startup fallback
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    mode: PresentationMode,
    tiles: BTreeMap<Instrument, TileView>,
    last_update: Option<DateTime<Utc>>,
}

impl BoardView {
    /// Every tile starts on its configured fallback until the first refresh settles
    pub fn new(config: &BoardConfig) -> Self {
        let tiles = Instrument::ALL
            .into_iter()
            .map(|instrument| {
                let tile = TileView {
                    display: config.fallback(instrument).unwrap_or("--").to_string(),
                    trend: None,
                    chart: ChartBuffer::new(config.chart_capacity),
                    updated_at: None,
                };
                (instrument, tile)
            })
            .collect();

        Self {
            mode: config.mode,
            tiles,
            last_update: None,
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn apply(&mut self, event: BoardEvent, received_at: DateTime<Utc>) {
        let Some(tile) = self.tiles.get_mut(&event.instrument()) else {
            return;
        };

        match event {
            BoardEvent::InstrumentUpdate { display, .. } => {
                tile.display = display;
                tile.updated_at = Some(received_at);
                self.last_update = Some(received_at);
            }
            BoardEvent::ChartPoint { point, .. } => tile.chart.push(point),
            BoardEvent::TrendChange { sign, .. } => tile.trend = Some(sign),
        }
    }

    pub fn tile(&self, instrument: Instrument) -> Option<&TileView> {
        self.tiles.get(&instrument)
    }

    /// Tiles in board display order
    pub fn tiles(&self) -> impl Iterator<Item = (Instrument, &TileView)> {
        Instrument::ALL
            .into_iter()
            .filter_map(|instrument| self.tiles.get(&instrument).map(|tile| (instrument, tile)))
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

//! Ratatui widgets for the kiosk board - clocks on top, rate tiles, ticker at the bottom

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Sparkline},
};
use rates_data::{
    Instrument,
    presentation::{
        PresentationMode,
        chart::{ChartBuffer, TrendColour},
        trend::TrendSign,
    },
};

use super::{
    clock::{KIOSK_CLOCKS, format_clock},
    ticker::TickerItem,
    view::{BoardView, TileView},
};

const C_BUY: Color = Color::Rgb(100, 220, 100);
const C_SELL: Color = Color::Rgb(220, 100, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Tiles per row
const TILE_COLUMNS: usize = 3;

/// Brand colour of each instrument, used for tile borders
fn instrument_colour(instrument: Instrument) -> Color {
    match instrument {
        Instrument::Btc => Color::Rgb(247, 147, 26),
        Instrument::Eth => Color::Rgb(98, 126, 234),
        Instrument::Gold => Color::Rgb(255, 215, 0),
        Instrument::Oil => Color::Rgb(150, 150, 150),
        Instrument::UsdCbr => Color::Rgb(30, 136, 229),
        Instrument::UsdMb => Color::Rgb(67, 160, 71),
    }
}

pub fn trend_arrow(sign: TrendSign) -> (&'static str, Color) {
    match sign {
        TrendSign::Up => ("▲", C_BUY),
        TrendSign::Down => ("▼", C_SELL),
    }
}

pub fn chart_colour(colour: Option<TrendColour>) -> Color {
    match colour {
        Some(TrendColour::Rising) => C_BUY,
        Some(TrendColour::Falling) => C_SELL,
        None => C_DIM,
    }
}

/// Scale chart values into 1..=100 sparkline bars. A flat chart renders as a baseline.
pub fn sparkline_data(chart: &ChartBuffer) -> Vec<u64> {
    let Some((min, max)) = chart.range() else {
        return Vec::new();
    };
    let range = if max - min > 0.0 { max - min } else { 1.0 };

    chart
        .points()
        .map(|point| 1 + ((point.value - min) / range * 99.0).round() as u64)
        .collect()
}

/// Render the whole board
pub fn render_board(
    f: &mut Frame,
    view: &BoardView,
    now: DateTime<Utc>,
    ticker: Option<&TickerItem>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8), Constraint::Length(3)])
        .split(f.area());

    render_clocks(f, chunks[0], now);
    render_tiles(f, chunks[1], view);
    render_ticker(f, chunks[2], view, ticker);
}

fn render_clocks(f: &mut Frame, area: Rect, now: DateTime<Utc>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_DIM));

    let mut spans = Vec::with_capacity(KIOSK_CLOCKS.len() * 3);
    for (index, clock) in KIOSK_CLOCKS.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled("   │   ", Style::default().fg(C_DIM)));
        }
        spans.push(Span::styled(format!("{} ", clock.label), Style::default().fg(C_DIM)));
        spans.push(Span::styled(
            format_clock(clock.zone, now),
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_tiles(f: &mut Frame, area: Rect, view: &BoardView) {
    let tiles = view.tiles().collect::<Vec<_>>();
    let rows = tiles.len().div_ceil(TILE_COLUMNS).max(1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    for (row_area, row) in row_areas.iter().zip(tiles.chunks(TILE_COLUMNS)) {
        let column_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, TILE_COLUMNS as u32); TILE_COLUMNS])
            .split(*row_area);

        for (tile_area, (instrument, tile)) in column_areas.iter().zip(row) {
            render_tile(f, *tile_area, *instrument, tile, view.mode());
        }
    }
}

fn render_tile(
    f: &mut Frame,
    area: Rect,
    instrument: Instrument,
    tile: &TileView,
    mode: PresentationMode,
) {
    let block = Block::default()
        .title(format!(" {} ", instrument.label()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(instrument_colour(instrument)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut value = vec![Span::styled(
        tile.display.clone(),
        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
    )];
    if mode == PresentationMode::Trend
        && let Some(sign) = tile.trend
    {
        let (arrow, colour) = trend_arrow(sign);
        value.push(Span::styled(format!(" {arrow}"), Style::default().fg(colour)));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    f.render_widget(
        Paragraph::new(Line::from(value)).alignment(Alignment::Center),
        chunks[0],
    );

    if mode == PresentationMode::Chart {
        let data = sparkline_data(&tile.chart);
        let sparkline = Sparkline::default()
            .data(&data)
            .max(100)
            .style(Style::default().fg(chart_colour(tile.chart.trend_colour())));
        f.render_widget(sparkline, chunks[1]);
    }
}

fn render_ticker(f: &mut Frame, area: Rect, view: &BoardView, ticker: Option<&TickerItem>) {
    let updated = view
        .last_update()
        .map(|time| time.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "waiting for rates".to_string());

    let block = Block::default()
        .title(Line::from(Span::styled(
            format!(" updated {updated} "),
            Style::default().fg(C_DIM),
        )))
        .title_alignment(Alignment::Right)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_ACCENT));

    let text = ticker.map(ToString::to_string).unwrap_or_default();
    f.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(C_BRIGHT))).block(block),
        area,
    );
}

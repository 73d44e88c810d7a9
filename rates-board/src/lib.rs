/// Rates Board - Shared Library
///
/// This library provides common functionality for the two binaries:
/// - rates-board: full-screen terminal kiosk board
/// - rates-log: headless logger printing every board event as a JSON line
///
/// The library includes:
/// - A renderer-side mirror of presentation state built from board events
/// - World clocks and the news / advert ticker shown under the rates
/// - Ratatui widgets for rate tiles, clocks and the ticker
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::clock::{KIOSK_CLOCKS, WorldClock, format_clock};
pub use shared::ticker::{DEFAULT_TICKER_INTERVAL, TickerItem, TickerRotation};
pub use shared::view::{BoardView, TileView};
pub use shared::widget::render_board;

/// Rates Board kiosk
///
/// Full-screen terminal board: world clocks, six rate tiles with trend arrows or rolling
/// charts, and a news / advert ticker. Rates are refreshed in the background by
/// `rates-data`; logs go to `RATES_LOG_FILE` (default: rates-board.log).
use std::{
    error::Error,
    fs::File,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{Terminal, backend::CrosstermBackend};
use rates_board::{
    BoardView, DEFAULT_TICKER_INTERVAL, TickerRotation, render_board,
    shared::{
        clock::CLOCK_INTERVAL,
        ticker::{DEFAULT_ADVERT, default_news},
    },
};
use rates_data::{
    client::HttpFeedClient,
    config::BoardConfig,
    refresh::RefreshOrchestrator,
    schedule::{RefreshSchedule, spawn_refresh_loop},
    sink::ChannelSink,
};
use tokio::sync::Mutex;
use tracing::info;

/// Get log file path from RATES_LOG_FILE env var (default: rates-board.log)
fn get_log_file() -> String {
    std::env::var("RATES_LOG_FILE").unwrap_or_else(|_| "rates-board.log".to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging(File::create(get_log_file())?);

    let config = BoardConfig::from_env()?;
    info!(mode = %config.mode, "starting rates board");

    let view = Arc::new(Mutex::new(BoardView::new(&config)));
    let client = HttpFeedClient::new(config.request_timeout())?;
    let (sink, mut event_rx) = ChannelSink::new();

    let schedule = RefreshSchedule::from(&config);
    let handle = spawn_refresh_loop(RefreshOrchestrator::new(config, client, sink), schedule);

    {
        let view = Arc::clone(&view);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let mut guard = view.lock().await;
                guard.apply(event, Utc::now());
            }
        });
    }

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut ticker = TickerRotation::new(default_news(), DEFAULT_ADVERT, StdRng::from_os_rng());
    ticker.rotate();

    let mut last_draw: Option<Instant> = None;
    let mut last_rotation = Instant::now();

    loop {
        if last_rotation.elapsed() >= DEFAULT_TICKER_INTERVAL {
            ticker.rotate();
            last_rotation = Instant::now();
            last_draw = None;
        }

        if last_draw.is_none_or(|drawn| drawn.elapsed() >= CLOCK_INTERVAL) {
            let snapshot = {
                let guard = view.lock().await;
                guard.clone()
            };
            terminal.draw(|f| render_board(f, &snapshot, Utc::now(), ticker.current()))?;
            last_draw = Some(Instant::now());
        }

        let timeout = last_draw
            .and_then(|drawn| CLOCK_INTERVAL.checked_sub(drawn.elapsed()))
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let orchestrator = handle.stop().await?;
    info!(phase = ?orchestrator.phase(), "rates board stopped");
    Ok(())
}

/// Initialize logging into `file`, the terminal belongs to the board
fn init_logging(file: File) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

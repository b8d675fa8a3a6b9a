//! A masonry feed in the terminal.
//!
//! Run the binary to scroll an endless, seeded demo feed.  Pass
//! `--log-file` (and `RUST_LOG`) to watch the engine's decisions.

mod app;
mod config;
mod ui;

use std::fs::File;
use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use waterfall::core::feed::Feed;
use waterfall::core::observe::{EventSink, FeedEvent};

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    host::TerminalHost,
    source::{DemoConfig, DemoSource},
    state::{AppState, FRAME},
};
use crate::ui::{
    feed_widget::{natural_heights, FeedWidget},
    layout::AppLayout,
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Masonry feed viewer")]
struct Cli {
    /// Seed for the demo data source.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Items per page.
    #[arg(long, default_value_t = 24)]
    page_size: usize,

    /// Simulated page latency in milliseconds.
    #[arg(long, default_value_t = 400)]
    latency_ms: u64,

    /// Pages before the source runs dry.
    #[arg(long, default_value_t = 12)]
    pages: u64,

    /// Probability (0–1) that a page request fails.
    #[arg(long, default_value_t = 0.0)]
    fail_rate: f64,

    /// Write tracing output here (the terminal is busy with the UI).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

fn init_tracing(path: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("waterfall=info"));
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            // Nothing is shown unless RUST_LOG asks for it; stderr is the UI.
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_writer(io::sink)
                .init();
        }
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let user_config = config::AppConfig::load();
    if cli.write_config {
        user_config.save()?;
        return Ok(());
    }

    // ── feed + host wiring ────────────────────────────────────
    let (sink, mut feed_rx) = EventSink::channel();
    let source = DemoSource::new(
        sink.clone(),
        DemoConfig {
            seed: cli.seed,
            page_size: cli.page_size.max(1),
            latency: Duration::from_millis(cli.latency_ms),
            pages: cli.pages,
            fail_rate: cli.fail_rate,
        },
    );
    let feed = Feed::new(user_config.feed.clone(), Box::new(source))?;
    let mut state = AppState::new(feed, TerminalHost::default(), user_config);
    state.feed.attach(&sink, &mut state.host);
    tracing::info!("feed ready (seed {}, {} pages)", cli.seed, cli.pages);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let mut events = spawn_event_reader(FRAME);

    // ── event loop ────────────────────────────────────────────
    loop {
        // Observe the container before the frame so a resize is visible
        // to this frame's layout.
        let size = terminal.size()?;
        let layout = AppLayout::from_area(Rect::new(0, 0, size.width, size.height));
        state.viewport_rows = layout.feed_inner.height;
        state.host.resized(layout.feed_inner);

        let now = Instant::now();
        state.animate(now);
        drain_feed_events(&mut state, &mut feed_rx);
        state.feed.frame(now);

        terminal.draw(|frame| {
            let range = state.feed.visible_range();
            let max = state.feed.max_scroll();
            let percent = if max > 0.0 { state.scroll.target() / max * 100.0 } else { 0.0 };
            let title = format!(
                " waterfall · {} items · {} cols · showing {}–{} · {percent:.0}% ",
                state.feed.item_count(),
                state.feed.column_plan().columns,
                range.start,
                range.end
            );
            let block = Block::default()
                .title(title)
                .title_style(Theme::title_style())
                .borders(Borders::ALL)
                .border_style(Theme::border_style());
            frame.render_widget(
                FeedWidget {
                    feed: &state.feed,
                    block,
                    scroll_top: state.scroll.position(),
                    tick: state.tick,
                },
                layout.feed_area,
            );

            let status = match state.feed.last_error() {
                Some(err) => {
                    Paragraph::new(format!("{err} · r: retry")).style(Theme::error_style())
                }
                None => {
                    let end = if state.feed.has_more() { "" } else { " · end of feed" };
                    Paragraph::new(format!("{}{end}", state.config.status_bar_hint()))
                        .style(Theme::status_bar_style())
                }
            };
            frame.render_widget(status, layout.status_area);
        })?;

        // Report what was just drawn: card heights and sentinel visibility.
        let column_width = state.feed.column_plan().column_width;
        for (index, height) in natural_heights(&state.feed) {
            state.host.measured(index, column_width, height);
        }
        let sentinel_visible = state.feed.sentinel_in_view();
        state.host.sentinel(sentinel_visible);

        let deadline = state
            .feed
            .next_deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(60));

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                let now = Instant::now();
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k, now),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    // Resizes are picked up at the top of the loop; ticks
                    // only wake it for the next animation frame.
                    AppEvent::Resize | AppEvent::Tick => {}
                }
            }

            Some(event) = feed_rx.recv() => {
                state.feed.handle(event, Instant::now());
                drain_feed_events(&mut state, &mut feed_rx);
            }

            _ = tokio::time::sleep_until(deadline) => {
                state.feed.poll(Instant::now());
            }
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    state.feed.teardown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Apply everything the observers and the data source have queued.
fn drain_feed_events(
    state: &mut AppState,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<FeedEvent>,
) {
    let now = Instant::now();
    while let Ok(event) = rx.try_recv() {
        state.feed.handle(event, now);
    }
}

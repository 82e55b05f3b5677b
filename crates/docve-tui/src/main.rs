//! Docve - a terminal client for Docve document shelves.
//!
//! With no subcommand this runs the keyboard-driven TUI; the subcommands in
//! `cli` cover the same operations for scripts.

mod app;
mod cli;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use cli::Cli;
use docve_core::Config;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix; the appender adds the date.
const LOG_FILE_NAME: &str = "docve.log";

/// Initialize the tracing subscriber.
///
/// With a `log_dir` (TUI mode) output goes to a daily file, since the
/// terminal belongs to the UI. Otherwise it goes to stderr.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=docve_core=debug).
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let (writer, guard) = match std::fs::create_dir_all(dir) {
                Ok(()) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
                    dir,
                    LOG_FILE_NAME,
                )),
                Err(_) => tracing_appender::non_blocking(io::sink()),
            };
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let (mut config, load_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.api_url_override = args.api_url.clone();

    let Some(command) = args.command else {
        let log_dir = config.log_dir().ok();
        let _guard = init_tracing(log_dir.as_deref());
        if let Some(e) = load_error {
            warn!(error = %e, "Failed to load config, using defaults");
        }
        return run_tui(config, args.open.as_deref()).await;
    };

    init_tracing(None);
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    cli::run(command, args.json, config).await
}

async fn run_tui(config: Config, open: Option<&str>) -> Result<()> {
    info!("Docve TUI starting");

    // Build the app before touching the terminal so setup errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start();
    if let Some(path) = open {
        app.navigate_path(path);
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Docve TUI shutting down");
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Drain finished background requests and re-check the gate
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

//! newsdeck — a terminal reader for a paginated news feed.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐  AppEvent   ┌──────────┐  draw()  ┌──────────┐
//! │ fetch tasks  │ ──────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio pool) │  (channel)  │ (state)  │          │ (render) │
//! └──────────────┘             └──────────┘          └──────────┘
//!                                   ▲
//!                                   │ handle_key_event()
//!                              ┌──────────┐
//!                              │ input.rs │
//!                              └──────────┘
//! ```
//!
//! * **`api/`** — the `NewsApi` trait, the wire types, and the HTTP
//!   implementation.
//! * **`feed`** — pagination state: accumulated items, the page counter,
//!   and the near-end fetch trigger.
//! * **`images/`** — the bounded thumbnail cache and its background loader.
//! * **`reader`** — the embedded article view and the browser hand-off.
//! * **`events`** — messages from fetch tasks back to the UI thread.
//! * **`app`** — owns all application state; applies events, never blocks.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse args, set up logging,
//!   the runtime, and the terminal, and run the event loop.

mod api;
mod app;
mod error;
mod events;
mod feed;
mod images;
mod input;
mod reader;
mod ui;

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use api::HttpNewsApi;
use app::App;
use images::ImageCache;

/// Terminal reader for a paginated news feed.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Base URL of the news API.
    #[arg(default_value = "https://webapi.autodoc.ru")]
    api_base: String,

    /// File the log is appended to; the screen belongs to the UI.
    #[arg(long, default_value = "newsdeck.log")]
    log_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Route tracing output to a file, filtered by `RUST_LOG` (default `info`).
///
/// Stdout is owned by the TUI, so logs must go elsewhere.  The returned
/// guard flushes the non-blocking writer; hold it for the life of `main`.
fn init_logging(path: &Path) -> WorkerGuard {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path.file_name().unwrap_or_else(|| OsStr::new("newsdeck.log"));

    let (writer, guard) = tracing_appender::non_blocking(rolling::never(directory, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.  This prevents the common TUI bug where a panic leaves the
/// terminal in a broken state.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.  Without this, a panic inside the event loop would leave
/// raw mode enabled and the alternate screen active.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_file);
    install_panic_hook();
    info!(api = %cli.api_base, "starting");

    // -- async runtime and shared HTTP client --------------------------------
    // All network work runs on this pool.  The UI thread never blocks on IO,
    // it only drains the event channel.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let client = reqwest::Client::builder()
        .user_agent(concat!("newsdeck/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()?;

    // -- wire up state -------------------------------------------------------
    // One client (connection pool) is shared by feed pages, thumbnails, and
    // article bodies; the image cache handle is handed to the app the same
    // way so tests can substitute either.
    let api = Arc::new(HttpNewsApi::new(&cli.api_base, client.clone())?);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(api, ImageCache::new(), client, runtime.handle().clone(), tx);
    app.reload();

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain completed fetch events.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Apply fetch completions
        while let Ok(event) = rx.try_recv() {
            app.apply(event);
        }

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

//! Clubfolio dashboard: six-panel terminal view of the club's holdings.
//!
//! Panels:
//! 1. Overview: value per investor and time-weighted returns
//! 2. Returns: every holding, worst to best
//! 3. Portfolio: open holdings of the selected investor
//! 4. Activity: recent sells and buys with price charts
//! 5. Timeline: holding periods
//! 6. Help: keyboard shortcuts
//!
//! Usage: `clubfolio-dash [CONFIG]` (defaults to ./clubfolio.toml if present).

mod app;
mod data_loader;
mod input;
mod persistence;
mod theme;
mod ui;

#[cfg(test)]
mod test_helpers;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use clubfolio_core::config::Config;

use crate::app::AppState;
use crate::data_loader::ArchiveSource;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Redraw at least this often so terminal resizes show up promptly.
const TICK: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        leave_screen(&mut io::stderr());
        previous_hook(info);
    }));

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;
    let state_file = state_path();

    let start = config.analysis.start_date;
    let mut app = AppState::new(Box::new(ArchiveSource::new(config)), start);
    persistence::apply(&mut app, persistence::load(&state_file));
    app.reload();

    let mut tui = enter_screen().context("failed to set up the terminal")?;
    let outcome = event_loop(&mut tui, &mut app);

    if let Err(e) = persistence::save(&state_file, &persistence::extract(&app)) {
        log::warn!("could not save dashboard state: {e:#}");
    }
    leave_screen(tui.backend_mut());
    tui.show_cursor()?;

    outcome
}

fn state_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clubfolio")
        .join("state.json")
}

fn enter_screen() -> Result<Tui> {
    terminal::enable_raw_mode()?;
    let mut out = io::stdout();
    execute!(out, EnterAlternateScreen)?;
    let mut tui = Terminal::new(CrosstermBackend::new(out))?;
    tui.clear()?;
    Ok(tui)
}

/// Best effort: also runs from the panic hook.
fn leave_screen<W: io::Write>(out: &mut W) {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(out, LeaveAlternateScreen);
}

fn event_loop(tui: &mut Tui, app: &mut AppState) -> Result<()> {
    while app.running {
        tui.draw(|frame| ui::draw(frame, app))?;
        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            input::handle_key(app, key);
        }
    }
    Ok(())
}

//! shelf TUI
//!
//! Terminal user interface for browsing and editing the shelf.
//!
//! ## Layout
//!
//! - Top: category tabs with item counts
//! - Left: items of the active category
//! - Right: details of the selected item
//!
//! ## Keys
//!
//! - j/k or ↑/↓: Move selection up/down
//! - h/l, ←/→ or Tab: Switch category
//! - J/K: Move the selected item down/up
//! - s: Toggle sort by rating
//! - a: Add, e: Rename, y: Year, +/-: Rating, d: Delete
//! - ?: Help, q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use shelf_core::{Config, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{App, InputMode, PromptKind};

/// Run the TUI application
pub fn run(config: Config) -> Result<()> {
    // Logging must not write to the terminal we draw on
    init_tui_logging(&config);

    let mut store = Store::open_with_config(config)?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(&store);
    let result = run_app(&mut terminal, &mut app, &mut store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, store: &mut Store) -> Result<()> {
    loop {
        app.check_status_timeout();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Any key dismisses the error modal or the help overlay
        if app.has_error() {
            app.clear_error();
            continue;
        }
        if app.show_help {
            app.show_help = false;
            continue;
        }

        match app.input_mode {
            InputMode::Normal => handle_normal_mode(app, store, key.code, key.modifiers),
            InputMode::Prompt => handle_prompt_mode(app, store, key.code, key.modifiers),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(app: &mut App, store: &mut Store, code: KeyCode, modifiers: KeyModifiers) {
    let result = match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            Ok(())
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            Ok(())
        }

        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            Ok(())
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
            Ok(())
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.move_to_first();
            Ok(())
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.move_to_last();
            Ok(())
        }

        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => app.next_tab(store),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => app.prev_tab(store),

        KeyCode::Char('K') => app.move_current(store, true),
        KeyCode::Char('J') => app.move_current(store, false),

        KeyCode::Char('s') => app.toggle_sort(store),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_rating(store, 1),
        KeyCode::Char('-') => app.adjust_rating(store, -1),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_current(store),

        KeyCode::Char('a') => {
            app.start_prompt(PromptKind::Add);
            Ok(())
        }
        KeyCode::Char('e') => {
            app.start_prompt(PromptKind::Rename);
            Ok(())
        }
        KeyCode::Char('y') => {
            app.start_prompt(PromptKind::Year);
            Ok(())
        }

        KeyCode::Char('?') => {
            app.toggle_help();
            Ok(())
        }

        _ => Ok(()),
    };

    if let Err(e) = result {
        app.set_error(format!("{:#}", e));
    }
}

/// Handle key events while the prompt line is open
fn handle_prompt_mode(app: &mut App, store: &mut Store, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.cancel_prompt(),

        KeyCode::Enter => {
            if let Err(e) = app.submit_prompt(store) {
                app.set_error(format!("{:#}", e));
            }
        }

        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),

        _ => {}
    }
}

/// Initialize logging for TUI mode
///
/// Only initializes if SHELF_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("SHELF_LOG") else {
        return;
    };

    if let Err(e) = config.ensure_data_dir() {
        eprintln!("Warning: {:#}", e);
        return;
    }

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("shelf_core={},shelf_cli={}", log_level, log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}

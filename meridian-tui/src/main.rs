//! Meridian entry point.

use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use meridian_tui::config::TuiConfig;
use meridian_tui::error::TuiError;
use meridian_tui::events::TuiEvent;
use meridian_tui::keys::{map_key, Action};
use meridian_tui::nav::View;
use meridian_tui::state::App;
use meridian_tui::transport::LiveFeed;
use meridian_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    init_logging(&config.log_path);
    info!(
        analysis_id = %config.analysis_id,
        transport = ?config.transport,
        "Starting meridian"
    );

    let mut app = App::new(config);
    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());
    let feed = LiveFeed::spawn(&app.config, event_tx)?;

    let mut ticker = tokio::time::interval(app.config.refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if app.on_tick() {
                    terminal.draw(|f| render_view(f, &app))?;
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    feed.stop();
    app.dispose();
    info!(version = app.store.snapshot().version, "Meridian stopped");
    Ok(())
}

/// Log to the configured file; the terminal belongs to the UI.
fn init_logging(path: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meridian=info"));
    let result = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init(),
    };
    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            let sent = match event::read() {
                Ok(CrosstermEvent::Key(key)) => sender.blocking_send(TuiEvent::Input(key)),
                Ok(CrosstermEvent::Resize(width, height)) => {
                    sender.blocking_send(TuiEvent::Resize { width, height })
                }
                _ => Ok(()),
            };
            if sent.is_err() {
                break;
            }
        }
    });
}

/// Returns true when the app should quit.
fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key) {
                app.mark_dirty();
                return handle_action(app, action);
            }
        }
        TuiEvent::Resize { .. } => app.mark_dirty(),
        TuiEvent::Feed(feed_event) => app.handle_feed(feed_event),
    }
    false
}

fn handle_action(app: &mut App, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::NextView => app.active_view = app.active_view.next(),
        Action::PrevView => app.active_view = app.active_view.previous(),
        Action::SwitchView(index) => {
            if let Some(view) = View::from_index(index) {
                app.active_view = view;
            }
        }
        Action::MoveUp if app.grabbed => app.move_grabbed(0, 1),
        Action::MoveDown if app.grabbed => app.move_grabbed(0, -1),
        Action::MoveLeft if app.grabbed => app.move_grabbed(-1, 0),
        Action::MoveRight if app.grabbed => app.move_grabbed(1, 0),
        Action::MoveUp => app.select_previous(),
        Action::MoveDown => app.select_next(),
        Action::ToggleGrab => {
            app.active_view = View::Graph;
            app.toggle_grab();
        }
        Action::ResetPins => app.reset_pins(),
        Action::PauseUpdates => app.toggle_pause(),
        Action::Cancel => {
            if app.grabbed {
                app.toggle_grab();
            }
        }
        Action::MoveLeft | Action::MoveRight => {}
    }
    false
}

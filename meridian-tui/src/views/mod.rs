//! View rendering dispatch.

pub mod agents;
pub mod citations;
pub mod graph;
pub mod timeline;

use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::state::{App, ConnectionState};
use crate::theme::request_status_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Graph => graph::render(f, app, layout[1]),
        View::Timeline => timeline::render(f, app, layout[1]),
        View::Agents => agents::render(f, app, layout[1]),
        View::Citations => citations::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let aggregates = &snapshot.aggregates;
    let connection_color = match app.connection {
        ConnectionState::Connected | ConnectionState::Polling => app.theme.success,
        ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => app.theme.warning,
        ConnectionState::Finished(_) => app.theme.text_dim,
    };

    let mut spans = vec![
        Span::styled(
            format!("MERIDIAN | {} | ", app.config.analysis_id),
            Style::default().fg(app.theme.primary),
        ),
        Span::styled(app.connection.label(), Style::default().fg(connection_color)),
        Span::raw(" | request: "),
        Span::styled(
            aggregates.request_status.as_str(),
            Style::default()
                .fg(request_status_color(aggregates.request_status, &app.theme))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " | {} agents, {} running, {} done",
                aggregates.total,
                aggregates.running(),
                aggregates.completed()
            ),
            Style::default().fg(app.theme.text_dim),
        ),
    ];
    if app.updates_paused {
        spans.push(Span::styled(
            format!(" | PAUSED ({} queued)", app.event_queue.len()),
            Style::default().fg(app.theme.warning),
        ));
    }

    let tabs: Vec<Span> = View::all()
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let style = if *view == app.active_view {
                Style::default().fg(app.theme.secondary).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text_dim)
            };
            Span::styled(format!(" {}:{} ", i + 1, view.title()), style)
        })
        .collect();

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border))
            .title(Line::from(tabs)),
    );
    f.render_widget(header, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = if app.grabbed {
        "h/j/k/l move node • g release • r reset pins • q quit"
    } else {
        "Tab/1-4 switch view • j/k select • g grab • r reset pins • p pause • q quit"
    };
    let (text, style) = if let Some(note) = app.notifications.last() {
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
            NotificationLevel::Success => app.theme.success,
        };
        (
            format!("{}: {}  [{}]", note.level.label(), note.message, help),
            Style::default().fg(color),
        )
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

/// Timestamp as `HH:MM:SS` when it looks like RFC 3339.
pub(crate) fn short_time(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .and_then(|(_, time)| time.get(..8))
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use crate::transport::FeedEvent;
    use meridian_test_utils::fixtures::reference_run_frames;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(app: &App) -> String {
        let mut terminal = match Terminal::new(TestBackend::new(120, 30)) {
            Ok(terminal) => terminal,
            Err(err) => panic!("test terminal: {}", err),
        };
        if let Err(err) = terminal.draw(|f| render_view(f, app)) {
            panic!("draw failed: {}", err);
        }
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_short_time() {
        assert_eq!(short_time("2024-05-01T10:00:02.000Z"), "10:00:02");
        assert_eq!(short_time("yesterday"), "yesterday");
    }

    #[test]
    fn test_every_view_renders_reference_run() {
        let mut app = App::new(sample_config());
        for frame in reference_run_frames() {
            app.handle_feed(FeedEvent::Frame(frame));
        }
        app.refresh_layout();
        for view in View::all() {
            app.active_view = *view;
            let screen = rendered(&app);
            assert!(screen.contains("MERIDIAN"));
        }
        app.active_view = View::Agents;
        app.select_next();
        assert!(rendered(&app).contains("Research Leader"));
    }

    #[test]
    fn test_empty_graph_renders() {
        let mut app = App::new(sample_config());
        app.refresh_layout();
        assert!(rendered(&app).contains("connecting"));
    }
}

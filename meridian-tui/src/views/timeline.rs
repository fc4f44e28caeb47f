//! Event log, newest first.

use crate::state::App;
use crate::views::short_time;
use meridian_core::EventKind;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let log = app.store.event_log();
    let items: Vec<ListItem> = log
        .iter()
        .rev()
        .map(|entry| {
            let color = match entry.kind {
                EventKind::Error => app.theme.error,
                EventKind::Delegation => app.theme.secondary,
                EventKind::Citation => app.theme.tertiary,
                EventKind::FullSync => app.theme.info,
                EventKind::StatusUpdate | EventKind::GenericProgress => app.theme.text,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", short_time(&entry.timestamp)),
                    Style::default().fg(app.theme.text_dim),
                ),
                Span::styled(format!("{:<16} ", entry.kind.as_str()), Style::default().fg(color)),
                Span::raw(entry.summary.clone()),
            ]))
        })
        .collect();

    let title = format!("Timeline ({}/{})", log.len(), log.capacity());
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

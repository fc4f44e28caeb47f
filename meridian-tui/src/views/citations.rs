//! Citations gathered during the run, newest first.

use crate::state::App;
use crate::views::short_time;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let items: Vec<ListItem> = snapshot
        .citations
        .iter()
        .rev()
        .map(|record| {
            let citation = &record.citation;
            let mut spans = vec![
                Span::styled(
                    format!("{} ", short_time(&record.timestamp)),
                    Style::default().fg(app.theme.text_dim),
                ),
                Span::styled(
                    format!("{:<18} ", record.agent_id.as_deref().unwrap_or("-")),
                    Style::default().fg(app.theme.secondary),
                ),
                Span::styled(citation.source.clone(), Style::default().fg(app.theme.tertiary)),
            ];
            if let Some(title) = &citation.title {
                spans.push(Span::raw(format!(" | {}", title)));
            }
            if let Some(confidence) = citation.confidence {
                spans.push(Span::styled(
                    format!(" ({:.0}%)", confidence * 100.0),
                    Style::default().fg(app.theme.text_dim),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = format!("Citations ({})", snapshot.citations.len());
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

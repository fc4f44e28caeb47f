//! Agent list and detail.

use crate::state::App;
use crate::theme::status_visual;
use crate::widgets::{DetailPanel, ProgressBar};
use meridian_core::AgentNode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let snapshot = app.store.snapshot();
    let items: Vec<ListItem> = snapshot
        .nodes
        .values()
        .map(|node| {
            let style = Style::default().fg(status_visual(node.status, &app.theme).color);
            ListItem::new(Line::from(Span::styled(
                format!("{} ({})", node.display_name, node.status),
                style,
            )))
        })
        .collect();

    let mut state = ListState::default();
    if let Some(selected) = &app.selected {
        state.select(snapshot.nodes.keys().position(|id| id == selected));
    }

    let list = List::new(items)
        .block(Block::default().title("Agents").borders(Borders::ALL))
        .highlight_style(Style::default().fg(app.theme.primary).add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, columns[0], &mut state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[1]);

    let selected = app.selected.as_deref().and_then(|id| snapshot.node(id));
    DetailPanel {
        title: "Details",
        fields: selected.map(detail_fields).unwrap_or_default(),
        label_style: Style::default().fg(app.theme.secondary),
        placeholder: "Select an agent with j/k",
    }
    .render(f, right[0]);

    ProgressBar {
        title: "Completed",
        done: snapshot.aggregates.completed(),
        total: snapshot.aggregates.total,
        style: Style::default().fg(app.theme.success).bg(app.theme.bg_secondary),
    }
    .render(f, right[1]);
}

fn detail_fields(node: &AgentNode) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Name", node.display_name.clone()),
        ("Id", node.id.clone()),
        ("Kind", node.kind.as_str().to_string()),
        ("Status", node.status.to_string()),
    ];
    if let Some(parent) = &node.parent_id {
        fields.push(("Reports To", parent.clone()));
    }
    if let Some(group) = &node.parallel_group {
        fields.push(("Parallel Group", group.clone()));
    }
    if let Some(confidence) = node.metrics.confidence {
        fields.push(("Confidence", format!("{:.0}%", confidence * 100.0)));
    }
    fields.push(("Duration", format!("{:.0}s", node.metrics.duration_secs)));
    fields.push(("Citations", node.metrics.citation_count.to_string()));
    if let Some(message) = &node.last_message {
        fields.push(("Last Message", message.clone()));
    }
    fields
}

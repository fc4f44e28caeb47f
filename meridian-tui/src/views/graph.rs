//! Live graph canvas.

use crate::state::App;
use crate::theme::{edge_status_color, status_visual};
use crate::widgets::{DetailPanel, StatusIndicator};
use meridian_core::AgentStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points},
    widgets::{Block, Borders},
    Frame,
};

const CANVAS_PADDING: f64 = 6.0;
const PULSE_RADIUS: f64 = 1.5;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    render_canvas(f, app, chunks[0]);
    render_sidebar(f, app, chunks[1]);
}

fn render_canvas(f: &mut Frame<'_>, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let layout = &app.layout;
    let theme = &app.theme;
    let (x_bounds, y_bounds) = layout.bounds(CANVAS_PADDING);
    let pulse_on = app.pulse_on();

    let canvas = Canvas::default()
        .block(Block::default().title("Execution Graph").borders(Borders::ALL))
        .background_color(theme.bg)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for edge in snapshot.resolved_edges() {
                if let (Some(from), Some(to)) =
                    (layout.position(&edge.source_id), layout.position(&edge.target_id))
                {
                    ctx.draw(&CanvasLine {
                        x1: from.x,
                        y1: from.y,
                        x2: to.x,
                        y2: to.y,
                        color: edge_status_color(edge.status, theme),
                    });
                }
            }
            ctx.layer();

            for (id, position) in &layout.positions {
                let Some(visual) = layout.visuals.get(id) else {
                    continue;
                };
                ctx.draw(&Points {
                    coords: &[(position.x, position.y)],
                    color: visual.color,
                });
                if visual.animated && pulse_on {
                    ctx.draw(&Circle {
                        x: position.x,
                        y: position.y,
                        radius: PULSE_RADIUS,
                        color: visual.color,
                    });
                }
            }
            ctx.layer();

            for (id, position) in &layout.positions {
                let Some(node) = snapshot.node(id) else {
                    continue;
                };
                let selected = app.selected.as_deref() == Some(id.as_str());
                let label = if selected && app.grabbed {
                    format!("<{}>", node.display_name)
                } else if selected {
                    format!("[{}]", node.display_name)
                } else {
                    node.display_name.clone()
                };
                let mut style = Style::default().fg(status_visual(node.status, theme).color);
                if selected {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                ctx.print(position.x, position.y, Span::styled(label, style));
            }
        });
    f.render_widget(canvas, area);
}

fn render_sidebar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let snapshot = app.store.snapshot();
    let selected = app.selected.as_deref().and_then(|id| snapshot.node(id));
    let status = selected.map(|n| n.status).unwrap_or_default();
    let visual = status_visual(status, &app.theme);
    StatusIndicator {
        title: "Selected",
        label: match selected {
            Some(node) => format!("{} ({})", node.display_name, node.status),
            None => "none".to_string(),
        },
        color: visual.color,
        animated: visual.animated,
        pulse_on: app.pulse_on(),
    }
    .render(f, chunks[0]);

    let aggregates = &snapshot.aggregates;
    let mut fields: Vec<(&str, String)> = AgentStatus::ALL
        .iter()
        .filter(|s| aggregates.count(**s) > 0)
        .map(|s| (s.as_str(), aggregates.count(*s).to_string()))
        .collect();
    fields.push(("edges", snapshot.resolved_edges().count().to_string()));
    if !aggregates.parallel_groups.is_empty() {
        let groups: Vec<&str> = aggregates.parallel_groups.iter().map(String::as_str).collect();
        fields.push(("parallel", groups.join(", ")));
    }
    if !app.pins.is_empty() {
        fields.push(("pinned", app.pins.len().to_string()));
    }

    DetailPanel {
        title: "Run",
        fields,
        label_style: Style::default().fg(app.theme.secondary),
        placeholder: "Waiting for agents...",
    }
    .render(f, chunks[1]);
}

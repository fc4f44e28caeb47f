//! Status indicator with a blinking dot for work in progress.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct StatusIndicator<'a> {
    pub title: &'a str,
    pub label: String,
    pub color: Color,
    pub animated: bool,
    /// Current blink phase; ignored unless `animated`
    pub pulse_on: bool,
}

impl<'a> StatusIndicator<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let dot = if self.animated && !self.pulse_on { "○" } else { "●" };
        let line = Line::from(vec![
            Span::styled(format!("{} ", dot), Style::default().fg(self.color)),
            Span::styled(
                self.label.clone(),
                Style::default().fg(self.color).add_modifier(Modifier::BOLD),
            ),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

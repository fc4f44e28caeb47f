//! Completion gauge for the analysis run.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Gauge},
    Frame,
};

pub struct ProgressBar<'a> {
    pub title: &'a str,
    pub done: usize,
    pub total: usize,
    pub style: Style,
}

impl<'a> ProgressBar<'a> {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.done as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let gauge = Gauge::default()
            .block(Block::default().title(self.title).borders(Borders::ALL))
            .gauge_style(self.style)
            .ratio(self.ratio())
            .label(format!("{}/{}", self.done, self.total));
        f.render_widget(gauge, area);
    }
}

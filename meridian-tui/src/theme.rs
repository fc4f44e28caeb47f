//! SynthBrute theme and the status → visual table.

use meridian_core::{AgentStatus, EdgeStatus, RequestStatus};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct SynthBruteTheme {
    pub bg: Color,
    pub bg_secondary: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub secondary_dim: Color,
    pub tertiary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl SynthBruteTheme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_secondary: Color::Rgb(26, 26, 26),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            secondary_dim: Color::Rgb(136, 0, 136),
            tertiary: Color::Rgb(255, 255, 0),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 255, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            text_muted: Color::Rgb(68, 68, 68),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

impl Default for SynthBruteTheme {
    fn default() -> Self {
        Self::synthbrute()
    }
}

/// How one agent status is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVisual {
    pub color: Color,
    /// Pulsing marker on the graph
    pub animated: bool,
}

/// The whole status → visual table. Nothing else decides how a node looks.
pub fn status_visual(status: AgentStatus, theme: &SynthBruteTheme) -> StatusVisual {
    let (color, animated) = match status {
        AgentStatus::Idle => (theme.text_dim, false),
        AgentStatus::Active => (theme.primary, true),
        AgentStatus::Thinking => (theme.secondary, true),
        AgentStatus::Searching => (theme.tertiary, true),
        AgentStatus::Analyzing => (theme.info, true),
        AgentStatus::Completed => (theme.success, false),
        AgentStatus::Error => (theme.error, false),
    };
    StatusVisual { color, animated }
}

pub fn edge_status_color(status: EdgeStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        EdgeStatus::Pending => theme.text_muted,
        EdgeStatus::Active => theme.primary_dim,
        EdgeStatus::Completed => theme.success,
    }
}

pub fn request_status_color(status: RequestStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        RequestStatus::Active => theme.primary,
        RequestStatus::Completed => theme.success,
        RequestStatus::Error => theme.error,
    }
}

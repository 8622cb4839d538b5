/// Small rendering helpers shared by the dashboard screens
///
/// Tables, paragraphs and gauges come straight from ratatui; this module
/// only holds the color rules and layout math used in several places.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Gauge},
};

use crate::core::{ContainerStatus, LogLevel};

/// Color for a usage percentage: red above 80, yellow above 60
pub fn usage_color(percent: f64) -> Color {
    if percent > 80.0 {
        Color::Red
    } else if percent > 60.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn usage_span(percent: f64) -> Span<'static> {
    Span::styled(
        format!("{:.1}%", percent),
        Style::default().fg(usage_color(percent)).add_modifier(Modifier::BOLD),
    )
}

/// Bordered gauge for a 0-100 percentage (out-of-range values are clamped)
pub fn usage_gauge<'a>(title: &'a str, percent: f64, label: String) -> Gauge<'a> {
    let ratio = if percent.is_finite() { (percent / 100.0).clamp(0.0, 1.0) } else { 0.0 };

    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(usage_color(percent)).bg(Color::Black))
        .ratio(ratio)
        .label(label)
}

pub fn status_color(status: &ContainerStatus) -> Color {
    match status {
        ContainerStatus::Running => Color::Green,
        ContainerStatus::Paused => Color::Yellow,
        ContainerStatus::Exited => Color::Red,
        ContainerStatus::Other(_) => Color::Gray,
    }
}

pub fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warning => Color::Yellow,
        LogLevel::Info => Color::Cyan,
    }
}

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

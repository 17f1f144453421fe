//! Reusable TUI widgets

mod confirm;
mod detail;
mod help;
mod history;

pub use confirm::ConfirmPopup;
pub use detail::DetailPopup;
pub use help::HelpPopup;
pub use history::HistoryPopup;

use ratatui::prelude::*;

use crate::view::BadgeClass;

/// Centered rectangle taking the given percentages of `area`
pub fn centered(area: Rect, width_pct: u16, height_pct: u16) -> Rect {
    let width = (area.width as u32 * width_pct.min(100) as u32 / 100) as u16;
    let height = (area.height as u32 * height_pct.min(100) as u32 / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Colour for a status badge
pub fn badge_style(badge: BadgeClass) -> Style {
    match badge {
        BadgeClass::Success => Style::default().fg(Color::Green),
        BadgeClass::Danger => Style::default().fg(Color::Red).bold(),
        BadgeClass::Warning => Style::default().fg(Color::Yellow),
    }
}

/// Bottom key hint bar, e.g. `[("Enter", "View"), ("q", "Quit")]`
pub fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled(
            format!(" {} ", key),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    Line::from(spans)
}

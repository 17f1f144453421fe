//! Call detail modal

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::{badge_style, centered, key_hints};
use crate::view::{DetailField, DetailView};

/// Scrollable modal over the calls table
pub struct DetailPopup {
    view: DetailView,
    scroll: u16,
}

impl DetailPopup {
    pub fn new(view: DetailView) -> Self {
        Self { view, scroll: 0 }
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered(area, 70, 80);
        frame.render_widget(Clear, popup_area);

        let mut lines = vec![section("Basic Information")];
        lines.extend(self.view.basic.iter().map(|f| self.field_line(f)));
        lines.push(Line::from(""));
        lines.push(section("Additional Details"));
        lines.extend(self.view.additional.iter().map(|f| self.field_line(f)));

        if let Some(summary) = &self.view.summary {
            lines.push(Line::from(""));
            lines.push(section("Summary"));
            lines.extend(summary.lines().map(|l| Line::from(l.to_string())));
        }

        if let Some(transcript) = &self.view.transcript {
            lines.push(Line::from(""));
            lines.push(section("Transcript"));
            lines.extend(transcript.lines().map(|l| Line::from(l.to_string())));
        }

        if !self.view.timeline.is_empty() {
            lines.push(Line::from(""));
            lines.push(section("Timeline"));
            for event in &self.view.timeline {
                lines.push(Line::from(Span::styled(
                    format!("  {}", event.value),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(key_hints(&[("↑/↓", "Scroll"), ("Esc", "Close")]));

        let popup = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .title(format!(" Call {} ", self.view.call_id))
                    .borders(Borders::ALL)
                    .border_style(badge_style(self.view.badge))
                    .style(Style::default().bg(Color::Black)),
            );
        frame.render_widget(popup, popup_area);
    }

    fn field_line(&self, field: &DetailField) -> Line<'static> {
        let value_style = if field.label == "Status" {
            badge_style(self.view.badge)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::styled(
                format!("  {:<12}", field.label),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(field.value.clone(), value_style),
        ])
    }
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Cyan).bold(),
    ))
}

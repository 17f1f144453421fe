//! Retry confirmation popup

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::centered;

/// Asks the operator before a retry is sent
pub struct ConfirmPopup {
    call_id: String,
    customer: String,
}

impl ConfirmPopup {
    pub fn new(call_id: impl Into<String>, customer: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            customer: customer.into(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered(area, 50, 30);
        frame.render_widget(Clear, popup_area);

        let customer = if self.customer.trim().is_empty() {
            "this customer"
        } else {
            self.customer.as_str()
        };

        let text = vec![
            Line::from(Span::styled(
                "Retry failed call?",
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw("Call "),
                Span::styled(&self.call_id, Style::default().fg(Color::White).bold()),
                Span::raw(format!(" will be dialled again for {}.", customer)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled(" y ", Style::default().fg(Color::Black).bg(Color::Green)),
                Span::raw(" Retry   "),
                Span::styled(" n ", Style::default().fg(Color::Black).bg(Color::Red)),
                Span::raw(" Cancel"),
            ]),
        ];

        let popup = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(" Confirm ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .style(Style::default().bg(Color::Black)),
            );
        frame.render_widget(popup, popup_area);
    }
}

//! Help popup widget

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::centered;
use crate::tui::AppScreen;

/// Help popup that shows keyboard shortcuts
pub struct HelpPopup;

impl HelpPopup {
    pub fn draw(frame: &mut Frame, area: Rect, screen: AppScreen) {
        let popup_area = centered(area, 60, 70);

        // Clear the area behind the popup
        frame.render_widget(Clear, popup_area);

        let (title, shortcuts): (&str, &[(&str, &str)]) = match screen {
            AppScreen::Dashboard => (
                "Dashboard Shortcuts",
                &[
                    ("c", "Call log"),
                    ("u", "Customers"),
                    ("R", "Refresh metrics"),
                    ("?", "Show this help"),
                    ("q", "Quit application"),
                ],
            ),
            AppScreen::Calls => (
                "Call Log Shortcuts",
                &[
                    ("↑/k", "Move up"),
                    ("↓/j", "Move down"),
                    ("Enter", "Open call details"),
                    ("r", "Retry failed call"),
                    ("/", "Edit filters"),
                    ("Tab", "Next filter field (while editing)"),
                    ("Space", "Cycle status / range (while editing)"),
                    ("n/→", "Next page"),
                    ("p/←", "Previous page"),
                    ("R", "Refresh"),
                    ("Esc", "Go back"),
                ],
            ),
            AppScreen::Customers => (
                "Customer Shortcuts",
                &[
                    ("↑/k", "Move up"),
                    ("↓/j", "Move down"),
                    ("Enter", "Show call history"),
                    ("/", "Search customers"),
                    ("n/→", "Next page"),
                    ("p/←", "Previous page"),
                    ("Esc", "Go back"),
                ],
            ),
        };

        let mut help_text = vec![
            Line::from(Span::styled(title, Style::default().fg(Color::Cyan).bold())),
            Line::from(""),
        ];
        for (key, action) in shortcuts {
            help_text.push(Line::from(vec![
                Span::styled(format!("{:<8}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )));

        let help = Paragraph::new(help_text).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .style(Style::default().bg(Color::Black)),
        );

        frame.render_widget(help, popup_area);
    }
}

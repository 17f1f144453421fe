//! Customer call history modal

use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState},
};

use super::{badge_style, centered, key_hints};
use crate::api::CustomerCalls;
use crate::view::badge_class;
use crate::view::table::format_duration;

/// Calls placed to one customer, opened from the customers table
pub struct HistoryPopup {
    history: CustomerCalls,
    table: TableState,
}

impl HistoryPopup {
    pub fn new(history: CustomerCalls) -> Self {
        let mut table = TableState::default();
        table.select((!history.calls.is_empty()).then_some(0));
        Self { history, table }
    }

    pub fn selected_call_id(&self) -> Option<&str> {
        self.table
            .selected()
            .and_then(|i| self.history.calls.get(i))
            .map(|call| call.call_id.as_str())
    }

    pub fn next(&mut self) {
        let len = self.history.calls.len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.history.calls.len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table.select(Some(i));
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let popup_area = centered(area, 80, 70);
        frame.render_widget(Clear, popup_area);

        let customer = &self.history.customer;
        let block = Block::default()
            .title(format!(" {} ({}) ", customer.name, customer.phone))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(inner);

        if self.history.calls.is_empty() {
            frame.render_widget(
                Paragraph::new("No calls for this customer")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center),
                chunks[0],
            );
        } else {
            let rows: Vec<Row> = self
                .history
                .calls
                .iter()
                .map(|call| {
                    let started = call
                        .call_started_at
                        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    Row::new(vec![
                        Span::raw(call.call_id.clone()),
                        Span::raw(started),
                        Span::styled(call.status.label(), badge_style(badge_class(&call.status))),
                        Span::raw(format_duration(call.duration_seconds.unwrap_or(0))),
                        Span::raw(call.summary.clone().unwrap_or_else(|| "-".to_string())),
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Length(16),
                    Constraint::Length(17),
                    Constraint::Length(10),
                    Constraint::Length(9),
                    Constraint::Min(10),
                ],
            )
            .header(
                Row::new(vec!["Call ID", "Started", "Status", "Duration", "Summary"])
                    .style(Style::default().fg(Color::Cyan).bold()),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▶ ");
            frame.render_stateful_widget(table, chunks[0], &mut self.table);
        }

        frame.render_widget(
            Paragraph::new(key_hints(&[
                ("↑/↓", "Navigate"),
                ("Enter", "Call details"),
                ("Esc", "Close"),
            ])),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CallStatus, Customer, CustomerCall};

    fn history(ids: &[&str]) -> CustomerCalls {
        CustomerCalls {
            customer: Customer {
                id: 7,
                name: "Ada".to_string(),
                phone: "555".to_string(),
                email: None,
                notes: None,
                call_count: ids.len() as u64,
                created_at: None,
            },
            calls: ids
                .iter()
                .map(|id| CustomerCall {
                    call_id: id.to_string(),
                    status: CallStatus::Completed,
                    call_started_at: None,
                    call_ended_at: None,
                    duration_seconds: None,
                    summary: None,
                })
                .collect(),
        }
    }

    #[test]
    fn selection_starts_on_newest_call_and_wraps() {
        let mut popup = HistoryPopup::new(history(&["A", "B"]));
        assert_eq!(popup.selected_call_id(), Some("A"));
        popup.next();
        assert_eq!(popup.selected_call_id(), Some("B"));
        popup.next();
        assert_eq!(popup.selected_call_id(), Some("A"));
        popup.previous();
        assert_eq!(popup.selected_call_id(), Some("B"));
    }

    #[test]
    fn empty_history_has_no_selection() {
        let mut popup = HistoryPopup::new(history(&[]));
        popup.next();
        assert_eq!(popup.selected_call_id(), None);
    }
}

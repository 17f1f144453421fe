//! Customers screen - searchable customer list

use crossterm::event::KeyCode;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};

use crate::api::{CustomerPage, CustomerQuery};
use crate::tui::widgets::key_hints;

/// Customers screen state
pub struct CustomersScreen {
    page: CustomerPage,
    table: TableState,
    search_mode: bool,
    search_query: String,
    current_page: u32,
    per_page: u32,
    error: Option<String>,
}

impl CustomersScreen {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: CustomerPage::default(),
            table: TableState::default(),
            search_mode: false,
            search_query: String::new(),
            current_page: 1,
            per_page,
            error: None,
        }
    }

    /// Query for the page and search currently shown
    pub fn query(&self) -> CustomerQuery {
        let search = self.search_query.trim();
        CustomerQuery {
            search: (!search.is_empty()).then(|| search.to_string()),
            page: self.current_page,
            per_page: self.per_page,
        }
    }

    pub fn set_page(&mut self, page: CustomerPage) {
        self.current_page = page.pagination.page.max(1);
        self.table
            .select((!page.customers.is_empty()).then_some(0));
        self.page = page;
        self.error = None;
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    /// ID of the highlighted customer
    pub fn selected_id(&self) -> Option<i64> {
        self.table
            .selected()
            .and_then(|i| self.page.customers.get(i))
            .map(|customer| customer.id)
    }

    pub fn is_searching(&self) -> bool {
        self.search_mode
    }

    pub fn start_search(&mut self) {
        self.search_mode = true;
    }

    /// Returns true when the search was submitted and the list should reload.
    pub fn handle_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => self.search_query.push(c),
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Enter => {
                self.search_mode = false;
                self.current_page = 1;
                return true;
            }
            KeyCode::Esc => self.search_mode = false,
            _ => {}
        }
        false
    }

    /// Move to the next page if there is one. Returns true if the page changed.
    pub fn next_page(&mut self) -> bool {
        if !self.page.pagination.has_next() {
            return false;
        }
        self.current_page += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.page.pagination.has_previous() {
            return false;
        }
        self.current_page -= 1;
        true
    }

    pub fn next(&mut self) {
        let len = self.page.customers.len();
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
        let len = self.page.customers.len();
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
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar
                Constraint::Min(5),    // Table
                Constraint::Length(1), // Status
                Constraint::Length(3), // Help
            ])
            .split(area);

        // Search bar
        let search_style = if self.search_mode {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let search_text = if self.search_mode {
            format!("Search: {}█", self.search_query)
        } else if self.search_query.is_empty() {
            "Press [/] to search".to_string()
        } else {
            format!("Search: {}", self.search_query)
        };

        let search = Paragraph::new(search_text)
            .style(search_style)
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        frame.render_widget(search, chunks[0]);

        let rows: Vec<Row> = self
            .page
            .customers
            .iter()
            .map(|customer| {
                Row::new(vec![
                    customer.id.to_string(),
                    customer.name.clone(),
                    customer.phone.clone(),
                    customer.email.clone().unwrap_or_else(|| "-".to_string()),
                    customer.call_count.to_string(),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(16),
                Constraint::Length(16),
                Constraint::Min(20),
                Constraint::Length(6),
            ],
        )
        .header(
            Row::new(vec!["ID", "Name", "Phone", "Email", "Calls"])
                .style(Style::default().fg(Color::Cyan).bold()),
        )
        .block(
            Block::default()
                .title(format!(
                    " Customers ({}) ",
                    self.page.pagination.total
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

        frame.render_stateful_widget(table, chunks[1], &mut self.table);

        let status = match &self.error {
            Some(error) => Line::from(Span::styled(
                format!(" {}", error),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(Span::styled(
                format!(
                    " Page {} of {}",
                    self.current_page,
                    self.page.pagination.pages.max(1)
                ),
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(status), chunks[2]);

        let help = Paragraph::new(key_hints(&[
            ("↑/↓", "Navigate"),
            ("Enter", "Call history"),
            ("/", "Search"),
            ("n/p", "Page"),
            ("Esc", "Back"),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(help, chunks[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_search_resets_to_first_page() {
        let mut screen = CustomersScreen::new(20);
        screen.current_page = 3;
        screen.start_search();
        for c in " Ada ".chars() {
            screen.handle_search_key(KeyCode::Char(c));
        }
        assert!(screen.handle_search_key(KeyCode::Enter));

        let query = screen.query();
        assert_eq!(query.search.as_deref(), Some("Ada"));
        assert_eq!(query.page, 1);
        assert!(!screen.is_searching());
    }

    #[test]
    fn selected_id_follows_the_highlighted_row() {
        let mut screen = CustomersScreen::new(20);
        assert_eq!(screen.selected_id(), None);

        let page: CustomerPage = serde_json::from_value(serde_json::json!({
            "customers": [{"id": 7, "name": "Ada"}, {"id": 9, "name": "Bob"}],
            "pagination": {"page": 1, "per_page": 20, "total": 2, "pages": 1}
        }))
        .unwrap();
        screen.set_page(page);
        assert_eq!(screen.selected_id(), Some(7));
        screen.next();
        assert_eq!(screen.selected_id(), Some(9));
    }

    #[test]
    fn paging_stops_at_the_last_page() {
        let mut screen = CustomersScreen::new(20);
        assert!(!screen.next_page());
        assert!(!screen.previous_page());
    }
}

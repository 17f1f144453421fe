//! Calls screen - filter bar, paged call table and notices

use crossterm::event::KeyCode;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::api::{CallApi, CallStatus};
use crate::tui::widgets::{badge_style, key_hints};
use crate::view::{CallLogViewModel, DateRange, FilterCriteria, Notice, RowView};

/// Filter bar field with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Status,
    Range,
    From,
    To,
    Search,
}

impl FilterField {
    const ORDER: [FilterField; 5] = [
        FilterField::Status,
        FilterField::Range,
        FilterField::From,
        FilterField::To,
        FilterField::Search,
    ];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Whether a validation error on `field` belongs to this input
    fn reports(self, field: &str) -> bool {
        matches!(
            (self, field),
            (Self::From, "start_date" | "date_range") | (Self::To, "end_date" | "date_range")
        )
    }
}

/// What the filter form wants the app to do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Draft criteria being edited; applied only on submit
#[derive(Debug, Clone, Default)]
pub struct FilterForm {
    status: Option<CallStatus>,
    range: DateRange,
    custom: bool,
    from: String,
    to: String,
    search: String,
    focus: Option<FilterField>,
}

impl FilterForm {
    fn load(&mut self, criteria: &FilterCriteria) {
        self.status = criteria.status.clone();
        self.search = criteria.search.clone();
        match &criteria.date_range {
            DateRange::Custom { start, end } => {
                self.custom = true;
                self.from = start.clone();
                self.to = end.clone();
            }
            range => {
                self.custom = false;
                self.range = range.clone();
                self.from.clear();
                self.to.clear();
            }
        }
    }

    /// Criteria as they would be submitted
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            status: self.status.clone(),
            date_range: if self.custom {
                DateRange::Custom {
                    start: self.from.clone(),
                    end: self.to.clone(),
                }
            } else {
                self.range.clone()
            },
            search: self.search.clone(),
        }
    }

    /// Presets first, then a custom range, then back to the first preset
    fn cycle_range(&mut self) {
        if self.custom {
            self.custom = false;
            self.range = DateRange::PRESETS[0].clone();
        } else if self.range == DateRange::All {
            self.custom = true;
        } else {
            self.range = self.range.next_preset();
        }
    }

    fn cycle_status(&mut self) {
        let mut criteria = FilterCriteria {
            status: self.status.take(),
            ..FilterCriteria::default()
        };
        criteria.cycle_status();
        self.status = criteria.status;
    }

    fn text_mut(&mut self, field: FilterField) -> Option<&mut String> {
        match field {
            FilterField::From => Some(&mut self.from),
            FilterField::To => Some(&mut self.to),
            FilterField::Search => Some(&mut self.search),
            FilterField::Status | FilterField::Range => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> FormAction {
        let Some(focus) = self.focus else {
            return FormAction::None;
        };

        match key {
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab => self.focus = Some(focus.next()),
            KeyCode::BackTab => self.focus = Some(focus.previous()),
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
                if matches!(focus, FilterField::Status | FilterField::Range) =>
            {
                if focus == FilterField::Status {
                    self.cycle_status();
                } else {
                    self.cycle_range();
                }
            }
            KeyCode::Char(c) => {
                if matches!(focus, FilterField::From | FilterField::To) {
                    self.custom = true;
                }
                if let Some(text) = self.text_mut(focus) {
                    text.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut(focus) {
                    text.pop();
                }
            }
            _ => {}
        }
        FormAction::None
    }
}

/// Calls screen state
#[derive(Default)]
pub struct CallsScreen {
    table: TableState,
    form: FilterForm,
}

impl CallsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.form.focus.is_some()
    }

    /// Open the filter bar on the criteria currently applied
    pub fn start_editing(&mut self, criteria: &FilterCriteria) {
        self.form.load(criteria);
        self.form.focus = Some(FilterField::Status);
    }

    /// Close the filter bar, showing the criteria actually applied
    pub fn stop_editing(&mut self, applied: &FilterCriteria) {
        self.form.load(applied);
        self.form.focus = None;
    }

    pub fn form(&self) -> &FilterForm {
        &self.form
    }

    pub fn handle_edit_key(&mut self, key: KeyCode) -> FormAction {
        self.form.handle_key(key)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.table.selected()
    }

    /// Keep the selection valid after the rows change
    pub fn clamp_selection(&mut self, len: usize) {
        match (self.table.selected(), len) {
            (_, 0) => self.table.select(None),
            (None, _) => self.table.select(Some(0)),
            (Some(i), len) if i >= len => self.table.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table.select(Some(i));
    }

    pub fn draw<A: CallApi + ?Sized>(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        model: &CallLogViewModel<A>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Filter bar
                Constraint::Min(5),    // Table
                Constraint::Length(1), // Notice / pagination
                Constraint::Length(3), // Help
            ])
            .split(area);

        self.draw_filters(frame, chunks[0], model.notice());
        self.draw_table(frame, chunks[1], model);
        draw_status_line(frame, chunks[2], model);

        let hints: &[(&str, &str)] = if self.is_editing() {
            &[
                ("Tab", "Next field"),
                ("Space", "Cycle"),
                ("Enter", "Apply"),
                ("Esc", "Cancel"),
            ]
        } else {
            &[
                ("↑/↓", "Navigate"),
                ("Enter", "Details"),
                ("r", "Retry"),
                ("/", "Filter"),
                ("n/p", "Page"),
                ("R", "Refresh"),
                ("Esc", "Back"),
            ]
        };
        let help = Paragraph::new(key_hints(hints)).alignment(Alignment::Center);
        frame.render_widget(help, chunks[3]);
    }

    fn draw_filters(&self, frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
        let error_field = match notice {
            Some(Notice::Field { field, .. }) => Some(*field),
            _ => None,
        };

        let form = &self.form;
        let status = form
            .status
            .as_ref()
            .map(|s| s.label())
            .unwrap_or_else(|| "All".to_string());
        let range = if form.custom {
            DateRange::Custom {
                start: String::new(),
                end: String::new(),
            }
            .label()
        } else {
            form.range.label()
        };

        let spans = vec![
            self.field_span(FilterField::Status, "Status", &status, error_field),
            Span::raw("  "),
            self.field_span(FilterField::Range, "Range", range, error_field),
            Span::raw("  "),
            self.field_span(FilterField::From, "From", &form.from, error_field),
            Span::raw("  "),
            self.field_span(FilterField::To, "To", &form.to, error_field),
            Span::raw("  "),
            self.field_span(FilterField::Search, "Search", &form.search, error_field),
        ];

        let mut lines = vec![Line::from(spans)];
        if let Some(Notice::Field { message, .. }) = notice {
            lines.push(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if !self.is_editing() {
            lines.push(Line::from(Span::styled(
                "Press [/] to edit filters",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let border = if self.is_editing() {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        let filters = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Filters ")
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(filters, area);
    }

    fn field_span(
        &self,
        field: FilterField,
        label: &str,
        value: &str,
        error_field: Option<&str>,
    ) -> Span<'static> {
        let focused = self.form.focus == Some(field);
        let cursor = if focused
            && matches!(
                field,
                FilterField::From | FilterField::To | FilterField::Search
            ) {
            "█"
        } else {
            ""
        };
        let text = format!("{}: {}{}", label, value, cursor);

        let style = if error_field.is_some_and(|f| field.reports(f)) {
            Style::default().fg(Color::Red).bold()
        } else if focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(text, style)
    }

    fn draw_table<A: CallApi + ?Sized>(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        model: &CallLogViewModel<A>,
    ) {
        let retries = model.retries();
        let rows: Vec<Row> = model
            .rows()
            .iter()
            .map(|row| table_row(row, retries.is_in_flight(&row.call_id)))
            .collect();

        let header = Row::new(vec![
            "ID", "Customer", "Phone", "Created", "Status", "Duration", "Actions",
        ])
        .style(Style::default().fg(Color::Cyan).bold());

        let widths = [
            Constraint::Length(14),
            Constraint::Min(16),
            Constraint::Length(16),
            Constraint::Length(17),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!(" Calls ({}) ", model.pagination().total))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(table, area, &mut self.table);
    }
}

fn table_row(row: &RowView, retrying: bool) -> Row<'static> {
    let actions = if retrying {
        "Retrying...".to_string()
    } else {
        row.actions
            .iter()
            .map(|a| a.label())
            .collect::<Vec<_>>()
            .join(" ")
    };

    Row::new(vec![
        Cell::from(row.call_id.clone()),
        Cell::from(row.customer_name.clone()),
        Cell::from(row.customer_phone.clone()),
        Cell::from(row.created_at.clone()).style(Style::default().fg(Color::DarkGray)),
        Cell::from(row.status.clone()).style(badge_style(row.badge)),
        Cell::from(row.duration.clone()),
        Cell::from(actions),
    ])
}

fn draw_status_line<A: CallApi + ?Sized>(
    frame: &mut Frame,
    area: Rect,
    model: &CallLogViewModel<A>,
) {
    let pagination = model.pagination();
    let mut spans = vec![Span::styled(
        format!(
            " Page {} of {} ",
            pagination.page,
            pagination.pages.max(1)
        ),
        Style::default().fg(Color::DarkGray),
    )];

    match model.notice() {
        Some(Notice::Info(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Green)));
        }
        Some(Notice::Error(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Red)));
        }
        Some(Notice::Field { .. }) | None => {}
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_a_date_switches_to_custom_range() {
        let mut screen = CallsScreen::new();
        screen.start_editing(&FilterCriteria::default());
        screen.handle_edit_key(KeyCode::Tab);
        screen.handle_edit_key(KeyCode::Tab);
        for c in "2024-02-01".chars() {
            screen.handle_edit_key(KeyCode::Char(c));
        }

        let criteria = screen.form().criteria();
        assert_eq!(
            criteria.date_range,
            DateRange::Custom {
                start: "2024-02-01".to_string(),
                end: String::new(),
            }
        );
    }

    #[test]
    fn range_cycles_through_presets_then_custom() {
        let mut form = FilterForm::default();
        form.focus = Some(FilterField::Range);
        let mut seen = Vec::new();
        for _ in 0..5 {
            form.handle_key(KeyCode::Char(' '));
            seen.push(form.criteria().date_range.label());
        }
        assert_eq!(
            seen,
            [
                "Custom range",
                "Last 24 hours",
                "Last 7 days",
                "Last 30 days",
                "All time"
            ]
        );
    }

    #[test]
    fn space_in_search_is_text() {
        let mut form = FilterForm::default();
        form.focus = Some(FilterField::Search);
        for c in "Ada L".chars() {
            form.handle_key(KeyCode::Char(c));
        }
        assert_eq!(form.criteria().search, "Ada L");
        assert_eq!(form.handle_key(KeyCode::Enter), FormAction::Submit);
    }

    #[test]
    fn selection_wraps_and_clamps() {
        let mut screen = CallsScreen::new();
        screen.clamp_selection(3);
        assert_eq!(screen.selected_index(), Some(0));
        screen.previous(3);
        assert_eq!(screen.selected_index(), Some(2));
        screen.clamp_selection(2);
        assert_eq!(screen.selected_index(), Some(1));
        screen.clamp_selection(0);
        assert_eq!(screen.selected_index(), None);
    }
}

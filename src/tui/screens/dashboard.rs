//! Dashboard screen - landing page with call counters and charts

use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Paragraph, Sparkline, Wrap},
};

use crate::api::{DashboardStats, MetricsSummary};
use crate::tui::widgets::key_hints;

/// Dashboard screen state
#[derive(Default)]
pub struct DashboardScreen {
    stats: Option<DashboardStats>,
    metrics: Option<MetricsSummary>,
    error: Option<String>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stats(&mut self, stats: DashboardStats) {
        self.stats = Some(stats);
    }

    pub fn set_metrics(&mut self, metrics: MetricsSummary) {
        self.metrics = Some(metrics);
    }

    /// Keep the last good data and show the error above it
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(7), // Counters
                Constraint::Min(8),    // Charts
                Constraint::Length(3), // Help
            ])
            .split(area);

        // Title
        let title = Paragraph::new("voicecrm")
            .style(Style::default().fg(Color::Cyan).bold())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, chunks[0]);

        self.draw_counters(frame, chunks[1]);
        self.draw_charts(frame, chunks[2]);

        let help = Paragraph::new(key_hints(&[
            ("c", "Calls"),
            ("u", "Customers"),
            ("R", "Refresh"),
            ("?", "Help"),
            ("q", "Quit"),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(help, chunks[3]);
    }

    fn draw_counters(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let mut overview = Vec::new();
        if let Some(error) = &self.error {
            overview.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        match &self.stats {
            Some(stats) => {
                overview.push(counter("Total calls", stats.total_calls, Color::White));
                overview.push(counter("Customers", stats.total_customers, Color::White));
                overview.push(counter("Active calls", stats.active_calls, Color::Yellow));
                overview.push(counter("Last 24h", stats.recent_calls_24h, Color::Cyan));
            }
            None if self.error.is_none() => overview.push(Line::from("Loading...")),
            None => {}
        }

        let overview_widget = Paragraph::new(overview).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Overview ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(overview_widget, columns[0]);

        let mut today = Vec::new();
        if let Some(daily) = self.metrics.as_ref().and_then(|m| m.daily_stats) {
            today.push(counter("Total calls", daily.total_calls, Color::White));
            today.push(counter("Successful", daily.successful_calls, Color::Green));
            today.push(counter("Failed", daily.failed_calls, Color::Red));
        } else if let Some(metrics) = &self.metrics {
            if let Some(total) = metrics.total_calls {
                today.push(counter("Total calls", total, Color::White));
            }
            if let Some(rate) = metrics.success_rate {
                today.push(Line::from(vec![
                    Span::raw(format!("{:<14}", "Success rate")),
                    Span::styled(format!("{:.1}%", rate), Style::default().fg(Color::Green)),
                ]));
            }
        }

        let today_widget = Paragraph::new(today).block(
            Block::default()
                .title(" Today ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(today_widget, columns[1]);
    }

    fn draw_charts(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let distribution: Vec<(String, u64)> = self
            .metrics
            .iter()
            .flat_map(|m| m.call_distribution.iter())
            .map(|bucket| (bucket.status.label(), bucket.count))
            .collect();
        let bars: Vec<(&str, u64)> = distribution
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .title(" Calls by status ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .data(bars.as_slice())
            .bar_width(10)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        frame.render_widget(chart, columns[0]);

        let growth: Vec<u64> = self
            .metrics
            .iter()
            .flat_map(|m| m.customer_growth.iter())
            .map(|point| point.count)
            .collect();

        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .title(" New customers ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .data(&growth)
            .style(Style::default().fg(Color::Green));
        frame.render_widget(sparkline, columns[1]);
    }
}

fn counter(label: &str, value: u64, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:<14}", label)),
        Span::styled(value.to_string(), Style::default().fg(color).bold()),
    ])
}

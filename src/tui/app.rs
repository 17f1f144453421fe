//! Main TUI application state and logic

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{HttpCrmClient, MetricsRange};
use crate::config::Settings;
use crate::tui::screens::{CallsScreen, CustomersScreen, DashboardScreen, FormAction};
use crate::tui::widgets::{ConfirmPopup, DetailPopup, HelpPopup, HistoryPopup};
use crate::view::{BadgeClass, CallLogViewModel, Preconfirmed, RetryOutcome};

/// Current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Dashboard,
    Calls,
    Customers,
}

/// Main application state
pub struct App {
    settings: Settings,
    client: Arc<HttpCrmClient>,
    current_screen: AppScreen,
    previous_screen: Option<AppScreen>,
    show_help: bool,

    // Screen states
    dashboard: DashboardScreen,
    calls: CallsScreen,
    customers: CustomersScreen,
    call_log: CallLogViewModel<HttpCrmClient>,

    // Overlays
    history: Option<HistoryPopup>,
    detail: Option<DetailPopup>,
    confirm: Option<ConfirmPopup>,

    // Retries run as tasks and report back here
    retry_tx: mpsc::UnboundedSender<(String, RetryOutcome)>,
    retry_rx: mpsc::UnboundedReceiver<(String, RetryOutcome)>,

    calls_loaded: bool,
    customers_loaded: bool,
    last_dashboard_update: Option<Instant>,
}

impl App {
    /// Create a new app instance
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Arc::new(HttpCrmClient::from_settings(&settings)?);
        let page_size = settings.tui.page_size;
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();

        Ok(Self {
            call_log: CallLogViewModel::new(Arc::clone(&client), page_size),
            client,
            current_screen: AppScreen::Dashboard,
            previous_screen: None,
            show_help: false,
            dashboard: DashboardScreen::new(),
            calls: CallsScreen::new(),
            customers: CustomersScreen::new(page_size),
            history: None,
            detail: None,
            confirm: None,
            retry_tx,
            retry_rx,
            calls_loaded: false,
            customers_loaded: false,
            last_dashboard_update: None,
            settings,
        })
    }

    /// Draw the current screen
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();

        match self.current_screen {
            AppScreen::Dashboard => {
                self.dashboard.draw(frame, area);
            }
            AppScreen::Calls => {
                self.calls.draw(frame, area, &self.call_log);
            }
            AppScreen::Customers => {
                self.customers.draw(frame, area);
            }
        }

        if let Some(history) = self.history.as_mut() {
            history.draw(frame, area);
        }

        if let Some(detail) = &self.detail {
            detail.draw(frame, area);
        }

        if let Some(confirm) = &self.confirm {
            confirm.draw(frame, area);
        }

        // Draw help popup if active
        if self.show_help {
            HelpPopup::draw(frame, area, self.current_screen);
        }
    }

    /// Whether every key, including `q` and `Esc`, belongs to an input or overlay
    pub fn is_capturing_input(&self) -> bool {
        self.show_help
            || self.confirm.is_some()
            || self.detail.is_some()
            || self.history.is_some()
            || self.calls.is_editing()
            || self.customers.is_searching()
    }

    /// Handle key input
    pub async fn handle_key(&mut self, key: KeyCode) -> Result<()> {
        if self.show_help {
            self.show_help = false;
            return Ok(());
        }

        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return Ok(());
        }

        if self.detail.is_some() {
            self.handle_detail_key(key);
            return Ok(());
        }

        if self.history.is_some() {
            self.handle_history_key(key).await;
            return Ok(());
        }

        match self.current_screen {
            AppScreen::Dashboard => {
                self.handle_dashboard_key(key).await;
            }
            AppScreen::Calls => {
                self.handle_calls_key(key).await;
            }
            AppScreen::Customers => {
                self.handle_customers_key(key).await;
            }
        }

        Ok(())
    }

    /// Handle dashboard key input
    async fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('c') | KeyCode::Tab => {
                self.switch_screen(AppScreen::Calls).await;
            }
            KeyCode::Char('u') => {
                self.switch_screen(AppScreen::Customers).await;
            }
            KeyCode::Char('R') => {
                self.refresh_dashboard().await;
            }
            _ => {}
        }
    }

    /// Handle calls key input
    async fn handle_calls_key(&mut self, key: KeyCode) {
        if self.calls.is_editing() {
            match self.calls.handle_edit_key(key) {
                FormAction::Submit => self.apply_filters().await,
                FormAction::Cancel => {
                    self.call_log.clear_notice();
                    self.calls
                        .stop_editing(self.call_log.filters().criteria());
                }
                FormAction::None => {}
            }
            return;
        }

        let len = self.call_log.rows().len();
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.calls.previous(len);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.calls.next(len);
            }
            KeyCode::Enter => {
                self.open_selected_call().await;
            }
            KeyCode::Char('r') => {
                self.request_retry_for_selected().await;
            }
            KeyCode::Char('/') => {
                self.calls
                    .start_editing(self.call_log.filters().criteria());
            }
            KeyCode::Char('n') | KeyCode::Right => {
                let _ = self.call_log.next_page().await;
                self.calls.clamp_selection(self.call_log.rows().len());
            }
            KeyCode::Char('p') | KeyCode::Left => {
                let _ = self.call_log.previous_page().await;
                self.calls.clamp_selection(self.call_log.rows().len());
            }
            KeyCode::Char('R') => {
                let _ = self.call_log.refresh().await;
                self.calls.clamp_selection(self.call_log.rows().len());
            }
            KeyCode::Char('d') => {
                self.switch_screen(AppScreen::Dashboard).await;
            }
            KeyCode::Char('u') => {
                self.switch_screen(AppScreen::Customers).await;
            }
            _ => {}
        }
    }

    /// Handle customers key input
    async fn handle_customers_key(&mut self, key: KeyCode) {
        if self.customers.is_searching() {
            if self.customers.handle_search_key(key) {
                self.load_customers().await;
            }
            return;
        }

        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.customers.previous();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.customers.next();
            }
            KeyCode::Enter => {
                self.open_selected_customer().await;
            }
            KeyCode::Char('/') => {
                self.customers.start_search();
            }
            KeyCode::Char('n') | KeyCode::Right => {
                if self.customers.next_page() {
                    self.load_customers().await;
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.customers.previous_page() {
                    self.load_customers().await;
                }
            }
            KeyCode::Char('d') => {
                self.switch_screen(AppScreen::Dashboard).await;
            }
            KeyCode::Char('c') => {
                self.switch_screen(AppScreen::Calls).await;
            }
            _ => {}
        }
    }

    async fn handle_history_key(&mut self, key: KeyCode) {
        let Some(history) = self.history.as_mut() else {
            return;
        };

        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.history = None;
            }
            KeyCode::Up | KeyCode::Char('k') => history.previous(),
            KeyCode::Down | KeyCode::Char('j') => history.next(),
            KeyCode::Enter => {
                let Some(call_id) = history.selected_call_id().map(str::to_string) else {
                    return;
                };
                match self.call_log.open_detail(&call_id).await {
                    Ok(view) => self.detail = Some(DetailPopup::new(view)),
                    Err(e) => self.customers.set_error(e.user_message()),
                }
            }
            _ => {}
        }
    }

    async fn open_selected_customer(&mut self) {
        let Some(customer_id) = self.customers.selected_id() else {
            return;
        };

        match self.client.fetch_customer_calls(customer_id).await {
            Ok(history) => self.history = Some(HistoryPopup::new(history)),
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "failed to load customer calls");
                self.customers.set_error(e.user_message());
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(confirm) = self.confirm.take() {
                    self.spawn_retry(confirm.call_id().to_string());
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                if let Some(confirm) = self.confirm.take() {
                    debug!(call_id = confirm.call_id(), "retry declined");
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyCode) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };

        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                self.detail = None;
            }
            KeyCode::Up | KeyCode::Char('k') => detail.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => detail.scroll_down(),
            KeyCode::Char('r') if detail.view().badge == BadgeClass::Danger => {
                let call_id = detail.view().call_id.clone();
                let customer = detail
                    .view()
                    .value("Customer")
                    .unwrap_or_default()
                    .to_string();
                self.detail = None;
                self.request_retry(call_id, customer);
            }
            _ => {}
        }
    }

    /// Validate and apply the filter draft; the bar stays open on validation errors.
    async fn apply_filters(&mut self) {
        let criteria = self.calls.form().criteria();
        self.call_log.filters_mut().set_criteria(criteria);

        match self.call_log.submit_filters().await {
            Err(crate::CrmError::Validation { .. }) => {}
            _ => {
                self.calls
                    .stop_editing(self.call_log.filters().criteria());
                self.calls.clamp_selection(self.call_log.rows().len());
            }
        }
    }

    async fn open_selected_call(&mut self) {
        let Some(call_id) = self.selected_call_id() else {
            return;
        };

        // A failed load leaves the notice set and no modal open
        if let Ok(view) = self.call_log.open_detail(&call_id).await {
            self.detail = Some(DetailPopup::new(view));
        }
    }

    async fn request_retry_for_selected(&mut self) {
        let Some(row) = self
            .calls
            .selected_index()
            .and_then(|i| self.call_log.rows().get(i))
        else {
            return;
        };

        if !row.can_retry() {
            return;
        }

        let (call_id, customer) = (row.call_id.clone(), row.customer_name.clone());
        if self.call_log.retries().is_in_flight(&call_id) {
            self.call_log
                .apply_retry_outcome(&call_id, &RetryOutcome::AlreadyInFlight)
                .await;
            return;
        }
        self.request_retry(call_id, customer);
    }

    fn request_retry(&mut self, call_id: String, customer: String) {
        self.confirm = Some(ConfirmPopup::new(call_id, customer));
    }

    /// Run a confirmed retry in the background; the outcome arrives in `update`.
    fn spawn_retry(&self, call_id: String) {
        let retries = self.call_log.retries();
        let tx = self.retry_tx.clone();
        tokio::spawn(async move {
            let outcome = retries.retry(&call_id, &Preconfirmed(true)).await;
            let _ = tx.send((call_id, outcome));
        });
    }

    fn selected_call_id(&self) -> Option<String> {
        self.calls
            .selected_index()
            .and_then(|i| self.call_log.rows().get(i))
            .map(|row| row.call_id.clone())
    }

    /// Switch to a different screen, loading it the first time it is shown
    async fn switch_screen(&mut self, screen: AppScreen) {
        self.previous_screen = Some(self.current_screen);
        self.current_screen = screen;

        match screen {
            AppScreen::Calls if !self.calls_loaded => {
                self.calls_loaded = true;
                let _ = self.call_log.submit_filters().await;
                self.calls.clamp_selection(self.call_log.rows().len());
            }
            AppScreen::Customers if !self.customers_loaded => {
                self.customers_loaded = true;
                self.load_customers().await;
            }
            _ => {}
        }
    }

    async fn load_customers(&mut self) {
        match self.client.fetch_customers(&self.customers.query()).await {
            Ok(page) => self.customers.set_page(page),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load customers");
                self.customers.set_error(e.user_message());
            }
        }
    }

    async fn refresh_dashboard(&mut self) {
        self.last_dashboard_update = Some(Instant::now());

        let stats = self.client.fetch_dashboard_stats().await;
        let metrics = self
            .client
            .fetch_metrics_summary(&MetricsRange::default())
            .await;

        let mut error = None;
        match stats {
            Ok(stats) => self.dashboard.set_stats(stats),
            Err(e) => error = Some(e.user_message()),
        }
        match metrics {
            Ok(metrics) => self.dashboard.set_metrics(metrics),
            Err(e) => error = error.or(Some(e.user_message())),
        }
        self.dashboard.set_error(error);
    }

    /// Handle back navigation
    pub fn handle_back(&mut self) {
        if let Some(prev) = self.previous_screen.take() {
            self.current_screen = prev;
        } else if self.current_screen != AppScreen::Dashboard {
            self.current_screen = AppScreen::Dashboard;
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.current_screen == AppScreen::Dashboard && !self.is_capturing_input()
    }

    /// Toggle help popup
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Update app state
    pub async fn update(&mut self) -> Result<()> {
        // Completed retries, in whatever order they finished
        while let Ok((call_id, outcome)) = self.retry_rx.try_recv() {
            self.call_log.apply_retry_outcome(&call_id, &outcome).await;
            self.calls.clamp_selection(self.call_log.rows().len());
        }

        let refresh_every = Duration::from_secs(self.settings.tui.refresh_secs.max(1));
        let due = self
            .last_dashboard_update
            .map_or(true, |at| at.elapsed() > refresh_every);
        if self.current_screen == AppScreen::Dashboard && due {
            self.refresh_dashboard().await;
        }

        Ok(())
    }
}

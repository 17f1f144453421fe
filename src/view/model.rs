//! Call log view-model
//!
//! Owns everything the calls view shows: filters, the current page of rows,
//! the operator-facing notice, and the retry coordinator. Create one when
//! the view opens and drop it when the view closes.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{CallApi, CallQuery, CallRecord, Pagination};
use crate::view::detail::{load_detail, DetailView};
use crate::view::filter::FilterState;
use crate::view::retry::{Confirm, RetryCoordinator, RetryOutcome};
use crate::view::table::{render, RowView};
use crate::{CrmError, Result};

/// Message shown to the operator after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    /// Shown next to the offending filter field
    Field { field: &'static str, message: String },
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Info(text) | Self::Error(text) => text,
            Self::Field { message, .. } => message,
        }
    }
}

pub struct CallLogViewModel<A: CallApi + ?Sized> {
    api: Arc<A>,
    filters: FilterState,
    retries: RetryCoordinator<A>,
    calls: Vec<CallRecord>,
    rows: Vec<RowView>,
    pagination: Pagination,
    last_query: Option<CallQuery>,
    notice: Option<Notice>,
}

impl<A: CallApi + ?Sized> CallLogViewModel<A> {
    pub fn new(api: Arc<A>, per_page: u32) -> Self {
        Self {
            retries: RetryCoordinator::new(Arc::clone(&api)),
            api,
            filters: FilterState::new(per_page),
            calls: Vec::new(),
            rows: Vec::new(),
            pagination: Pagination::default(),
            last_query: None,
            notice: None,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Edit filters. Nothing is fetched until [`Self::submit_filters`].
    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn rows(&self) -> &[RowView] {
        &self.rows
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Query behind the rows currently shown
    pub fn last_query(&self) -> Option<&CallQuery> {
        self.last_query.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Shared handle for running retries outside this object (e.g. spawned tasks)
    pub fn retries(&self) -> RetryCoordinator<A> {
        self.retries.clone()
    }

    /// Explicit submit: validate the filters, then fetch.
    pub async fn submit_filters(&mut self) -> Result<()> {
        self.submit_filters_at(Utc::now()).await
    }

    pub async fn submit_filters_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        let query = match self.filters.submit(now) {
            Ok(query) => query,
            Err(e) => {
                if let CrmError::Validation { field, message } = &e {
                    self.notice = Some(Notice::Field {
                        field: *field,
                        message: message.clone(),
                    });
                }
                return Err(e);
            }
        };

        self.notice = None;
        self.fetch(query).await
    }

    /// Re-fetch the current query from the server.
    pub async fn refresh(&mut self) -> Result<()> {
        match self.last_query.clone() {
            Some(query) => self.fetch(query).await,
            None => self.submit_filters().await,
        }
    }

    pub async fn next_page(&mut self) -> Result<()> {
        if !self.pagination.has_next() {
            return Ok(());
        }
        self.go_to_page(self.current_page() + 1).await
    }

    pub async fn previous_page(&mut self) -> Result<()> {
        if !self.pagination.has_previous() {
            return Ok(());
        }
        self.go_to_page(self.current_page().saturating_sub(1)).await
    }

    /// Page of the rows on screen, not of the (possibly rejected) filter draft
    fn current_page(&self) -> u32 {
        self.last_query
            .as_ref()
            .map_or(self.filters.page(), |query| query.page)
    }

    async fn go_to_page(&mut self, page: u32) -> Result<()> {
        let Some(mut query) = self.last_query.clone() else {
            self.filters.set_page(page);
            return self.submit_filters().await;
        };
        self.filters.set_page(page);
        query.page = self.filters.page();
        self.fetch(query).await
    }

    async fn fetch(&mut self, query: CallQuery) -> Result<()> {
        match self.api.fetch_call_list(&query).await {
            Ok(page) => {
                self.rows = render(&page.calls);
                self.calls = page.calls;
                self.pagination = page.pagination;
                self.last_query = Some(query);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load call list");
                self.notice = Some(Notice::Error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Load the detail view for a call. Nothing is returned on failure.
    pub async fn open_detail(&mut self, call_id: &str) -> Result<DetailView> {
        match load_detail(self.api.as_ref(), call_id).await {
            Ok(view) => Ok(view),
            Err(e) => {
                warn!(call_id, error = %e, "failed to load call detail");
                self.notice = Some(Notice::Error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Confirm and run a retry, then apply its outcome.
    pub async fn retry(&mut self, call_id: &str, confirm: &dyn Confirm) -> RetryOutcome {
        let outcome = self.retries.retry(call_id, confirm).await;
        self.apply_retry_outcome(call_id, &outcome).await;
        outcome
    }

    /// Notify the operator and, after a success, re-fetch the list once.
    pub async fn apply_retry_outcome(&mut self, call_id: &str, outcome: &RetryOutcome) {
        match outcome {
            RetryOutcome::Declined => {}
            RetryOutcome::AlreadyInFlight => {
                self.notice = Some(Notice::Info(format!(
                    "A retry for {} is already in progress",
                    call_id
                )));
            }
            RetryOutcome::Succeeded { message } => {
                info!(call_id, "retry succeeded, refreshing call list");
                // a failed refresh leaves its own error as the notice
                if self.refresh().await.is_ok() {
                    self.notice = Some(Notice::Info(message.clone()));
                }
            }
            RetryOutcome::Failed { message } => {
                self.notice = Some(Notice::Error(message.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CallPage, CallRecordDetail, CallStatus, RetryResult};
    use crate::view::filter::DateRange;
    use crate::view::retry::Preconfirmed;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        queries: Mutex<Vec<CallQuery>>,
        fail_list: bool,
    }

    #[async_trait]
    impl CallApi for RecordingApi {
        async fn fetch_call_list(&self, query: &CallQuery) -> Result<CallPage> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_list {
                return Err(CrmError::transport("connection refused"));
            }
            Ok(CallPage {
                calls: vec![CallRecord {
                    call_id: "A".to_string(),
                    customer_name: "Ada".to_string(),
                    customer_phone: "555".to_string(),
                    created_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
                    status: CallStatus::Completed,
                    duration_seconds: Some(30),
                }],
                pagination: Pagination {
                    page: query.page,
                    per_page: query.per_page,
                    total: 45,
                    pages: 3,
                },
            })
        }

        async fn fetch_call_detail(&self, _call_id: &str) -> Result<CallRecordDetail> {
            Err(CrmError::Parse("unexpected end of input".to_string()))
        }

        async fn retry_call(&self, _call_id: &str) -> Result<RetryResult> {
            Ok(RetryResult {
                success: false,
                message: "Phone number required".to_string(),
                dispatch_id: None,
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn invalid_filters_block_the_fetch_and_flag_the_field() {
        let api = Arc::new(RecordingApi::default());
        let mut model = CallLogViewModel::new(api.clone(), 20);
        model.filters_mut().criteria_mut().date_range = DateRange::Custom {
            start: "2024-02-10".to_string(),
            end: "2024-02-01".to_string(),
        };

        assert!(model.submit_filters_at(now()).await.is_err());
        assert!(api.queries.lock().unwrap().is_empty());
        assert!(matches!(
            model.notice(),
            Some(Notice::Field {
                field: "date_range",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn editing_filters_alone_never_fetches() {
        let api = Arc::new(RecordingApi::default());
        let mut model = CallLogViewModel::new(api.clone(), 20);
        model.filters_mut().criteria_mut().search = "Ada".to_string();
        model.filters_mut().criteria_mut().cycle_status();
        assert!(api.queries.lock().unwrap().is_empty());

        model.submit_filters_at(now()).await.unwrap();
        let queries = api.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].customer_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn paging_reuses_the_submitted_query() {
        let api = Arc::new(RecordingApi::default());
        let mut model = CallLogViewModel::new(api.clone(), 20);
        model.filters_mut().criteria_mut().date_range = DateRange::Last24h;
        model.submit_filters_at(now()).await.unwrap();

        model.next_page().await.unwrap();

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].page, 2);
        assert_eq!(queries[1].date_from, queries[0].date_from);
    }

    #[tokio::test]
    async fn paging_follows_shown_rows_after_rejected_submit() {
        let api = Arc::new(RecordingApi::default());
        let mut model = CallLogViewModel::new(api.clone(), 20);
        model.submit_filters_at(now()).await.unwrap();
        model.next_page().await.unwrap();

        model.filters_mut().set_criteria(crate::view::FilterCriteria {
            date_range: DateRange::Custom {
                start: "2024-02-10".to_string(),
                end: "2024-02-01".to_string(),
            },
            ..Default::default()
        });
        assert!(model.submit_filters_at(now()).await.is_err());

        model.next_page().await.unwrap();
        model.previous_page().await.unwrap();

        let pages: Vec<u32> = api.queries.lock().unwrap().iter().map(|q| q.page).collect();
        assert_eq!(pages, [1, 2, 3, 2]);
    }

    #[tokio::test]
    async fn list_failure_surfaces_generic_notice_and_keeps_old_rows() {
        let api = Arc::new(RecordingApi {
            fail_list: true,
            ..RecordingApi::default()
        });
        let mut model = CallLogViewModel::new(api, 20);

        assert!(model.submit_filters_at(now()).await.is_err());
        assert!(model.rows().is_empty());
        assert_eq!(
            model.notice(),
            Some(&Notice::Error(crate::TRANSPORT_FAILURE_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn detail_failure_returns_no_view() {
        let mut model = CallLogViewModel::new(Arc::new(RecordingApi::default()), 20);
        let result = model.open_detail("A").await;
        assert!(matches!(result, Err(CrmError::Parse(_))));
        assert_eq!(
            model.notice(),
            Some(&Notice::Error(crate::PARSE_FAILURE_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn refused_retry_shows_server_message_without_refresh() {
        let api = Arc::new(RecordingApi::default());
        let mut model = CallLogViewModel::new(api.clone(), 20);

        let outcome = model.retry("B", &Preconfirmed(true)).await;

        assert_eq!(outcome.message(), Some("Phone number required"));
        assert_eq!(
            model.notice(),
            Some(&Notice::Error("Phone number required".to_string()))
        );
        assert!(api.queries.lock().unwrap().is_empty());
    }
}

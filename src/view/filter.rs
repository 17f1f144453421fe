//! Filter state for the call list

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::api::{CallQuery, CallStatus};
use crate::{CrmError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time window applied to the call list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateRange {
    Last24h,
    Last7d,
    Last30d,
    #[default]
    All,
    /// Operator-entered `YYYY-MM-DD` bounds, validated on submit
    Custom { start: String, end: String },
}

impl DateRange {
    /// Preset ranges in the order the UI cycles through them
    pub const PRESETS: [DateRange; 4] = [
        DateRange::Last24h,
        DateRange::Last7d,
        DateRange::Last30d,
        DateRange::All,
    ];

    pub fn from_preset(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" => Some(Self::Last24h),
            "7d" => Some(Self::Last7d),
            "30d" => Some(Self::Last30d),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last24h => "Last 24 hours",
            Self::Last7d => "Last 7 days",
            Self::Last30d => "Last 30 days",
            Self::All => "All time",
            Self::Custom { .. } => "Custom range",
        }
    }

    /// Next preset after this one; a custom range cycles back to the first preset.
    pub fn next_preset(&self) -> Self {
        match self {
            Self::Last24h => Self::Last7d,
            Self::Last7d => Self::Last30d,
            Self::Last30d => Self::All,
            Self::All | Self::Custom { .. } => Self::Last24h,
        }
    }

    fn lookback(&self) -> Option<Duration> {
        match self {
            Self::Last24h => Some(Duration::hours(24)),
            Self::Last7d => Some(Duration::days(7)),
            Self::Last30d => Some(Duration::days(30)),
            Self::All | Self::Custom { .. } => None,
        }
    }
}

/// What the operator has typed or selected; nothing is sent until submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub status: Option<CallStatus>,
    pub date_range: DateRange,
    pub search: String,
}

impl FilterCriteria {
    /// Cycle the status filter: all -> initiated -> ... -> failed -> all
    pub fn cycle_status(&mut self) {
        self.status = match &self.status {
            None => Some(CallStatus::FILTERABLE[0].clone()),
            Some(current) => CallStatus::FILTERABLE
                .iter()
                .position(|s| s == current)
                .and_then(|i| CallStatus::FILTERABLE.get(i + 1))
                .cloned(),
        };
    }
}

/// Holds the current criteria and paging, and turns them into a query on submit
#[derive(Debug, Clone)]
pub struct FilterState {
    criteria: FilterCriteria,
    page: u32,
    per_page: u32,
}

impl FilterState {
    pub fn new(per_page: u32) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: 1,
            per_page: per_page.clamp(1, crate::api::types::MAX_PER_PAGE),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Edit the criteria. Editing resets to the first page.
    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        self.page = 1;
        &mut self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.page = 1;
        self.criteria = criteria;
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Validate the criteria and build the list query.
    ///
    /// `now` anchors the relative ranges so the same criteria and clock
    /// always produce the same query.
    pub fn submit(&self, now: DateTime<Utc>) -> Result<CallQuery> {
        let (date_from, date_to) = match &self.criteria.date_range {
            DateRange::Custom { start, end } => {
                let (start, end) = validate_custom_range(start, end)?;
                (Some(start), Some(end))
            }
            range => (
                range.lookback().map(|back| (now - back).to_rfc3339()),
                None,
            ),
        };

        let (customer_name, phone_number) = route_search(&self.criteria.search);

        Ok(CallQuery {
            status: self.criteria.status.clone(),
            date_from,
            date_to,
            customer_name,
            phone_number,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

/// Check a `YYYY-MM-DD` pair and return the trimmed bounds.
pub fn validate_custom_range(start: &str, end: &str) -> Result<(String, String)> {
    let start = start.trim();
    let end = end.trim();

    let start_date = parse_date("start_date", "Start date", start)?;
    let end_date = parse_date("end_date", "End date", end)?;

    if start_date > end_date {
        return Err(CrmError::validation(
            "date_range",
            "Start date must be on or before end date",
        ));
    }

    Ok((start.to_string(), end.to_string()))
}

fn parse_date(field: &'static str, label: &str, value: &str) -> Result<NaiveDate> {
    if value.is_empty() {
        return Err(CrmError::validation(field, format!("{} is required", label)));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        CrmError::validation(field, format!("{} must be a date like 2024-02-01", label))
    })
}

/// Phone-looking text searches phone numbers; anything else searches names.
fn route_search(search: &str) -> (Option<String>, Option<String>) {
    let search = search.trim();
    if search.is_empty() {
        return (None, None);
    }

    let looks_like_phone = search.chars().any(|c| c.is_ascii_digit())
        && search
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));

    if looks_like_phone {
        (None, Some(search.to_string()))
    } else {
        (Some(search.to_string()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()
    }

    fn custom(start: &str, end: &str) -> FilterState {
        let mut state = FilterState::new(20);
        state.criteria_mut().date_range = DateRange::Custom {
            start: start.to_string(),
            end: end.to_string(),
        };
        state
    }

    #[test]
    fn reversed_custom_range_is_rejected() {
        let err = custom("2024-02-10", "2024-02-01").submit(now()).unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "date_range", .. }));
    }

    #[test]
    fn valid_custom_range_passes_dates_through_exactly() {
        let query = custom("2024-02-01", "2024-02-10").submit(now()).unwrap();
        assert_eq!(query.date_from.as_deref(), Some("2024-02-01"));
        assert_eq!(query.date_to.as_deref(), Some("2024-02-10"));
    }

    #[test]
    fn same_day_custom_range_is_valid() {
        assert!(custom("2024-02-01", "2024-02-01").submit(now()).is_ok());
    }

    #[test]
    fn empty_or_malformed_custom_dates_are_rejected() {
        let err = custom("", "2024-02-10").submit(now()).unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "start_date", .. }));

        let err = custom("2024-02-01", "02/10/2024").submit(now()).unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "end_date", .. }));

        let err = custom("2024-02-30", "2024-03-01").submit(now()).unwrap_err();
        assert!(matches!(err, CrmError::Validation { field: "start_date", .. }));
    }

    #[test]
    fn relative_ranges_are_anchored_to_the_clock() {
        let mut state = FilterState::new(20);
        state.criteria_mut().date_range = DateRange::Last7d;

        let query = state.submit(now()).unwrap();
        assert_eq!(query.date_from.as_deref(), Some("2024-02-08T12:00:00+00:00"));
        assert_eq!(query.date_to, None);
        assert_eq!(state.submit(now()).unwrap(), query);
    }

    #[test]
    fn all_time_sends_no_dates() {
        let query = FilterState::new(20).submit(now()).unwrap();
        assert_eq!(query.date_from, None);
        assert_eq!(query.date_to, None);
    }

    #[test]
    fn search_is_routed_by_shape() {
        let mut state = FilterState::new(20);
        state.criteria_mut().search = "  +1 (555) 010-2030 ".to_string();
        let query = state.submit(now()).unwrap();
        assert_eq!(query.phone_number.as_deref(), Some("+1 (555) 010-2030"));
        assert_eq!(query.customer_name, None);

        state.criteria_mut().search = "Ada 2".to_string();
        let query = state.submit(now()).unwrap();
        assert_eq!(query.customer_name.as_deref(), Some("Ada 2"));
        assert_eq!(query.phone_number, None);
    }

    #[test]
    fn editing_criteria_resets_paging() {
        let mut state = FilterState::new(20);
        state.set_page(3);
        state.criteria_mut().cycle_status();
        assert_eq!(state.page(), 1);
        assert_eq!(state.criteria().status, Some(CallStatus::Initiated));
    }

    #[test]
    fn status_cycle_wraps_back_to_all() {
        let mut criteria = FilterCriteria::default();
        for _ in 0..CallStatus::FILTERABLE.len() {
            criteria.cycle_status();
        }
        assert_eq!(criteria.status, Some(CallStatus::Failed));
        criteria.cycle_status();
        assert_eq!(criteria.status, None);
    }
}

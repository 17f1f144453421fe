//! Wire types for the CRM backend API

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a logged call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CallStatus {
    /// Dispatch created, not yet answered
    #[default]
    Initiated,
    /// Customer picked up
    Connected,
    /// Call finished normally
    Completed,
    /// Call could not be placed or dropped with an error
    Failed,
    /// Any status the backend reports that we do not know about
    Other(String),
}

impl CallStatus {
    /// The statuses an operator can filter on.
    pub const FILTERABLE: [CallStatus; 4] = [
        CallStatus::Initiated,
        CallStatus::Connected,
        CallStatus::Completed,
        CallStatus::Failed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initiated => "initiated",
            Self::Connected => "connected",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }

    /// Lenient decoding used for backend payloads.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "initiated" => Self::Initiated,
            "connected" => Self::Connected,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Title-cased label for display
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing used for operator input: only the known statuses are valid filters.
impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match Self::parse(s) {
            Self::Other(raw) => Err(format!(
                "unknown status '{}'. Expected one of: initiated, connected, completed, failed",
                raw
            )),
            status => Ok(status),
        }
    }
}

impl Serialize for CallStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CallStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::parse(&s)).unwrap_or_default())
    }
}

/// One logged call, as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Opaque identifier used for detail and retry lookups
    pub call_id: String,

    #[serde(default, deserialize_with = "empty_if_null")]
    pub customer_name: String,

    #[serde(default, deserialize_with = "empty_if_null")]
    pub customer_phone: String,

    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: CallStatus,

    /// Call length in seconds; absent for calls that never connected
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<u64>,
}

impl CallRecord {
    /// Duration for display; absent counts as zero.
    pub fn duration_or_zero(&self) -> u64 {
        self.duration_seconds.unwrap_or(0)
    }
}

/// A single call with the extended fields only the detail endpoint returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecordDetail {
    #[serde(flatten)]
    pub record: CallRecord,

    #[serde(default, rename = "customer_email", alias = "email")]
    pub email: Option<String>,

    #[serde(default)]
    pub room_name: Option<String>,

    #[serde(default)]
    pub dispatch_id: Option<String>,

    /// What the customer asked for when the call was requested
    #[serde(default, rename = "customer_query", alias = "query")]
    pub query: Option<String>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub call_started_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub call_ended_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub transcript: Option<String>,

    #[serde(default)]
    pub recording_url: Option<String>,

    #[serde(default)]
    pub events: Vec<CallEvent>,
}

/// Lifecycle event attached to a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    pub event_type: String,

    #[serde(default)]
    pub event_data: Option<serde_json::Value>,

    #[serde(default, alias = "timestamp", deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Pagination envelope shared by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            total: 0,
            pages: 0,
        }
    }
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of the call list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallPage {
    #[serde(default)]
    pub calls: Vec<CallRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Body of `POST /api/retry-failed-call`
#[derive(Debug, Serialize)]
pub struct RetryRequest<'a> {
    pub call_id: &'a str,
}

/// Result of asking the backend to re-dispatch a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub dispatch_id: Option<String>,
}

/// Normalized query for the call list and calls export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallQuery {
    pub status: Option<CallStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Largest page the backend will serve
pub const MAX_PER_PAGE: u32 = 100;

impl Default for CallQuery {
    fn default() -> Self {
        Self {
            status: None,
            date_from: None,
            date_to: None,
            customer_name: None,
            phone_number: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl CallQuery {
    /// Filter parameters only, as sent to the export endpoint
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(name) = &self.customer_name {
            pairs.push(("customer_name", name.clone()));
        }
        if let Some(phone) = &self.phone_number {
            pairs.push(("phone_number", phone.clone()));
        }
        if let Some(from) = &self.date_from {
            pairs.push(("date_from", from.clone()));
        }
        if let Some(to) = &self.date_to {
            pairs.push(("date_to", to.clone()));
        }
        pairs
    }

    /// Filter and pagination parameters, as sent to the list endpoint
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.clamp(1, MAX_PER_PAGE).to_string()),
        ];
        pairs.extend(self.filter_pairs());
        pairs
    }
}

/// Customer list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for CustomerQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl CustomerQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.clamp(1, MAX_PER_PAGE).to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        pairs
    }
}

/// A CRM customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub name: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub call_count: u64,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of the customer list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPage {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// A call in a customer's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCall {
    pub call_id: String,
    #[serde(default)]
    pub status: CallStatus,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub call_started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub call_ended_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "duration", alias = "duration_seconds")]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A customer with every call placed to their phone, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCalls {
    pub customer: Customer,
    #[serde(default)]
    pub calls: Vec<CustomerCall>,
}

/// Date window for the metrics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl MetricsRange {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = &self.start_date {
            pairs.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_date", end.clone()));
        }
        pairs
    }
}

/// Aggregates behind the analytics page
///
/// The backend has served two shapes over time (a dashboard shape with
/// `daily_stats` and a monitoring shape with flat totals), so every field
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(default)]
    pub daily_stats: Option<DailyStats>,
    #[serde(default)]
    pub call_distribution: Vec<StatusCount>,
    #[serde(default)]
    pub customer_growth: Vec<DateCount>,
    #[serde(default)]
    pub period_days: Option<u32>,
    #[serde(default)]
    pub total_calls: Option<u64>,
    #[serde(default)]
    pub successful_calls: Option<u64>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub average_duration: Option<f64>,
    #[serde(default)]
    pub unique_customers: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub successful_calls: u64,
    #[serde(default)]
    pub failed_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: CallStatus,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: String,
    #[serde(default)]
    pub count: u64,
}

/// Headline counters for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub active_calls: u64,
    #[serde(default)]
    pub recent_calls_24h: u64,
}

/// Which CSV export to download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Calls,
    Customers,
}

impl ExportKind {
    pub fn path_segments(&self) -> &'static [&'static str] {
        match self {
            Self::Calls => &["api", "export", "calls"],
            Self::Customers => &["api", "customers", "export"],
        }
    }

    /// Default file name, e.g. `calls_export_20240201_101500.csv`
    pub fn file_name(&self, at: DateTime<chrono::Local>) -> String {
        let prefix = match self {
            Self::Calls => "calls",
            Self::Customers => "customers",
        };
        format!("{}_export_{}.csv", prefix, at.format("%Y%m%d_%H%M%S"))
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn empty_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 and the offset-less ISO form the backend emits for UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
    }
}

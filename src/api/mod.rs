//! CRM backend API
//!
//! Typed access to the JSON endpoints behind the operator dashboard.

mod client;
mod http;
pub mod types;

pub use client::CallApi;
pub use http::HttpCrmClient;
pub use types::{
    CallEvent, CallPage, CallQuery, CallRecord, CallRecordDetail, CallStatus, Customer,
    CustomerCall, CustomerCalls, CustomerPage, CustomerQuery, DashboardStats, ExportKind,
    MetricsRange, MetricsSummary, Pagination, RetryResult,
};

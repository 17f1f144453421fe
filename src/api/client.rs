use async_trait::async_trait;

use crate::api::types::{CallPage, CallQuery, CallRecordDetail, RetryResult};
use crate::Result;

/// The call endpoints the call log view depends on.
///
/// Every method performs exactly one request. Transport and parse failures
/// come back as `Err`; a retry the backend refuses comes back as
/// `Ok(RetryResult { success: false, .. })`.
#[async_trait]
pub trait CallApi: Send + Sync {
    async fn fetch_call_list(&self, query: &CallQuery) -> Result<CallPage>;

    async fn fetch_call_detail(&self, call_id: &str) -> Result<CallRecordDetail>;

    async fn retry_call(&self, call_id: &str) -> Result<RetryResult>;
}

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::client::CallApi;
use crate::api::types::{
    CallPage, CallQuery, CallRecordDetail, CustomerCalls, CustomerPage, CustomerQuery, DashboardStats,
    ExportKind, MetricsRange, MetricsSummary, RetryRequest, RetryResult,
};
use crate::config::Settings;
use crate::{CrmError, Result, APP_NAME, VERSION};

const API_KEY_HEADER: &str = "X-API-Key";

/// reqwest-backed client for the CRM backend
#[derive(Clone)]
pub struct HttpCrmClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpCrmClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Self::new(
            &settings.api.base_url,
            Duration::from_secs(settings.api.timeout_secs.max(1)),
        )?;

        let api_key = settings.api.api_key.trim();
        if api_key.is_empty() {
            Ok(client)
        } else {
            Ok(client.with_api_key(api_key))
        }
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let raw = base_url.trim();
        if raw.is_empty() {
            return Err(CrmError::Config(
                "api.base_url is empty. Set it in config or VOICECRM_API_URL.".to_string(),
            ));
        }

        let base_url = Url::parse(raw)
            .map_err(|e| CrmError::Config(format!("Invalid api.base_url '{}': {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CrmError::Config(format!(
                "api.base_url '{}' is not an http(s) URL",
                raw
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", APP_NAME, VERSION))
            .build()
            .map_err(|e| CrmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: None,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Customers, newest first
    pub async fn fetch_customers(&self, query: &CustomerQuery) -> Result<CustomerPage> {
        let url = self.endpoint(&["api", "customers"])?;
        let request = self.request(Method::GET, url).query(&query.to_pairs());
        self.send_json(request, "customer list").await
    }

    /// One customer and their call history
    pub async fn fetch_customer_calls(&self, customer_id: i64) -> Result<CustomerCalls> {
        let id = customer_id.to_string();
        let url = self.endpoint(&["api", "customers", &id, "calls"])?;
        self.send_json(self.request(Method::GET, url), "customer calls")
            .await
    }

    pub async fn fetch_metrics_summary(&self, range: &MetricsRange) -> Result<MetricsSummary> {
        let url = self.endpoint(&["api", "metrics", "summary"])?;
        let request = self.request(Method::GET, url).query(&range.to_pairs());
        self.send_json(request, "metrics summary").await
    }

    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats> {
        let url = self.endpoint(&["api", "dashboard-stats"])?;
        self.send_json(self.request(Method::GET, url), "dashboard stats")
            .await
    }

    /// Download a CSV export as raw bytes. Call filters apply only to the calls export.
    pub async fn download_export(
        &self,
        kind: ExportKind,
        filters: Option<&CallQuery>,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint(kind.path_segments())?;
        let mut request = self.request(Method::GET, url);
        if let (ExportKind::Calls, Some(query)) = (kind, filters) {
            request = request.query(&query.filter_pairs());
        }

        let response = self.send(request, "export").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CrmError::transport(format!("Failed to read export body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                CrmError::Config(format!("api.base_url '{}' cannot take a path", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = url.path(), "CRM API request");
        let request = self.http.request(method, url);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "{} request failed", what);
            if e.is_timeout() {
                CrmError::transport(format!("{} request timed out", what))
            } else {
                CrmError::transport(format!("{} request failed: {}", what, e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("no reason").to_string());

        warn!(status = status.as_u16(), %detail, "{} returned an error status", what);
        Err(CrmError::Transport {
            status: Some(status.as_u16()),
            message: format!("{} returned {}: {}", what, status, detail),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request, what).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CrmError::transport(format!("Failed to read {} body: {}", what, e)))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "{} response was not valid JSON", what);
            CrmError::Parse(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl CallApi for HttpCrmClient {
    async fn fetch_call_list(&self, query: &CallQuery) -> Result<CallPage> {
        let url = self.endpoint(&["api", "calls"])?;
        let request = self.request(Method::GET, url).query(&query.to_pairs());
        self.send_json(request, "call list").await
    }

    async fn fetch_call_detail(&self, call_id: &str) -> Result<CallRecordDetail> {
        let url = self.endpoint(&["api", "calls", call_id])?;
        self.send_json(self.request(Method::GET, url), "call detail")
            .await
    }

    async fn retry_call(&self, call_id: &str) -> Result<RetryResult> {
        let url = self.endpoint(&["api", "retry-failed-call"])?;
        let request = self
            .request(Method::POST, url)
            .json(&RetryRequest { call_id });
        self.send_json(request, "retry").await
    }
}

/// Error envelope the backend uses for non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpCrmClient {
        HttpCrmClient::new(base, Duration::from_secs(5)).expect("valid base url")
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let client = client("http://localhost:8080/crm/");
        let url = client.endpoint(&["api", "calls"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/crm/api/calls");
    }

    #[test]
    fn call_ids_are_percent_encoded_in_paths() {
        let client = client("http://localhost:8080");
        let url = client.endpoint(&["api", "calls", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/calls/a%2Fb%20c");
    }

    #[test]
    fn empty_or_invalid_base_url_is_a_config_error() {
        assert!(matches!(
            HttpCrmClient::new("  ", Duration::from_secs(1)),
            Err(CrmError::Config(_))
        ));
        assert!(matches!(
            HttpCrmClient::new("not a url", Duration::from_secs(1)),
            Err(CrmError::Config(_))
        ));
    }

    #[test]
    fn settings_api_key_is_applied() {
        let mut settings = Settings::default();
        settings.api.api_key = " secret ".to_string();
        let client = HttpCrmClient::from_settings(&settings).unwrap();
        assert_eq!(client.api_key.as_deref(), Some("secret"));
    }
}

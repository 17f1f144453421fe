use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voicecrm::api::HttpCrmClient;
use voicecrm::view::{
    BadgeClass, CallLogViewModel, Notice, Preconfirmed, RetryOutcome, RowAction, PLACEHOLDER,
};

async fn mount_call_list(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/api/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [
                {
                    "call_id": "A",
                    "customer_name": "Ada",
                    "customer_phone": "555-0100",
                    "created_at": "2024-02-01T10:15:00",
                    "status": "completed",
                    "duration_seconds": 42
                },
                {
                    "call_id": "B",
                    "customer_name": "Bob",
                    "customer_phone": "555-0101",
                    "created_at": "2024-02-01T11:00:00",
                    "status": "failed"
                }
            ],
            "pagination": {"page": 1, "per_page": 20, "total": 2, "pages": 1}
        })))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

fn view_model(server: &MockServer) -> CallLogViewModel<HttpCrmClient> {
    let client = HttpCrmClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    CallLogViewModel::new(Arc::new(client), 20)
}

#[tokio::test]
async fn successful_retry_refreshes_the_list_exactly_once() {
    let server = MockServer::start().await;
    mount_call_list(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/api/retry-failed-call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "dispatch_id": "dispatch_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = view_model(&server);
    model.submit_filters().await.unwrap();

    let rows = model.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].call_id, "A");
    assert_eq!(rows[0].badge, BadgeClass::Success);
    assert_eq!(rows[0].actions, vec![RowAction::View]);
    assert_eq!(rows[1].badge, BadgeClass::Danger);
    assert!(rows[1].can_retry());

    let outcome = model.retry("B", &Preconfirmed(true)).await;

    assert_eq!(
        outcome,
        RetryOutcome::Succeeded {
            message: "ok".to_string()
        }
    );
    assert_eq!(model.notice(), Some(&Notice::Info("ok".to_string())));

    let requests = server.received_requests().await.unwrap();
    let sequence: Vec<(String, String)> = requests
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect();
    assert_eq!(
        sequence,
        [
            ("GET".to_string(), "/api/calls".to_string()),
            ("POST".to_string(), "/api/retry-failed-call".to_string()),
            ("GET".to_string(), "/api/calls".to_string()),
        ]
    );
}

#[tokio::test]
async fn refused_retry_shows_server_message_and_does_not_refresh() {
    let server = MockServer::start().await;
    mount_call_list(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/retry-failed-call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "X"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = view_model(&server);
    model.submit_filters().await.unwrap();
    let outcome = model.retry("B", &Preconfirmed(true)).await;

    assert_eq!(outcome.message(), Some("X"));
    assert_eq!(model.notice(), Some(&Notice::Error("X".to_string())));
}

#[tokio::test]
async fn declined_retry_sends_nothing() {
    let server = MockServer::start().await;
    mount_call_list(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/retry-failed-call"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut model = view_model(&server);
    model.submit_filters().await.unwrap();

    assert_eq!(
        model.retry("B", &Preconfirmed(false)).await,
        RetryOutcome::Declined
    );
    assert_eq!(model.notice(), None);
}

#[tokio::test]
async fn server_error_on_retry_shows_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/retry-failed-call"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = view_model(&server);
    let outcome = model.retry("B", &Preconfirmed(true)).await;

    assert_eq!(outcome.message(), Some(voicecrm::TRANSPORT_FAILURE_MESSAGE));
}

#[tokio::test]
async fn detail_view_fills_missing_fields_with_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calls/B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "call_id": "B",
            "customer_name": "Bob",
            "customer_phone": "555-0101",
            "customer_email": "",
            "created_at": "2024-02-01T11:00:00",
            "status": "failed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = view_model(&server);
    let view = model.open_detail("B").await.unwrap();

    assert_eq!(view.value("Email"), Some(PLACEHOLDER));
    assert_eq!(view.value("Query"), Some(PLACEHOLDER));
    assert_eq!(view.value("Room Name"), Some(PLACEHOLDER));
    assert_eq!(view.value("Status"), Some("Failed"));
    assert_eq!(view.badge, BadgeClass::Danger);
}

#[tokio::test]
async fn missing_call_produces_no_detail_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calls/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Call not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = view_model(&server);

    assert!(model.open_detail("missing").await.is_err());
    assert!(matches!(model.notice(), Some(Notice::Error(_))));
}

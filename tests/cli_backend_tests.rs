mod common;

use common::TestEnv;
use serde_json::json;
use std::process::Output;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(env: TestEnv, args: &'static [&'static str]) -> (TestEnv, Output) {
    tokio::task::spawn_blocking(move || {
        let output = env.run(args);
        (env, output)
    })
    .await
    .expect("binary runner panicked")
}

async fn mount_calls(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [
                {"call_id": "A", "customer_name": "Ada", "customer_phone": "555-0100",
                 "created_at": "2024-02-01T10:15:00", "status": "completed", "duration_seconds": 42},
                {"call_id": "B", "customer_name": "Bob", "customer_phone": "555-0101",
                 "created_at": "2024-02-01T11:00:00", "status": "failed"}
            ],
            "pagination": {"page": 1, "per_page": 20, "total": 2, "pages": 1}
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn calls_list_prints_rows_with_retry_only_for_failed() {
    let server = MockServer::start().await;
    mount_calls(&server).await;

    let env = TestEnv::new().with_api_url(server.uri());
    let (_env, output) = run(env, &["calls", "list"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "calls list should succeed\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let line_a = stdout.lines().find(|l| l.starts_with("A ")).unwrap();
    let line_b = stdout.lines().find(|l| l.starts_with("B ")).unwrap();
    assert!(line_a.contains("Completed") && !line_a.contains("Retry"));
    assert!(line_b.contains("Failed") && line_b.contains("Retry"));
    assert!(stdout.contains("Page 1 of 1 (2 calls)"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn calls_retry_with_yes_skips_prompt() {
    let server = MockServer::start().await;
    mount_calls(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/retry-failed-call"))
        .and(body_json(json!({"call_id": "B"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Call retry initiated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new().with_api_url(server.uri());
    let (_env, output) = run(env, &["calls", "retry", "B", "--yes"]).await;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Call retry initiated successfully"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn export_writes_csv_bytes_to_output_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/calls"))
        .and(query_param("status", "failed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Call ID\nB\n"))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new().with_api_url(server.uri());
    let (env, output) = run(
        env,
        &["export", "calls", "--status", "failed", "--output", "out/calls.csv"],
    )
    .await;

    assert!(
        output.status.success(),
        "export should succeed\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written = std::fs::read_to_string(env.home().join("out/calls.csv")).unwrap();
    assert_eq!(written, "Call ID\nB\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn customers_calls_prints_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/7/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customer": {"id": 7, "name": "Ada", "phone": "555-0100"},
            "calls": [{"call_id": "A", "status": "completed", "duration": 42, "summary": "Billing"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new().with_api_url(server.uri());
    let (_env, output) = run(env, &["customers", "calls", "7"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Customer 7: Ada"));
    let line = stdout.lines().find(|l| l.starts_with("A ")).unwrap();
    assert!(line.contains("Completed") && line.contains("Billing"));
}

/// Integration tests for the bulk ticket importer
///
/// Test coverage:
/// - Successful `create_many` submission
/// - Bounded retries on 429
/// - Retry counter reset after a non-429 response
/// - Default wait when `Retry-After` is missing
/// - Non-200 responses carrying the body text
/// - Cancellation while waiting out a rate limit
use std::time::Duration;

use mockito::{Matcher, Server};
use tokio_util::sync::CancellationToken;
use zendesk_connector::domain::models::ConnectionConfig;
use zendesk_connector::domain::ports::TicketWriter;
use zendesk_connector::{BulkImporter, ChangeRecord, ConnectorError, ZendeskClient};

const CREATE_MANY_PATH: &str = "/api/v2/imports/tickets/create_many";

fn importer_for(server: &Server, max_retries: u32) -> BulkImporter {
    let config = ConnectionConfig {
        domain: "acme".to_string(),
        user_name: "agent@acme.test".to_string(),
        api_token: "secret".to_string(),
        base_url: Some(server.url()),
    };
    let client = ZendeskClient::from_config(&config).expect("Failed to create client");
    BulkImporter::new(client, max_retries)
}

fn dummy_tickets() -> Vec<ChangeRecord> {
    vec![ChangeRecord::new(
        "1",
        serde_json::json!({
            "assignee_id": 1,
            "subject": "Help",
            "description": "A description",
            "comments": [{ "author_id": 1, "value": "This is a comment" }]
        })
        .to_string()
        .into_bytes(),
    )]
}

fn job_status_body() -> String {
    serde_json::json!({
        "job_status": {
            "id": "8b726e606741012ffc2d782bcb7848fe",
            "status": "queued",
            "url": "https://acme.zendesk.com/api/v2/job_statuses/8b726e606741012ffc2d782bcb7848fe.json"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_write_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CREATE_MANY_PATH)
        .match_header("content-type", "application/json; charset=UTF-8")
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "tickets": [{ "subject": "Help" }]
        })))
        .with_status(200)
        .with_body(job_status_body())
        .expect(1)
        .create_async()
        .await;

    let mut importer = importer_for(&server, 3);
    importer
        .write(&dummy_tickets(), &CancellationToken::new())
        .await
        .expect("write failed");
    mock.assert_async().await;
    assert_eq!(importer.retry_count(), 0);
}

#[tokio::test]
async fn test_rate_limit_retries_are_bounded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(429)
        .with_header("Retry-After", "0")
        .expect(2)
        .create_async()
        .await;

    let mut importer = importer_for(&server, 1);
    let err = importer
        .write(&dummy_tickets(), &CancellationToken::new())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ConnectorError::RateLimitExceeded { retry_count: 1 }));
    assert_eq!(err.to_string(), "rate-limit exceeded, total retries: 1");
}

#[tokio::test]
async fn test_retry_count_resets_after_success() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(429)
        .with_header("Retry-After", "0")
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(200)
        .with_body(job_status_body())
        .expect(1)
        .create_async()
        .await;

    let mut importer = importer_for(&server, 3);
    importer
        .write(&dummy_tickets(), &CancellationToken::new())
        .await
        .expect("write should succeed after one retry");

    limited.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(importer.retry_count(), 0);
}

#[tokio::test]
async fn test_missing_retry_after_uses_default_wait() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(200)
        .with_body(job_status_body())
        .expect(1)
        .create_async()
        .await;

    let mut importer =
        importer_for(&server, 3).with_default_retry_after(Duration::from_millis(10));
    tokio::time::timeout(
        Duration::from_secs(5),
        importer.write(&dummy_tickets(), &CancellationToken::new()),
    )
    .await
    .expect("default wait should be short")
    .expect("write should succeed after the default wait");

    limited.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(importer.retry_count(), 0);
}

#[tokio::test]
async fn test_unexpected_status_includes_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(500)
        .with_body("some_dummy_error")
        .create_async()
        .await;

    let mut importer = importer_for(&server, 3);
    let err = importer
        .write(&dummy_tickets(), &CancellationToken::new())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("some_dummy_error"), "{message}");
}

#[tokio::test]
async fn test_cancelled_while_rate_limited() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", CREATE_MANY_PATH)
        .with_status(429)
        .with_header("Retry-After", "60")
        .create_async()
        .await;

    let mut importer = importer_for(&server, 3);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = importer.write(&dummy_tickets(), &cancel).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Cancelled));
}

#[tokio::test]
async fn test_write_after_stop() {
    let server = Server::new_async().await;
    let mut importer = importer_for(&server, 3);
    importer.stop().await;

    let err = importer
        .write(&dummy_tickets(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::NotOpened));
}

#[tokio::test]
async fn test_non_object_payload_is_rejected() {
    let server = Server::new_async().await;
    let mut importer = importer_for(&server, 3);
    let records = vec![ChangeRecord::new("1", b"[1,2,3]".to_vec())];

    let err = importer
        .write(&records, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Serialization(_)));
}

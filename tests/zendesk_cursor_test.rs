/// Integration tests for the incremental export cursor
///
/// Test coverage:
/// - Normalizing a page into change records
/// - `after_url` continuation taking precedence over `start_time`
/// - 429 cool-down with `Retry-After`, including unusable values
/// - Non-200 responses
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockito::{Matcher, Server};
use zendesk_connector::domain::models::ConnectionConfig;
use zendesk_connector::domain::ports::TicketCursor;
use zendesk_connector::{ConnectorError, Operation, Position, ZendeskClient, ZendeskCursor};


fn client_for(server: &Server) -> ZendeskClient {
    let config = ConnectionConfig {
        domain: "acme".to_string(),
        user_name: "agent@acme.test".to_string(),
        api_token: "secret".to_string(),
        base_url: Some(server.url()),
    };
    ZendeskClient::from_config(&config).expect("Failed to create client")
}

fn export_path() -> Matcher {
    Matcher::Regex(r"^/api/v2/incremental/tickets/cursor\.json".to_string())
}

#[tokio::test]
async fn test_fetch_single_ticket_page() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", export_path())
        .match_query(Matcher::UrlEncoded("start_time".into(), "1".into()))
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "after_url": "X",
                "tickets": [{
                    "id": 1,
                    "updated_at": "2022-05-08T05:49:55Z",
                    "created_at": "2022-05-08T05:49:55Z",
                    "status": "open"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    let records = cursor.fetch_records().await.expect("fetch failed");
    mock.assert_async().await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    let modified = Utc.with_ymd_and_hms(2022, 5, 8, 5, 49, 55).unwrap();
    assert_eq!(record.key, "1");
    assert_eq!(record.position, Position::new(modified, 1));
    assert_eq!(record.operation, Operation::Create);
    assert_eq!(record.ticket_status(), Some("open"));
    assert_eq!(cursor.after_url(), Some("X"));
}

#[tokio::test]
async fn test_after_url_takes_precedence() {
    let mut server = Server::new_async().await;
    let after_url = format!("{}/continue?cursor=abc", server.url());
    let first = server
        .mock("GET", export_path())
        .with_status(200)
        .with_body(serde_json::json!({ "after_url": after_url, "tickets": [] }).to_string())
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", Matcher::Regex("^/continue".to_string()))
        .match_query(Matcher::UrlEncoded("cursor".into(), "abc".into()))
        .with_status(200)
        .with_body(r#"{"tickets":[]}"#)
        .expect(1)
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    assert!(cursor.fetch_records().await.unwrap().is_empty());

    // A later mark does not override the continuation URL.
    cursor.advance_to(Utc::now());
    assert!(cursor.fetch_records().await.unwrap().is_empty());

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(cursor.after_url(), Some(after_url.as_str()));
}

#[tokio::test]
async fn test_rate_limit_defers_next_fetch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", export_path())
        .with_status(429)
        .with_header("Retry-After", "93")
        .expect(1)
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    let before = Utc::now();
    let records = cursor.fetch_records().await.expect("429 is not an error");
    assert!(records.is_empty());

    let next_run = cursor.next_run().expect("next_run must be set");
    assert!(next_run >= before + Duration::seconds(93));

    // Still cooling down: no request goes out.
    assert!(cursor.fetch_records().await.unwrap().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_without_retry_after() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", export_path())
        .with_status(429)
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    let err = cursor.fetch_records().await.unwrap_err();
    assert!(matches!(err, ConnectorError::RetryValueUnavailable(_)));
}

#[tokio::test]
async fn test_rate_limit_with_out_of_range_retry_after() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", export_path())
        .with_status(429)
        .with_header("Retry-After", "100000000000000")
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    let err = cursor.fetch_records().await.unwrap_err();
    assert!(matches!(err, ConnectorError::RetryValueUnavailable(_)));
    assert!(cursor.next_run().is_none());
}

#[tokio::test]
async fn test_unexpected_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", export_path())
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    let err = cursor.fetch_records().await.unwrap_err();
    assert!(matches!(err, ConnectorError::UnexpectedStatus { code: 500, .. }));
    assert_eq!(err.to_string(), "non 200 status code received(500)");
}

#[tokio::test]
async fn test_start_time_follows_mark() {
    let mut server = Server::new_async().await;
    let mark = Utc.with_ymd_and_hms(2022, 5, 8, 5, 49, 55).unwrap();
    let mock = server
        .mock("GET", export_path())
        .match_query(Matcher::UrlEncoded(
            "start_time".into(),
            (mark.timestamp() + 1).to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"tickets":[]}"#)
        .create_async()
        .await;

    let mut cursor = ZendeskCursor::new(client_for(&server), DateTime::UNIX_EPOCH);
    cursor.advance_to(mark);
    assert!(cursor.fetch_records().await.unwrap().is_empty());
    mock.assert_async().await;
    assert_eq!(cursor.last_modified_time(), mark);
}

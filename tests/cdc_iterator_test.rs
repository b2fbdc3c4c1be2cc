/// Integration tests for the polling iterator
///
/// Test coverage:
/// - Stopping with a consumer blocked in `next`
/// - Polling on every period and advancing the cursor mark
/// - Empty fetches leave the mark untouched
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use zendesk_connector::{
    CdcIterator, ChangeRecord, ConnectorError, ConnectorResult, Position, RecordIterator,
    TicketCursor,
};

/// Cursor handing out one record per fetch and recording every mark.
#[derive(Default)]
struct CountingCursor {
    fetches: Arc<Mutex<u32>>,
    marks: Arc<Mutex<Vec<DateTime<Utc>>>>,
    empty: bool,
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_650_000_000 + secs, 0).unwrap()
}

#[async_trait]
impl TicketCursor for CountingCursor {
    async fn fetch_records(&mut self) -> ConnectorResult<Vec<ChangeRecord>> {
        let mut fetches = self.fetches.lock().unwrap();
        *fetches += 1;
        if self.empty {
            return Ok(Vec::new());
        }
        let id = i64::from(*fetches);
        Ok(vec![ChangeRecord::new(id.to_string(), b"{}".to_vec())
            .with_position(Position::new(at(id), id))])
    }

    fn advance_to(&mut self, last_modified: DateTime<Utc>) {
        self.marks.lock().unwrap().push(last_modified);
    }
}

#[tokio::test]
async fn test_stop_releases_blocked_next() {
    let cursor = CountingCursor {
        empty: true,
        ..CountingCursor::default()
    };
    let iterator = Arc::new(CdcIterator::new(cursor, Duration::from_secs(3600)));

    let waiting = {
        let iterator = Arc::clone(&iterator);
        tokio::spawn(async move { iterator.next(&CancellationToken::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    iterator.stop();

    let result = tokio::time::timeout(Duration::from_secs(2), waiting)
        .await
        .expect("next must return after stop")
        .expect("task panicked");
    assert!(matches!(result, Err(ConnectorError::IteratorStopped)));
    assert!(iterator.has_next(), "a stopped iterator reports its error");
}

#[tokio::test]
async fn test_polls_and_advances_mark() {
    let marks = Arc::new(Mutex::new(Vec::new()));
    let cursor = CountingCursor {
        marks: Arc::clone(&marks),
        ..CountingCursor::default()
    };
    let iterator = CdcIterator::new(cursor, Duration::from_millis(20));
    let cancel = CancellationToken::new();

    for expected in 1..=3 {
        let record = tokio::time::timeout(Duration::from_secs(2), iterator.next(&cancel))
            .await
            .expect("record should arrive")
            .unwrap();
        assert_eq!(record.key, expected.to_string());
        assert_eq!(record.position.last_modified, at(expected));
    }
    iterator.shutdown().await;

    let marks = marks.lock().unwrap();
    assert!(marks.len() >= 3);
    assert_eq!(&marks[..3], &[at(1), at(2), at(3)]);
}

#[tokio::test]
async fn test_empty_fetch_keeps_mark() {
    let fetches = Arc::new(Mutex::new(0));
    let marks = Arc::new(Mutex::new(Vec::new()));
    let cursor = CountingCursor {
        fetches: Arc::clone(&fetches),
        marks: Arc::clone(&marks),
        empty: true,
    };
    let iterator = CdcIterator::new(cursor, Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(!iterator.has_next());
    iterator.shutdown().await;

    assert!(*fetches.lock().unwrap() >= 2);
    assert!(marks.lock().unwrap().is_empty());
}

/// Cursor whose fetch panics.
struct PanickingCursor;

#[async_trait]
impl TicketCursor for PanickingCursor {
    async fn fetch_records(&mut self) -> ConnectorResult<Vec<ChangeRecord>> {
        panic!("cursor exploded")
    }

    fn advance_to(&mut self, _last_modified: DateTime<Utc>) {}
}

#[tokio::test]
async fn test_panicking_cursor_surfaces_cause() {
    let iterator = CdcIterator::new(PanickingCursor, Duration::from_millis(10));

    let err = tokio::time::timeout(Duration::from_secs(2), iterator.next(&CancellationToken::new()))
        .await
        .expect("next must return once the poll task dies")
        .unwrap_err();
    assert!(
        matches!(err, ConnectorError::TaskPanicked(ref msg) if msg.contains("poll")),
        "unexpected error: {err}"
    );
    assert!(iterator.has_next());
    iterator.shutdown().await;
}

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use zendesk_connector::domain::models::ConnectionConfig;
use zendesk_connector::{Position, ZendeskClient, ZendeskCursor};

fn cursor_at(mark: DateTime<Utc>) -> ZendeskCursor {
    let config = ConnectionConfig {
        domain: "acme".to_string(),
        user_name: "agent@acme.test".to_string(),
        api_token: "secret".to_string(),
        base_url: Some("http://127.0.0.1:9".to_string()),
    };
    ZendeskCursor::new(ZendeskClient::from_config(&config).unwrap(), mark)
}

fn rfc3339(secs: i64) -> String {
    if secs == 0 {
        "0001-01-01T00:00:00Z".to_string()
    } else {
        Utc.timestamp_opt(secs, 0).unwrap().to_rfc3339()
    }
}

proptest! {
    /// Property: an encoded position decodes to itself
    #[test]
    fn prop_position_round_trip(secs in 0i64..4_000_000_000, id in any::<i64>()) {
        let position = Position::new(Utc.timestamp_opt(secs, 0).unwrap(), id);
        let decoded = Position::decode(&position.encode().unwrap()).unwrap();
        prop_assert_eq!(decoded, position);
    }

    /// Property: normalized positions never fall below the cursor mark or
    /// move backwards within a page, whatever mix of zero timestamps it has
    #[test]
    fn prop_positions_monotonic(
        mark in 1_600_000_000i64..1_700_000_000,
        tickets in proptest::collection::vec(
            (
                prop_oneof![Just(0i64), 1_500_000_000i64..1_800_000_000],
                prop_oneof![Just(0i64), 1_500_000_000i64..1_800_000_000],
            ),
            1..20,
        ),
    ) {
        let mark = Utc.timestamp_opt(mark, 0).unwrap();
        let mut sorted: Vec<(i64, i64)> = tickets;
        // The export returns tickets ordered by updated_at; zero times sort first.
        sorted.sort_by_key(|(updated, _)| *updated);

        let raw = sorted
            .iter()
            .enumerate()
            .map(|(i, (updated, created))| {
                serde_json::json!({
                    "id": i,
                    "updated_at": rfc3339(*updated),
                    "created_at": rfc3339(*created),
                })
                .as_object()
                .cloned()
                .unwrap()
            })
            .collect();

        let records = cursor_at(mark).to_records(raw).unwrap();
        let mut previous = mark;
        for record in &records {
            let modified = record.position.last_modified;
            if modified < mark {
                // Only genuine timestamps older than the mark may sit below it.
                let original = sorted[usize::try_from(record.position.id).unwrap()].0;
                prop_assert!(original != 0);
                continue;
            }
            prop_assert!(modified >= mark);
            if sorted[usize::try_from(record.position.id).unwrap()].0 == 0 {
                prop_assert!(modified >= previous);
            }
            previous = previous.max(modified);
        }
    }
}

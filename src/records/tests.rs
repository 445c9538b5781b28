//! Tests for raw record decoding

use super::*;
use serde_json::json;

#[test]
fn test_song_record_from_feed_document() {
    let doc = json!({
        "num_songs": 1,
        "artist_id": "ARJIE2Y1187B994AB7",
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": "Line Renaud",
        "song_id": "SOUPIRU12A6D4FA1E1",
        "title": "Der Kleine Dompfaff",
        "duration": 152.92036,
        "year": 0
    });

    let record: SongMetadataRecord = serde_json::from_value(doc).unwrap();
    assert_eq!(record.song_id.as_deref(), Some("SOUPIRU12A6D4FA1E1"));
    assert_eq!(record.artist_name.as_deref(), Some("Line Renaud"));
    assert_eq!(record.year, Some(0));
    assert_eq!(record.artist_latitude, None);
    assert_eq!(record.num_songs, Some(1));
}

#[test]
fn test_song_record_missing_fields() {
    let record: SongMetadataRecord = serde_json::from_value(json!({"title": "x"})).unwrap();
    assert!(record.song_id.is_none());
    assert!(record.artist_id.is_none());
}

#[test]
fn test_event_record_camel_case() {
    let doc = json!({
        "artist": "Des'ree",
        "auth": "Logged In",
        "firstName": "Kaylee",
        "gender": "F",
        "itemInSession": 1,
        "lastName": "Summers",
        "length": 246.30812,
        "level": "free",
        "location": "Phoenix-Mesa-Scottsdale, AZ",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540344794796.0,
        "sessionId": 139,
        "song": "You Gotta Be",
        "status": 200,
        "ts": 1541106106796i64,
        "userAgent": "Mozilla/5.0",
        "userId": "8"
    });

    let event: EventRecord = serde_json::from_value(doc).unwrap();
    assert_eq!(event.user_id.as_deref(), Some("8"));
    assert_eq!(event.first_name.as_deref(), Some("Kaylee"));
    assert_eq!(event.session_id, Some(139));
    assert_eq!(event.item_in_session, Some(1));
    assert_eq!(event.ts, 1_541_106_106_796);
    assert!(event.is_song_play());
}

#[test]
fn test_event_user_id_lenient() {
    let numeric: EventRecord = serde_json::from_value(json!({"ts": 1, "userId": 42})).unwrap();
    assert_eq!(numeric.user_id.as_deref(), Some("42"));

    let blank: EventRecord = serde_json::from_value(json!({"ts": 1, "userId": ""})).unwrap();
    assert!(blank.user_id.is_none());

    let missing: EventRecord = serde_json::from_value(json!({"ts": 1})).unwrap();
    assert!(missing.user_id.is_none());
}

#[test]
fn test_event_requires_timestamp() {
    let result: Result<EventRecord, _> = serde_json::from_value(json!({"userId": "1"}));
    assert!(result.is_err());
}

#[test]
fn test_event_rejects_out_of_range_timestamp() {
    let result: Result<EventRecord, _> =
        serde_json::from_value(json!({"ts": 9_000_000_000_000_000_i64, "page": "NextSong"}));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("outside the supported date range"));
}

#[test]
fn test_is_song_play() {
    let mut event = EventRecord {
        page: Some("Home".to_string()),
        ..Default::default()
    };
    assert!(!event.is_song_play());

    event.page = Some(NEXT_SONG_PAGE.to_string());
    assert!(event.is_song_play());

    event.page = None;
    assert!(!event.is_song_play());
}

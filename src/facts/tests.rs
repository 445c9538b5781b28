//! Tests for fact resolution

use super::*;
use crate::records::EventRecord;
use crate::schema::{ArtistDimension, SongDimension};
use crate::types::SurrogateKeyStrategy;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn song(song_id: &str, title: &str, artist_id: &str) -> SongDimension {
    SongDimension {
        song_id: song_id.to_string(),
        title: Some(title.to_string()),
        artist_id: Some(artist_id.to_string()),
        year: Some(2000),
        duration: Some(200.0),
    }
}

fn artist(artist_id: &str, name: &str) -> ArtistDimension {
    ArtistDimension {
        artist_id: artist_id.to_string(),
        name: Some(name.to_string()),
        location: None,
        latitude: None,
        longitude: None,
    }
}

fn play(song: &str, artist: &str, item: i64) -> EventRecord {
    EventRecord {
        user_id: Some("26".to_string()),
        level: Some("free".to_string()),
        page: Some("NextSong".to_string()),
        ts: 1_542_241_826_796,
        song: Some(song.to_string()),
        artist: Some(artist.to_string()),
        session_id: Some(583),
        location: Some("San Jose-Sunnyvale-Santa Clara, CA".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        item_in_session: Some(item),
        ..Default::default()
    }
}

#[test]
fn test_full_match() {
    let songs = vec![song("S1", "Setanta matins", "AR5")];
    let artists = vec![artist("AR5", "Elena")];
    let events = vec![play("Setanta matins", "Elena", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);

    let fact = &out.facts[0];
    assert_eq!(fact.song_id.as_deref(), Some("S1"));
    assert_eq!(fact.artist_id.as_deref(), Some("AR5"));
    assert_eq!(fact.start_time, 1_542_241_826);
    assert_eq!(fact.year, 2018);
    assert_eq!(fact.month, 11);
    assert_eq!(fact.user_id.as_deref(), Some("26"));
    assert_eq!(fact.session_id, Some(583));
    assert_eq!(out.stats.matched_songs, 1);
    assert_eq!(out.stats.matched_artists, 1);
}

#[test]
fn test_unmatched_event_keeps_row_with_null_keys() {
    let songs = vec![song("S1", "Known", "AR1")];
    let artists = vec![artist("AR1", "Someone")];
    let events = vec![play("Unknown", "Nobody", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);
    assert!(out.facts[0].song_id.is_none());
    assert!(out.facts[0].artist_id.is_none());
    assert_eq!(out.stats.matched_songs, 0);
}

#[test]
fn test_title_match_without_artist_match() {
    let songs = vec![song("S1", "Hold On", "AR1")];
    let artists = vec![artist("AR1", "Wilson Phillips")];
    let events = vec![play("Hold On", "Someone Else", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts[0].song_id.as_deref(), Some("S1"));
    assert!(out.facts[0].artist_id.is_none());
}

#[test]
fn test_artist_name_with_other_artist_id_does_not_match() {
    let songs = vec![song("S1", "Hold On", "AR1")];
    // right name, wrong id
    let artists = vec![artist("AR2", "Wilson Phillips")];
    let events = vec![play("Hold On", "Wilson Phillips", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts[0].song_id.as_deref(), Some("S1"));
    assert!(out.facts[0].artist_id.is_none());
}

#[test]
fn test_ambiguous_title_prefers_artist_match() {
    let songs = vec![
        song("S1", "Intro", "AR1"),
        song("S2", "Intro", "AR2"),
        song("S3", "Intro", "AR3"),
    ];
    let artists = vec![artist("AR1", "A"), artist("AR2", "B"), artist("AR3", "C")];
    let events = vec![play("Intro", "B", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);
    assert_eq!(out.facts[0].song_id.as_deref(), Some("S2"));
    assert_eq!(out.facts[0].artist_id.as_deref(), Some("AR2"));
    assert_eq!(out.stats.ambiguous_titles, 1);
}

#[test]
fn test_ambiguous_title_without_artist_picks_smallest_song_id() {
    let songs = vec![song("S9", "Intro", "AR9"), song("S3", "Intro", "AR3")];
    let events = vec![play("Intro", "Unknown", 0)];

    let out = resolve_songplays(&events, &songs, &[], SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts[0].song_id.as_deref(), Some("S3"));
    assert!(out.facts[0].artist_id.is_none());
}

#[test]
fn test_duplicate_artist_rows_do_not_duplicate_facts() {
    let songs = vec![song("S1", "Intro", "AR1")];
    let artists = vec![artist("AR1", "A"), artist("AR1", "A")];
    let events = vec![play("Intro", "A", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);
    assert_eq!(out.facts[0].artist_id.as_deref(), Some("AR1"));
    assert_eq!(out.stats.ambiguous_artists, 0);
}

#[test]
fn test_conflicting_artist_rows_flagged() {
    let songs = vec![song("S1", "Intro", "AR1")];
    let mut moved = artist("AR1", "A");
    moved.location = Some("Memphis, TN".to_string());
    let artists = vec![artist("AR1", "A"), moved, artist("AR1", "A")];
    let events = vec![play("Intro", "A", 0)];

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);
    assert_eq!(out.stats.ambiguous_artists, 1);
}

#[test]
fn test_non_song_play_events_ignored() {
    let mut home = play("Intro", "A", 1);
    home.page = Some("Home".to_string());
    let events = vec![play("Intro", "A", 0), home];

    let out = resolve_songplays(&events, &[], &[], SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 1);
    assert_eq!(out.stats.events, 1);
}

#[test]
fn test_cardinality_preserved() {
    let songs = vec![song("S1", "Track 0", "AR1"), song("S2", "Track 1", "AR2")];
    let artists = vec![artist("AR1", "Band 0")];
    let events: Vec<EventRecord> = (0..87)
        .map(|i| play(&format!("Track {}", i % 3), &format!("Band {}", i % 2), i))
        .collect();

    let out = resolve_songplays(&events, &songs, &artists, SurrogateKeyStrategy::Composite);
    assert_eq!(out.facts.len(), 87);
    assert_eq!(out.stats.facts, 87);

    let keys: HashSet<i64> = out.facts.iter().map(|f| f.songplay_id).collect();
    assert_eq!(keys.len(), 87);
}

#[test]
fn test_sequential_keys() {
    let events: Vec<EventRecord> = (0..4).map(|i| play("x", "y", i)).collect();
    let out = resolve_songplays(&events, &[], &[], SurrogateKeyStrategy::Sequential);
    let keys: Vec<i64> = out.facts.iter().map(|f| f.songplay_id).collect();
    assert_eq!(keys, vec![0, 1, 2, 3]);
}

#[test]
fn test_composite_keys_stable_across_runs() {
    let songs = vec![song("S1", "x", "AR1")];
    let events: Vec<EventRecord> = (0..10).map(|i| play("x", "y", i)).collect();

    let first = resolve_songplays(&events, &songs, &[], SurrogateKeyStrategy::Composite);
    let second = resolve_songplays(&events, &songs, &[], SurrogateKeyStrategy::Composite);
    assert_eq!(first.facts, second.facts);
}

#[test]
fn test_unrepresentable_timestamp_skipped() {
    let mut bad = play("x", "y", 0);
    bad.ts = i64::MAX;

    let out = resolve_songplays(&[bad], &[], &[], SurrogateKeyStrategy::Composite);
    assert!(out.facts.is_empty());
    assert_eq!(out.stats.skipped_events, 1);
}

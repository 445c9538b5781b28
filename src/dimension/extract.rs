//! Projection of raw records into dimension rows

use super::dedup::{dedup_by_key, prefer_song, prefer_user};
use crate::records::{EventRecord, SongMetadataRecord};
use crate::schema::{ArtistDimension, SongDimension, TimeDimension, UserDimension};
use crate::timestamp::decompose;
use tracing::{debug, warn};

/// Build the `song` dimension: project, drop null `song_id`, keep one row per `song_id`
pub fn extract_songs(records: &[SongMetadataRecord]) -> Vec<SongDimension> {
    let projected: Vec<SongDimension> = records
        .iter()
        .filter_map(|r| {
            Some(SongDimension {
                song_id: r.song_id.clone()?,
                title: r.title.clone(),
                artist_id: r.artist_id.clone(),
                year: r.year,
                duration: r.duration,
            })
        })
        .collect();

    let keyed = projected.len();
    let songs = dedup_by_key(projected, |s| s.song_id.clone(), prefer_song);
    debug!(
        input = records.len(),
        null_keys = records.len() - keyed,
        duplicates = keyed - songs.len(),
        "Extracted songs"
    );
    songs
}

/// Build the `artist` dimension: one row per source document with an `artist_id`
pub fn extract_artists(records: &[SongMetadataRecord]) -> Vec<ArtistDimension> {
    records
        .iter()
        .filter_map(|r| {
            Some(ArtistDimension {
                artist_id: r.artist_id.clone()?,
                name: r.artist_name.clone(),
                location: r.artist_location.clone(),
                latitude: r.artist_latitude,
                longitude: r.artist_longitude,
            })
        })
        .collect()
}

/// Build the `user` dimension: drop null `user_id`, keep one row per `user_id`
pub fn extract_users(events: &[EventRecord]) -> Vec<UserDimension> {
    let projected: Vec<UserDimension> = events
        .iter()
        .filter_map(|e| {
            Some(UserDimension {
                user_id: e.user_id.clone()?,
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                gender: e.gender.clone(),
                level: e.level.clone(),
            })
        })
        .collect();

    let keyed = projected.len();
    let users = dedup_by_key(projected, |u| u.user_id.clone(), prefer_user);
    debug!(
        input = events.len(),
        null_keys = events.len() - keyed,
        duplicates = keyed - users.len(),
        "Extracted users"
    );
    users
}

/// Build the `time` dimension: one row per event, in event order
pub fn extract_time(events: &[EventRecord]) -> Vec<TimeDimension> {
    events
        .iter()
        .filter_map(|e| {
            let Some(parts) = decompose(e.ts) else {
                warn!(ts = e.ts, "Skipping event with unrepresentable timestamp");
                return None;
            };
            Some(TimeDimension {
                start_time: parts.start_time,
                hour: parts.hour as i32,
                day: parts.day as i32,
                week: parts.week as i32,
                month: parts.month as i32,
                year: parts.year,
                weekday: parts.weekday,
            })
        })
        .collect()
}

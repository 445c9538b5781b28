//! Table row types

use serde::{Deserialize, Serialize};

/// Row of the `song` dimension, keyed by `song_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDimension {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// Row of the `artist` dimension
///
/// `artist_id` is not unique: one row is kept per source song document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistDimension {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row of the `user` dimension, keyed by `user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDimension {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Row of the `time` dimension, one per song-play event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDimension {
    /// Seconds since the Unix epoch, UTC
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: String,
}

/// Row of the `songplay` fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongplayFact {
    /// Surrogate key
    pub songplay_id: i64,
    /// Seconds since the Unix epoch, UTC
    pub start_time: i64,
    pub user_id: Option<String>,
    pub level: Option<String>,
    /// `None` when no song matched the event
    pub song_id: Option<String>,
    /// `None` when no artist matched the event
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub year: i32,
    pub month: i32,
}

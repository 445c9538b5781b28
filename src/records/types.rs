//! Record types for the song metadata and event log feeds

use crate::timestamp::decompose;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Page value marking a song play in the event log
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One song metadata document
///
/// Artist attributes are embedded in each song document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMetadataRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub song_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    #[serde(default)]
    pub num_songs: Option<i64>,
}

/// One application event from the activity log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    /// Event time in epoch milliseconds, always within the calendar range
    #[serde(deserialize_with = "event_time")]
    pub ts: i64,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub item_in_session: Option<i64>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
}

impl EventRecord {
    /// Check if this event is a song play
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

/// Accept a string or a number for identifier fields.
///
/// The log feed writes `userId` as a string and uses `""` for guests;
/// blank strings become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Reject event times that have no calendar date.
///
/// Such an event could not land in the time or songplay tables, so it is
/// treated as a malformed record by the reader.
fn event_time<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let ts = i64::deserialize(deserializer)?;
    if decompose(ts).is_none() {
        return Err(D::Error::custom(format!("ts {ts} is outside the supported date range")));
    }
    Ok(ts)
}

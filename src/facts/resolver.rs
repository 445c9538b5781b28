//! Left-outer join of song-play events against song and artist dimensions

use super::keys::KeyGenerator;
use crate::records::EventRecord;
use crate::schema::{ArtistDimension, SongDimension, SongplayFact};
use crate::timestamp::decompose;
use crate::types::SurrogateKeyStrategy;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counters collected while resolving facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Song-play events considered
    pub events: usize,
    /// Fact rows produced
    pub facts: usize,
    /// Facts with a `song_id`
    pub matched_songs: usize,
    /// Facts with an `artist_id`
    pub matched_artists: usize,
    /// Events whose title matched more than one song
    pub ambiguous_titles: usize,
    /// Events whose artist matched artist rows with differing attributes
    pub ambiguous_artists: usize,
    /// Events dropped because their timestamp is unrepresentable
    pub skipped_events: usize,
    /// Surrogate keys issued more than once
    pub repeated_keys: usize,
}

/// Output of a resolution run
#[derive(Debug, Clone)]
pub struct Resolution {
    pub facts: Vec<SongplayFact>,
    pub stats: JoinStats,
}

/// Lookup structures over the persisted dimensions
pub struct SongplayResolver<'a> {
    /// Songs by title, each list sorted by `song_id`
    songs_by_title: HashMap<&'a str, Vec<&'a SongDimension>>,
    /// Distinct artist rows per (artist_id, name)
    artists: HashMap<(&'a str, &'a str), Vec<&'a ArtistDimension>>,
}

struct SongMatch<'a> {
    song: &'a SongDimension,
    artist_id: Option<&'a str>,
    ambiguous_title: bool,
    ambiguous_artist: bool,
}

impl<'a> SongplayResolver<'a> {
    /// Index the dimension tables
    pub fn new(songs: &'a [SongDimension], artists: &'a [ArtistDimension]) -> Self {
        let mut songs_by_title: HashMap<&str, Vec<&SongDimension>> = HashMap::new();
        for song in songs {
            if let Some(title) = song.title.as_deref() {
                songs_by_title.entry(title).or_default().push(song);
            }
        }
        for candidates in songs_by_title.values_mut() {
            candidates.sort_by(|a, b| a.song_id.cmp(&b.song_id));
        }

        // one artist row exists per song document, so repeats are expected
        let mut index: HashMap<(&str, &str), Vec<&ArtistDimension>> = HashMap::new();
        for artist in artists {
            if let Some(name) = artist.name.as_deref() {
                let rows = index.entry((artist.artist_id.as_str(), name)).or_default();
                if !rows.contains(&artist) {
                    rows.push(artist);
                }
            }
        }

        Self {
            songs_by_title,
            artists: index,
        }
    }

    fn artist_rows(&self, song: &SongDimension, artist_name: Option<&str>) -> usize {
        match (song.artist_id.as_deref(), artist_name) {
            (Some(id), Some(name)) => self.artists.get(&(id, name)).map_or(0, Vec::len),
            _ => 0,
        }
    }

    fn find(&self, event: &EventRecord) -> Option<SongMatch<'a>> {
        let candidates = self.songs_by_title.get(event.song.as_deref()?)?;
        let artist_name = event.artist.as_deref();

        let with_artist = candidates
            .iter()
            .map(|song| (*song, self.artist_rows(song, artist_name)))
            .find(|(_, rows)| *rows > 0);

        let ambiguous_title = candidates.len() > 1;
        Some(match with_artist {
            Some((song, rows)) => SongMatch {
                song,
                artist_id: song.artist_id.as_deref(),
                ambiguous_title,
                ambiguous_artist: rows > 1,
            },
            None => SongMatch {
                song: candidates[0],
                artist_id: None,
                ambiguous_title,
                ambiguous_artist: false,
            },
        })
    }

    /// Resolve every song-play event into one fact row
    pub fn resolve(&self, events: &[EventRecord], strategy: SurrogateKeyStrategy) -> Resolution {
        let mut keys = KeyGenerator::new(strategy);
        let mut stats = JoinStats::default();
        let mut facts = Vec::new();

        for event in events.iter().filter(|e| e.is_song_play()) {
            stats.events += 1;

            let Some(time) = decompose(event.ts) else {
                warn!(ts = event.ts, "Skipping song play with unrepresentable timestamp");
                stats.skipped_events += 1;
                continue;
            };

            let found = self.find(event);
            let (song_id, artist_id) = match &found {
                Some(m) => {
                    stats.matched_songs += 1;
                    if m.ambiguous_title {
                        stats.ambiguous_titles += 1;
                        debug!(title = ?event.song, song_id = %m.song.song_id, "Title matches several songs");
                    }
                    if m.ambiguous_artist {
                        stats.ambiguous_artists += 1;
                    }
                    if m.artist_id.is_some() {
                        stats.matched_artists += 1;
                    }
                    (Some(m.song.song_id.clone()), m.artist_id.map(String::from))
                }
                None => (None, None),
            };

            facts.push(SongplayFact {
                songplay_id: keys.next_key(event),
                start_time: time.start_time,
                user_id: event.user_id.clone(),
                level: event.level.clone(),
                song_id,
                artist_id,
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
                year: time.year,
                month: time.month as i32,
            });
        }

        stats.facts = facts.len();
        stats.repeated_keys = keys.repeats();

        if stats.ambiguous_titles > 0 || stats.ambiguous_artists > 0 {
            warn!(
                ambiguous_titles = stats.ambiguous_titles,
                ambiguous_artists = stats.ambiguous_artists,
                "Song plays matched several dimension rows; one match was kept per event"
            );
        }
        if stats.repeated_keys > 0 {
            warn!(
                repeated = stats.repeated_keys,
                "Surrogate keys repeated; events share user, session, timestamp and item"
            );
        }

        Resolution { facts, stats }
    }
}

/// Resolve song-play events against the song and artist dimensions
pub fn resolve_songplays(
    events: &[EventRecord],
    songs: &[SongDimension],
    artists: &[ArtistDimension],
    strategy: SurrogateKeyStrategy,
) -> Resolution {
    SongplayResolver::new(songs, artists).resolve(events, strategy)
}

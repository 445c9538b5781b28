//! Song-play fact resolution
//!
//! Joins song-play events against the persisted `song` and `artist`
//! dimensions and assigns surrogate keys.
//!
//! # Join contract
//!
//! The join is left outer and yields exactly one fact row per event:
//!
//! 1. candidate songs are those whose `title` equals the event's `song`
//! 2. a candidate whose `artist_id` has an artist row named like the event's
//!    `artist` is preferred; among equals the smallest `song_id` wins
//! 3. `artist_id` is only filled when both title and artist name match
//!
//! Titles or artist names that map to several dimension rows are counted in
//! [`JoinStats`] and logged, never duplicated.

mod keys;
mod resolver;

pub use keys::{composite_key, KeyGenerator};
pub use resolver::{resolve_songplays, JoinStats, Resolution, SongplayResolver};

#[cfg(test)]
mod tests;

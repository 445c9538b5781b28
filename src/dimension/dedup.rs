//! Deterministic key deduplication
//!
//! When several rows share a key, the survivor is the row with the most
//! non-null attributes. Remaining ties go to the row whose attributes compare
//! greatest, strings lexicographically and floats by IEEE total order.
//! The outcome never depends on input order.

use crate::schema::{SongDimension, UserDimension};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Keep one row per key; output is ordered by key
pub fn dedup_by_key<R, K, F, P>(rows: impl IntoIterator<Item = R>, key: F, prefer: P) -> Vec<R>
where
    K: Ord,
    F: Fn(&R) -> K,
    P: Fn(&R, &R) -> Ordering,
{
    let mut survivors: BTreeMap<K, R> = BTreeMap::new();

    for row in rows {
        match survivors.entry(key(&row)) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(mut slot) => {
                if prefer(&row, slot.get()) == Ordering::Greater {
                    slot.insert(row);
                }
            }
        }
    }

    survivors.into_values().collect()
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

fn song_filled(row: &SongDimension) -> usize {
    [
        row.title.is_some(),
        row.artist_id.is_some(),
        row.year.is_some(),
        row.duration.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
}

fn user_filled(row: &UserDimension) -> usize {
    [
        row.first_name.is_some(),
        row.last_name.is_some(),
        row.gender.is_some(),
        row.level.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
}

/// Preference between two song rows sharing a `song_id`
pub fn prefer_song(a: &SongDimension, b: &SongDimension) -> Ordering {
    song_filled(a)
        .cmp(&song_filled(b))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.artist_id.cmp(&b.artist_id))
        .then_with(|| a.year.cmp(&b.year))
        .then_with(|| cmp_f64(a.duration, b.duration))
}

/// Preference between two user rows sharing a `user_id`
///
/// This does not look at event time, so `level` is not guaranteed to be
/// the user's most recent subscription level.
pub fn prefer_user(a: &UserDimension, b: &UserDimension) -> Ordering {
    user_filled(a)
        .cmp(&user_filled(b))
        .then_with(|| a.first_name.cmp(&b.first_name))
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.gender.cmp(&b.gender))
        .then_with(|| a.level.cmp(&b.level))
}

use crate::model::{SongStream, TrackRow};
use std::collections::{BTreeSet, HashMap};

const MS_PER_HUNDREDTH_HOUR: u64 = 36_000;

/// Folds song plays into one row per distinct track name, most played first.
///
/// Rows with equal play counts keep the order in which their track name was
/// first seen. Album and artist come from the first play of each name.
pub fn aggregate_songs<'a, I>(songs: I) -> Vec<TrackRow>
where
    I: IntoIterator<Item = &'a SongStream>,
{
    let mut by_name: HashMap<&'a str, usize> = HashMap::new();
    let mut rows: Vec<TrackRow> = Vec::new();

    for song in songs {
        let index = *by_name.entry(song.track_name.as_str()).or_insert_with(|| {
            rows.push(TrackRow {
                name: song.track_name.clone(),
                album: song.album_name.clone(),
                artist: song.artist_name.clone(),
                played_ms: 0,
                hours: 0.0,
                count: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[index];
        row.played_ms = row.played_ms.saturating_add(song.ms_played);
        row.count = row.count.saturating_add(1);
    }

    for row in &mut rows {
        row.hours = round_hours(row.played_ms);
    }
    // sort_by is stable, which preserves first-seen order between ties
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Milliseconds as hours, rounded half away from zero to 2 decimals.
pub fn round_hours(played_ms: u64) -> f64 {
    // rounded in whole hundredths of an hour, before any float conversion
    let hundredths = played_ms.saturating_add(MS_PER_HUNDREDTH_HOUR / 2) / MS_PER_HUNDREDTH_HOUR;
    hundredths as f64 / 100.0
}

/// Distinct calendar years across `songs`, ascending.
pub fn year_universe(songs: &[SongStream]) -> Vec<i32> {
    songs
        .iter()
        .filter_map(SongStream::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Songs played in one of `years`; every song when `years` is empty.
pub fn songs_in_years<'a>(
    songs: &'a [SongStream],
    years: &'a BTreeSet<i32>,
) -> impl Iterator<Item = &'a SongStream> + 'a {
    songs.iter().filter(move |song| {
        years.is_empty() || song.year().is_some_and(|year| years.contains(&year))
    })
}

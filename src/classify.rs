use crate::model::{
    ALBUM_NAME_FIELD, ARTIST_NAME_FIELD, EPISODE_NAME_FIELD, EpisodeStream, RawRecord,
    SHOW_NAME_FIELD, SongStream, StreamEvent, TRACK_NAME_FIELD,
};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub songs: Vec<SongStream>,
    pub episodes: Vec<EpisodeStream>,
    pub dropped: usize,
}

/// Decodes a raw record into exactly one stream variant.
///
/// The song shape is tried first, so a record carrying both field groups is a
/// song.
pub fn classify(record: RawRecord) -> StreamEvent {
    if let Some(song) = decode_song(&record) {
        return StreamEvent::Song(song);
    }
    if let Some(episode) = decode_episode(&record) {
        return StreamEvent::Episode(episode);
    }
    StreamEvent::Unclassified(record)
}

pub fn partition(records: Vec<RawRecord>) -> Partitioned {
    let mut out = Partitioned::default();
    for record in records {
        match classify(record) {
            StreamEvent::Song(song) => out.songs.push(song),
            StreamEvent::Episode(episode) => out.episodes.push(episode),
            StreamEvent::Unclassified(record) => {
                debug!(source = %record.source, ts = record.ts(), "classify.drop");
                out.dropped += 1;
            }
        }
    }
    out
}

fn decode_song(record: &RawRecord) -> Option<SongStream> {
    let track_name = record.string_field(TRACK_NAME_FIELD)?;
    let artist_name = record.string_field(ARTIST_NAME_FIELD)?;
    let album_name = record.string_field(ALBUM_NAME_FIELD)?;
    Some(SongStream {
        ts: record.ts().to_string(),
        played_at: record.played_at,
        platform: record.platform().to_string(),
        ms_played: record.ms_played(),
        track_name: track_name.to_string(),
        artist_name: artist_name.to_string(),
        album_name: album_name.to_string(),
    })
}

fn decode_episode(record: &RawRecord) -> Option<EpisodeStream> {
    let episode_name = record.string_field(EPISODE_NAME_FIELD)?;
    let show_name = record.string_field(SHOW_NAME_FIELD)?;
    Some(EpisodeStream {
        ts: record.ts().to_string(),
        played_at: record.played_at,
        platform: record.platform().to_string(),
        ms_played: record.ms_played(),
        episode_name: episode_name.to_string(),
        show_name: show_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert_eq;
    use proptest::strategy::{Just, Strategy};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn record(value: Value) -> RawRecord {
        let Value::Object(fields) = value else {
            panic!("test record must be an object");
        };
        RawRecord {
            source: Arc::from("test.json"),
            fields,
            played_at: None,
        }
    }

    #[test]
    fn song_fields_make_a_song() {
        let event = classify(record(json!({
            "ts": "2021-01-01T00:00:00Z",
            "platform": "android",
            "ms_played": 1000,
            "master_metadata_track_name": "Track",
            "master_metadata_album_artist_name": "Artist",
            "master_metadata_album_album_name": "Album",
            "conn_country": "IT",
            "shuffle": true
        })));

        let StreamEvent::Song(song) = event else {
            panic!("expected song, got {event:?}");
        };
        assert_eq!(song.track_name, "Track");
        assert_eq!(song.artist_name, "Artist");
        assert_eq!(song.album_name, "Album");
        assert_eq!(song.platform, "android");
        assert_eq!(song.ms_played, 1000);
    }

    #[test]
    fn episode_fields_make_an_episode() {
        let event = classify(record(json!({
            "ts": "2021-01-01T00:00:00Z",
            "platform": "ios",
            "ms_played": 5,
            "master_metadata_track_name": null,
            "episode_name": "Ep 1",
            "episode_show_name": "Show"
        })));

        let StreamEvent::Episode(episode) = event else {
            panic!("expected episode, got {event:?}");
        };
        assert_eq!(episode.episode_name, "Ep 1");
        assert_eq!(episode.show_name, "Show");
    }

    #[test]
    fn song_wins_when_both_shapes_match() {
        let event = classify(record(json!({
            "ts": "t",
            "master_metadata_track_name": "Track",
            "master_metadata_album_artist_name": "Artist",
            "master_metadata_album_album_name": "Album",
            "episode_name": "Ep",
            "episode_show_name": "Show"
        })));
        assert!(matches!(event, StreamEvent::Song(_)));
    }

    #[test]
    fn partial_or_mistyped_fields_are_unclassified() {
        for value in [
            json!({"ts": "t", "master_metadata_track_name": "T", "master_metadata_album_artist_name": "A"}),
            json!({"ts": "t", "master_metadata_track_name": "T", "master_metadata_album_artist_name": "A", "master_metadata_album_album_name": 7}),
            json!({"ts": "t", "episode_name": "E"}),
            json!({"ts": "t", "episode_name": "E", "episode_show_name": null}),
        ] {
            assert!(matches!(classify(record(value)), StreamEvent::Unclassified(_)));
        }
    }

    #[test]
    fn partition_counts_dropped_records() {
        let out = partition(vec![
            record(json!({"ts": "t", "episode_name": "E", "episode_show_name": "S"})),
            record(json!({"ts": "t"})),
            record(json!({
                "ts": "t",
                "master_metadata_track_name": "T",
                "master_metadata_album_artist_name": "A",
                "master_metadata_album_album_name": "B"
            })),
        ]);
        assert_eq!(out.songs.len(), 1);
        assert_eq!(out.episodes.len(), 1);
        assert_eq!(out.dropped, 1);
    }

    fn maybe_field(key: &'static str) -> impl Strategy<Value = Option<(&'static str, Value)>> {
        proptest::option::of(proptest::prop_oneof![
            "[a-z]{0,4}".prop_map(Value::from),
            (0i64..10).prop_map(Value::from),
            Just(Value::Null),
        ])
        .prop_map(move |value| value.map(|value| (key, value)))
    }

    proptest::proptest! {
        #[test]
        fn every_record_lands_in_exactly_one_bucket(
            shapes in proptest::collection::vec(
                (
                    maybe_field(TRACK_NAME_FIELD),
                    maybe_field(ARTIST_NAME_FIELD),
                    maybe_field(ALBUM_NAME_FIELD),
                    maybe_field(EPISODE_NAME_FIELD),
                    maybe_field(SHOW_NAME_FIELD),
                ),
                0..40,
            )
        ) {
            let records: Vec<RawRecord> = shapes
                .into_iter()
                .map(|(a, b, c, d, e)| {
                    let mut fields = serde_json::Map::new();
                    fields.insert(String::from("ts"), Value::from("t"));
                    for (key, value) in [a, b, c, d, e].into_iter().flatten() {
                        fields.insert(key.to_string(), value);
                    }
                    record(Value::Object(fields))
                })
                .collect();
            let total = records.len();
            let songs_expected = records.iter().filter(|r| decode_song(r).is_some()).count();

            let out = partition(records);

            prop_assert_eq!(out.songs.len() + out.episodes.len() + out.dropped, total);
            prop_assert_eq!(out.songs.len(), songs_expected);
        }
    }
}

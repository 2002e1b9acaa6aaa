use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use time::OffsetDateTime;

pub const TS_FIELD: &str = "ts";
pub const PLATFORM_FIELD: &str = "platform";
pub const MS_PLAYED_FIELD: &str = "ms_played";
pub const TRACK_NAME_FIELD: &str = "master_metadata_track_name";
pub const ARTIST_NAME_FIELD: &str = "master_metadata_album_artist_name";
pub const ALBUM_NAME_FIELD: &str = "master_metadata_album_album_name";
pub const EPISODE_NAME_FIELD: &str = "episode_name";
pub const SHOW_NAME_FIELD: &str = "episode_show_name";

/// One element of an uploaded export array, kept as parsed.
///
/// `played_at` is derived from `ts` at ingest time and already converted to
/// the observer's local offset. It is `None` when `ts` is not a recognised
/// timestamp format.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub source: Arc<str>,
    pub fields: Map<String, Value>,
    pub played_at: Option<OffsetDateTime>,
}

impl RawRecord {
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn ts(&self) -> &str {
        self.string_field(TS_FIELD).unwrap_or_default()
    }

    pub fn platform(&self) -> &str {
        self.string_field(PLATFORM_FIELD).unwrap_or_default()
    }

    pub fn ms_played(&self) -> u64 {
        let Some(Value::Number(number)) = self.fields.get(MS_PLAYED_FIELD) else {
            return 0;
        };
        number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && *value > 0.0)
                    .map(|value| value as u64)
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongStream {
    pub ts: String,
    pub played_at: Option<OffsetDateTime>,
    pub platform: String,
    pub ms_played: u64,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
}

impl SongStream {
    pub fn year(&self) -> Option<i32> {
        self.played_at.map(|at| at.year())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeStream {
    pub ts: String,
    pub played_at: Option<OffsetDateTime>,
    pub platform: String,
    pub ms_played: u64,
    pub episode_name: String,
    pub show_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Song(SongStream),
    Episode(EpisodeStream),
    Unclassified(RawRecord),
}

/// Rolling play statistics for one distinct track name.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub name: String,
    pub album: String,
    pub artist: String,
    pub played_ms: u64,
    pub hours: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterColumn {
    #[default]
    Name,
    Album,
    Artist,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 3] = [Self::Name, Self::Album, Self::Artist];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Album => "Album",
            Self::Artist => "Artist",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Album => "album",
            Self::Artist => "artist",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Album,
            Self::Album => Self::Artist,
            Self::Artist => Self::Name,
        }
    }

    pub fn value_of(self, row: &TrackRow) -> &str {
        match self {
            Self::Name => &row.name,
            Self::Album => &row.album,
            Self::Artist => &row.artist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    PitchBlack,
    Matrix,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub default_column: FilterColumn,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_page_size() -> usize {
    crate::query::COMBINED_VIEW_PAGE_SIZE
}

fn default_log_filter() -> String {
    String::from("info")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_column: FilterColumn::default(),
            theme: Theme::default(),
            log_filter: default_log_filter(),
        }
    }
}

use crate::model::{RawRecord, TS_FIELD};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no files to ingest")]
    Empty,
    #[error("{file}: invalid JSON: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}: {reason}")]
    Format {
        file: String,
        index: Option<usize>,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub file_count: usize,
    pub records: Vec<RawRecord>,
}

/// Parses uploaded export files into raw records.
///
/// A batch is all-or-nothing: the first invalid file aborts it and no
/// records from any file are returned.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    local_offset: UtcOffset,
}

impl Ingestor {
    pub fn new(local_offset: UtcOffset) -> Self {
        Self { local_offset }
    }

    pub fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }

    pub fn ingest(&self, files: &[SourceFile]) -> Result<Batch, IngestError> {
        if files.is_empty() {
            return Err(IngestError::Empty);
        }

        let mut records = Vec::new();
        for file in files {
            let mut parsed = self.ingest_file(file)?;
            debug!(file = %file.name, records = parsed.len(), "ingest.file");
            records.append(&mut parsed);
        }

        info!(files = files.len(), records = records.len(), "ingest.batch");
        Ok(Batch {
            file_count: files.len(),
            records,
        })
    }

    fn ingest_file(&self, file: &SourceFile) -> Result<Vec<RawRecord>, IngestError> {
        let value: Value =
            serde_json::from_str(&file.contents).map_err(|source| IngestError::Parse {
                file: file.name.clone(),
                source,
            })?;

        let Value::Array(items) = value else {
            return Err(IngestError::Format {
                file: file.name.clone(),
                index: None,
                reason: format!("expected a JSON array, found {}", json_kind(&value)),
            });
        };

        let source: Arc<str> = Arc::from(file.name.as_str());
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let Value::Object(fields) = item else {
                    return Err(missing_ts(file, index));
                };
                let Some(ts) = fields.get(TS_FIELD).and_then(Value::as_str) else {
                    return Err(missing_ts(file, index));
                };
                let played_at = parse_timestamp(ts, self.local_offset);
                Ok(RawRecord {
                    source: Arc::clone(&source),
                    fields,
                    played_at,
                })
            })
            .collect()
    }
}

/// The offset of the machine running the viewer, or UTC when the platform
/// cannot report one.
pub fn observer_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Derives the instant a record was played, expressed in `local_offset`.
///
/// Naive date-times are read as local wall-clock time; bare dates as UTC
/// midnight.
pub fn parse_timestamp(ts: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    let ts = ts.trim();
    if let Ok(at) = OffsetDateTime::parse(ts, &Rfc3339) {
        return at.checked_to_offset(local_offset);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(at) = PrimitiveDateTime::parse(ts, format) {
            return Some(at.assume_offset(local_offset));
        }
    }

    Date::parse(ts, format_description!("[year]-[month]-[day]"))
        .ok()
        .and_then(|date| date.midnight().assume_utc().checked_to_offset(local_offset))
}

fn missing_ts(file: &SourceFile, index: usize) -> IngestError {
    IngestError::Format {
        file: file.name.clone(),
        index: Some(index),
        reason: format!("record {index} has no string `{TS_FIELD}` field"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn ingestor() -> Ingestor {
        Ingestor::new(UtcOffset::UTC)
    }

    #[test]
    fn concatenates_files_in_submission_order() {
        let batch = ingestor()
            .ingest(&[
                SourceFile::new(
                    "a.json",
                    r#"[{"ts":"2021-01-01T00:00:00Z","n":1},{"ts":"2021-01-02T00:00:00Z","n":2}]"#,
                ),
                SourceFile::new("b.json", r#"[{"ts":"2022-01-01T00:00:00Z","n":3}]"#),
            ])
            .expect("batch");

        assert_eq!(batch.file_count, 2);
        let order: Vec<i64> = batch
            .records
            .iter()
            .map(|record| record.fields["n"].as_i64().expect("n"))
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(&*batch.records[2].source, "b.json");
    }

    #[test]
    fn empty_arrays_still_count_as_files() {
        let batch = ingestor()
            .ingest(&[SourceFile::new("empty.json", "[]")])
            .expect("batch");
        assert_eq!(batch.file_count, 1);
        assert!(batch.records.is_empty());
    }

    #[test]
    fn rejects_empty_batch() {
        assert!(matches!(ingestor().ingest(&[]), Err(IngestError::Empty)));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ingestor()
            .ingest(&[SourceFile::new("bad.json", "[{\"ts\": ")])
            .expect_err("must fail");
        assert!(matches!(err, IngestError::Parse { ref file, .. } if file == "bad.json"));
    }

    #[test]
    fn non_array_is_a_format_error() {
        let err = ingestor()
            .ingest(&[SourceFile::new("obj.json", r#"{"ts":"2021-01-01"}"#)])
            .expect_err("must fail");
        match err {
            IngestError::Format { index, reason, .. } => {
                assert_eq!(index, None);
                assert!(reason.contains("an object"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_or_non_string_ts_is_a_format_error() {
        for body in [
            r#"[{"ts":"2021-01-01"},{"platform":"ios"}]"#,
            r#"[{"ts":"2021-01-01"},{"ts":1609459200}]"#,
            r#"[{"ts":"2021-01-01"},42]"#,
        ] {
            let err = ingestor()
                .ingest(&[SourceFile::new("f.json", body)])
                .expect_err("must fail");
            assert!(
                matches!(err, IngestError::Format { index: Some(1), .. }),
                "unexpected {err:?} for {body}"
            );
        }
    }

    #[test]
    fn one_bad_file_aborts_whole_batch() {
        let result = ingestor().ingest(&[
            SourceFile::new("good.json", r#"[{"ts":"2021-01-01T00:00:00Z"}]"#),
            SourceFile::new("bad.json", "not json"),
        ]);
        assert!(matches!(result, Err(IngestError::Parse { ref file, .. }) if file == "bad.json"));
    }

    #[test]
    fn unrecognised_timestamp_is_accepted_without_date() {
        let batch = ingestor()
            .ingest(&[SourceFile::new("f.json", r#"[{"ts":"yesterday"}]"#)])
            .expect("batch");
        assert_eq!(batch.records[0].played_at, None);
        assert_eq!(batch.records[0].ts(), "yesterday");
    }

    #[test]
    fn rfc3339_is_converted_to_observer_offset() {
        let at = parse_timestamp("2021-12-31T23:30:00Z", offset!(+1)).expect("parse");
        assert_eq!(at.year(), 2022);
        assert_eq!(at, datetime!(2022-01-01 00:30 +1));
    }

    #[test]
    fn naive_timestamps_are_local_wall_clock() {
        let seconds = parse_timestamp("2020-12-31 23:59:59", offset!(-5)).expect("parse");
        assert_eq!(seconds, datetime!(2020-12-31 23:59:59 -5));

        let minutes = parse_timestamp("2019-06-01 08:15", offset!(+2)).expect("parse");
        assert_eq!(minutes, datetime!(2019-06-01 08:15 +2));
    }

    #[test]
    fn bare_dates_are_utc_midnight() {
        let at = parse_timestamp("2021-01-01", offset!(-3)).expect("parse");
        assert_eq!(at.year(), 2020);
    }
}

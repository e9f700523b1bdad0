//! JSON import/export of word records.
//!
//! The file is a JSON array of objects:
//!
//! ```json
//! [{ "id": 1, "english": "house", "german": "das Haus",
//!    "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 0 }]
//! ```
//!
//! `progressPercentage` is optional and derived from `interval` when absent;
//! when present it must equal the derived value.
//! One bad record rejects the whole batch.

use std::path::{Path, PathBuf};

use deutschmemo_algo::validation::whole_number;
use deutschmemo_algo::{progress_for_interval, ValidationError, WordRecord};
use serde::Deserialize;
use thiserror::Error;

use crate::store::{StoreError, WordStore};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a JSON array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record #{index} has the wrong shape: {source}")]
    Shape {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record #{index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl InterchangeError {
    /// The input file was at fault, as opposed to storage or the filesystem.
    pub fn is_bad_input(&self) -> bool {
        match self {
            InterchangeError::Parse(_) => true,
            InterchangeError::Store(err) => err.is_validation(),
            _ => false,
        }
    }
}

/// Record as it appears in the file; numbers are plain JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    id: i64,
    english: String,
    german: String,
    repetition_counter: f64,
    next_review_date: f64,
    ease_factor: f64,
    interval: f64,
    #[serde(default)]
    progress_percentage: Option<f64>,
}

impl RawWord {
    fn into_record(self) -> Result<WordRecord, ValidationError> {
        let id = self.id;
        let out_of_range = |field: &'static str, value: f64| ValidationError::InvalidNumber {
            id,
            field,
            value,
        };

        let repetition_counter =
            u32::try_from(whole_number(id, "repetitionCounter", self.repetition_counter)?)
                .map_err(|_| out_of_range("repetitionCounter", self.repetition_counter))?;
        let interval = u32::try_from(whole_number(id, "interval", self.interval)?)
            .map_err(|_| out_of_range("interval", self.interval))?;
        let next_review_date = i64::try_from(whole_number(id, "nextReviewDate", self.next_review_date)?)
            .map_err(|_| out_of_range("nextReviewDate", self.next_review_date))?;
        let progress_percentage = match self.progress_percentage {
            Some(value) => u8::try_from(whole_number(id, "progressPercentage", value)?)
                .map_err(|_| out_of_range("progressPercentage", value))?,
            None => progress_for_interval(interval),
        };

        let record = WordRecord {
            id,
            source_text: self.english,
            target_text: self.german,
            repetition_counter,
            interval,
            ease_factor: self.ease_factor,
            next_review_date,
            progress_percentage,
        };
        record.validate()?;
        record.validate_progress()?;

        Ok(record)
    }
}

/// Parses and validates a whole batch; the first bad record aborts it.
pub fn parse_records(text: &str) -> Result<Vec<WordRecord>, ParseError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: RawWord = serde_json::from_value(value)
                .map_err(|source| ParseError::Shape { index, source })?;
            raw.into_record()
                .map_err(|source| ParseError::Invalid { index, source })
        })
        .collect()
}

/// Reads `path` and writes every record in one transaction.
pub async fn import_file(store: &WordStore, path: &Path) -> Result<usize, InterchangeError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InterchangeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let records = parse_records(&text)?;
    store.put_all(&records).await?;

    tracing::info!(count = records.len(), path = %path.display(), "import completed");
    Ok(records.len())
}

/// All records as pretty JSON, ordered by id.
pub async fn export_json(store: &WordStore) -> Result<String, InterchangeError> {
    let records = records_by_id(store).await?;
    serde_json::to_string_pretty(&records).map_err(InterchangeError::Serialize)
}

/// Writes the export to `path`. Returns the number of records written.
pub async fn export_file(store: &WordStore, path: &Path) -> Result<usize, InterchangeError> {
    let records = records_by_id(store).await?;
    let json = serde_json::to_string_pretty(&records).map_err(InterchangeError::Serialize)?;

    tokio::fs::write(path, json)
        .await
        .map_err(|source| InterchangeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(count = records.len(), path = %path.display(), "export completed");
    Ok(records.len())
}

async fn records_by_id(store: &WordStore) -> Result<Vec<WordRecord>, StoreError> {
    let mut records = store.get_all().await?;
    records.sort_by_key(|record| record.id);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fresh_and_scheduled_records() {
        let text = r#"[
            {"id": 1, "english": "house", "german": "das Haus",
             "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 0},
            {"id": 2, "english": "tree", "german": "der Baum",
             "repetitionCounter": 2, "nextReviewDate": 1700000000000, "easeFactor": 2.2,
             "interval": 3, "progressPercentage": 21}
        ]"#;

        let records = parse_records(text).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_fresh());
        assert_eq!(records[1].interval, 3);
        assert_eq!(records[1].progress_percentage, 21);
        assert_eq!(records[1].next_review_date, 1_700_000_000_000);
    }

    #[test]
    fn derives_missing_progress() {
        let text = r#"[{"id": 1, "english": "a", "german": "b",
            "repetitionCounter": 3, "nextReviewDate": 5, "easeFactor": 2.5, "interval": 6}]"#;

        let records = parse_records(text).unwrap();
        assert_eq!(records[0].progress_percentage, 43);
    }

    #[test]
    fn progress_contradicting_interval_rejects_batch() {
        let text = r#"[{"id": 4, "english": "a", "german": "b",
            "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 0,
            "progressPercentage": 100}]"#;

        assert!(matches!(
            parse_records(text),
            Err(ParseError::Invalid {
                index: 0,
                source: ValidationError::ProgressMismatch {
                    id: 4,
                    value: 100,
                    expected: 0,
                    ..
                }
            })
        ));
    }

    #[test]
    fn empty_text_rejects_batch() {
        let text = r#"[
            {"id": 1, "english": "house", "german": "das Haus",
             "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 0},
            {"id": 2, "english": "", "german": "der Baum",
             "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 0}
        ]"#;

        let err = parse_records(text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Invalid {
                index: 1,
                source: ValidationError::EmptySourceText { id: 2 }
            }
        ));
    }

    #[test]
    fn wrong_type_rejects_batch() {
        let text = r#"[{"id": 1, "english": "a", "german": "b",
            "repetitionCounter": "zero", "nextReviewDate": 0, "easeFactor": 0, "interval": 0}]"#;

        assert!(matches!(
            parse_records(text),
            Err(ParseError::Shape { index: 0, .. })
        ));
    }

    #[test]
    fn missing_field_rejects_batch() {
        let text = r#"[{"id": 1, "english": "a", "german": "b",
            "repetitionCounter": 0, "easeFactor": 0, "interval": 0}]"#;

        assert!(matches!(
            parse_records(text),
            Err(ParseError::Shape { index: 0, .. })
        ));
    }

    #[test]
    fn fractional_interval_rejected() {
        let text = r#"[{"id": 1, "english": "a", "german": "b",
            "repetitionCounter": 0, "nextReviewDate": 0, "easeFactor": 0, "interval": 1.5}]"#;

        assert!(matches!(
            parse_records(text),
            Err(ParseError::Invalid {
                source: ValidationError::InvalidNumber { field: "interval", .. },
                ..
            })
        ));
    }

    #[test]
    fn not_an_array() {
        assert!(matches!(parse_records("{}"), Err(ParseError::Json(_))));
        assert!(matches!(parse_records("nonsense"), Err(ParseError::Json(_))));
    }

    #[test]
    fn empty_array_is_empty_batch() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn bad_input_classification() {
        let parse = InterchangeError::from(ParseError::Json(
            serde_json::from_str::<serde_json::Value>("x").unwrap_err(),
        ));
        assert!(parse.is_bad_input());

        let io = InterchangeError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!io.is_bad_input());
    }
}

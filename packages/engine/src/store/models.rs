//! Row mapping between the word table and [`WordRecord`].

use deutschmemo_algo::WordRecord;

use crate::store::StoreError;

/// Column list shared by every SELECT, in [`WordRow`] field order.
pub const WORD_COLUMNS: &str = "id, source_text, target_text, repetition_counter, \
     interval_days, ease_factor, next_review_date, progress_percentage";

/// SQLite stores every integer as i64; narrowing happens in `TryFrom`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WordRow {
    pub id: i64,
    pub source_text: String,
    pub target_text: String,
    pub repetition_counter: i64,
    pub interval_days: i64,
    pub ease_factor: f64,
    pub next_review_date: i64,
    pub progress_percentage: i64,
}

impl TryFrom<WordRow> for WordRecord {
    type Error = StoreError;

    fn try_from(row: WordRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |field: &'static str| StoreError::CorruptRow { id, field };

        Ok(WordRecord {
            id,
            source_text: row.source_text,
            target_text: row.target_text,
            repetition_counter: u32::try_from(row.repetition_counter)
                .map_err(|_| corrupt("repetition_counter"))?,
            interval: u32::try_from(row.interval_days).map_err(|_| corrupt("interval_days"))?,
            ease_factor: row.ease_factor,
            next_review_date: row.next_review_date,
            progress_percentage: u8::try_from(row.progress_percentage)
                .map_err(|_| corrupt("progress_percentage"))?,
        })
    }
}

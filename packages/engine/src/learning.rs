//! Grading round trip: validate, reschedule, write back.

use deutschmemo_algo::{advance, Grade, WordRecord};

use crate::store::{StoreResult, WordStore};

/// Applies `grade` to `word` at the current time and stores the result.
pub async fn submit_grade(
    store: &WordStore,
    word: &WordRecord,
    grade: Grade,
) -> StoreResult<WordRecord> {
    submit_grade_at(store, word, grade, chrono::Utc::now().timestamp_millis()).await
}

pub async fn submit_grade_at(
    store: &WordStore,
    word: &WordRecord,
    grade: Grade,
    graded_at: i64,
) -> StoreResult<WordRecord> {
    word.validate()?;

    let next = advance(word, grade, graded_at);
    tracing::debug!(
        word_id = next.id,
        grade = ?grade,
        interval = next.interval,
        progress = next.progress_percentage,
        "word graded"
    );

    store.put(&next).await
}

/// Grades a typed answer against the word's target text and stores the result.
pub async fn submit_answer(
    store: &WordStore,
    word: &WordRecord,
    answer: &str,
) -> StoreResult<(Grade, WordRecord)> {
    let grade = Grade::from_answer(&word.target_text, answer);
    let next = submit_grade(store, word, grade).await?;
    Ok((grade, next))
}

//! Spaced-Repetition Scheduler
//!
//! Two-branch policy keyed on the grade:
//!
//! - **Correct**: repetition count +1, ease +0.1, interval grows
//!   (1 day, then [`GRADUATING_INTERVAL_DAYS`], then `interval * ease`)
//! - **Incorrect**: repetition count reset, ease -0.2, interval drops to
//!   [`RELEARN_INTERVAL_DAYS`]
//!
//! The ease factor never drops below [`MIN_EASE_FACTOR`]. Progress is the
//! interval as a share of [`MAX_INTERVAL_DAYS`].

use crate::types::{
    Grade, WordRecord, DEFAULT_EASE_FACTOR, EASE_BONUS, EASE_PENALTY, GRADUATING_INTERVAL_DAYS,
    MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, MS_PER_DAY, RELEARN_INTERVAL_DAYS,
};

/// Applies one grading event and returns the rescheduled record.
///
/// `graded_at` is the grading time in epoch milliseconds.
///
/// Precondition: `record.ease_factor` is finite and non-negative
/// (see [`WordRecord::validate`]). The function is total over such records.
pub fn advance(record: &WordRecord, grade: Grade, graded_at: i64) -> WordRecord {
    debug_assert!(
        record.ease_factor.is_finite() && record.ease_factor >= 0.0,
        "ease factor must be validated before scheduling"
    );

    let mut next = record.clone();

    // first grading of a fresh record
    let interval = if record.interval == 0 { 1 } else { record.interval };
    let ease = if record.ease_factor == 0.0 {
        DEFAULT_EASE_FACTOR
    } else {
        record.ease_factor
    };

    match grade {
        Grade::Correct => {
            next.repetition_counter = record.repetition_counter.saturating_add(1);
            next.ease_factor = (ease + EASE_BONUS).max(MIN_EASE_FACTOR);
            next.interval = match next.repetition_counter {
                1 => 1,
                2 => GRADUATING_INTERVAL_DAYS,
                _ => grown_interval(interval, next.ease_factor),
            };
        }
        Grade::Incorrect => {
            next.repetition_counter = 0;
            next.ease_factor = (ease - EASE_PENALTY).max(MIN_EASE_FACTOR);
            next.interval = RELEARN_INTERVAL_DAYS;
        }
    }

    next.next_review_date =
        graded_at.saturating_add(i64::from(next.interval).saturating_mul(MS_PER_DAY));
    next.progress_percentage = progress_for_interval(next.interval);

    next
}

/// `round(min(interval, 14) / 14 * 100)`
pub fn progress_for_interval(interval: u32) -> u8 {
    let capped = interval.min(MAX_INTERVAL_DAYS);
    (f64::from(capped) / f64::from(MAX_INTERVAL_DAYS) * 100.0).round() as u8
}

fn grown_interval(interval: u32, ease: f64) -> u32 {
    // float-to-int casts saturate
    (f64::from(interval) * ease).round() as u32
}

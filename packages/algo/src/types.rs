//! Common Types and Constants
//!
//! Shared data structures used by the scheduler and by the storage layer.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Milliseconds in one day
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Lower bound for the ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assumed for a record that has never been graded
pub const DEFAULT_EASE_FACTOR: f64 = 2.0;

/// Ease factor gain on a correct answer
pub const EASE_BONUS: f64 = 0.1;

/// Ease factor loss on an incorrect answer
pub const EASE_PENALTY: f64 = 0.2;

/// Interval horizon for progress; an interval at or beyond this is 100%
pub const MAX_INTERVAL_DAYS: u32 = 14;

/// Interval after the second consecutive correct answer
pub const GRADUATING_INTERVAL_DAYS: u32 = 3;

/// Interval after an incorrect answer; the word is due again immediately
pub const RELEARN_INTERVAL_DAYS: u32 = 0;

/// Progress value of a fully learned word
pub const MASTERED_PERCENTAGE: u8 = 100;

/// `next_review_date` of a word that has never been scheduled
pub const UNSCHEDULED: i64 = 0;

// ==================== Grading ====================

/// Outcome of one recall attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Correct,
    Incorrect,
}

impl Grade {
    /// Grades a typed answer: trimmed, case-insensitive comparison.
    pub fn from_answer(expected: &str, given: &str) -> Self {
        if given.trim().to_lowercase() == expected.trim().to_lowercase() {
            Grade::Correct
        } else {
            Grade::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Grade::Correct)
    }
}

impl From<bool> for Grade {
    fn from(correct: bool) -> Self {
        if correct {
            Grade::Correct
        } else {
            Grade::Incorrect
        }
    }
}

// ==================== Word Record ====================

/// One word pair together with its review schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    /// Stable identifier, assigned at creation
    pub id: i64,
    /// Prompt side of the pair
    #[serde(rename = "english")]
    pub source_text: String,
    /// Answer side of the pair
    #[serde(rename = "german")]
    pub target_text: String,
    /// Consecutive correct answers since the last failure
    pub repetition_counter: u32,
    /// Days until the next presentation
    pub interval: u32,
    /// Interval growth multiplier; 0 means "not yet graded"
    pub ease_factor: f64,
    /// Epoch milliseconds; [`UNSCHEDULED`] for a brand-new word
    pub next_review_date: i64,
    /// Mastery signal derived from `interval`, 0..=100
    pub progress_percentage: u8,
}

impl WordRecord {
    /// A fresh, never graded word.
    pub fn new(id: i64, source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            id,
            source_text: source_text.into(),
            target_text: target_text.into(),
            repetition_counter: 0,
            interval: 0,
            ease_factor: 0.0,
            next_review_date: UNSCHEDULED,
            progress_percentage: 0,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.next_review_date == UNSCHEDULED
    }

    pub fn is_mastered(&self) -> bool {
        self.progress_percentage >= MASTERED_PERCENTAGE
    }

    /// Due at `now` (epoch ms). Fresh words are not "due", they are new.
    pub fn is_due(&self, now: i64) -> bool {
        self.next_review_date != UNSCHEDULED && self.next_review_date <= now
    }
}

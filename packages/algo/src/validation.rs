//! Record Validation
//!
//! Well-formedness checks applied before a record reaches the scheduler or
//! the store. A record that fails here is rejected whole.

use thiserror::Error;

use crate::scheduler::progress_for_interval;
use crate::types::{WordRecord, MASTERED_PERCENTAGE};

/// Reason a word record was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("word {id}: source text is empty")]
    EmptySourceText { id: i64 },

    #[error("word {id}: target text is empty")]
    EmptyTargetText { id: i64 },

    #[error("word {id}: ease factor {value} is not a finite non-negative number")]
    InvalidEaseFactor { id: i64, value: f64 },

    #[error("word {id}: next review date {value} is negative")]
    NegativeReviewDate { id: i64, value: i64 },

    #[error("word {id}: progress percentage {value} exceeds 100")]
    ProgressOutOfRange { id: i64, value: u8 },

    #[error("word {id}: progress percentage {value} does not match interval {interval} (expected {expected})")]
    ProgressMismatch {
        id: i64,
        interval: u32,
        value: u8,
        expected: u8,
    },

    #[error("word {id}: field `{field}` must be a finite non-negative integer, got {value}")]
    InvalidNumber {
        id: i64,
        field: &'static str,
        value: f64,
    },
}

impl WordRecord {
    /// Checks the record is well formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let id = self.id;

        if self.source_text.trim().is_empty() {
            return Err(ValidationError::EmptySourceText { id });
        }
        if self.target_text.trim().is_empty() {
            return Err(ValidationError::EmptyTargetText { id });
        }
        if !self.ease_factor.is_finite() || self.ease_factor < 0.0 {
            return Err(ValidationError::InvalidEaseFactor {
                id,
                value: self.ease_factor,
            });
        }
        if self.next_review_date < 0 {
            return Err(ValidationError::NegativeReviewDate {
                id,
                value: self.next_review_date,
            });
        }
        if self.progress_percentage > MASTERED_PERCENTAGE {
            return Err(ValidationError::ProgressOutOfRange {
                id,
                value: self.progress_percentage,
            });
        }

        Ok(())
    }

    /// Progress must be the one derived from `interval`. Imported records
    /// are held to this; the scheduler always produces it.
    pub fn validate_progress(&self) -> Result<(), ValidationError> {
        let expected = progress_for_interval(self.interval);
        if self.progress_percentage != expected {
            return Err(ValidationError::ProgressMismatch {
                id: self.id,
                interval: self.interval,
                value: self.progress_percentage,
                expected,
            });
        }
        Ok(())
    }
}

/// Converts a JSON-style number into a non-negative integer field.
///
/// Interchange files carry plain numbers; counters, intervals and timestamps
/// must still be integral.
pub fn whole_number(id: i64, field: &'static str, value: f64) -> Result<u64, ValidationError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(ValidationError::InvalidNumber { id, field, value });
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word() -> WordRecord {
        WordRecord::new(5, "apple", "der Apfel")
    }

    #[test]
    fn test_fresh_word_is_valid() {
        assert_eq!(word().validate(), Ok(()));
    }

    #[test]
    fn test_empty_texts_rejected() {
        let mut w = word();
        w.source_text = "   ".into();
        assert_eq!(w.validate(), Err(ValidationError::EmptySourceText { id: 5 }));

        let mut w = word();
        w.target_text = String::new();
        assert_eq!(w.validate(), Err(ValidationError::EmptyTargetText { id: 5 }));
    }

    #[test]
    fn test_nan_and_negative_ease_rejected() {
        let mut w = word();
        w.ease_factor = f64::NAN;
        assert!(matches!(
            w.validate(),
            Err(ValidationError::InvalidEaseFactor { id: 5, .. })
        ));

        w.ease_factor = -0.5;
        assert!(w.validate().is_err());

        w.ease_factor = f64::INFINITY;
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_negative_review_date_rejected() {
        let mut w = word();
        w.next_review_date = -1;
        assert_eq!(
            w.validate(),
            Err(ValidationError::NegativeReviewDate { id: 5, value: -1 })
        );
    }

    #[test]
    fn test_progress_above_100_rejected() {
        let mut w = word();
        w.progress_percentage = 101;
        assert!(matches!(
            w.validate(),
            Err(ValidationError::ProgressOutOfRange { value: 101, .. })
        ));
    }

    #[test]
    fn test_progress_must_follow_interval() {
        let mut w = word();
        assert_eq!(w.validate_progress(), Ok(()));

        w.progress_percentage = 100;
        assert_eq!(
            w.validate_progress(),
            Err(ValidationError::ProgressMismatch {
                id: 5,
                interval: 0,
                value: 100,
                expected: 0,
            })
        );

        w.interval = 14;
        assert_eq!(w.validate_progress(), Ok(()));
    }

    #[test]
    fn test_whole_number() {
        assert_eq!(whole_number(1, "interval", 3.0), Ok(3));
        assert_eq!(whole_number(1, "interval", 0.0), Ok(0));
        assert!(whole_number(1, "interval", 2.5).is_err());
        assert!(whole_number(1, "interval", -1.0).is_err());
        assert!(whole_number(1, "interval", f64::NAN).is_err());
    }

    #[test]
    fn test_error_message_names_the_word() {
        let err = ValidationError::EmptyTargetText { id: 42 };
        assert_eq!(err.to_string(), "word 42: target text is empty");
    }
}

//! # deutschmemo-algo - vocabulary learning core algorithms
//!
//! Pure Rust, no I/O:
//!
//! - [`types`] - `WordRecord`, `Grade` and the scheduling constants
//! - [`validation`] - record well-formedness checks
//! - [`scheduler`] - the spaced-repetition policy that turns a grade into a new schedule
//!
//! ## Example
//!
//! ```rust
//! use deutschmemo_algo::{advance, Grade, WordRecord};
//!
//! let word = WordRecord::new(1, "house", "das Haus");
//! let graded = advance(&word, Grade::Correct, 1_700_000_000_000);
//! assert_eq!(graded.repetition_counter, 1);
//! assert_eq!(graded.interval, 1);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod scheduler;
pub mod types;
pub mod validation;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use scheduler::{advance, progress_for_interval};

pub use validation::ValidationError;

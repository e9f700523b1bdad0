//! deutschmemo engine: SQLite word store, review-queue selection, progress
//! statistics and JSON interchange around the `deutschmemo-algo` scheduler.

pub mod config;
pub mod interchange;
pub mod learning;
pub mod logging;
pub mod session;
pub mod statistics;
pub mod store;

pub use config::{AppConfig, SeedSource, StorageNames, StoreConfig};
pub use interchange::{InterchangeError, ParseError};
pub use learning::{submit_answer, submit_grade, submit_grade_at};
pub use session::{select_session, select_session_at};
pub use statistics::{progress_report, ProgressReport, PROGRESS_BUCKETS};
pub use store::{ScanDirection, StoreError, StoreResult, WordStore};

pub use deutschmemo_algo::{Grade, WordRecord};

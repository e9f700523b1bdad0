#![allow(dead_code)]

use std::path::PathBuf;

use deutschmemo_algo::{progress_for_interval, WordRecord};
use deutschmemo_engine::{StoreConfig, WordStore};
use tempfile::TempDir;

pub const SEED_WORDS: usize = 30;

pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/words.json")
}

pub fn temp_config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path().join("vocabulary.db"))
}

/// A store in a fresh temp directory. Keep the `TempDir` alive.
pub fn temp_store() -> (TempDir, WordStore) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = WordStore::new(temp_config(&dir)).expect("valid config");
    (dir, store)
}

pub fn word(id: i64, next_review_date: i64) -> WordRecord {
    let mut word = WordRecord::new(id, format!("word {id}"), format!("das Wort {id}"));
    if next_review_date != 0 {
        word.repetition_counter = 1;
        word.interval = 1;
        word.ease_factor = 2.1;
        word.progress_percentage = progress_for_interval(1);
    }
    word.next_review_date = next_review_date;
    word
}

/// A scheduled word whose progress matches `interval`.
pub fn scheduled(id: i64, next_review_date: i64, interval: u32) -> WordRecord {
    let mut word = word(id, next_review_date);
    word.interval = interval;
    word.progress_percentage = progress_for_interval(interval);
    word
}

pub fn word_with_progress(id: i64, next_review_date: i64, progress: u8) -> WordRecord {
    let mut word = word(id, next_review_date);
    word.progress_percentage = progress;
    word
}

pub fn ids(words: &[WordRecord]) -> Vec<i64> {
    words.iter().map(|w| w.id).collect()
}

/// A bare pool on `path`, bypassing `WordStore` initialization.
pub async fn raw_pool(path: &std::path::Path) -> sqlx::SqlitePool {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("failed to open test pool")
}

pub async fn migration_rows(pool: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .expect("schema_migrations should exist")
}

pub async fn seed_log_rows(pool: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM seed_log")
        .fetch_one(pool)
        .await
        .expect("seed_log should exist")
}

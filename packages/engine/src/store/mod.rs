//! SQLite word store
//!
//! Durable mapping from word id to [`WordRecord`] with two secondary indexes
//! (next review date, progress percentage) supporting ordered range scans and
//! range counts.
//!
//! The pool is opened lazily: [`WordStore::open`] may be called explicitly at
//! startup, and every other operation calls it implicitly. Concurrent first
//! callers all wait on a single initialization.

pub mod migrations;
pub(crate) mod models;

use std::borrow::Cow;
use std::ops::{Bound, RangeBounds};
use std::path::PathBuf;

use deutschmemo_algo::{ValidationError, WordRecord};
use futures_util::stream::{self, BoxStream, StreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::{ConfigError, SeedSource, StorageNames, StoreConfig, BUNDLED_SEED};
use crate::interchange::{self, ParseError};
use crate::store::migrations::SEED_LOG_TABLE;
use crate::store::models::{WordRow, WORD_COLUMNS};

// ============================================================
// Errors
// ============================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration {version} ({name}) failed: {source}")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("seed data from {origin} is invalid: {source}")]
    Seed {
        origin: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid word record: {0}")]
    Validation(#[from] ValidationError),

    #[error("word {id}: stored column `{field}` is out of range")]
    CorruptRow { id: i64, field: &'static str },
}

impl StoreError {
    /// Bad input rather than a storage failure; retrying will not help.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::Seed { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================
// Scan direction
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Ascending,
    Descending,
}

// ============================================================
// Prepared SQL
// ============================================================

/// SQL text built once from the configured names.
#[derive(Debug)]
struct Queries {
    upsert: String,
    select_by_id: String,
    select_all: String,
    count: String,
    seed_logged: String,
    log_seed: String,
    count_in_progress_range: String,
    scan_ascending: String,
    scan_descending: String,
    list_indexes: String,
}

impl Queries {
    fn new(names: &StorageNames) -> Self {
        let table = &names.table;

        let scan = |order: &str| {
            format!(
                r#"SELECT {WORD_COLUMNS} FROM "{table}"
                   WHERE next_review_date >= ?1 AND next_review_date <= ?2
                   ORDER BY next_review_date {order}, id {order}"#
            )
        };

        Self {
            upsert: format!(
                r#"INSERT INTO "{table}" ({WORD_COLUMNS})
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                   ON CONFLICT(id) DO UPDATE SET
                       source_text = excluded.source_text,
                       target_text = excluded.target_text,
                       repetition_counter = excluded.repetition_counter,
                       interval_days = excluded.interval_days,
                       ease_factor = excluded.ease_factor,
                       next_review_date = excluded.next_review_date,
                       progress_percentage = excluded.progress_percentage"#
            ),
            select_by_id: format!(r#"SELECT {WORD_COLUMNS} FROM "{table}" WHERE id = ?1"#),
            select_all: format!(r#"SELECT {WORD_COLUMNS} FROM "{table}""#),
            count: format!(r#"SELECT COUNT(*) FROM "{table}""#),
            seed_logged: format!(
                r#"SELECT COUNT(*) FROM "{SEED_LOG_TABLE}" WHERE table_name = ?1"#
            ),
            log_seed: format!(
                r#"INSERT OR IGNORE INTO "{SEED_LOG_TABLE}" (table_name, source, record_count, seeded_at)
                   VALUES (?1, ?2, ?3, ?4)"#
            ),
            count_in_progress_range: format!(
                r#"SELECT COUNT(*) FROM "{table}" WHERE progress_percentage BETWEEN ?1 AND ?2"#
            ),
            scan_ascending: scan("ASC"),
            scan_descending: scan("DESC"),
            list_indexes: "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1"
                .to_string(),
        }
    }
}

// ============================================================
// WordStore
// ============================================================

pub struct WordStore {
    config: StoreConfig,
    queries: Queries,
    pool: OnceCell<SqlitePool>,
    index_check: OnceCell<()>,
}

impl WordStore {
    /// Creates a store handle. Nothing touches the disk until first use.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.names.validate()?;

        Ok(Self {
            queries: Queries::new(&config.names),
            config,
            pool: OnceCell::new(),
            index_check: OnceCell::new(),
        })
    }

    /// Opens the database, migrates it and loads the seed data into an empty
    /// table that has never been seeded. Idempotent; safe to race.
    pub async fn open(&self) -> StoreResult<()> {
        self.pool().await.map(|_| ())
    }

    /// The connection pool, initializing the store on first call.
    pub async fn pool(&self) -> StoreResult<&SqlitePool> {
        self.pool.get_or_try_init(|| self.initialize()).await
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    async fn initialize(&self) -> StoreResult<SqlitePool> {
        let path = &self.config.path;
        tracing::info!(path = %path.display(), "opening word store");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(self.config.journal_mode.as_sqlx())
            .busy_timeout(self.config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect_with(options)
            .await?;

        let ready = match migrations::run_migrations(&pool, &self.config.names).await {
            Ok(_) => self.load_seed(&pool).await,
            Err(err) => Err(err),
        };
        if let Err(err) = ready {
            pool.close().await;
            return Err(err);
        }

        Ok(pool)
    }

    /// Seeds run at most once per table: the records and the `seed_log` row
    /// commit together, so a failed attempt is retried on the next open.
    async fn load_seed(&self, pool: &SqlitePool) -> StoreResult<()> {
        let Some(seed) = &self.config.seed else {
            return Ok(());
        };
        let table = &self.config.names.table;

        let logged: i64 = sqlx::query_scalar(&self.queries.seed_logged)
            .bind(table)
            .fetch_one(pool)
            .await?;
        if logged > 0 {
            return Ok(());
        }

        let existing: i64 = sqlx::query_scalar(&self.queries.count)
            .fetch_one(pool)
            .await?;
        if existing > 0 {
            tracing::debug!(existing, "word table already has rows, seed skipped");
            return Ok(());
        }

        let text = match seed {
            SeedSource::Bundled => Cow::Borrowed(BUNDLED_SEED),
            SeedSource::File(path) => Cow::Owned(
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: path.clone(),
                        source,
                    })?,
            ),
        };
        let records = interchange::parse_records(&text).map_err(|source| StoreError::Seed {
            origin: seed.to_string(),
            source,
        })?;

        let mut tx = pool.begin().await?;
        upsert_records(&mut *tx, &self.queries.upsert, &records).await?;
        sqlx::query(&self.queries.log_seed)
            .bind(table)
            .bind(seed.to_string())
            .bind(records.len() as i64)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(count = records.len(), source = %seed, "seed data loaded");
        Ok(())
    }

    // ========== Writes ==========

    /// Inserts or replaces the record with the same id.
    pub async fn put(&self, record: &WordRecord) -> StoreResult<WordRecord> {
        record.validate()?;
        let pool = self.pool().await?;

        bind_record(sqlx::query(&self.queries.upsert), record)
            .execute(pool)
            .await?;

        Ok(record.clone())
    }

    /// Upserts every record in one transaction. Any invalid record or
    /// failed write leaves the store unchanged.
    pub async fn put_all(&self, records: &[WordRecord]) -> StoreResult<()> {
        for record in records {
            record.validate()?;
        }
        let pool = self.pool().await?;

        let mut tx = pool.begin().await?;
        upsert_records(&mut *tx, &self.queries.upsert, records).await?;
        tx.commit().await?;
        tracing::debug!(count = records.len(), "bulk upsert committed");

        Ok(())
    }

    // ========== Reads ==========

    pub async fn get(&self, id: i64) -> StoreResult<Option<WordRecord>> {
        let pool = self.pool().await?;

        let row: Option<WordRow> = sqlx::query_as(&self.queries.select_by_id)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(WordRecord::try_from).transpose()
    }

    /// Every record, in no particular order.
    pub async fn get_all(&self) -> StoreResult<Vec<WordRecord>> {
        let pool = self.pool().await?;

        let rows: Vec<WordRow> = sqlx::query_as(&self.queries.select_all)
            .fetch_all(pool)
            .await?;

        rows.into_iter().map(WordRecord::try_from).collect()
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let pool = self.pool().await?;

        let count: i64 = sqlx::query_scalar(&self.queries.count)
            .fetch_one(pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Number of records whose progress percentage lies in `[min, max]`.
    pub async fn count_in_range(&self, min: u8, max: u8) -> StoreResult<u64> {
        let pool = self.pool().await?;
        self.check_indexes_once(pool).await;

        let count: i64 = sqlx::query_scalar(&self.queries.count_in_progress_range)
            .bind(i64::from(min))
            .bind(i64::from(max))
            .fetch_one(pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Lazily streams records whose next review date lies in `range`, ordered
    /// by next review date (ties by id). Dropping the stream ends the query.
    pub async fn scan_by_next_review_date<R>(
        &self,
        range: R,
        direction: ScanDirection,
    ) -> StoreResult<BoxStream<'_, StoreResult<WordRecord>>>
    where
        R: RangeBounds<i64>,
    {
        let bounds = inclusive_bounds(&range);
        let pool = self.pool().await?;
        self.check_indexes_once(pool).await;

        let Some((low, high)) = bounds else {
            return Ok(stream::empty().boxed());
        };

        let sql = match direction {
            ScanDirection::Ascending => &self.queries.scan_ascending,
            ScanDirection::Descending => &self.queries.scan_descending,
        };

        let rows = sqlx::query_as::<_, WordRow>(sql)
            .bind(low)
            .bind(high)
            .fetch(pool)
            .map(|row| row.map_err(StoreError::from).and_then(WordRecord::try_from));

        Ok(rows.boxed())
    }

    /// Secondary indexes the schema is missing, by configured name.
    pub async fn missing_indexes(&self) -> StoreResult<Vec<String>> {
        let pool = self.pool().await?;
        self.missing_indexes_in(pool).await
    }

    async fn missing_indexes_in(&self, pool: &SqlitePool) -> StoreResult<Vec<String>> {
        let present: Vec<String> = sqlx::query_scalar(&self.queries.list_indexes)
            .bind(&self.config.names.table)
            .fetch_all(pool)
            .await?;

        let names = &self.config.names;
        Ok([&names.next_review_index, &names.progress_index]
            .into_iter()
            .filter(|name| !present.contains(*name))
            .cloned()
            .collect())
    }

    /// A missing index is a migration defect: queries still run, as table
    /// scans, so it is reported rather than raised.
    async fn check_indexes_once(&self, pool: &SqlitePool) {
        self.index_check
            .get_or_init(|| async {
                match self.missing_indexes_in(pool).await {
                    Ok(missing) if missing.is_empty() => {}
                    Ok(missing) => tracing::error!(
                        table = %self.config.names.table,
                        missing = ?missing,
                        "secondary index missing; range queries degrade to table scans"
                    ),
                    Err(err) => tracing::warn!(error = %err, "index check failed"),
                }
            })
            .await;
    }
}

// ============================================================
// Helpers
// ============================================================

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_record<'q>(query: SqliteQuery<'q>, record: &WordRecord) -> SqliteQuery<'q> {
    query
        .bind(record.id)
        .bind(record.source_text.clone())
        .bind(record.target_text.clone())
        .bind(i64::from(record.repetition_counter))
        .bind(i64::from(record.interval))
        .bind(record.ease_factor)
        .bind(record.next_review_date)
        .bind(i64::from(record.progress_percentage))
}

/// Runs inside the caller's transaction; committing is up to the caller.
async fn upsert_records(
    conn: &mut SqliteConnection,
    sql: &str,
    records: &[WordRecord],
) -> StoreResult<()> {
    for record in records {
        bind_record(sqlx::query(sql), record)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Integer bounds make exclusive ends exact. `None` means the range is empty.
fn inclusive_bounds<R: RangeBounds<i64>>(range: &R) -> Option<(i64, i64)> {
    let low = match range.start_bound() {
        Bound::Included(&v) => v,
        Bound::Excluded(&v) => v.checked_add(1)?,
        Bound::Unbounded => i64::MIN,
    };
    let high = match range.end_bound() {
        Bound::Included(&v) => v,
        Bound::Excluded(&v) => v.checked_sub(1)?,
        Bound::Unbounded => i64::MAX,
    };
    (low <= high).then_some((low, high))
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "vocabulary";
pub const DEFAULT_NEXT_REVIEW_INDEX: &str = "by_next_review_date";
pub const DEFAULT_PROGRESS_INDEX: &str = "by_progress_percentage";
pub const DEFAULT_SESSION_LIMIT: usize = 10;

/// Word list compiled into the binary, loaded into a newly created store.
pub const BUNDLED_SEED: &str = include_str!("../data/words.json");

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub session_limit: usize,
    pub stats_retry_delay: Duration,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_limit = env_u64("SESSION_LIMIT", DEFAULT_SESSION_LIMIT as u64) as usize;
        let stats_retry_delay = Duration::from_millis(env_u64("STATS_RETRY_DELAY_MS", 500));
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            store: StoreConfig::from_env()?,
            session_limit,
            stats_retry_delay,
            log_level,
        })
    }
}

/// Names of the word table and its two secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNames {
    pub table: String,
    pub next_review_index: String,
    pub progress_index: String,
}

impl Default for StorageNames {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_NAME.to_string(),
            next_review_index: DEFAULT_NEXT_REVIEW_INDEX.to_string(),
            progress_index: DEFAULT_PROGRESS_INDEX.to_string(),
        }
    }
}

impl StorageNames {
    /// Names end up inside SQL text, so only plain identifiers are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.table, &self.next_review_index, &self.progress_index] {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidIdentifier { name: name.clone() });
            }
        }
        if self.next_review_index == self.progress_index {
            return Err(ConfigError::DuplicateIndexName {
                name: self.progress_index.clone(),
            });
        }
        Ok(())
    }
}

/// Where the initial word list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    Bundled,
    File(PathBuf),
}

impl SeedSource {
    /// `DEUTSCHMEMO_SEED_PATH`: unset means the bundled list, `none` or an
    /// empty value disables seeding, anything else is a file path.
    fn from_env_value(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None => Some(SeedSource::Bundled),
            Some(v) if v.is_empty() || v.eq_ignore_ascii_case("none") => None,
            Some(v) => Some(SeedSource::File(resolve_path_relative_to_cwd(v))),
        }
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::Bundled => f.write_str("bundled word list"),
            SeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// `None` leaves a new store empty.
    pub seed: Option<SeedSource>,
    pub names: StorageNames,
    pub journal_mode: SqliteJournalMode,
    pub busy_timeout: Duration,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
            names: StorageNames::default(),
            journal_mode: SqliteJournalMode::Wal,
            busy_timeout: Duration::from_secs(5),
            max_connections: 5,
        }
    }

    pub fn with_seed(mut self, seed_path: impl Into<PathBuf>) -> Self {
        self.seed = Some(SeedSource::File(seed_path.into()));
        self
    }

    pub fn with_bundled_seed(mut self) -> Self {
        self.seed = Some(SeedSource::Bundled);
        self
    }

    pub fn with_names(mut self, names: StorageNames) -> Self {
        self.names = names;
        self
    }

    fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("DEUTSCHMEMO_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let seed_var = std::env::var("DEUTSCHMEMO_SEED_PATH").ok();
        let seed = SeedSource::from_env_value(seed_var.as_deref());

        let names = StorageNames {
            table: std::env::var("DEUTSCHMEMO_TABLE")
                .unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string()),
            ..StorageNames::default()
        };
        names.validate()?;

        let journal_mode = std::env::var("SQLITE_JOURNAL_MODE")
            .ok()
            .as_deref()
            .and_then(SqliteJournalMode::parse)
            .unwrap_or(SqliteJournalMode::Wal);

        let busy_timeout_ms = env_u64("SQLITE_BUSY_TIMEOUT_MS", 5000);
        let max_connections = env_u32("SQLITE_MAX_CONNECTIONS", 5).max(1);

        Ok(Self {
            path,
            seed,
            names,
            journal_mode,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            max_connections,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteJournalMode {
    Wal,
    Delete,
    Truncate,
    Memory,
}

impl SqliteJournalMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WAL" => Some(Self::Wal),
            "DELETE" => Some(Self::Delete),
            "TRUNCATE" => Some(Self::Truncate),
            "MEMORY" => Some(Self::Memory),
            _ => None,
        }
    }

    pub const fn as_sqlx(self) -> sqlx::sqlite::SqliteJournalMode {
        match self {
            SqliteJournalMode::Wal => sqlx::sqlite::SqliteJournalMode::Wal,
            SqliteJournalMode::Delete => sqlx::sqlite::SqliteJournalMode::Delete,
            SqliteJournalMode::Truncate => sqlx::sqlite::SqliteJournalMode::Truncate,
            SqliteJournalMode::Memory => sqlx::sqlite::SqliteJournalMode::Memory,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{name}` is not a valid SQL identifier")]
    InvalidIdentifier { name: String },
    #[error("index name `{name}` is used twice")]
    DuplicateIndexName { name: String },
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deutschmemo")
        .join("vocabulary.db")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn resolve_path_relative_to_cwd(value: &str) -> PathBuf {
    let raw = Path::new(value);
    if raw.is_absolute() {
        return raw.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(raw)
}

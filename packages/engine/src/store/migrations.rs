//! Schema migrations for the word store.
//!
//! Versions are applied in order, each inside its own transaction, and
//! recorded in `schema_migrations`. Every statement is `IF NOT EXISTS`, so a
//! version that finds its objects already present is a no-op, and an upgrade
//! over existing rows only adds what is missing.

use sqlx::SqlitePool;

use crate::config::StorageNames;
use crate::store::{StoreError, StoreResult};

/// Latest schema version
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// One row per word table whose seed data has been committed.
pub const SEED_LOG_TABLE: &str = "seed_log";

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub statements: Vec<String>,
}

/// All migrations, ordered by version.
pub fn migrations(names: &StorageNames) -> Vec<Migration> {
    let table = &names.table;

    vec![
        // V1: word table + progress index
        Migration {
            version: 1,
            name: "create_word_table",
            statements: vec![
                format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS "{table}" (
                        id INTEGER PRIMARY KEY,
                        source_text TEXT NOT NULL CHECK (length(trim(source_text)) > 0),
                        target_text TEXT NOT NULL CHECK (length(trim(target_text)) > 0),
                        repetition_counter INTEGER NOT NULL DEFAULT 0 CHECK (repetition_counter >= 0),
                        interval_days INTEGER NOT NULL DEFAULT 0 CHECK (interval_days >= 0),
                        ease_factor REAL NOT NULL DEFAULT 0,
                        next_review_date INTEGER NOT NULL DEFAULT 0 CHECK (next_review_date >= 0),
                        progress_percentage INTEGER NOT NULL DEFAULT 0
                            CHECK (progress_percentage BETWEEN 0 AND 100)
                    )
                    "#
                ),
                format!(
                    r#"CREATE INDEX IF NOT EXISTS "{}" ON "{table}" (progress_percentage)"#,
                    names.progress_index
                ),
            ],
        },
        // V2: next review date index
        Migration {
            version: 2,
            name: "add_next_review_date_index",
            statements: vec![format!(
                r#"CREATE INDEX IF NOT EXISTS "{}" ON "{table}" (next_review_date)"#,
                names.next_review_index
            )],
        },
        // V3: seed completion marker
        Migration {
            version: 3,
            name: "create_seed_log",
            statements: vec![format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{SEED_LOG_TABLE}" (
                    table_name TEXT PRIMARY KEY,
                    source TEXT NOT NULL,
                    record_count INTEGER NOT NULL,
                    seeded_at INTEGER NOT NULL
                )
                "#
            )],
        },
    ]
}

async fn ensure_migrations_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Highest applied version, 0 for a new database.
pub async fn current_version(pool: &SqlitePool) -> StoreResult<u32> {
    ensure_migrations_table(pool).await?;

    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await?;

    Ok(u32::try_from(version).unwrap_or(0))
}

/// Applies every pending migration. Returns the versions applied by this call.
pub async fn run_migrations(pool: &SqlitePool, names: &StorageNames) -> StoreResult<Vec<u32>> {
    migrate_to(pool, names, CURRENT_SCHEMA_VERSION).await
}

/// Applies pending migrations up to and including `target`.
pub async fn migrate_to(
    pool: &SqlitePool,
    names: &StorageNames,
    target: u32,
) -> StoreResult<Vec<u32>> {
    let current = current_version(pool).await?;
    let mut applied = Vec::new();

    for migration in migrations(names) {
        if migration.version <= current {
            tracing::debug!(version = migration.version, "Already applied, skipping");
            continue;
        }
        if migration.version > target {
            break;
        }

        tracing::info!(
            version = migration.version,
            migration = migration.name,
            "Applying migration..."
        );
        apply(pool, &migration).await?;
        applied.push(migration.version);
    }

    if applied.is_empty() {
        tracing::debug!(version = current, "Schema is up to date");
    } else {
        tracing::info!(versions = ?applied, "Schema migrations completed");
    }

    Ok(applied)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> StoreResult<()> {
    let failed = |source: sqlx::Error| StoreError::Migration {
        version: migration.version,
        name: migration.name,
        source,
    };

    let mut tx = pool.begin().await.map_err(failed)?;

    for statement in &migration.statements {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
    }

    sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)")
        .bind(i64::from(migration.version))
        .bind(migration.name)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(failed)?;

    tx.commit().await.map_err(failed)?;

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use deutschmemo_engine::config::AppConfig;
use deutschmemo_engine::interchange::{self, InterchangeError};
use deutschmemo_engine::store::{StoreError, WordStore};
use deutschmemo_engine::{learning, logging, select_session, statistics, Grade};

#[derive(Parser)]
#[command(name = "deutschmemo", about = "Spaced-repetition vocabulary trainer", version)]
struct Cli {
    /// Database file (overrides DEUTSCHMEMO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the words of the next review session
    Session {
        /// Maximum number of words (default: SESSION_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Grade a typed answer for one word and reschedule it
    Grade {
        /// Word id
        id: i64,
        /// The answer as typed
        answer: String,
    },

    /// Show how many words sit in each progress bucket
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Replace or add words from a JSON export
    Import { file: PathBuf },

    /// Write every word to a JSON file
    Export { file: PathBuf },
}

#[derive(Debug, Error)]
enum CommandError {
    #[error("no word with id {0}")]
    NotFound(i64),
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CommandError {
    fn is_bad_input(&self) -> bool {
        match self {
            CommandError::NotFound(_) => true,
            CommandError::Interchange(err) => err.is_bad_input(),
            CommandError::Store(err) => err.is_validation(),
            CommandError::Render(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    let _log_guard = logging::init_tracing(&config.log_level);

    let store = match WordStore::new(config.store.clone()) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "invalid store configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = store.open().await {
        tracing::error!(error = %err, "failed to open word store");
        eprintln!("could not open the word store, please retry: {err}");
        return ExitCode::FAILURE;
    }

    let result = run(cli.command, &store, &config).await;
    store.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            if err.is_bad_input() {
                eprintln!("{err}");
            } else {
                eprintln!("storage problem, please retry: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, store: &WordStore, config: &AppConfig) -> Result<(), CommandError> {
    match command {
        Command::Session { limit } => {
            let limit = limit.unwrap_or(config.session_limit);
            let words = select_session(store, limit).await?;
            if words.is_empty() {
                println!("nothing to review");
            }
            for word in words {
                println!("{:>6}  {}", word.id, word.source_text);
            }
        }
        Command::Grade { id, answer } => {
            let word = store.get(id).await?.ok_or(CommandError::NotFound(id))?;
            let (grade, next) = learning::submit_answer(store, &word, &answer).await?;
            match grade {
                Grade::Correct => println!("correct"),
                Grade::Incorrect => println!("incorrect, expected: {}", word.target_text),
            }
            let due = chrono::DateTime::from_timestamp_millis(next.next_review_date)
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| next.next_review_date.to_string());
            println!("next review: {due} ({}% learned)", next.progress_percentage);
        }
        Command::Stats { json } => {
            let report = statistics::progress_report(store, config.stats_retry_delay).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("total: {}", report.total);
                for entry in &report.buckets {
                    println!(
                        "{:>8}  {:>6}  {:>5.1}%",
                        entry.bucket.label, entry.count, entry.percentage
                    );
                }
            }
        }
        Command::Import { file } => {
            let count = interchange::import_file(store, &file).await?;
            println!("imported {count} words");
        }
        Command::Export { file } => {
            let count = interchange::export_file(store, &file).await?;
            println!("exported {count} words to {}", file.display());
        }
    }

    Ok(())
}

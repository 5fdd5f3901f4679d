#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

//! Buildpack state for bpi
//!
//! This crate manages the `SQLite` database that records buildpacks and the
//! named locks guarding their creation.

pub mod locking;
pub mod manager;
pub mod models;
pub mod queries;

pub use locking::{NamedLockGuard, LOCK_BUILDPACKS};
pub use manager::StateManager;
pub use models::{ArtifactUpdate, Buildpack};

use bpi_errors::Error;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Create a new `SQLite` connection pool
///
/// # Errors
///
/// Returns an error if the database connection fails or configuration is invalid.
pub async fn create_pool(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::from(bpi_errors::StateError::DatabaseError {
                message: e.to_string(),
            })
        })?;

    if let Ok(mut conn) = pool.acquire().await {
        let _ = sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&mut *conn)
            .await;
        let _ = sqlx::query("PRAGMA temp_store = MEMORY")
            .execute(&mut *conn)
            .await;
    }

    Ok(pool)
}

/// Run database migrations
///
/// # Errors
///
/// Returns an error if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        bpi_errors::StateError::MigrationFailed {
            message: e.to_string(),
        }
        .into()
    })
}

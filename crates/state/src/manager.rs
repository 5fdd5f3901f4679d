//! State manager implementation

use crate::locking::{self, LOCK_BUILDPACKS};
use crate::models::{ArtifactUpdate, Buildpack};
use crate::queries;
use bpi_errors::{Error, StateError};
use bpi_events::{AppEvent, EventEmitter, EventSender, StateEvent};
use bpi_types::InstallOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use uuid::Uuid;

/// Buildpack storage backed by a `SQLite` pool
#[derive(Clone)]
pub struct StateManager {
    pool: Pool<Sqlite>,
    tx: Option<EventSender>,
}

impl EventEmitter for StateManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl StateManager {
    /// Open (or create) the database at `db_path` and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn open(db_path: &Path) -> Result<Self, Error> {
        let pool = crate::create_pool(db_path).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::with_pool(pool))
    }

    /// Create a state manager over an already migrated pool
    #[must_use]
    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool, tx: None }
    }

    /// Forward storage events to `tx`
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// All buildpacks in position order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Buildpack>, Error> {
        let mut tx = self.pool.begin().await?;
        let rows = queries::list_buildpacks(&mut tx).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Buildpacks named `name`, first by position
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Buildpack>, Error> {
        let mut tx = self.pool.begin().await?;
        let rows = queries::find_by_name(&mut tx, name).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Buildpacks with an exact (name, stack) match
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name_and_stack(
        &self,
        name: &str,
        stack: &str,
    ) -> Result<Vec<Buildpack>, Error> {
        let mut tx = self.pool.begin().await?;
        let rows = queries::find_by_name_and_stack(&mut tx, name, stack).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Stack-agnostic buildpacks named `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name_without_stack(&self, name: &str) -> Result<Vec<Buildpack>, Error> {
        let mut tx = self.pool.begin().await?;
        let rows = queries::find_by_name_without_stack(&mut tx, name).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Look up one buildpack by guid
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, guid: &str) -> Result<Option<Buildpack>, Error> {
        let mut tx = self.pool.begin().await?;
        let row = queries::get_buildpack(&mut tx, guid).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Create a bare buildpack row while holding the buildpacks lock.
    ///
    /// The process-wide lock is taken first, then the `locks` row is written
    /// inside the insert transaction; both are released once the insert has
    /// committed. Every creation serializes, whatever its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock row is missing or any statement fails;
    /// nothing is inserted in that case.
    pub async fn create_locked(&self, name: &str) -> Result<Buildpack, Error> {
        let lock = locking::acquire(LOCK_BUILDPACKS).await;
        self.emit(AppEvent::State(StateEvent::LockAcquired {
            lock: lock.name().to_string(),
            waited: lock.waited(),
        }));

        let guid = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;
        queries::touch_lock(&mut tx, LOCK_BUILDPACKS).await?;
        queries::insert_buildpack(&mut tx, &guid, name).await?;
        let row = queries::get_buildpack(&mut tx, &guid)
            .await?
            .ok_or_else(|| StateError::TransactionFailed {
                message: format!("inserted buildpack {guid} not visible"),
            })?;
        tx.commit().await?;

        drop(lock);
        self.emit(AppEvent::State(StateEvent::LockReleased {
            lock: LOCK_BUILDPACKS.to_string(),
        }));
        self.emit(AppEvent::State(StateEvent::BuildpackInserted {
            guid: row.guid.clone(),
            name: row.name.clone(),
        }));

        Ok(row)
    }

    /// Delete a buildpack row
    ///
    /// # Errors
    ///
    /// Returns an error if the database statement fails.
    pub async fn delete(&self, buildpack: &Buildpack) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;
        let removed = queries::delete_buildpack(&mut tx, &buildpack.guid).await?;
        tx.commit().await?;

        if removed {
            self.emit(AppEvent::State(StateEvent::BuildpackDeleted {
                guid: buildpack.guid.clone(),
                name: buildpack.name.clone(),
            }));
        }
        Ok(removed)
    }

    /// Record an uploaded artifact on a buildpack
    ///
    /// # Errors
    ///
    /// Returns an error if the row no longer exists or the update fails.
    pub async fn set_artifact(&self, guid: &str, update: &ArtifactUpdate) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        queries::set_artifact(&mut tx, guid, update).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Apply install options to a buildpack
    ///
    /// # Errors
    ///
    /// Returns an error if the row no longer exists or the update fails.
    pub async fn update_attributes(&self, guid: &str, options: &InstallOptions) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        queries::update_attributes(&mut tx, guid, options).await?;
        tx.commit().await?;
        Ok(())
    }
}

//! Runtime SQL queries for buildpack state

use crate::models::{ArtifactUpdate, Buildpack};
use bpi_errors::{Error, StateError};
use bpi_types::InstallOptions;
use sqlx::{query, query_as, Sqlite, Transaction};

const BUILDPACK_COLUMNS: &str = "id, guid, name, stack, position, enabled, locked, filename, \
     artifact_key, checksum, created_at, updated_at";

/// All buildpacks, in position order
pub async fn list_buildpacks(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<Buildpack>, Error> {
    let sql = format!("SELECT {BUILDPACK_COLUMNS} FROM buildpacks ORDER BY position, id");
    let rows = query_as::<_, Buildpack>(&sql).fetch_all(&mut **tx).await?;
    Ok(rows)
}

/// Buildpacks sharing a name, first by position then by insertion order
pub async fn find_by_name(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Vec<Buildpack>, Error> {
    let sql = format!(
        "SELECT {BUILDPACK_COLUMNS} FROM buildpacks WHERE name = ?1 ORDER BY position, id"
    );
    let rows = query_as::<_, Buildpack>(&sql)
        .bind(name)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

/// Buildpacks with an exact (name, stack) match
pub async fn find_by_name_and_stack(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    stack: &str,
) -> Result<Vec<Buildpack>, Error> {
    let sql = format!(
        "SELECT {BUILDPACK_COLUMNS} FROM buildpacks WHERE name = ?1 AND stack = ?2 \
         ORDER BY position, id"
    );
    let rows = query_as::<_, Buildpack>(&sql)
        .bind(name)
        .bind(stack)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

/// Stack-agnostic buildpacks with the given name
pub async fn find_by_name_without_stack(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Vec<Buildpack>, Error> {
    let sql = format!(
        "SELECT {BUILDPACK_COLUMNS} FROM buildpacks WHERE name = ?1 AND stack IS NULL \
         ORDER BY position, id"
    );
    let rows = query_as::<_, Buildpack>(&sql)
        .bind(name)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

/// Look up a single buildpack by guid
pub async fn get_buildpack(
    tx: &mut Transaction<'_, Sqlite>,
    guid: &str,
) -> Result<Option<Buildpack>, Error> {
    let sql = format!("SELECT {BUILDPACK_COLUMNS} FROM buildpacks WHERE guid = ?1");
    let row = query_as::<_, Buildpack>(&sql)
        .bind(guid)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

/// Insert a bare buildpack row; every column except `name` takes its default.
///
/// New rows are appended after the current last position.
pub async fn insert_buildpack(
    tx: &mut Transaction<'_, Sqlite>,
    guid: &str,
    name: &str,
) -> Result<(), Error> {
    let now = chrono::Utc::now().timestamp();

    query(
        "INSERT INTO buildpacks (guid, name, position, created_at, updated_at)
         VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM buildpacks), ?3, ?3)",
    )
    .bind(guid)
    .bind(name)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Delete a buildpack row, returning whether a row was removed
pub async fn delete_buildpack(tx: &mut Transaction<'_, Sqlite>, guid: &str) -> Result<bool, Error> {
    let result = query("DELETE FROM buildpacks WHERE guid = ?1")
        .bind(guid)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record a freshly uploaded artifact on a buildpack
pub async fn set_artifact(
    tx: &mut Transaction<'_, Sqlite>,
    guid: &str,
    update: &ArtifactUpdate,
) -> Result<(), Error> {
    let now = chrono::Utc::now().timestamp();

    let result = query(
        "UPDATE buildpacks
         SET artifact_key = ?1, filename = ?2, checksum = ?3, stack = ?4, updated_at = ?5
         WHERE guid = ?6",
    )
    .bind(&update.artifact_key)
    .bind(&update.filename)
    .bind(&update.checksum)
    .bind(update.stack.as_deref())
    .bind(now)
    .bind(guid)
    .execute(&mut **tx)
    .await?;

    ensure_updated(result.rows_affected(), guid)
}

/// Apply install options as attribute updates; unset options keep their column value
pub async fn update_attributes(
    tx: &mut Transaction<'_, Sqlite>,
    guid: &str,
    options: &InstallOptions,
) -> Result<(), Error> {
    let now = chrono::Utc::now().timestamp();

    let result = query(
        "UPDATE buildpacks
         SET enabled = COALESCE(?1, enabled),
             locked = COALESCE(?2, locked),
             position = COALESCE(?3, position),
             updated_at = ?4
         WHERE guid = ?5",
    )
    .bind(options.enabled)
    .bind(options.locked)
    .bind(options.position)
    .bind(now)
    .bind(guid)
    .execute(&mut **tx)
    .await?;

    ensure_updated(result.rows_affected(), guid)
}

/// Write to the row backing a named lock.
///
/// The write takes SQLite's database-level write lock for the rest of the
/// transaction, so other connections (and other processes sharing the file)
/// block until commit.
pub async fn touch_lock(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<(), Error> {
    let now = chrono::Utc::now().timestamp();

    let result = query("UPDATE locks SET acquired_at = ?1 WHERE name = ?2")
        .bind(now)
        .bind(name)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StateError::LockMissing {
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

fn ensure_updated(rows_affected: u64, guid: &str) -> Result<(), Error> {
    if rows_affected == 0 {
        Err(StateError::BuildpackNotFound {
            guid: guid.to_string(),
        }
        .into())
    } else {
        Ok(())
    }
}

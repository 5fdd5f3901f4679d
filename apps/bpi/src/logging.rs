//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields.

use bpi_events::{AppEvent, EventMessage, GeneralEvent, InstallEvent, StateEvent};
use tracing::{debug, error, info, warn};

/// Log an event through tracing at the level its domain assigns
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    details = ?details,
                    "{message}"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    error = %error,
                    "Operation failed"
                );
            }
        },

        AppEvent::Install(event) => match event {
            InstallEvent::Planned {
                name,
                action,
                filename,
                detected_stack,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    action = %action,
                    filename = %filename,
                    detected_stack = ?detected_stack,
                    "Buildpack install planned"
                );
            }
            InstallEvent::Started { name, action } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    action = %action,
                    "Installing buildpack"
                );
            }
            InstallEvent::Created { name, guid } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    guid = %guid,
                    "Buildpack record created"
                );
            }
            InstallEvent::Uploaded {
                name,
                guid,
                filename,
                stack,
                changed,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    guid = %guid,
                    filename = %filename,
                    stack = ?stack,
                    changed = changed,
                    "Buildpack artifact uploaded"
                );
            }
            InstallEvent::RolledBack { name, guid } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    guid = %guid,
                    "Removed buildpack record after failed upload"
                );
            }
            InstallEvent::Completed {
                name,
                guid,
                created,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    guid = %guid,
                    created = created,
                    "Buildpack installed or updated"
                );
            }
            InstallEvent::Skipped { name, guid, reason } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    guid = %guid,
                    reason = %reason,
                    "Buildpack not updated"
                );
            }
            InstallEvent::Failed { name, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    buildpack = %name,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Buildpack failed to install or update"
                );
            }
        },

        AppEvent::State(event) => match event {
            StateEvent::LockAcquired { lock, waited } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    lock = %lock,
                    waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    "Lock acquired"
                );
            }
            StateEvent::LockReleased { lock } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    lock = %lock,
                    "Lock released"
                );
            }
            StateEvent::BuildpackInserted { guid, name } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    guid = %guid,
                    buildpack = %name,
                    "Buildpack row inserted"
                );
            }
            StateEvent::BuildpackDeleted { guid, name } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    guid = %guid,
                    buildpack = %name,
                    "Buildpack row deleted"
                );
            }
        },
    }
}

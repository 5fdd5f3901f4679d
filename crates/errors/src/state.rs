//! State management error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    #[error("buildpack not found: {guid}")]
    BuildpackNotFound { guid: String },

    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("lock {name} is not registered")]
    LockMissing { name: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError { .. } | Self::TransactionFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::BuildpackNotFound { .. } => "state.buildpack_not_found",
            Self::DatabaseError { .. } => "state.database_error",
            Self::TransactionFailed { .. } => "state.transaction_failed",
            Self::LockMissing { .. } => "state.lock_missing",
            Self::MigrationFailed { .. } => "state.migration_failed",
        };
        Some(code)
    }
}

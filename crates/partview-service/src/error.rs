//! Errors surfaced by the sync pipeline.
//!
//! Decode, render and derive problems are not errors here; they become
//! slot warnings on the report. Only failures while committing, which
//! leave the previous record in force, end a sync with [`SyncError`].

use partview_core::error::{AppError, ErrorKind};
use partview_core::types::PartId;
use thiserror::Error;

/// Message shown to the user when the asset commit fails.
pub const ASSET_NOT_UPDATED: &str = "asset not updated, part saved";

/// Why a sync did not commit.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing blob store objects failed.
    #[error("Storage failure while syncing part {part_id}: {source}")]
    Storage {
        /// The part being synced.
        part_id: PartId,
        /// Underlying store error.
        #[source]
        source: AppError,
    },

    /// Reading or writing the asset record failed.
    #[error("Metadata failure while syncing part {part_id}: {source}")]
    Metadata {
        /// The part being synced.
        part_id: PartId,
        /// Underlying store error.
        #[source]
        source: AppError,
    },

    /// The task was cancelled before it committed.
    #[error("Sync of part {part_id} cancelled before commit")]
    Cancelled {
        /// The part being synced.
        part_id: PartId,
    },

    /// The background task did not run to completion.
    #[error("Sync task for part {part_id} failed: {message}")]
    Task {
        /// The part being synced.
        part_id: PartId,
        /// Join failure description.
        message: String,
    },
}

impl SyncError {
    /// The part this error belongs to.
    pub fn part_id(&self) -> PartId {
        match self {
            Self::Storage { part_id, .. }
            | Self::Metadata { part_id, .. }
            | Self::Cancelled { part_id }
            | Self::Task { part_id, .. } => *part_id,
        }
    }

    /// Whether running the same sync again may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled { .. })
    }

    /// Text for the hosting UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Cancelled { .. } => "asset update cancelled, part saved",
            _ => ASSET_NOT_UPDATED,
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        let kind = match &err {
            SyncError::Storage { .. } => ErrorKind::Storage,
            SyncError::Metadata { .. } => ErrorKind::Metadata,
            SyncError::Cancelled { .. } => ErrorKind::Cancelled,
            SyncError::Task { .. } => ErrorKind::Internal,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_is_retryable_with_user_message() {
        let err = SyncError::Storage {
            part_id: PartId::new(),
            source: AppError::storage("disk full"),
        };
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), ASSET_NOT_UPDATED);

        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::Storage);
        assert!(app.message.contains("disk full"));
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        let part_id = PartId::new();
        let err = SyncError::Cancelled { part_id };
        assert!(!err.is_retryable());
        assert_eq!(err.part_id(), part_id);
        assert_eq!(AppError::from(err).kind, ErrorKind::Cancelled);
    }
}

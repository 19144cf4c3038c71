//! Handle to a sync running in the background.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use partview_core::types::PartId;

use super::report::SyncReport;
use crate::error::SyncError;

/// A spawned sync.
///
/// Cancelling does not interrupt running render work; it keeps the sync
/// from committing and makes [`SyncTask::join`] discard the result.
#[derive(Debug)]
pub struct SyncTask {
    part_id: PartId,
    cancel: CancellationToken,
    handle: JoinHandle<Result<SyncReport, SyncError>>,
}

impl SyncTask {
    pub(crate) fn new(
        part_id: PartId,
        cancel: CancellationToken,
        handle: JoinHandle<Result<SyncReport, SyncError>>,
    ) -> Self {
        Self {
            part_id,
            cancel,
            handle,
        }
    }

    pub fn part_id(&self) -> PartId {
        self.part_id
    }

    /// Suppress the result of this sync.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the sync. `None` when the task was cancelled.
    pub async fn join(self) -> Option<Result<SyncReport, SyncError>> {
        let outcome = self.handle.await;
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(outcome.unwrap_or_else(|e| {
            Err(SyncError::Task {
                part_id: self.part_id,
                message: e.to_string(),
            })
        }))
    }
}

//! Asset synchronization.

pub mod lock;
pub mod report;
pub mod slots;
pub mod sync;
pub mod task;

pub use lock::PartLocks;
pub use report::{PreviewOutcome, SlotWarning, SyncReport};
pub use slots::{SlotInput, SlotInputs};
pub use sync::AssetSyncManager;
pub use task::SyncTask;

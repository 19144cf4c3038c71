//! In-memory metadata store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use partview_core::error::AppError;
use partview_core::result::AppResult;
use partview_core::traits::MetadataStore;
use partview_core::types::{AssetRecord, EncodedPayload, PartId};

/// Metadata rows kept in concurrent maps.
///
/// Stored fields are held as [`EncodedPayload`]s exactly as a database
/// driver would return them.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    payloads: DashMap<(PartId, String), EncodedPayload>,
    records: DashMap<PartId, AssetRecord>,
    fail_writes: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw field value for a part.
    pub fn set_payload(&self, part_id: PartId, field: impl Into<String>, payload: EncodedPayload) {
        self.payloads.insert((part_id, field.into()), payload);
    }

    pub fn remove_payload(&self, part_id: PartId, field: &str) {
        self.payloads.remove(&(part_id, field.to_string()));
    }

    /// Current record without going through the async trait.
    pub fn record(&self, part_id: PartId) -> Option<AssetRecord> {
        self.records.get(&part_id).map(|r| r.clone())
    }

    /// Make `store_record` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn fetch_payload(
        &self,
        part_id: PartId,
        field: &str,
    ) -> AppResult<Option<EncodedPayload>> {
        Ok(self
            .payloads
            .get(&(part_id, field.to_string()))
            .map(|p| p.clone()))
    }

    async fn load_record(&self, part_id: PartId) -> AppResult<Option<AssetRecord>> {
        Ok(self.record(part_id))
    }

    async fn store_record(&self, record: &AssetRecord) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::metadata(format!(
                "Record write rejected for part {}",
                record.part_id
            )));
        }
        self.records.insert(record.part_id, record.clone());
        Ok(())
    }
}

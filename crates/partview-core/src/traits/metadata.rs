//! Metadata store trait: the part row that holds raw payloads and the
//! persisted asset record.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{AssetRecord, EncodedPayload, PartId};

/// Access to the part's metadata row.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read a stored binary field, still transport-encoded.
    async fn fetch_payload(&self, part_id: PartId, field: &str)
    -> AppResult<Option<EncodedPayload>>;

    /// Read the current asset record, if the part has one.
    async fn load_record(&self, part_id: PartId) -> AppResult<Option<AssetRecord>>;

    /// Replace the asset record of `record.part_id`.
    async fn store_record(&self, record: &AssetRecord) -> AppResult<()>;
}

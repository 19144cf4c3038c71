//! The asset sync pipeline.
//!
//! A sync resolves the selected slot's source file, turns it into an
//! image (rendering CAD sources), derives thumbnails and then commits
//! under the part's lock:
//!
//! 1. upload new source objects and the new thumbnail generation,
//! 2. write the asset record,
//! 3. sweep every object under the part's prefixes the record no longer
//!    references.
//!
//! A failure in 1 or 2 removes what was uploaded and leaves the previous
//! record in force. A failure in 3 only leaves garbage that the next
//! sweep collects.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use partview_cad::{CadRenderer, Resolution};
use partview_core::config::sync::SyncConfig;
use partview_core::error::AppError;
use partview_core::result::AppResult;
use partview_core::traits::{BlobStore, MetadataStore};
use partview_core::types::{
    AssetRecord, GenerationId, PartId, SlotFileMeta, SourceFile, SourceSlot, ThumbnailObject,
    ThumbnailRefs,
};
use partview_storage::layout;
use partview_storage::{ThumbnailDeriver, ThumbnailImage, ThumbnailSet};
use partview_transport::TransportDecoder;

use super::lock::PartLocks;
use super::report::{PreviewOutcome, SlotWarning, SyncReport};
use super::slots::{SlotInput, SlotInputs};
use super::task::SyncTask;
use crate::error::SyncError;

/// Thumbnails derived before the commit.
#[derive(Debug)]
struct Derived {
    slot: SourceSlot,
    set: ThumbnailSet,
    degraded: bool,
}

/// Keeps a part's stored assets in line with its source slots.
#[derive(Debug, Clone)]
pub struct AssetSyncManager {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    renderer: Arc<CadRenderer>,
    decoder: TransportDecoder,
    deriver: ThumbnailDeriver,
    locks: Arc<PartLocks>,
    render_target: Resolution,
}

impl AssetSyncManager {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        renderer: Arc<CadRenderer>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            metadata,
            blobs,
            renderer,
            decoder: TransportDecoder::new(),
            deriver: ThumbnailDeriver::new(),
            locks: Arc::new(PartLocks::new()),
            render_target: Resolution::new(config.render_width, config.render_height),
        }
    }

    /// The lock registry shared by every clone of this manager.
    pub fn locks(&self) -> &Arc<PartLocks> {
        &self.locks
    }

    /// Sync a part and wait for the result.
    #[instrument(skip(self, slots), fields(part_id = %part_id))]
    pub async fn sync(
        &self,
        part_id: PartId,
        primary: Option<SourceSlot>,
        slots: SlotInputs,
    ) -> Result<SyncReport, SyncError> {
        self.run(part_id, primary, slots, &CancellationToken::new())
            .await
    }

    /// Sync a part on the runtime.
    pub fn spawn_sync(
        &self,
        part_id: PartId,
        primary: Option<SourceSlot>,
        slots: SlotInputs,
    ) -> SyncTask {
        self.spawn_sync_with_callback(part_id, primary, slots, |_| {})
    }

    /// Sync a part on the runtime and hand the result to `on_complete`,
    /// unless the task is cancelled first.
    pub fn spawn_sync_with_callback<F>(
        &self,
        part_id: PartId,
        primary: Option<SourceSlot>,
        slots: SlotInputs,
        on_complete: F,
    ) -> SyncTask
    where
        F: FnOnce(&Result<SyncReport, SyncError>) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            let result = manager.run(part_id, primary, slots, &token).await;
            if !token.is_cancelled() {
                on_complete(&result);
            }
            result
        });
        SyncTask::new(part_id, cancel, handle)
    }

    async fn run(
        &self,
        part_id: PartId,
        primary: Option<SourceSlot>,
        slots: SlotInputs,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let mut warnings = Vec::new();
        let mut resolved = HashMap::new();
        let selected = slots.select(primary);

        let mut derived = None;
        if let Some(slot) = selected {
            let file = self
                .resolve(part_id, slot, slots.get(slot), &mut warnings)
                .await;
            if let Some(file) = &file {
                derived = self.derive(part_id, slot, file, &mut warnings).await;
            }
            resolved.insert(slot, file);
        }

        if cancel.is_cancelled() {
            debug!(%part_id, "Sync cancelled before commit");
            return Err(SyncError::Cancelled { part_id });
        }
        let _guard = self.locks.acquire(part_id).await;
        if cancel.is_cancelled() {
            debug!(%part_id, "Sync cancelled while waiting for the part lock");
            return Err(SyncError::Cancelled { part_id });
        }

        self.commit(part_id, selected, &slots, resolved, derived, warnings)
            .await
    }

    /// The source file of one slot, or `None` with a warning.
    async fn resolve(
        &self,
        part_id: PartId,
        slot: SourceSlot,
        input: &SlotInput,
        warnings: &mut Vec<SlotWarning>,
    ) -> Option<SourceFile> {
        let (field, filename) = match input {
            SlotInput::Empty => return None,
            SlotInput::Uploaded(file) => return Some(file.clone()),
            SlotInput::Stored { field, filename } => (field, filename),
        };

        let payload = match self.metadata.fetch_payload(part_id, field).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                warn!(%part_id, slot = slot.as_str(), field, "Stored field is empty");
                warnings.push(SlotWarning::new(slot, format!("field '{field}' holds no data")));
                return None;
            }
            Err(e) => {
                warn!(%part_id, slot = slot.as_str(), field, error = %e, "Failed to read stored field");
                warnings.push(SlotWarning::new(slot, e.to_string()));
                return None;
            }
        };

        let decoded = match self.decoder.decode(field, &payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(%part_id, slot = slot.as_str(), error = %e, "Stored field cannot be decoded");
                warnings.push(SlotWarning::new(slot, e.to_string()));
                return None;
            }
        };
        if decoded.ambiguous {
            warnings.push(SlotWarning::new(
                slot,
                format!("field '{field}' decoded from an ambiguous value"),
            ));
        }

        match SourceFile::new(filename.clone(), decoded.bytes) {
            Ok(file) => Some(file),
            Err(e) => {
                warnings.push(SlotWarning::new(slot, e.message));
                None
            }
        }
    }

    /// Image bytes for `file`, then its thumbnails.
    async fn derive(
        &self,
        part_id: PartId,
        slot: SourceSlot,
        file: &SourceFile,
        warnings: &mut Vec<SlotWarning>,
    ) -> Option<Derived> {
        let (image_bytes, degraded) = match slot {
            SourceSlot::User => (file.bytes.clone(), false),
            SourceSlot::Drawing2D | SourceSlot::Model3D => {
                let result = self.renderer.render(file, self.render_target).await;
                if result.degraded {
                    warn!(
                        %part_id,
                        filename = %file.filename,
                        attempts = result.attempts.len(),
                        "Render degraded to placeholder"
                    );
                    warnings.push(SlotWarning::new(
                        slot,
                        format!("{} could not be rendered; showing a placeholder", file.filename),
                    ));
                }
                (result.image_bytes, result.degraded)
            }
        };

        let deriver = self.deriver;
        let tag = slot.as_str();
        match tokio::task::spawn_blocking(move || deriver.derive(part_id, &image_bytes, tag)).await {
            Ok(Some(set)) => Some(Derived {
                slot,
                set,
                degraded,
            }),
            Ok(None) => {
                warnings.push(SlotWarning::new(
                    slot,
                    format!("{} is not a usable image", file.filename),
                ));
                None
            }
            Err(e) => {
                warnings.push(SlotWarning::new(slot, format!("thumbnail task failed: {e}")));
                None
            }
        }
    }

    async fn commit(
        &self,
        part_id: PartId,
        selected: Option<SourceSlot>,
        slots: &SlotInputs,
        mut resolved: HashMap<SourceSlot, Option<SourceFile>>,
        derived: Option<Derived>,
        mut warnings: Vec<SlotWarning>,
    ) -> Result<SyncReport, SyncError> {
        let previous = self
            .metadata
            .load_record(part_id)
            .await
            .map_err(|source| SyncError::Metadata { part_id, source })?;
        let generation = GenerationId::next();

        let mut written = Vec::new();
        let staged = self
            .write_objects(
                part_id,
                generation,
                previous.as_ref(),
                slots,
                &mut resolved,
                derived,
                &mut warnings,
                &mut written,
            )
            .await;
        let (mut record, preview) = match staged {
            Ok(staged) => staged,
            Err(source) => {
                self.rollback(&written).await;
                return Err(SyncError::Storage { part_id, source });
            }
        };

        record.primary_source = match preview {
            PreviewOutcome::Updated { generated_from, .. } => Some(generated_from),
            PreviewOutcome::Unchanged => record
                .thumbnails
                .as_ref()
                .map(|t| t.generated_from)
                .or(selected),
            PreviewOutcome::Cleared => None,
        };

        if let Err(source) = self.metadata.store_record(&record).await {
            self.rollback(&written).await;
            return Err(SyncError::Metadata { part_id, source });
        }
        info!(
            %part_id,
            generation = %generation.short(),
            preview = ?preview,
            objects_written = written.len(),
            warnings = warnings.len(),
            "Committed asset record"
        );

        self.sweep(&record).await;

        Ok(SyncReport {
            record,
            preview,
            warnings,
        })
    }

    /// Upload new objects and build the record that references them.
    #[allow(clippy::too_many_arguments)]
    async fn write_objects(
        &self,
        part_id: PartId,
        generation: GenerationId,
        previous: Option<&AssetRecord>,
        slots: &SlotInputs,
        resolved: &mut HashMap<SourceSlot, Option<SourceFile>>,
        derived: Option<Derived>,
        warnings: &mut Vec<SlotWarning>,
        written: &mut Vec<String>,
    ) -> AppResult<(AssetRecord, PreviewOutcome)> {
        let mut record = AssetRecord::empty(part_id);

        for slot in SourceSlot::ALL {
            let meta = match slots.get(slot) {
                SlotInput::Empty => None,
                SlotInput::Uploaded(file) => {
                    Some(self.put_source(part_id, slot, generation, file, written).await?)
                }
                SlotInput::Stored { .. } => match previous.and_then(|r| r.slot(slot)) {
                    Some(meta) => Some(meta.clone()),
                    None => {
                        // never stored as an object before
                        let file = match resolved.remove(&slot) {
                            Some(attempted) => attempted,
                            None => self.resolve(part_id, slot, slots.get(slot), warnings).await,
                        };
                        match file {
                            Some(file) => Some(
                                self.put_source(part_id, slot, generation, &file, written)
                                    .await?,
                            ),
                            None => None,
                        }
                    }
                },
            };
            *record.slot_mut(slot) = meta;
        }

        let preview = match derived {
            Some(derived) => {
                record.thumbnails =
                    Some(self.put_thumbnails(part_id, generation, &derived, written).await?);
                PreviewOutcome::Updated {
                    generated_from: derived.slot,
                    degraded: derived.degraded,
                }
            }
            None if slots.all_empty() => PreviewOutcome::Cleared,
            None => {
                record.thumbnails = previous.and_then(|r| r.thumbnails.clone());
                PreviewOutcome::Unchanged
            }
        };
        record.updated_at = Utc::now();
        Ok((record, preview))
    }

    async fn put_source(
        &self,
        part_id: PartId,
        slot: SourceSlot,
        generation: GenerationId,
        file: &SourceFile,
        written: &mut Vec<String>,
    ) -> AppResult<SlotFileMeta> {
        let path = layout::source_path(part_id, slot, generation, &file.filename);
        self.blobs
            .put(&path, file.bytes.clone(), file.content_type())
            .await?;
        written.push(path.clone());
        Ok(SlotFileMeta {
            filename: file.filename.clone(),
            extension: file.extension.clone(),
            size_bytes: file.size_bytes,
            content_type: file.content_type().to_string(),
            url: self.blobs.public_url(&path),
            storage_path: path,
        })
    }

    async fn put_thumbnails(
        &self,
        part_id: PartId,
        generation: GenerationId,
        derived: &Derived,
        written: &mut Vec<String>,
    ) -> AppResult<ThumbnailRefs> {
        let mut objects = Vec::with_capacity(3);
        for image in derived.set.iter() {
            objects.push(self.put_thumbnail(part_id, generation, image, written).await?);
        }
        let mut objects = objects.into_iter();
        match (objects.next(), objects.next(), objects.next()) {
            (Some(small), Some(medium), Some(large)) => Ok(ThumbnailRefs {
                generation: generation.short(),
                generated_from: derived.slot,
                degraded: derived.degraded,
                small,
                medium,
                large,
            }),
            _ => Err(AppError::internal(
                "Thumbnail set is missing a tier",
            )),
        }
    }

    async fn put_thumbnail(
        &self,
        part_id: PartId,
        generation: GenerationId,
        image: &ThumbnailImage,
        written: &mut Vec<String>,
    ) -> AppResult<ThumbnailObject> {
        let path = layout::thumbnail_path(part_id, generation, image.tier);
        self.blobs.put(&path, image.png.clone(), "image/png").await?;
        written.push(path.clone());
        Ok(ThumbnailObject {
            url: self.blobs.public_url(&path),
            storage_path: path,
            width: image.width,
            height: image.height,
        })
    }

    /// Best-effort removal of objects written by a failed commit.
    async fn rollback(&self, written: &[String]) {
        for path in written {
            if let Err(e) = self.blobs.delete(path).await {
                warn!(path, error = %e, "Failed to remove object of an aborted commit");
            }
        }
    }

    /// Delete every object of the part the record does not reference.
    async fn sweep(&self, record: &AssetRecord) {
        let live: HashSet<&str> = record.referenced_paths().into_iter().collect();
        let mut removed = 0usize;
        for prefix in [
            layout::thumbnail_prefix(record.part_id),
            layout::source_prefix(record.part_id),
        ] {
            let objects = match self.blobs.list(&prefix).await {
                Ok(objects) => objects,
                Err(e) => {
                    warn!(prefix, error = %e, "Failed to list objects for cleanup");
                    continue;
                }
            };
            for object in objects.iter().filter(|o| !live.contains(o.path.as_str())) {
                match self.blobs.delete(&object.path).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %object.path, error = %e, "Failed to delete stale object"),
                }
            }
        }
        if removed > 0 {
            debug!(part_id = %record.part_id, removed, "Removed stale objects");
        }
    }
}

//! End-to-end sync scenarios across decoder, renderer, deriver and stores.

mod helpers;

use std::collections::HashSet;

use partview_core::traits::BlobStore;
use partview_core::types::{EncodedPayload, PartId, SourceFile, SourceSlot, ThumbnailTier};
use partview_service::error::ASSET_NOT_UPDATED;
use partview_service::{PreviewOutcome, SlotInput, SlotInputs, SyncError};
use partview_transport::{TransportLayer, encode};

use helpers::{TestApp, drawing_file, photo_file};

fn uploaded(file: SourceFile) -> SlotInput {
    SlotInput::Uploaded(file)
}

#[tokio::test]
async fn test_primary_switch_replaces_thumbnail_set() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let drawing = drawing_file("plate.dxf");
    let photo = photo_file("plate.png", 640, 480);

    let first = app
        .sync
        .sync(
            part,
            Some(SourceSlot::Drawing2D),
            SlotInputs::new()
                .with(SourceSlot::Drawing2D, uploaded(drawing.clone()))
                .with(SourceSlot::User, uploaded(photo.clone())),
        )
        .await
        .expect("first sync");
    assert_eq!(
        first.preview,
        PreviewOutcome::Updated {
            generated_from: SourceSlot::Drawing2D,
            degraded: false
        }
    );
    let old_set = first.record.thumbnails.clone().expect("first set");
    assert_eq!(old_set.generated_from, SourceSlot::Drawing2D);

    // the part row now holds both files; the next save leaves them untouched
    app.store_field(part, "drawing_2d", &drawing.bytes);
    app.store_field(part, "user_image", &photo.bytes);
    let second = app
        .sync
        .sync(
            part,
            Some(SourceSlot::User),
            SlotInputs::new()
                .with(SourceSlot::Drawing2D, SlotInput::stored("drawing_2d", "plate.dxf"))
                .with(SourceSlot::User, SlotInput::stored("user_image", "plate.png")),
        )
        .await
        .expect("second sync");

    let new_set = second.record.thumbnails.clone().expect("second set");
    assert_eq!(new_set.generated_from, SourceSlot::User);
    assert_eq!(second.record.primary_source, Some(SourceSlot::User));

    for path in old_set.storage_paths() {
        assert!(!app.blobs.exists(path).await.expect("exists"), "{path} not deleted");
    }
    for path in new_set.storage_paths() {
        assert!(app.blobs.exists(path).await.expect("exists"), "{path} missing");
    }
    assert_eq!(app.thumbnail_paths(part).await.len(), 3);

    // stored slots keep the objects uploaded by the first save
    assert_eq!(second.record.drawing_2d, first.record.drawing_2d);
    assert_eq!(second.record.user, first.record.user);
    assert_eq!(app.source_paths(part).await.len(), 2);
}

#[tokio::test]
async fn test_storage_holds_one_live_set_across_syncs() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let model = SourceFile::new("bracket.step", vec![0u8; 10_240]).expect("model");
    let primaries = [
        Some(SourceSlot::Drawing2D),
        Some(SourceSlot::User),
        Some(SourceSlot::Model3D),
        None,
        Some(SourceSlot::Drawing2D),
        Some(SourceSlot::Model3D),
    ];

    for (round, primary) in primaries.into_iter().enumerate() {
        let slots = SlotInputs::new()
            .with(SourceSlot::Drawing2D, uploaded(drawing_file("plate.dxf")))
            .with(SourceSlot::Model3D, uploaded(model.clone()))
            .with(
                SourceSlot::User,
                uploaded(photo_file("photo.png", 100 + round as u32 * 10, 80)),
            );
        let report = app.sync.sync(part, primary, slots).await.expect("sync");

        let live: HashSet<String> = report
            .record
            .referenced_paths()
            .into_iter()
            .map(String::from)
            .collect();
        let stored: HashSet<String> = app
            .thumbnail_paths(part)
            .await
            .into_iter()
            .chain(app.source_paths(part).await)
            .collect();
        assert_eq!(stored, live, "round {round}");
        assert_eq!(app.thumbnail_paths(part).await.len(), 3);
    }
    assert!(app.sync.locks().is_empty());
}

#[tokio::test]
async fn test_unrenderable_model_degrades_with_caption() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let model = SourceFile::new("bracket.step", vec![0u8; 10_240]).expect("model");

    let report = app
        .sync
        .sync(
            part,
            Some(SourceSlot::Model3D),
            SlotInputs::new().with(SourceSlot::Model3D, uploaded(model)),
        )
        .await
        .expect("sync");

    assert_eq!(
        report.preview,
        PreviewOutcome::Updated {
            generated_from: SourceSlot::Model3D,
            degraded: true
        }
    );
    assert!(report.warnings.iter().any(|w| w.message.contains("bracket.step")));
    let thumbnail = app
        .previews
        .thumbnail(part, ThumbnailTier::Large)
        .await
        .expect("read")
        .expect("thumbnail");
    assert!(thumbnail.degraded);
    assert_eq!((thumbnail.width, thumbnail.height), (640, 480));
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_record() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let first = app
        .sync
        .sync(
            part,
            None,
            SlotInputs::new().with(SourceSlot::User, uploaded(photo_file("a.png", 64, 64))),
        )
        .await
        .expect("first sync");
    let before = app.memory().paths();

    app.memory().fail_puts_containing("medium.png");
    let err = app
        .sync
        .sync(
            part,
            Some(SourceSlot::Drawing2D),
            SlotInputs::new()
                .with(SourceSlot::Drawing2D, uploaded(drawing_file("plate.dxf")))
                .with(SourceSlot::User, uploaded(photo_file("b.png", 64, 64))),
        )
        .await
        .expect_err("upload rejected");

    assert!(matches!(err, SyncError::Storage { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), ASSET_NOT_UPDATED);
    assert_eq!(app.metadata.record(part), Some(first.record.clone()));
    assert_eq!(app.memory().paths(), before);

    // a retry after the store recovers goes through
    app.memory().clear_failures();
    let retried = app
        .sync
        .sync(
            part,
            Some(SourceSlot::Drawing2D),
            SlotInputs::new().with(SourceSlot::Drawing2D, uploaded(drawing_file("plate.dxf"))),
        )
        .await
        .expect("retry");
    assert!(retried.record.user.is_none());
    assert_eq!(app.source_paths(part).await.len(), 1);
}

#[tokio::test]
async fn test_failed_stale_delete_is_collected_later() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let photo = || SlotInputs::new().with(SourceSlot::User, uploaded(photo_file("p.png", 32, 32)));

    let first = app.sync.sync(part, None, photo()).await.expect("first");
    let old_generation = first.record.thumbnails.expect("set").generation;

    app.memory().fail_deletes_containing(old_generation.as_str());
    app.sync.sync(part, None, photo()).await.expect("second");
    assert_eq!(app.thumbnail_paths(part).await.len(), 6);

    app.memory().clear_failures();
    app.sync.sync(part, None, photo()).await.expect("third");
    assert_eq!(app.thumbnail_paths(part).await.len(), 3);
}

#[tokio::test]
async fn test_nested_encoding_is_decoded_with_warning() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let photo = helpers::png(48, 24);
    let raw = encode(
        &photo,
        &[
            TransportLayer::Hex { marker: true, uppercase: false },
            TransportLayer::Base64 { padded: true },
        ],
    );
    app.metadata
        .set_payload(part, "user_image", EncodedPayload { raw, hint: None });

    let report = app
        .sync
        .sync(
            part,
            None,
            SlotInputs::new().with(SourceSlot::User, SlotInput::stored("user_image", "shot.png")),
        )
        .await
        .expect("sync");

    assert_eq!(
        report.preview,
        PreviewOutcome::Updated {
            generated_from: SourceSlot::User,
            degraded: false
        }
    );
    assert!(report.warnings.iter().any(|w| w.message.contains("ambiguous")));
    let user = report.record.user.expect("user meta");
    assert_eq!(user.size_bytes, photo.len() as u64);
    assert_eq!(app.blobs.get(&user.storage_path).await.expect("object"), photo);
}

#[tokio::test]
async fn test_cancelled_sync_commits_nothing() {
    let app = TestApp::in_memory();
    let part = PartId::new();

    let task = app.sync.spawn_sync(
        part,
        None,
        SlotInputs::new().with(SourceSlot::User, uploaded(photo_file("p.png", 32, 32))),
    );
    task.cancel();
    assert!(task.is_cancelled());
    assert!(task.join().await.is_none());

    assert!(app.metadata.record(part).is_none());
    assert!(app.memory().is_empty());
}

#[tokio::test]
async fn test_completion_callback_receives_report() {
    let app = TestApp::in_memory();
    let part = PartId::new();
    let (tx, rx) = tokio::sync::oneshot::channel();

    let task = app.sync.spawn_sync_with_callback(
        part,
        None,
        SlotInputs::new().with(SourceSlot::User, uploaded(photo_file("p.png", 32, 32))),
        move |result| {
            let _ = tx.send(result.as_ref().map(|r| r.preview).map_err(|e| e.to_string()));
        },
    );

    let joined = task.join().await.expect("not cancelled").expect("sync");
    let notified = rx.await.expect("callback ran").expect("ok");
    assert_eq!(notified, joined.preview);
}

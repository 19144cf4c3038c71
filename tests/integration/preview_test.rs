//! Preview reads against a disk-backed blob store.

mod helpers;

use partview_core::types::{PartId, SourceSlot, ThumbnailTier};
use partview_service::{PreviewOutcome, SlotInput, SlotInputs};

use helpers::{TestApp, drawing_file, photo_file};

#[tokio::test]
async fn test_disk_store_serves_rendered_drawing() {
    let app = TestApp::on_disk().await;
    let part = PartId::new();

    let report = app
        .sync
        .sync(
            part,
            Some(SourceSlot::Drawing2D),
            SlotInputs::new().with(SourceSlot::Drawing2D, SlotInput::Uploaded(drawing_file("plate.dxf"))),
        )
        .await
        .expect("sync");
    assert!(matches!(report.preview, PreviewOutcome::Updated { degraded: false, .. }));

    for tier in ThumbnailTier::ALL {
        let thumbnail = app
            .previews
            .thumbnail(part, tier)
            .await
            .expect("read")
            .expect("thumbnail");
        let (max_w, max_h) = tier.bounds();
        assert!(thumbnail.width <= max_w && thumbnail.height <= max_h);
        assert!(thumbnail.url.starts_with("https://assets.example.com/thumbnails/"));

        let image = image::load_from_memory(&thumbnail.data).expect("png");
        assert_eq!((image.width(), image.height()), (thumbnail.width, thumbnail.height));
    }

    // renders fill the configured target, which fits the large tier
    let large = app
        .previews
        .thumbnail(part, ThumbnailTier::Large)
        .await
        .expect("read")
        .expect("thumbnail");
    assert_eq!((large.width, large.height), (640, 480));
}

#[tokio::test]
async fn test_disk_store_sweeps_superseded_generation() {
    let app = TestApp::on_disk().await;
    let part = PartId::new();
    let photo = |w, h| SlotInputs::new().with(SourceSlot::User, SlotInput::Uploaded(photo_file("p.png", w, h)));

    app.sync.sync(part, None, photo(400, 200)).await.expect("first");
    let first = app
        .previews
        .thumbnail(part, ThumbnailTier::Small)
        .await
        .expect("read")
        .expect("thumbnail");
    assert_eq!((first.width, first.height), (100, 50));

    app.sync.sync(part, None, photo(200, 400)).await.expect("second");
    let second = app
        .previews
        .thumbnail(part, ThumbnailTier::Small)
        .await
        .expect("read")
        .expect("thumbnail");
    assert_eq!((second.width, second.height), (50, 100));
    assert_ne!(first.storage_path, second.storage_path);

    let thumbnails = app.thumbnail_paths(part).await;
    assert_eq!(thumbnails.len(), 3);
    assert!(!thumbnails.contains(&first.storage_path));
    assert_eq!(app.source_paths(part).await.len(), 1);

    // only the live generation keeps a directory on disk
    let live = app.metadata.record(part).and_then(|r| r.thumbnails).expect("live set");
    for round in 0..3 {
        app.sync.sync(part, None, photo(300 + round, 150)).await.expect("resync");
    }
    let live_after = app.metadata.record(part).and_then(|r| r.thumbnails).expect("live set");
    assert_ne!(live.generation, live_after.generation);
    assert_eq!(
        app.subdirectories(&format!("thumbnails/{part}")),
        vec![live_after.generation.to_string()]
    );

    assert!(app.previews.invalidate_part(part).await >= 1);
}

#[tokio::test]
async fn test_clearing_all_slots_empties_part_prefixes() {
    let app = TestApp::on_disk().await;
    let part = PartId::new();
    app.sync
        .sync(
            part,
            None,
            SlotInputs::new().with(SourceSlot::User, SlotInput::Uploaded(photo_file("p.png", 64, 64))),
        )
        .await
        .expect("first");

    let report = app.sync.sync(part, None, SlotInputs::new()).await.expect("clear");
    assert_eq!(report.preview, PreviewOutcome::Cleared);
    assert!(app.thumbnail_paths(part).await.is_empty());
    assert!(app.source_paths(part).await.is_empty());
    assert!(app.subdirectories("thumbnails").is_empty());
    assert!(app.subdirectories("sources").is_empty());
    assert!(
        app.previews
            .thumbnail(part, ThumbnailTier::Medium)
            .await
            .expect("read")
            .is_none()
    );
}

//! End-to-end scenarios on small hand-built images.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crate::blink::{
    BlinkKind, BlinkMessage, BlinkSynchronizer, FinishReason, SyncState, TimelineEvent,
};
use crate::compositor::{CompositeOptions, HighlightMode, render, render_with};
use crate::data::RasterImage;
use crate::producer::{RegionProducer, ThresholdProducer};
use crate::selection::{SelectionSet, locate};

const WAIT: Duration = Duration::from_secs(5);

/// 4x4 grayscale: `[[10, 200], [50, 210]]` in the top-left corner, 0 elsewhere.
fn padded_image() -> RasterImage {
    let corner = [[10u8, 200], [50, 210]];
    RasterImage::gray_from_fn(4, 4, |x, y| {
        if x < 2 && y < 2 {
            corner[y as usize][x as usize]
        } else {
            0
        }
    })
}

#[test]
fn test_threshold_scenario() {
    let image = padded_image();
    let collection = ThresholdProducer::new(100).produce(&image).unwrap();

    assert_eq!(collection.len(), 1);
    let region = collection.get(0).unwrap();
    assert_eq!(region.area(), 2);
    assert!(region.contains(1, 0), "value 200");
    assert!(region.contains(1, 1), "value 210");
    assert_eq!((region.width(), region.height()), image.dimensions());

    assert!(locate(&collection, 0, 0).is_none(), "value 10");
    assert!(locate(&collection, 0, 1).is_none(), "value 50");
    let hit = locate(&collection, 1, 0).unwrap();
    assert!(Arc::ptr_eq(hit, region));
}

#[test]
fn test_locate_is_deterministic() {
    let collection = ThresholdProducer::new(100).produce(&padded_image()).unwrap();
    for (x, y) in [(1, 0), (0, 0), (-1, 2), (9, 9), (1, 1)] {
        let first = locate(&collection, x, y).map(|r| r.id());
        for _ in 0..3 {
            assert_eq!(locate(&collection, x, y).map(|r| r.id()), first);
        }
    }
}

#[test]
fn test_selection_lifecycle() {
    let collection = Arc::new(ThresholdProducer::new(100).produce(&padded_image()).unwrap());
    let mut selection = SelectionSet::new(Arc::clone(&collection));

    assert!(selection.toggle_at(1, 0).is_some());
    // Same region through another of its pixels: unchanged
    assert!(selection.toggle_at(1, 1).is_some());
    assert!(selection.toggle_at(1, 0).is_some());
    assert_eq!(selection.len(), 1);

    assert!(selection.toggle_at(3, 3).is_none());
    assert_eq!(selection.len(), 1);

    selection.clear();
    assert!(selection.is_empty());
    selection.clear();
    assert!(selection.is_empty());
}

#[test]
fn test_render_follows_selection() {
    let image = padded_image();
    let collection = Arc::new(ThresholdProducer::new(100).produce(&image).unwrap());
    let mut selection = SelectionSet::new(Arc::clone(&collection));
    let options = CompositeOptions::default();

    let plain = render(&image, &collection, &selection.snapshot(), &options);
    selection.toggle_at(1, 0);
    let highlighted = render(&image, &collection, &selection.snapshot(), &options);

    assert_ne!(plain, highlighted);
    // Pixels outside every region never change
    assert_eq!(plain.pixel(0, 0), highlighted.pixel(0, 0));
    assert_eq!(highlighted.pixel(0, 0), Some([10, 10, 10]));

    let normal = render_with(
        &image,
        &collection,
        &selection.snapshot(),
        HighlightMode::Normal,
        &options,
    );
    assert_eq!(normal, plain);
}

#[test]
fn test_blink_scenario() {
    let image = Arc::new(padded_image());
    let collection = Arc::new(ThresholdProducer::new(100).produce(&image).unwrap());
    let mut selection = SelectionSet::new(Arc::clone(&collection));
    selection.toggle_at(1, 0);
    let options = CompositeOptions::default();

    let bright = render(&image, &collection, &selection.snapshot(), &options);
    let normal = render(&image, &collection, &[], &options);

    let mut sync = BlinkSynchronizer::default();
    let (tx, rx) = mpsc::channel();
    sync.start(
        Arc::clone(&image),
        Arc::clone(&collection),
        selection.snapshot(),
        options,
        rx,
    )
    .unwrap();
    tx.send(TimelineEvent::new(0, BlinkKind::On)).unwrap();
    tx.send(TimelineEvent::new(1, BlinkKind::Off)).unwrap();
    drop(tx);

    let mut frames = Vec::new();
    loop {
        match sync.recv_timeout(WAIT).expect("blink message") {
            BlinkMessage::Frame { frame, .. } => frames.push(frame),
            BlinkMessage::Finished { reason } => {
                assert_eq!(reason, FinishReason::Exhausted);
                break;
            }
        }
    }
    assert_eq!(frames, vec![bright, normal]);
    assert_eq!(sync.state(), SyncState::Stopped);
}

#[test]
fn test_blink_snapshot_ignores_later_edits() {
    let image = Arc::new(padded_image());
    let collection = Arc::new(ThresholdProducer::new(100).produce(&image).unwrap());
    let mut selection = SelectionSet::new(Arc::clone(&collection));
    selection.toggle_at(1, 0);
    let options = CompositeOptions::default();
    let expected = render(&image, &collection, &selection.snapshot(), &options);

    let mut sync = BlinkSynchronizer::default();
    let (tx, rx) = mpsc::channel();
    sync.start(
        Arc::clone(&image),
        Arc::clone(&collection),
        selection.snapshot(),
        options,
        rx,
    )
    .unwrap();
    selection.clear();
    tx.send(TimelineEvent::new(0, BlinkKind::On)).unwrap();

    match sync.recv_timeout(WAIT).expect("frame") {
        BlinkMessage::Frame { frame, .. } => assert_eq!(frame, expected),
        other => panic!("expected frame, got {:?}", other),
    }
    sync.stop();
}

//! Load, produce in the background, select and export, as the CLI does.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use ndarray::Array3;
use ndarray_npy::WriteNpyExt;

use crate::config::AppConfig;
use crate::data::{RasterImage, load_image_from_bytes};
use crate::export::SvgDocument;
use crate::producer::{ModelProducer, NpyMaskModel, ProductionError, RegionProducer};
use crate::session::Session;

const WAIT: Duration = Duration::from_secs(5);

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 20) as u8, (y * 20) as u8, 128])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Three masks: a large background block, a small square on top of it, and
/// an empty mask that must be dropped.
fn mask_stack(width: usize, height: usize) -> Vec<u8> {
    let stack = Array3::from_shape_fn((3, height, width), |(i, y, x)| match i {
        0 => u8::from(y < height / 2),
        1 => u8::from((1..3).contains(&x) && (1..3).contains(&y)),
        _ => 0,
    });
    let mut bytes = Vec::new();
    stack.write_npy(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_model_pipeline() {
    let image = load_image_from_bytes(&png_bytes(6, 6), Some("photo.png")).unwrap();
    assert!(matches!(image, RasterImage::Rgb(_)));

    let config = AppConfig::default();
    let mut session = Session::new(image.clone(), &config).unwrap();

    let model = NpyMaskModel::from_bytes(&mask_stack(6, 6), "masks.npy").unwrap();
    let producer: Arc<dyn RegionProducer> = Arc::new(ModelProducer::new(model).with_color_seed(7));
    session.request_production(image, producer).unwrap();
    assert!(session.wait_for_production(WAIT).unwrap());

    let collection = Arc::clone(session.collection());
    assert_eq!(collection.len(), 2, "empty mask dropped");
    for region in collection.iter() {
        assert_eq!((region.width(), region.height()), (6, 6));
    }

    // (1, 1) is covered by both masks; the earlier one wins.
    let hit = session.toggle_at(1, 1).unwrap();
    assert_eq!(hit.id(), 0);
    // (2, 4) is below the large block and outside the square
    let hit = session.toggle_at(2, 4);
    assert!(hit.is_none());
    assert_eq!(session.selected().len(), 1);

    let document = SvgDocument::from_selection(&session.selected()).unwrap();
    assert_eq!(document.polygons().len(), 1);
    assert_eq!(
        document.polygons()[0].points,
        vec![(0, 0), (5, 0), (5, 2), (0, 2)]
    );
}

#[test]
fn test_model_dimension_mismatch_keeps_session() {
    let image = load_image_from_bytes(&png_bytes(5, 4), Some("photo.png")).unwrap();
    let mut session = Session::new(image.clone(), &AppConfig::default()).unwrap();
    let before = Arc::clone(session.collection());

    let model = NpyMaskModel::from_bytes(&mask_stack(6, 6), "masks.npy").unwrap();
    let producer: Arc<dyn RegionProducer> = Arc::new(ModelProducer::new(model));
    session.request_production(image, producer).unwrap();

    let result = session.wait_for_production(WAIT);
    assert!(matches!(
        result,
        Err(ProductionError::DimensionMismatch { .. })
    ));
    assert!(Arc::ptr_eq(session.collection(), &before));
}

#[test]
fn test_colors_are_stable_across_productions() {
    let image = RasterImage::gray_from_fn(6, 6, |_, _| 0);
    let producer = ModelProducer::new(
        NpyMaskModel::from_bytes(&mask_stack(6, 6), "masks.npy").unwrap(),
    )
    .with_color_seed(42);

    let first = producer.produce(&image).unwrap();
    let second = producer.produce(&image).unwrap();
    let colors = |c: &crate::model::RegionCollection| {
        c.iter().map(|r| r.display_color()).collect::<Vec<_>>()
    };
    assert_eq!(colors(&first), colors(&second));
}

//! Error handling edge cases across the public API
//!
//! Verifies that invalid parameters are rejected before any pixel work, that
//! failures stay local to one request, and that no partial results escape.

use bgcompose::{
    composite, AlphaMatte, Background, BackendKind, CompositeConfig, CompositeError,
    CompositionProcessor, Foreground, MockMattingBackend, PassthroughMattingBackend,
};
use image::{DynamicImage, Rgba, RgbaImage};

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    buffer
}

#[test]
fn parameters_rejected_before_processing() {
    // Negative feather radius
    let err = CompositeConfig::builder()
        .feather_radius(-0.5)
        .build()
        .unwrap_err();
    assert!(matches!(err, CompositeError::InvalidConfig(_)));

    // Desaturation outside [0, 1]
    let err = CompositeConfig::builder()
        .desaturation(1.01)
        .build()
        .unwrap_err();
    assert!(matches!(err, CompositeError::InvalidConfig(_)));

    // Non-finite blur radius
    let err = CompositeConfig::builder()
        .blur_radius(f32::INFINITY)
        .build()
        .unwrap_err();
    assert!(matches!(err, CompositeError::InvalidConfig(_)));
}

#[test]
fn processor_construction_validates_config() {
    let config = CompositeConfig {
        feather_radius: f32::NAN,
        ..CompositeConfig::default()
    };
    let result = CompositionProcessor::new(config, Box::new(PassthroughMattingBackend));
    assert!(matches!(result, Err(CompositeError::InvalidConfig(_))));
}

#[test]
fn undecodable_input_is_an_error_not_a_panic() {
    let processor = CompositionProcessor::new(
        CompositeConfig::default(),
        Box::new(PassthroughMattingBackend),
    )
    .unwrap();

    let result = processor.process_bytes(b"not an image at all", &Background::Transparent);
    assert!(result.is_err());
}

#[test]
fn missing_matting_command_surfaces_matting_error() {
    let config = CompositeConfig::builder()
        .backend(BackendKind::Command(
            "bgcompose-nonexistent-matting-tool - -".to_string(),
        ))
        .build()
        .unwrap();
    let processor = CompositionProcessor::from_config(config).unwrap();

    let input = png_bytes(&RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
    let result = processor.process_bytes(&input, &Background::Transparent);
    assert!(matches!(result, Err(CompositeError::Matting(_))));
}

#[test]
fn blurred_original_size_mismatch_is_fatal_for_that_request() {
    let fg = Foreground::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));

    let result = composite(
        &fg,
        &Background::BlurredOriginal {
            source: RgbaImage::new(5, 5),
            radius: 1.0,
        },
    );
    match result {
        Err(CompositeError::DimensionMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, (4, 4));
            assert_eq!(actual, (5, 5));
        },
        other => panic!("expected DimensionMismatch, got {:?}", other.map(|_| ())),
    }

    // The same foreground still composites fine afterwards: failures are
    // local to one request
    assert!(composite(&fg, &Background::Solid { r: 0, g: 0, b: 0 }).is_ok());
}

#[test]
fn negative_blur_radius_rejected_at_composite_time() {
    let fg = Foreground::from_rgba(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])));
    let result = composite(
        &fg,
        &Background::BlurredOriginal {
            source: RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
            radius: -3.0,
        },
    );
    assert!(matches!(result, Err(CompositeError::InvalidConfig(_))));
}

#[test]
fn mismatched_foreground_buffers_rejected() {
    let color = RgbaImage::new(4, 4);
    let matte = AlphaMatte::new(vec![255; 9], (3, 3));
    assert!(matches!(
        Foreground::new(color, matte),
        Err(CompositeError::DimensionMismatch { .. })
    ));
}

#[test]
fn failed_request_does_not_affect_following_ones() {
    let processor = CompositionProcessor::new(
        CompositeConfig::default(),
        Box::new(MockMattingBackend::new(255)),
    )
    .unwrap();

    let bad = processor.process_bytes(b"garbage", &Background::Transparent);
    assert!(bad.is_err());

    let input = png_bytes(&RgbaImage::from_pixel(2, 2, Rgba([5, 5, 5, 255])));
    let good = processor.process_bytes(&input, &Background::Solid { r: 1, g: 1, b: 1 });
    assert!(good.is_ok());
}

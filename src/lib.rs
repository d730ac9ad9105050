#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # bgcompose
//!
//! Background removal compositing: take a subject cut out by a matting model
//! and blend it convincingly onto a new background: transparent, solid
//! color, a blurred version of the original photo, or an arbitrary
//! replacement image.
//!
//! The matting model itself is an external collaborator (any command or
//! function turning image bytes into image bytes with an alpha channel).
//! This crate owns everything after that point:
//!
//! - **Edge refinement**: Gaussian feathering of the matte plus an erosion
//!   offset that discards low-confidence rim pixels
//! - **Color decontamination**: matte-weighted desaturation that dilutes
//!   background tint bleeding into translucent edges
//! - **Compositing**: one alpha-blend law over three background strategies,
//!   always producing a fully opaque result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgcompose::{Background, BackendKind, CompositeConfig, composite_from_bytes};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CompositeConfig::builder()
//!     .feather_radius(3.0)
//!     .erosion(10)
//!     .desaturation(0.6)
//!     .backend(BackendKind::Command("rembg i - -".to_string()))
//!     .build()?;
//!
//! let input = tokio::fs::read("photo.jpg").await?;
//! let result = composite_from_bytes(
//!     &input,
//!     &Background::Solid { r: 255, g: 255, b: 255 },
//!     &config,
//! )
//! .await?;
//! result.save_png("photo_white.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pre-matted inputs
//!
//! When the input already carries an alpha matte (e.g. a PNG produced by a
//! separate removal step), use the passthrough backend or the processor's
//! `process_foreground` to skip the matting call:
//!
//! ```rust,no_run
//! use bgcompose::{Background, CompositeConfig, CompositionProcessor};
//!
//! # fn example() -> anyhow::Result<()> {
//! let processor = CompositionProcessor::from_config(CompositeConfig::default())?;
//! let cutout = image::open("cutout.png")?;
//! let result = processor.process_foreground(&cutout, &Background::Transparent)?;
//! result.save_png("refined.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): command-line interface and batch driver

#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod decontaminate;
pub mod error;
pub mod matting;
pub mod processor;
pub mod refine;
pub mod services;
pub mod types;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use compositor::composite;
pub use config::{Background, CompositeConfig, CompositeConfigBuilder, OutputFormat};
pub use decontaminate::decontaminate;
pub use error::{CompositeError, Result};
pub use matting::{
    BackendKind, CommandMattingBackend, MattingBackend, MockMattingBackend,
    PassthroughMattingBackend,
};
pub use processor::{BackendFactory, CompositionProcessor, DefaultBackendFactory};
pub use refine::refine;
pub use services::ImageIoService;
pub use types::{
    AlphaMatte, CompositeResult, Foreground, MatteStatistics, ProcessingMetadata,
    ProcessingTimings,
};

/// Composite an image provided as encoded bytes
///
/// Runs the configured matting backend, refines and decontaminates the
/// cutout, and blends it onto `background`. Suitable for web servers and
/// memory-based processing.
///
/// # Errors
///
/// `Matting` for backend failures, `Image` for undecodable input or backend
/// output, `InvalidConfig` for out-of-range parameters.
pub async fn composite_from_bytes(
    image_bytes: &[u8],
    background: &Background,
    config: &CompositeConfig,
) -> Result<CompositeResult> {
    let processor = CompositionProcessor::from_config(config.clone())?;
    processor.process_bytes(image_bytes, background)
}

/// Composite an image from an async reader stream
///
/// Accepts any async readable stream, making it suitable for network
/// streams or large files.
///
/// # Errors
///
/// `Io` when the stream cannot be read, plus any [`composite_from_bytes`]
/// error.
pub async fn composite_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    background: &Background,
    config: &CompositeConfig,
) -> Result<CompositeResult> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer)
        .await
        .map_err(|e| CompositeError::processing(format!("Failed to read from stream: {}", e)))?;

    composite_from_bytes(&buffer, background, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_composite_from_bytes_passthrough() {
        let config = CompositeConfig::builder()
            .feather_radius(0.0)
            .erosion(0)
            .desaturation(1.0)
            .build()
            .unwrap();

        let input = png_bytes(&RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])));
        let result = composite_from_bytes(
            &input,
            &Background::Solid { r: 0, g: 0, b: 255 },
            &config,
        )
        .await
        .unwrap();

        assert!(result.is_fully_opaque());
        for pixel in result.image.to_rgba8().pixels() {
            assert_eq!(pixel, &Rgba([255, 0, 0, 255]));
        }
    }

    #[tokio::test]
    async fn test_composite_from_reader() {
        let config = CompositeConfig::builder()
            .feather_radius(0.0)
            .erosion(0)
            .desaturation(1.0)
            .build()
            .unwrap();

        let input = png_bytes(&RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        let reader = std::io::Cursor::new(input);

        let result = composite_from_reader(reader, &Background::Transparent, &config)
            .await
            .unwrap();
        assert_eq!(result.dimensions, (2, 2));
    }

    #[tokio::test]
    async fn test_composite_from_bytes_rejects_garbage() {
        let config = CompositeConfig::default();
        let result = composite_from_bytes(
            b"not an image",
            &Background::Transparent,
            &config,
        )
        .await;
        assert!(result.is_err());
    }
}

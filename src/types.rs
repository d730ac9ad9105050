//! Core types for compositing operations

use crate::{config::OutputFormat, error::Result};
use image::{DynamicImage, GenericImageView, ImageBuffer, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Single-channel foreground coverage map
///
/// Value 0 is fully background, 255 fully foreground; intermediate values are
/// partial coverage (hair, soft edges).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaMatte {
    /// Matte data as grayscale values (0-255)
    pub data: Vec<u8>,

    /// Matte dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl AlphaMatte {
    /// Create a new alpha matte
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Extract the matte from an RGBA image's alpha plane
    #[must_use]
    pub fn from_alpha_channel(image: &RgbaImage) -> Self {
        let data = image.pixels().map(|p| p[3]).collect();
        Self::new(data, image.dimensions())
    }

    /// Create a matte from a grayscale image
    #[must_use]
    pub fn from_image(image: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert the matte to a grayscale image
    pub fn to_image(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            crate::error::CompositeError::processing("Failed to create image from matte data")
        })
    }

    /// Replace an RGBA image's alpha channel with this matte
    pub fn apply_to_image(&self, image: &mut RgbaImage) -> Result<()> {
        if image.dimensions() != self.dimensions {
            return Err(crate::error::CompositeError::dimension_mismatch(
                self.dimensions,
                image.dimensions(),
                "alpha application",
            ));
        }

        for (pixel, &alpha) in image.pixels_mut().zip(self.data.iter()) {
            pixel[3] = alpha;
        }

        Ok(())
    }

    /// Resize the matte to new dimensions
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<AlphaMatte> {
        let current_image = self.to_image()?;
        let resized = image::imageops::resize(
            &current_image,
            new_width,
            new_height,
            image::imageops::FilterType::Lanczos3,
        );

        Ok(AlphaMatte::from_image(&resized))
    }

    /// Get matte coverage statistics
    #[must_use]
    pub fn statistics(&self) -> MatteStatistics {
        let total_pixels = self.data.len();
        let foreground_pixels = self.data.iter().filter(|&&x| x > 127).count();
        let background_pixels = total_pixels - foreground_pixels;

        MatteStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: foreground_pixels as f32 / total_pixels as f32,
            background_ratio: background_pixels as f32 / total_pixels as f32,
        }
    }

    /// Save the matte as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.to_image()?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Statistics about an alpha matte
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatteStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// The subject to be kept: color image plus its coverage matte
///
/// Invariant: the color buffer and the matte share the same dimensions.
#[derive(Debug, Clone)]
pub struct Foreground {
    /// RGBA color buffer (alpha mirrors the matte)
    pub color: RgbaImage,

    /// Coverage matte used as the blend weight
    pub matte: AlphaMatte,
}

impl Foreground {
    /// Create a foreground from a color buffer and matching matte
    pub fn new(color: RgbaImage, matte: AlphaMatte) -> Result<Self> {
        if color.dimensions() != matte.dimensions {
            return Err(crate::error::CompositeError::dimension_mismatch(
                matte.dimensions,
                color.dimensions(),
                "foreground construction",
            ));
        }
        Ok(Self { color, matte })
    }

    /// Build a foreground from an RGBA image, taking the alpha plane as matte
    #[must_use]
    pub fn from_rgba(color: RgbaImage) -> Self {
        let matte = AlphaMatte::from_alpha_channel(&color);
        Self { color, matte }
    }

    /// Foreground dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// Result of a compositing operation
#[derive(Debug, Clone)]
pub struct CompositeResult {
    /// The final composited image
    pub image: DynamicImage,

    /// The refined matte used for blending
    pub matte: AlphaMatte,

    /// Original input dimensions
    pub dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: ProcessingMetadata,
}

impl CompositeResult {
    /// Create a new composite result
    #[must_use]
    pub fn new(image: DynamicImage, matte: AlphaMatte, metadata: ProcessingMetadata) -> Self {
        let dimensions = image.dimensions();
        Self {
            image,
            matte,
            dimensions,
            metadata,
        }
    }

    /// Save the result as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Save the result as JPEG
    ///
    /// JPEG carries no alpha; the image is converted to RGB. The compositor
    /// already guarantees full opacity for every non-transparent strategy.
    pub fn save_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<()> {
        let rgb_image = self.image.to_rgb8();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            std::fs::File::create(path)?,
            quality,
        );
        encoder.encode_image(&rgb_image)?;
        Ok(())
    }

    /// Save in the specified format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        match format {
            OutputFormat::Png => self.save_png(path),
            OutputFormat::Jpeg => self.save_jpeg(path, quality),
            OutputFormat::WebP => {
                self.image.save_with_format(path, image::ImageFormat::WebP)?;
                Ok(())
            },
            OutputFormat::Rgba8 => {
                let rgba_image = self.image.to_rgba8();
                std::fs::write(path, rgba_image.as_raw())?;
                Ok(())
            },
        }
    }

    /// Get the image as raw RGBA bytes
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.image.to_rgba8().into_raw()
    }

    /// Get the image as encoded bytes in the specified format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Png => {
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                self.image.write_to(&mut cursor, image::ImageFormat::Png)?;
                Ok(buffer)
            },
            OutputFormat::Jpeg => {
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                let rgb_image = self.image.to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                encoder.encode_image(&rgb_image)?;
                Ok(buffer)
            },
            OutputFormat::WebP => {
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                self.image.write_to(&mut cursor, image::ImageFormat::WebP)?;
                Ok(buffer)
            },
            OutputFormat::Rgba8 => Ok(self.to_rgba_bytes()),
        }
    }

    /// Check whether every pixel is fully opaque
    #[must_use]
    pub fn is_fully_opaque(&self) -> bool {
        self.image.to_rgba8().pixels().all(|p| p[3] == 255)
    }

    /// Get detailed timing breakdown
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }
}

/// Detailed timing breakdown for one compositing request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Input decoding from bytes
    pub decode_ms: u64,

    /// External matting backend call
    pub matting_ms: u64,

    /// Matte feathering and erosion
    pub refine_ms: u64,

    /// Edge color decontamination
    pub decontaminate_ms: u64,

    /// Background preparation and blend
    pub composite_ms: u64,

    /// Final image encoding (if encoded)
    pub encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    /// Timing summary for display
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Total: {}ms | Decode: {}ms | Matting: {}ms | Refine: {}ms | Decontaminate: {}ms | Composite: {}ms",
            self.total_ms,
            self.decode_ms,
            self.matting_ms,
            self.refine_ms,
            self.decontaminate_ms,
            self.composite_ms
        );

        if let Some(encode_ms) = self.encode_ms {
            summary.push_str(&format!(" | Encode: {}ms", encode_ms));
        }

        summary
    }
}

/// Metadata about one compositing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Detailed timing breakdown
    pub timings: ProcessingTimings,

    /// Background strategy applied
    pub background: String,

    /// Matting backend used
    pub backend_name: String,
}

impl ProcessingMetadata {
    /// Create new processing metadata
    #[must_use]
    pub fn new(background: String, backend_name: String) -> Self {
        Self {
            timings: ProcessingTimings::default(),
            background,
            backend_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_alpha_matte_creation() {
        let data = vec![255, 128, 0, 255];
        let matte = AlphaMatte::new(data, (2, 2));

        assert_eq!(matte.dimensions, (2, 2));
        assert_eq!(matte.data.len(), 4);
    }

    #[test]
    fn test_matte_from_alpha_channel() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([10, 20, 30, 200]));
        image.put_pixel(1, 0, Rgba([40, 50, 60, 17]));

        let matte = AlphaMatte::from_alpha_channel(&image);
        assert_eq!(matte.data, vec![200, 17]);
    }

    #[test]
    fn test_matte_apply_to_image() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 0]));
        let matte = AlphaMatte::new(vec![255, 128, 64, 0], (2, 2));

        matte.apply_to_image(&mut image).unwrap();
        assert_eq!(image.get_pixel(0, 0)[3], 255);
        assert_eq!(image.get_pixel(1, 0)[3], 128);
        assert_eq!(image.get_pixel(0, 1)[3], 64);
        assert_eq!(image.get_pixel(1, 1)[3], 0);
        // Color channels untouched
        assert_eq!(&image.get_pixel(0, 0).0[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_matte_apply_dimension_mismatch() {
        let mut image = RgbaImage::new(3, 3);
        let matte = AlphaMatte::new(vec![0; 4], (2, 2));

        assert!(matte.apply_to_image(&mut image).is_err());
    }

    #[test]
    fn test_matte_statistics() {
        let data = vec![255, 255, 0, 0]; // 2 foreground, 2 background
        let matte = AlphaMatte::new(data, (2, 2));

        let stats = matte.statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert_eq!(stats.foreground_ratio, 0.5);
        assert_eq!(stats.background_ratio, 0.5);
    }

    #[test]
    fn test_matte_resize() {
        let matte = AlphaMatte::new(vec![200; 4], (2, 2));
        let resized = matte.resize(4, 4).unwrap();

        assert_eq!(resized.dimensions, (4, 4));
        assert_eq!(resized.data.len(), 16);
        // Resampling a constant field should stay constant up to rounding
        for &value in &resized.data {
            assert!(value.abs_diff(200) <= 1);
        }
    }

    #[test]
    fn test_matte_save_png_round_trip() {
        let matte = AlphaMatte::new(vec![0, 64, 128, 255], (2, 2));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matte.png");

        matte.save_png(&path).unwrap();

        let reloaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(reloaded.dimensions(), (2, 2));
        assert_eq!(reloaded.into_raw(), matte.data);
    }

    #[test]
    fn test_foreground_dimension_validation() {
        let color = RgbaImage::new(4, 4);
        let matte = AlphaMatte::new(vec![0; 4], (2, 2));
        assert!(Foreground::new(color, matte).is_err());

        let color = RgbaImage::new(2, 2);
        let matte = AlphaMatte::new(vec![0; 4], (2, 2));
        assert!(Foreground::new(color, matte).is_ok());
    }
}

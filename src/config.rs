//! Configuration types for compositing operations

use crate::{
    error::{CompositeError, Result},
    matting::BackendKind,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// JPEG (no transparency, opaque composites only)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

/// Background strategy for the final composite
///
/// All non-transparent strategies produce a fully opaque result; the blend
/// law fills any alpha deficit from the background side.
#[derive(Debug, Clone)]
pub enum Background {
    /// Keep the cutout as-is: refined matte, no background blend
    Transparent,
    /// Uniform opaque color canvas
    Solid { r: u8, g: u8, b: u8 },
    /// The original, unmatted photo softened with a Gaussian blur.
    ///
    /// `radius` is the blur standard deviation; 0.0 means no blur. The
    /// source must match the foreground's dimensions exactly.
    BlurredOriginal { source: RgbaImage, radius: f32 },
    /// An arbitrary replacement image, stretched to the foreground's size
    Replacement { image: RgbaImage },
}

impl Background {
    /// Short strategy name for logging and metadata
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::Solid { .. } => "solid",
            Self::BlurredOriginal { .. } => "blurred-original",
            Self::Replacement { .. } => "replacement",
        }
    }

    /// Validate strategy parameters before any pixel work
    pub fn validate(&self) -> Result<()> {
        if let Self::BlurredOriginal { radius, .. } = self {
            if !radius.is_finite() || *radius < 0.0 {
                return Err(CompositeError::config_value_error(
                    "blur radius",
                    radius,
                    ">= 0.0",
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for compositing operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Gaussian feathering sigma applied to the matte (0.0 = none)
    pub feather_radius: f32,

    /// Offset subtracted from every matte value to contract the cutout
    /// inward, discarding low-confidence rim pixels
    pub erosion: u8,

    /// Fraction of original saturation retained at translucent edge pixels
    /// (1.0 = unchanged, 0.0 = fully gray)
    pub desaturation: f32,

    /// Default blur sigma for the blurred-original background strategy
    pub blur_radius: f32,

    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// WebP quality (0-100, only used for WebP output)
    pub webp_quality: u8,

    /// Enable debug mode (additional logging and validation)
    pub debug: bool,

    /// Matting backend to construct for byte-level entry points
    pub backend: BackendKind,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            feather_radius: 3.0,
            erosion: 10,
            desaturation: 0.6,
            blur_radius: 22.0,
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            webp_quality: 85,
            debug: false,
            backend: BackendKind::default(),
        }
    }
}

impl CompositeConfig {
    /// Create a new configuration builder for fluent construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgcompose::CompositeConfig;
    ///
    /// let config = CompositeConfig::builder()
    ///     .feather_radius(2.0)
    ///     .erosion(8)
    ///     .desaturation(0.5)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> CompositeConfigBuilder {
        CompositeConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Feather and blur radii: finite, >= 0
    /// - Desaturation factor: within [0, 1]
    /// - JPEG/WebP quality: 0-100 (inclusive)
    ///
    /// # Errors
    ///
    /// `InvalidConfig` with the offending parameter and valid range.
    pub fn validate(&self) -> Result<()> {
        if !self.feather_radius.is_finite() || self.feather_radius < 0.0 {
            return Err(CompositeError::config_value_error(
                "feather radius",
                self.feather_radius,
                ">= 0.0",
            ));
        }
        if !self.desaturation.is_finite() || !(0.0..=1.0).contains(&self.desaturation) {
            return Err(CompositeError::config_value_error(
                "desaturation",
                self.desaturation,
                "0.0-1.0",
            ));
        }
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(CompositeError::config_value_error(
                "blur radius",
                self.blur_radius,
                ">= 0.0",
            ));
        }
        if self.jpeg_quality > 100 {
            return Err(CompositeError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
            ));
        }
        if self.webp_quality > 100 {
            return Err(CompositeError::config_value_error(
                "WebP quality",
                self.webp_quality,
                "0-100",
            ));
        }
        Ok(())
    }
}

/// Builder for `CompositeConfig`
#[derive(Debug, Default)]
pub struct CompositeConfigBuilder {
    config: CompositeConfig,
}

impl CompositeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn feather_radius(mut self, radius: f32) -> Self {
        self.config.feather_radius = radius;
        self
    }

    #[must_use]
    pub fn erosion(mut self, erosion: u8) -> Self {
        self.config.erosion = erosion;
        self
    }

    #[must_use]
    pub fn desaturation(mut self, factor: f32) -> Self {
        self.config.desaturation = factor;
        self
    }

    #[must_use]
    pub fn blur_radius(mut self, radius: f32) -> Self {
        self.config.blur_radius = radius;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    #[must_use]
    pub fn webp_quality(mut self, quality: u8) -> Self {
        self.config.webp_quality = quality;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Build the configuration, validating all parameters
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for out-of-range parameters.
    pub fn build(self) -> Result<CompositeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompositeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feather_radius, 3.0);
        assert_eq!(config.erosion, 10);
        assert_eq!(config.desaturation, 0.6);
        assert_eq!(config.blur_radius, 22.0);
    }

    #[test]
    fn test_builder_rejects_out_of_range() {
        assert!(CompositeConfig::builder().feather_radius(-1.0).build().is_err());
        assert!(CompositeConfig::builder().desaturation(1.5).build().is_err());
        assert!(CompositeConfig::builder().desaturation(-0.1).build().is_err());
        assert!(CompositeConfig::builder().blur_radius(f32::NAN).build().is_err());
        assert!(CompositeConfig::builder().jpeg_quality(150).build().is_err());
    }

    #[test]
    fn test_builder_accepts_boundaries() {
        assert!(CompositeConfig::builder()
            .feather_radius(0.0)
            .erosion(0)
            .desaturation(0.0)
            .build()
            .is_ok());
        assert!(CompositeConfig::builder().desaturation(1.0).build().is_ok());
    }

    #[test]
    fn test_background_validation() {
        let bg = Background::Solid { r: 255, g: 255, b: 255 };
        assert!(bg.validate().is_ok());
        assert_eq!(bg.name(), "solid");

        let bg = Background::BlurredOriginal {
            source: RgbaImage::new(1, 1),
            radius: -2.0,
        };
        assert!(bg.validate().is_err());
    }
}

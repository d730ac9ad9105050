//! Image I/O operations service
//!
//! Separates file I/O from the pixel pipeline, keeping the compositor free of
//! filesystem concerns.

use crate::{
    config::OutputFormat,
    error::{CompositeError, Result},
};
use image::DynamicImage;
use std::path::Path;

/// Service for handling image file input/output operations
pub struct ImageIoService;

impl ImageIoService {
    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first, then falls back to
    /// content-based detection for files with misleading extensions.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, `Processing` when neither
    /// detection strategy can decode it.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(CompositeError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    CompositeError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    CompositeError::processing_stage_error(
                        "image loading",
                        &format!(
                            "Failed to load '{}' with both extension-based and content-based detection. Extension error: {}. Content error: {}",
                            path_ref.display(),
                            e,
                            content_err
                        ),
                    )
                })
            },
        }
    }

    /// Read raw file bytes
    ///
    /// # Errors
    ///
    /// `Io` with path context when the file cannot be read.
    pub fn load_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        std::fs::read(path_ref)
            .map_err(|e| CompositeError::file_io_error("read file", path_ref, &e))
    }

    /// Decode encoded image bytes
    ///
    /// # Errors
    ///
    /// `Image` when the bytes are not a valid raster image.
    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        Ok(image::load_from_memory(bytes)?)
    }

    /// File extension for an output format
    #[must_use]
    pub fn extension_for(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Rgba8 => "rgba8",
        }
    }
}

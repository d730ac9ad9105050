//! Error types for compositing operations

use thiserror::Error;

/// Result type alias for compositing operations
pub type Result<T> = std::result::Result<T, CompositeError>;

/// Error taxonomy for the compositing pipeline
#[derive(Error, Debug)]
pub enum CompositeError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Images combined pixel-wise do not share the same dimensions
    #[error("Dimension mismatch in {context}: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        /// Dimensions the operation required
        expected: (u32, u32),
        /// Dimensions actually supplied
        actual: (u32, u32),
        /// Which operation detected the mismatch
        context: String,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// External matting backend failure
    #[error("Matting error: {0}")]
    Matting(String),

    /// Pixel processing errors
    #[error("Processing error: {0}")]
    Processing(String),
}

impl CompositeError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new matting backend error
    pub fn matting<S: Into<String>>(msg: S) -> Self {
        Self::Matting(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a dimension mismatch error with operation context
    pub fn dimension_mismatch(
        expected: (u32, u32),
        actual: (u32, u32),
        context: &str,
    ) -> Self {
        Self::DimensionMismatch {
            expected,
            actual,
            context: context.to_string(),
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str) -> Self {
        Self::Processing(format!("Processing failed at stage '{}': {}", stage, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CompositeError::invalid_config("test config error");
        assert!(matches!(err, CompositeError::InvalidConfig(_)));

        let err = CompositeError::matting("backend exited with status 1");
        assert!(matches!(err, CompositeError::Matting(_)));
    }

    #[test]
    fn test_error_display() {
        let err = CompositeError::invalid_config("negative blur radius");
        assert_eq!(err.to_string(), "Invalid configuration: negative blur radius");

        let err = CompositeError::dimension_mismatch((4, 4), (2, 2), "blurred-original blend");
        let msg = err.to_string();
        assert!(msg.contains("4x4"));
        assert!(msg.contains("2x2"));
        assert!(msg.contains("blurred-original blend"));
    }

    #[test]
    fn test_config_value_error() {
        let err = CompositeError::config_value_error("desaturation", 1.5, "0.0-1.0");
        let msg = err.to_string();
        assert!(msg.contains("desaturation"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("0.0-1.0"));
    }
}

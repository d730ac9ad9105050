//! Unified compositing processor
//!
//! `CompositionProcessor` consolidates the whole pipeline (matting call,
//! matte refinement, color decontamination, background blend) behind one
//! type so the library API and the CLI behave identically.

use crate::{
    compositor,
    config::{Background, CompositeConfig},
    decontaminate, refine,
    error::{CompositeError, Result},
    matting::{BackendKind, CommandMattingBackend, MattingBackend, PassthroughMattingBackend},
    types::{AlphaMatte, CompositeResult, Foreground, ProcessingMetadata},
};
use image::DynamicImage;
use instant::Instant;
use log::debug;
use tracing::{debug as trace_debug, instrument};

/// Factory trait for creating matting backends
///
/// Frontends can inject their own factory to supply custom backends.
pub trait BackendFactory: Send + Sync {
    /// Create a backend of the requested kind
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for unsupported or malformed backend specifications.
    fn create_backend(&self, kind: &BackendKind) -> Result<Box<dyn MattingBackend>>;
}

/// Default backend factory covering the shipped backends
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(&self, kind: &BackendKind) -> Result<Box<dyn MattingBackend>> {
        match kind {
            BackendKind::Command(command_line) => Ok(Box::new(
                CommandMattingBackend::from_command_line(command_line)?,
            )),
            BackendKind::Passthrough => Ok(Box::new(PassthroughMattingBackend)),
        }
    }
}

/// Compositing processor combining a matting backend with the pixel pipeline
pub struct CompositionProcessor {
    config: CompositeConfig,
    backend: Box<dyn MattingBackend>,
}

impl CompositionProcessor {
    /// Create a processor with an explicit backend
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the configuration fails validation.
    pub fn new(config: CompositeConfig, backend: Box<dyn MattingBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    /// Create a processor through a backend factory
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for invalid configuration or backend specification.
    pub fn with_factory(
        config: CompositeConfig,
        kind: &BackendKind,
        factory: &dyn BackendFactory,
    ) -> Result<Self> {
        let backend = factory.create_backend(kind)?;
        Self::new(config, backend)
    }

    /// Create a processor from a configuration alone, using the default
    /// factory and the configuration's backend selection
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for invalid configuration or backend specification.
    pub fn from_config(config: CompositeConfig) -> Result<Self> {
        let kind = config.backend.clone();
        Self::with_factory(config, &kind, &DefaultBackendFactory)
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Process encoded image bytes end to end
    ///
    /// Runs the matting backend, refines the resulting matte, decontaminates
    /// edge colors and blends onto the requested background.
    ///
    /// # Errors
    ///
    /// `Matting` for backend failures, `Image` for undecodable backend
    /// output, plus any compositing error.
    #[instrument(skip_all, fields(backend = self.backend.name(), background = background.name()))]
    pub fn process_bytes(
        &self,
        image_bytes: &[u8],
        background: &Background,
    ) -> Result<CompositeResult> {
        let total_start = Instant::now();
        let mut metadata = ProcessingMetadata::new(
            background.name().to_string(),
            self.backend.name().to_string(),
        );

        let matting_start = Instant::now();
        let matted_bytes = self.backend.remove_foreground(image_bytes)?;
        metadata.timings.matting_ms = matting_start.elapsed().as_millis() as u64;

        let decode_start = Instant::now();
        let matted = image::load_from_memory(&matted_bytes).map_err(|e| {
            CompositeError::processing_stage_error(
                "matted image decoding",
                &format!("backend output is not a valid image: {}", e),
            )
        })?;
        metadata.timings.decode_ms = decode_start.elapsed().as_millis() as u64;

        self.finish(&matted, background, metadata, total_start)
    }

    /// Process a pre-decoded image whose alpha plane is the raw matte
    ///
    /// Skips the matting backend entirely.
    ///
    /// # Errors
    ///
    /// Any refinement, decontamination or compositing error.
    #[instrument(skip_all, fields(background = background.name()))]
    pub fn process_foreground(
        &self,
        image: &DynamicImage,
        background: &Background,
    ) -> Result<CompositeResult> {
        let total_start = Instant::now();
        let metadata =
            ProcessingMetadata::new(background.name().to_string(), "pre-decoded".to_string());
        self.finish(image, background, metadata, total_start)
    }

    fn finish(
        &self,
        matted: &DynamicImage,
        background: &Background,
        mut metadata: ProcessingMetadata,
        total_start: Instant,
    ) -> Result<CompositeResult> {
        background.validate()?;

        let color = matted.to_rgba8();
        let raw_matte = AlphaMatte::from_alpha_channel(&color);
        debug!(
            "Raw matte covers {:.1}% of the frame",
            raw_matte.statistics().foreground_ratio * 100.0
        );

        let refine_start = Instant::now();
        let refined = refine::refine(&raw_matte, self.config.feather_radius, self.config.erosion)?;
        metadata.timings.refine_ms = refine_start.elapsed().as_millis() as u64;

        let decontaminate_start = Instant::now();
        let decontaminated =
            decontaminate::decontaminate(&color, &refined, self.config.desaturation)?;
        metadata.timings.decontaminate_ms = decontaminate_start.elapsed().as_millis() as u64;

        let foreground = Foreground::new(decontaminated, refined.clone())?;

        let composite_start = Instant::now();
        let composited = compositor::composite(&foreground, background)?;
        metadata.timings.composite_ms = composite_start.elapsed().as_millis() as u64;

        metadata.timings.total_ms = total_start.elapsed().as_millis() as u64;
        trace_debug!("{}", metadata.timings.summary());

        Ok(CompositeResult::new(
            DynamicImage::ImageRgba8(composited),
            refined,
            metadata,
        ))
    }
}

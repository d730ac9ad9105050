//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliBackground, CliOutputFormat};
use crate::{
    config::{CompositeConfig, OutputFormat},
    matting::BackendKind,
};
use anyhow::{bail, Context, Result};

/// Convert CLI arguments to a unified `CompositeConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `CompositeConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<CompositeConfig> {
        let backend = if cli.pre_matted {
            BackendKind::Passthrough
        } else {
            BackendKind::Command(cli.matting_cmd.clone())
        };

        CompositeConfig::builder()
            .feather_radius(cli.feather)
            .erosion(cli.erosion)
            .desaturation(cli.desaturation)
            .blur_radius(cli.blur_radius)
            .output_format(to_output_format(cli.format))
            .jpeg_quality(cli.jpeg_quality)
            .webp_quality(cli.webp_quality)
            .debug(cli.verbose >= 2)
            .backend(backend)
            .build()
            .context("Invalid configuration")
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.background == CliBackground::Image && cli.background_image.is_none() {
            bail!("--background image requires --background-image PATH");
        }

        if cli.background == CliBackground::Transparent && cli.format == CliOutputFormat::Jpeg {
            bail!("Transparent output cannot be encoded as JPEG; use png, webp or rgba8");
        }

        parse_color(&cli.color).context("Invalid --color value")?;

        // Range errors surface here rather than mid-batch
        Self::from_cli(cli).map(|_| ())
    }
}

/// Map the clap-facing format enum onto the library's `OutputFormat`
pub(crate) fn to_output_format(format: CliOutputFormat) -> OutputFormat {
    match format {
        CliOutputFormat::Png => OutputFormat::Png,
        CliOutputFormat::Jpeg => OutputFormat::Jpeg,
        CliOutputFormat::Webp => OutputFormat::WebP,
        CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
    }
}

/// Parse an `R,G,B` color triple
pub(crate) fn parse_color(value: &str) -> Result<(u8, u8, u8)> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("Expected R,G,B (e.g. 255,255,255), got '{}'", value);
    }

    let mut channels = [0u8; 3];
    for (channel, part) in channels.iter_mut().zip(parts.iter()) {
        *channel = part
            .parse::<u8>()
            .with_context(|| format!("'{}' is not a value in 0-255", part))?;
    }
    Ok((channels[0], channels[1], channels[2]))
}

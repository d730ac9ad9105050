//! Background Compositing CLI Tool
//!
//! Command-line interface for removing backgrounds and recompositing the
//! subject onto a new background, for single files or whole directories.

use super::config::{parse_color, CliConfigBuilder};
use crate::{
    config::Background,
    processor::CompositionProcessor,
    services::ImageIoService,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Background compositing CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgcompose")]
pub struct Cli {
    /// Input image files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch processing)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png)]
    pub format: CliOutputFormat,

    /// Background strategy
    #[arg(short, long, value_enum, default_value_t = CliBackground::Transparent)]
    pub background: CliBackground,

    /// Solid background color as R,G,B (used with --background solid)
    #[arg(long, default_value = "255,255,255")]
    pub color: String,

    /// Replacement background image (used with --background image)
    #[arg(long, value_name = "PATH")]
    pub background_image: Option<PathBuf>,

    /// Gaussian blur sigma for --background blur
    #[arg(long, default_value_t = 22.0)]
    pub blur_radius: f32,

    /// Matte feathering sigma (0 = none)
    #[arg(long, default_value_t = 3.0)]
    pub feather: f32,

    /// Matte erosion offset subtracted from every alpha value
    #[arg(long, default_value_t = 10)]
    pub erosion: u8,

    /// Fraction of saturation retained at translucent edges (0.0-1.0)
    #[arg(long, default_value_t = 0.6)]
    pub desaturation: f32,

    /// External matting command (stdin: image bytes, stdout: matted bytes)
    #[arg(long, default_value = "rembg i - -")]
    pub matting_cmd: String,

    /// Inputs already carry an alpha matte; skip the matting command
    #[arg(long)]
    pub pre_matted: bool,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90)]
    pub jpeg_quality: u8,

    /// WebP quality (0-100)
    #[arg(long, default_value_t = 85)]
    pub webp_quality: u8,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Rgba8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackground {
    /// Keep the cutout transparent
    Transparent,
    /// Solid color canvas (see --color)
    Solid,
    /// Blurred version of the original photo
    Blur,
    /// Replacement image (see --background-image)
    Image,
}

/// Extensions accepted when scanning directories
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!("Starting background compositing");
    info!("Input(s): {}", cli.input.join(", "));
    info!(
        "Background: {:?}, feather: {}, erosion: {}, desaturation: {}",
        cli.background, cli.feather, cli.erosion, cli.desaturation
    );

    let files = collect_input_files(&cli)?;
    if files.is_empty() {
        bail!("No image files found in the given input(s)");
    }

    // Replacement background is decoded once and shared across the batch
    let replacement = match (&cli.background, &cli.background_image) {
        (CliBackground::Image, Some(path)) => Some(
            ImageIoService::load_image(path)
                .with_context(|| format!("Failed to load background image '{}'", path.display()))?
                .to_rgba8(),
        ),
        _ => None,
    };

    let processor =
        CompositionProcessor::from_config(config.clone()).context("Failed to create processor")?;

    if files.len() == 1 {
        let input = &files[0];
        let output = resolve_single_output(&cli, input);
        process_one(&cli, &processor, input, &output, replacement.as_ref())
            .with_context(|| format!("Failed to process '{}'", input.display()))?;
        info!("Wrote {}", output.display());
        return Ok(());
    }

    process_batch(&cli, &processor, &files, replacement.as_ref())
}

/// Process every collected file, tolerating per-file failures
fn process_batch(
    cli: &Cli,
    processor: &CompositionProcessor,
    files: &[PathBuf],
    replacement: Option<&image::RgbaImage>,
) -> Result<()> {
    let output_dir = PathBuf::from(cli.output.as_deref().unwrap_or("output"));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let batch_start = Instant::now();
    let mut failures = 0usize;

    for input in files {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        progress.set_message(file_name.clone());

        let extension = ImageIoService::extension_for(processor.config().output_format);
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let output = output_dir.join(format!("{}.{}", stem, extension));

        if let Err(e) = process_one(cli, processor, input, &output, replacement) {
            error!("Failed to process '{}': {:#}", input.display(), e);
            failures += 1;
        }

        progress.inc(1);
    }

    progress.finish_with_message("done");

    let elapsed = batch_start.elapsed().as_secs_f64();
    let processed = files.len() - failures;
    info!(
        "Processed {}/{} file(s) in {:.2}s ({} failed)",
        processed,
        files.len(),
        elapsed,
        failures
    );

    if failures == files.len() {
        bail!("All {} file(s) failed to process", files.len());
    }
    if failures > 0 {
        warn!("{} file(s) failed; see log for details", failures);
    }
    Ok(())
}

/// Composite a single file and write the result
fn process_one(
    cli: &Cli,
    processor: &CompositionProcessor,
    input: &Path,
    output: &Path,
    replacement: Option<&image::RgbaImage>,
) -> Result<()> {
    let input_bytes = ImageIoService::load_bytes(input)?;
    let background = background_for(cli, input, replacement)?;

    let result = processor.process_bytes(&input_bytes, &background)?;

    let config = processor.config();
    let quality = match config.output_format {
        crate::config::OutputFormat::Jpeg => config.jpeg_quality,
        _ => config.webp_quality,
    };
    result.save(output, config.output_format, quality)?;

    log::debug!("{}", result.timings().summary());
    Ok(())
}

/// Build the per-file background strategy
///
/// The blur strategy needs the original photo as a per-file input; solid and
/// replacement backgrounds are shared.
fn background_for(
    cli: &Cli,
    input: &Path,
    replacement: Option<&image::RgbaImage>,
) -> Result<Background> {
    match cli.background {
        CliBackground::Transparent => Ok(Background::Transparent),
        CliBackground::Solid => {
            let (r, g, b) = parse_color(&cli.color)?;
            Ok(Background::Solid { r, g, b })
        },
        CliBackground::Blur => {
            let source = ImageIoService::load_image(input)?.to_rgba8();
            Ok(Background::BlurredOriginal {
                source,
                radius: cli.blur_radius,
            })
        },
        CliBackground::Image => {
            let image = replacement
                .context("Replacement background image was not loaded")?
                .clone();
            Ok(Background::Replacement { image })
        },
    }
}

/// Expand files and directories into a flat list of image paths
fn collect_input_files(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in &cli.input {
        let path = PathBuf::from(input);
        if path.is_dir() {
            let max_depth = if cli.recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(&path)
                .max_depth(max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                if entry.file_type().is_file() && has_image_extension(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path);
        } else {
            bail!("Input '{}' does not exist", input);
        }
    }

    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Default output path for single-file mode: `<stem>_composited.<ext>`
fn resolve_single_output(cli: &Cli, input: &Path) -> PathBuf {
    let extension = ImageIoService::extension_for(super::config::to_output_format(cli.format));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    if let Some(output) = &cli.output {
        let path = PathBuf::from(output);
        if path.is_dir() {
            return path.join(format!("{}.{}", stem, extension));
        }
        return path;
    }

    input.with_file_name(format!("{}_composited.{}", stem, extension))
}

fn init_tracing(verbose_count: u8) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match verbose_count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bgcompose={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose_count >= 2)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}

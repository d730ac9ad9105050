//! Matting backend abstraction
//!
//! Background removal itself is an external collaborator: an opaque function
//! from raw image bytes to image bytes carrying an alpha channel. Backends
//! implement that boundary; the pipeline never looks inside it and never
//! retries a failed matting call.

use crate::error::{CompositeError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

/// Backend selection for runtime construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// External matting command reading stdin and writing stdout
    Command(String),
    /// Input already carries an alpha matte
    Passthrough,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Passthrough
    }
}

/// Trait for matting backends
pub trait MattingBackend: Send {
    /// Backend name for logging and metadata
    fn name(&self) -> &str;

    /// Remove the background from encoded image bytes
    ///
    /// Returns losslessly encoded image bytes with an alpha channel marking
    /// foreground coverage.
    ///
    /// # Errors
    ///
    /// `Matting` for any backend failure; the error is surfaced upward
    /// without retry.
    fn remove_foreground(&self, image_bytes: &[u8]) -> Result<Vec<u8>>;
}

/// Matting backend that pipes bytes through an external command
///
/// The command receives the encoded input image on stdin and must write the
/// matted image (with alpha) to stdout, e.g. `rembg i - -`.
pub struct CommandMattingBackend {
    program: String,
    args: Vec<String>,
}

impl CommandMattingBackend {
    /// Create a backend for the given program and arguments
    #[must_use]
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a full command line, e.g. `"rembg i - -"`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the command line is empty.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CompositeError::invalid_config("Empty matting command"))?;
        Ok(Self::new(program, parts.map(String::from).collect()))
    }
}

impl MattingBackend for CommandMattingBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn remove_foreground(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        debug!(
            "Invoking matting command '{}' with {} input bytes",
            self.program,
            image_bytes.len()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CompositeError::matting(format!(
                    "Failed to start matting command '{}': {}",
                    self.program, e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CompositeError::matting("Matting command stdin unavailable"))?;

        // Feed stdin from a separate thread while draining stdout here. A
        // command that streams output while consuming input would otherwise
        // fill both pipe buffers and deadlock.
        let input = image_bytes.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output().map_err(|e| {
            CompositeError::matting(format!("Failed to wait for matting command: {}", e))
        })?;

        match writer.join() {
            Ok(Ok(())) => {},
            // The command may legitimately close stdin once it has read enough
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {},
            Ok(Err(e)) => {
                return Err(CompositeError::matting(format!(
                    "Failed to write to matting command: {}",
                    e
                )));
            },
            Err(_) => {
                return Err(CompositeError::matting(
                    "Matting command writer thread panicked",
                ));
            },
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompositeError::matting(format!(
                "Matting command '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(CompositeError::matting(format!(
                "Matting command '{}' produced no output",
                self.program
            )));
        }

        Ok(output.stdout)
    }
}

/// Backend for inputs that already carry an alpha matte
///
/// Used for pre-matted workflows where a matting model has already run; the
/// bytes pass through untouched and the alpha plane is taken as the matte.
pub struct PassthroughMattingBackend;

impl MattingBackend for PassthroughMattingBackend {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn remove_foreground(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(image_bytes.to_vec())
    }
}

/// Deterministic backend for tests: sets every pixel's alpha to a constant
pub struct MockMattingBackend {
    alpha: u8,
}

impl MockMattingBackend {
    /// Create a mock producing uniform coverage `alpha`
    #[must_use]
    pub fn new(alpha: u8) -> Self {
        Self { alpha }
    }
}

impl MattingBackend for MockMattingBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn remove_foreground(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let image = image::load_from_memory(image_bytes)?;
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            pixel[3] = self.alpha;
        }

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        image::DynamicImage::ImageRgba8(rgba).write_to(&mut cursor, image::ImageFormat::Png)?;
        Ok(buffer)
    }
}

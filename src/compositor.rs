//! Background compositing
//!
//! One blend law serves every strategy: `out = a * fg + (1 - a) * bg` per
//! channel, per pixel, with the foreground's refined matte as `a`. The
//! strategies differ only in how the background canvas is prepared.

use crate::{
    config::Background,
    error::{CompositeError, Result},
    types::{AlphaMatte, Foreground},
};
use image::{imageops, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use log::debug;

/// Composite a prepared foreground over the chosen background
///
/// Returns the cutout unchanged for `Background::Transparent`; every other
/// strategy yields a fully opaque image (alpha 255 everywhere).
///
/// # Errors
///
/// `DimensionMismatch` when a blurred-original source does not match the
/// foreground's dimensions, or the foreground's own buffers disagree.
pub fn composite(foreground: &Foreground, background: &Background) -> Result<RgbaImage> {
    background.validate()?;

    let (width, height) = foreground.dimensions();
    debug!(
        "Compositing {}x{} foreground onto {} background",
        width, height,
        background.name()
    );

    match background {
        Background::Transparent => Ok(foreground.color.clone()),
        Background::Solid { r, g, b } => {
            let canvas = RgbaImage::from_pixel(width, height, Rgba([*r, *g, *b, 255]));
            blend_over(&foreground.color, &foreground.matte, &canvas)
        },
        Background::Replacement { image } => {
            // Stretched to fit; aspect ratio is intentionally not preserved
            let canvas = if image.dimensions() == (width, height) {
                image.clone()
            } else {
                imageops::resize(image, width, height, imageops::FilterType::Lanczos3)
            };
            blend_over(&foreground.color, &foreground.matte, &canvas)
        },
        Background::BlurredOriginal { source, radius } => {
            if source.dimensions() != (width, height) {
                return Err(CompositeError::dimension_mismatch(
                    (width, height),
                    source.dimensions(),
                    "blurred-original blend",
                ));
            }
            let canvas = if *radius > 0.0 {
                gaussian_blur_f32(source, *radius)
            } else {
                source.clone()
            };
            blend_over(&foreground.color, &foreground.matte, &canvas)
        },
    }
}

/// Alpha-blend a foreground over an opaque background canvas
///
/// Integer arithmetic with round-to-nearest, so matte 255 reproduces the
/// foreground exactly and matte 0 reproduces the background exactly. The
/// output alpha is 255 everywhere.
fn blend_over(
    color: &RgbaImage,
    matte: &AlphaMatte,
    background: &RgbaImage,
) -> Result<RgbaImage> {
    if color.dimensions() != matte.dimensions {
        return Err(CompositeError::dimension_mismatch(
            matte.dimensions,
            color.dimensions(),
            "foreground blend",
        ));
    }
    if background.dimensions() != matte.dimensions {
        return Err(CompositeError::dimension_mismatch(
            matte.dimensions,
            background.dimensions(),
            "background blend",
        ));
    }

    let (width, height) = matte.dimensions;
    let mut output = RgbaImage::new(width, height);

    for (((out, fg), bg), &alpha) in output
        .pixels_mut()
        .zip(color.pixels())
        .zip(background.pixels())
        .zip(matte.data.iter())
    {
        let a = u32::from(alpha);
        let inv = 255 - a;
        let mix = |f: u8, b: u8| -> u8 {
            ((a * u32::from(f) + inv * u32::from(b) + 127) / 255) as u8
        };
        *out = Rgba([
            mix(fg[0], bg[0]),
            mix(fg[1], bg[1]),
            mix(fg[2], bg[2]),
            255,
        ]);
    }

    Ok(output)
}

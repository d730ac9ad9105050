//! Edge color decontamination
//!
//! Translucent edge pixels of a cutout often keep a tint of the removed
//! background ("edge bleed"). Blending the foreground toward a desaturated
//! copy, weighted by the matte itself, dilutes that tint exactly where
//! coverage is low while leaving the opaque interior untouched.

use crate::{
    error::Result,
    types::AlphaMatte,
};
use image::{Rgba, RgbaImage};
use log::debug;

/// Rec. 601 luma weights used for the gray reference
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Suppress residual background tint at translucent edge pixels
///
/// `desaturation` is the fraction of original saturation retained in the
/// desaturated reference (1.0 = unchanged, 0.0 = fully gray). Each pixel is
/// blended between original and desaturated color using its matte value as
/// weight, then the matte is attached as the output's alpha channel.
///
/// The operation is per-pixel and order independent.
///
/// # Errors
///
/// `DimensionMismatch` if the matte does not match the color buffer,
/// `InvalidConfig` if `desaturation` is outside [0, 1].
pub fn decontaminate(
    color: &RgbaImage,
    matte: &AlphaMatte,
    desaturation: f32,
) -> Result<RgbaImage> {
    if !desaturation.is_finite() || !(0.0..=1.0).contains(&desaturation) {
        return Err(crate::error::CompositeError::config_value_error(
            "desaturation",
            desaturation,
            "0.0-1.0",
        ));
    }
    if color.dimensions() != matte.dimensions {
        return Err(crate::error::CompositeError::dimension_mismatch(
            matte.dimensions,
            color.dimensions(),
            "color decontamination",
        ));
    }

    debug!(
        "Decontaminating {}x{} foreground (desaturation: {})",
        matte.dimensions.0, matte.dimensions.1, desaturation
    );

    // Factor 1.0 keeps full saturation everywhere; only the alpha changes.
    if desaturation >= 1.0 {
        let mut output = color.clone();
        matte.apply_to_image(&mut output)?;
        return Ok(output);
    }

    let mut output = RgbaImage::new(matte.dimensions.0, matte.dimensions.1);
    for ((out, src), &alpha) in output
        .pixels_mut()
        .zip(color.pixels())
        .zip(matte.data.iter())
    {
        let Rgba([r, g, b, _]) = *src;
        let gray = LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b);
        let weight = f32::from(alpha) / 255.0;

        let mix = |channel: u8| -> u8 {
            let original = f32::from(channel);
            let desaturated = gray + desaturation * (original - gray);
            let blended = weight * original + (1.0 - weight) * desaturated;
            blended.round().clamp(0.0, 255.0) as u8
        };

        *out = Rgba([mix(r), mix(g), mix(b), alpha]);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desaturation_identity() {
        let mut color = RgbaImage::new(2, 2);
        color.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        color.put_pixel(1, 0, Rgba([12, 200, 99, 128]));
        color.put_pixel(0, 1, Rgba([0, 0, 255, 3]));
        color.put_pixel(1, 1, Rgba([77, 77, 77, 0]));
        let matte = AlphaMatte::new(vec![255, 128, 3, 0], (2, 2));

        let output = decontaminate(&color, &matte, 1.0).unwrap();

        for (out, src) in output.pixels().zip(color.pixels()) {
            assert_eq!(&out.0[..3], &src.0[..3]);
        }
    }

    #[test]
    fn test_opaque_pixels_keep_full_color() {
        let color = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let matte = AlphaMatte::new(vec![255; 4], (2, 2));

        let output = decontaminate(&color, &matte, 0.0).unwrap();
        for pixel in output.pixels() {
            assert_eq!(pixel, &Rgba([255, 0, 0, 255]));
        }
    }

    #[test]
    fn test_zero_coverage_pixel_fully_desaturated() {
        // Pure red, Rec. 601 gray = 76
        let color = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let matte = AlphaMatte::new(vec![0], (1, 1));

        let output = decontaminate(&color, &matte, 0.0).unwrap();
        let pixel = output.get_pixel(0, 0);
        assert_eq!(&pixel.0[..3], &[76, 76, 76]);
        assert_eq!(pixel[3], 0);
    }

    #[test]
    fn test_matte_reattached_as_alpha() {
        let color = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let matte = AlphaMatte::new(vec![42, 200], (2, 1));

        let output = decontaminate(&color, &matte, 0.6).unwrap();
        assert_eq!(output.get_pixel(0, 0)[3], 42);
        assert_eq!(output.get_pixel(1, 0)[3], 200);
    }

    #[test]
    fn test_rejects_out_of_range_factor() {
        let color = RgbaImage::new(1, 1);
        let matte = AlphaMatte::new(vec![0], (1, 1));
        assert!(decontaminate(&color, &matte, 1.5).is_err());
        assert!(decontaminate(&color, &matte, -0.1).is_err());
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let color = RgbaImage::new(2, 2);
        let matte = AlphaMatte::new(vec![0], (1, 1));
        assert!(decontaminate(&color, &matte, 0.5).is_err());
    }

    #[test]
    fn test_gray_pixels_unchanged_by_desaturation() {
        // A neutral pixel has no saturation to remove
        let color = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let matte = AlphaMatte::new(vec![64], (1, 1));

        let output = decontaminate(&color, &matte, 0.0).unwrap();
        assert_eq!(&output.get_pixel(0, 0).0[..3], &[100, 100, 100]);
    }
}

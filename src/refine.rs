//! Matte edge refinement: feathering and erosion
//!
//! The raw matte from a matting model tends to have a hard or noisy boundary.
//! Feathering replaces it with a smooth alpha ramp; erosion then contracts the
//! cutout inward, discarding the low-confidence outer rim most likely to carry
//! residual background color.

use crate::{
    error::Result,
    types::AlphaMatte,
};
use imageproc::filter::gaussian_blur_f32;
use log::debug;

/// Refine a raw alpha matte for blending
///
/// Applies a Gaussian low-pass of standard deviation `feather_radius` to the
/// matte, then subtracts `erosion` from every value (clamped at 0). With
/// `feather_radius == 0.0` and `erosion == 0` the output equals the input
/// exactly.
///
/// Feathering cannot raise values above the matte's maximum and erosion only
/// decreases them, so results stay in range without an upper clamp.
///
/// # Errors
///
/// `InvalidConfig` if `feather_radius` is negative or non-finite,
/// `Processing` if the matte's data length does not match its dimensions.
pub fn refine(matte: &AlphaMatte, feather_radius: f32, erosion: u8) -> Result<AlphaMatte> {
    if !feather_radius.is_finite() || feather_radius < 0.0 {
        return Err(crate::error::CompositeError::config_value_error(
            "feather radius",
            feather_radius,
            ">= 0.0",
        ));
    }

    debug!(
        "Refining matte {}x{} (feather: {}, erosion: {})",
        matte.dimensions.0, matte.dimensions.1, feather_radius, erosion
    );

    let mut refined = if feather_radius > 0.0 {
        let image = matte.to_image()?;
        AlphaMatte::from_image(&gaussian_blur_f32(&image, feather_radius))
    } else {
        matte.clone()
    };

    if erosion > 0 {
        for value in &mut refined.data {
            *value = value.saturating_sub(erosion);
        }
    }

    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> AlphaMatte {
        let data = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if (x + y) % 2 == 0 { 255 } else { 0 }
            })
            .collect();
        AlphaMatte::new(data, (width, height))
    }

    #[test]
    fn test_rejects_invalid_feather_radius() {
        let matte = AlphaMatte::new(vec![100; 4], (2, 2));
        assert!(refine(&matte, -5.0, 0).is_err());
        assert!(refine(&matte, f32::NAN, 0).is_err());
        assert!(refine(&matte, f32::INFINITY, 0).is_err());
    }

    #[test]
    fn test_refine_identity() {
        let matte = checkerboard(8, 8);
        let refined = refine(&matte, 0.0, 0).unwrap();
        assert_eq!(refined, matte);
    }

    #[test]
    fn test_erosion_subtracts_with_floor() {
        let matte = AlphaMatte::new(vec![0, 5, 10, 255], (2, 2));
        let refined = refine(&matte, 0.0, 10).unwrap();
        assert_eq!(refined.data, vec![0, 0, 0, 245]);
    }

    #[test]
    fn test_erosion_monotonic() {
        let matte = checkerboard(8, 8);
        let lightly = refine(&matte, 1.5, 5).unwrap();
        let heavily = refine(&matte, 1.5, 20).unwrap();

        for (a, b) in heavily.data.iter().zip(lightly.data.iter()) {
            assert!(a <= b);
        }
    }

    #[test]
    fn test_feathering_softens_boundary() {
        // A hard vertical edge should gain intermediate values
        let mut data = vec![0u8; 8 * 8];
        for y in 0..8 {
            for x in 0..4 {
                data[y * 8 + x] = 255;
            }
        }
        let matte = AlphaMatte::new(data, (8, 8));
        let refined = refine(&matte, 2.0, 0).unwrap();

        assert!(refined
            .data
            .iter()
            .any(|&v| v > 0 && v < 255));
    }

    #[test]
    fn test_feathering_preserves_flat_regions() {
        // Blurring a constant matte is (up to rounding) a no-op
        let matte = AlphaMatte::new(vec![200; 16], (4, 4));
        let refined = refine(&matte, 3.0, 0).unwrap();
        for value in &refined.data {
            assert!(value.abs_diff(200) <= 1, "flat region drifted to {}", value);
        }
    }
}

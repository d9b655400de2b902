//! Per-pixel alpha blend compositor.
//!
//! Blends a batch of images over a base batch with one of 14 blend modes, an
//! opacity mix, and an optional mask. Mismatched batch lengths truncate to
//! the shorter batch; mismatched spatial sizes resample the blend image (and
//! the mask, separately) to the base size with integer-ratio nearest
//! neighbor lookup.

use std::convert::Infallible;
use std::str::FromStr;

use image::{Luma, Rgb};
use imageproc::definitions::Image;
use rayon::prelude::*;

use crate::error::BlendError;
use crate::utils::clamp01;

/// Epsilon guarding the dodge/burn divisions.
const DODGE_BURN_EPSILON: f32 = 1e-10;

/// Per-pixel blend formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    /// Replace with the blend value
    #[default]
    Normal,
    /// `base * blend`
    Multiply,
    /// `1 - (1 - base) * (1 - blend)`
    Screen,
    /// Multiply below mid gray, screen above, keyed on the base
    Overlay,
    /// Darkens or lightens depending on the blend value
    SoftLight,
    /// Overlay keyed on the blend value
    HardLight,
    /// Brightens the base toward the blend
    ColorDodge,
    /// Darkens the base toward the blend
    ColorBurn,
    /// Per-channel minimum
    Darken,
    /// Per-channel maximum
    Lighten,
    /// Absolute difference
    Difference,
    /// `base + blend - 2 * base * blend`
    Exclusion,
    /// Saturating addition
    Add,
    /// Saturating subtraction
    Subtract,
}

impl FromStr for BlendMode {
    type Err = Infallible;

    /// Parses a mode name; unrecognized names fall back to [`BlendMode::Normal`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "normal" => Self::Normal,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "soft_light" => Self::SoftLight,
            "hard_light" => Self::HardLight,
            "color_dodge" => Self::ColorDodge,
            "color_burn" => Self::ColorBurn,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            _ => Self::Normal,
        })
    }
}

/// Mask controlling where the blended result replaces the base.
///
/// A 3-channel mask is reduced to one channel by averaging; a grayscale mask
/// is used directly.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskImage {
    /// Single-channel coverage in [0, 1]
    Gray(Image<Luma<f32>>),
    /// RGB coverage, averaged per pixel
    Rgb(Image<Rgb<f32>>),
}

impl MaskImage {
    /// Mask dimensions as (width, height).
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Gray(image) => image.dimensions(),
            Self::Rgb(image) => image.dimensions(),
        }
    }

    /// Coverage at mask-space coordinates.
    fn coverage(&self, x: u32, y: u32) -> f32 {
        match self {
            Self::Gray(image) => image.get_pixel(x, y)[0],
            Self::Rgb(image) => {
                let Rgb([r, g, b]) = *image.get_pixel(x, y);
                (r + g + b) / 3.0
            }
        }
    }
}

/// Evaluates one blend mode on a pair of channel values.
fn apply_blend_mode(mode: BlendMode, base: f32, blend: f32) -> f32 {
    match mode {
        BlendMode::Normal => blend,
        BlendMode::Multiply => base * blend,
        BlendMode::Screen => 1.0 - (1.0 - base) * (1.0 - blend),
        BlendMode::Overlay => {
            if base < 0.5 {
                2.0 * base * blend
            } else {
                1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
            }
        }
        BlendMode::SoftLight => {
            if blend < 0.5 {
                2.0 * base * blend + base * base * (1.0 - 2.0 * blend)
            } else {
                2.0 * base * (1.0 - blend) + base.sqrt() * (2.0 * blend - 1.0)
            }
        }
        BlendMode::HardLight => {
            if blend < 0.5 {
                2.0 * base * blend
            } else {
                1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
            }
        }
        BlendMode::ColorDodge => {
            if blend >= 1.0 {
                1.0
            } else {
                (base / (1.0 - blend + DODGE_BURN_EPSILON)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if blend <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - base) / (blend + DODGE_BURN_EPSILON)).min(1.0)
            }
        }
        BlendMode::Darken => base.min(blend),
        BlendMode::Lighten => base.max(blend),
        BlendMode::Difference => (base - blend).abs(),
        BlendMode::Exclusion => base + blend - 2.0 * base * blend,
        BlendMode::Add => (base + blend).min(1.0),
        BlendMode::Subtract => (base - blend).max(0.0),
    }
}

/// Nearest-neighbor resample using truncating integer-ratio index mapping.
fn resize_nearest_impl(image: &Image<Rgb<f32>>, width: u32, height: u32) -> Image<Rgb<f32>> {
    let (src_width, src_height) = image.dimensions();
    Image::from_fn(width, height, |x, y| {
        let sx = (u64::from(x) * u64::from(src_width) / u64::from(width)) as u32;
        let sy = (u64::from(y) * u64::from(src_height) / u64::from(height)) as u32;
        *image.get_pixel(sx, sy)
    })
}

/// Coverage of a mask at base-space coordinates, resampling on the fly when
/// the mask size differs from the output size.
fn mask_coverage_impl(mask: &MaskImage, x: u32, y: u32, out_width: u32, out_height: u32) -> f32 {
    let (mask_width, mask_height) = mask.dimensions();
    let sx = (u64::from(x) * u64::from(mask_width) / u64::from(out_width)) as u32;
    let sy = (u64::from(y) * u64::from(mask_height) / u64::from(out_height)) as u32;
    mask.coverage(sx, sy)
}

/// Blends one image over a base image.
///
/// Inputs are clamped to [0, 1] before the mode formula; the result is
/// `base * (1 - opacity) + mode(base, blend) * opacity`, then mixed with the
/// base through the mask when one is given, and clamped.
///
/// # Errors
///
/// Returns [`BlendError::EmptyImage`] if either image has a zero dimension.
///
/// # Examples
/// ```
/// use image::Rgb;
/// use imagefx_kit::{blend_images, BlendMode, Image};
///
/// let white: Image<Rgb<f32>> = Image::from_pixel(2, 2, Rgb([1.0, 1.0, 1.0]));
/// let black: Image<Rgb<f32>> = Image::from_pixel(2, 2, Rgb([0.0, 0.0, 0.0]));
/// let result = blend_images(&white, &black, BlendMode::Multiply, 1.0, None).unwrap();
/// assert_eq!(*result.get_pixel(0, 0), Rgb([0.0, 0.0, 0.0]));
/// ```
pub fn blend_images(
    base: &Image<Rgb<f32>>,
    blend: &Image<Rgb<f32>>,
    mode: BlendMode,
    opacity: f32,
    mask: Option<&MaskImage>,
) -> Result<Image<Rgb<f32>>, BlendError> {
    let (width, height) = base.dimensions();
    if width == 0 || height == 0 {
        return Err(BlendError::EmptyImage { width, height });
    }
    let (blend_width, blend_height) = blend.dimensions();
    if blend_width == 0 || blend_height == 0 {
        return Err(BlendError::EmptyImage {
            width: blend_width,
            height: blend_height,
        });
    }

    let resized;
    let blend = if (blend_width, blend_height) == (width, height) {
        blend
    } else {
        resized = resize_nearest_impl(blend, width, height);
        &resized
    };

    let out = Image::from_fn(width, height, |x, y| {
        let base_pixel = base.get_pixel(x, y);
        let blend_pixel = blend.get_pixel(x, y);
        let coverage = mask.map(|m| mask_coverage_impl(m, x, y, width, height));

        let mut out = [0.0f32; 3];
        for (c, value) in out.iter_mut().enumerate() {
            let b = clamp01(base_pixel[c]);
            let l = clamp01(blend_pixel[c]);
            let mixed = b * (1.0 - opacity) + apply_blend_mode(mode, b, l) * opacity;
            let masked = match coverage {
                Some(m) => b * (1.0 - m) + mixed * m,
                None => mixed,
            };
            *value = clamp01(masked);
        }
        Rgb(out)
    });

    Ok(out)
}

/// Blends two image batches element-wise.
///
/// Batch lengths are truncated to the shorter batch. Mask batch element
/// `min(b, masks.len() - 1)` applies to batch element `b`; an empty mask
/// slice behaves like no mask.
///
/// # Errors
///
/// Returns [`BlendError::EmptyBaseBatch`] / [`BlendError::EmptyBlendBatch`]
/// for empty batches, or [`BlendError::EmptyImage`] from the per-image
/// blending.
pub fn blend_batches(
    base: &[Image<Rgb<f32>>],
    blend: &[Image<Rgb<f32>>],
    mode: BlendMode,
    opacity: f32,
    masks: Option<&[MaskImage]>,
) -> Result<Vec<Image<Rgb<f32>>>, BlendError> {
    if base.is_empty() {
        return Err(BlendError::EmptyBaseBatch);
    }
    if blend.is_empty() {
        return Err(BlendError::EmptyBlendBatch);
    }

    let count = base.len().min(blend.len());
    (0..count)
        .into_par_iter()
        .map(|index| {
            let mask = masks
                .filter(|masks| !masks.is_empty())
                .map(|masks| &masks[index.min(masks.len() - 1)]);
            blend_images(&base[index], &blend[index], mode, opacity, mask)
        })
        .collect()
}

/// Extension trait providing a fluent blend method on the base image.
pub trait BlendExt {
    /// Blend another image over this one, consuming self.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::EmptyImage`] if either image has a zero
    /// dimension.
    fn blend_with(
        self,
        blend: &Self,
        mode: BlendMode,
        opacity: f32,
        mask: Option<&MaskImage>,
    ) -> Result<Self, BlendError>
    where
        Self: Sized;
}

impl BlendExt for Image<Rgb<f32>> {
    fn blend_with(
        self,
        blend: &Self,
        mode: BlendMode,
        opacity: f32,
        mask: Option<&MaskImage>,
    ) -> Result<Self, BlendError> {
        blend_images(&self, blend, mode, opacity, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        assert_in_unit_range, create_test_rgb_image, max_pixel_difference, uniform_gray_image,
        uniform_rgb_image,
    };

    #[test]
    fn blend_images_multiply_white_with_black_yields_black() {
        let white = uniform_rgb_image(2, 2, [1.0, 1.0, 1.0]);
        let black = uniform_rgb_image(2, 2, [0.0, 0.0, 0.0]);
        let result = blend_images(&white, &black, BlendMode::Multiply, 1.0, None).unwrap();
        for pixel in result.pixels() {
            assert_eq!(*pixel, Rgb([0.0, 0.0, 0.0]));
        }
    }

    #[test]
    fn blend_images_with_zero_opacity_returns_base() {
        let base = create_test_rgb_image();
        let blend = uniform_rgb_image(2, 2, [0.3, 0.6, 0.9]);
        let result = blend_images(&base, &blend, BlendMode::Screen, 0.0, None).unwrap();
        assert!(max_pixel_difference(&base, &result) < 1e-6);
    }

    #[test]
    fn blend_images_normal_full_opacity_returns_blend() {
        let base = create_test_rgb_image();
        let blend = uniform_rgb_image(2, 2, [0.3, 0.6, 0.9]);
        let result = blend_images(&base, &blend, BlendMode::Normal, 1.0, None).unwrap();
        assert!(max_pixel_difference(&blend, &result) < 1e-6);
    }

    #[test]
    fn blend_images_resamples_smaller_blend_to_base_size() {
        let base = uniform_rgb_image(4, 4, [0.0, 0.0, 0.0]);
        let blend = uniform_rgb_image(2, 2, [1.0, 0.5, 0.25]);
        let result = blend_images(&base, &blend, BlendMode::Normal, 1.0, None).unwrap();
        assert_eq!(result.dimensions(), (4, 4));
        let pixel = result.get_pixel(3, 3);
        assert!((pixel[0] - 1.0).abs() < 1e-6);
        assert!((pixel[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn blend_images_with_gray_mask_mixes_against_base() {
        let base = uniform_rgb_image(2, 2, [0.0, 0.0, 0.0]);
        let blend = uniform_rgb_image(2, 2, [1.0, 1.0, 1.0]);
        let mask = MaskImage::Gray(uniform_gray_image(2, 2, 0.5));
        let result = blend_images(&base, &blend, BlendMode::Normal, 1.0, Some(&mask)).unwrap();
        for pixel in result.pixels() {
            assert!((pixel[0] - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn blend_images_with_rgb_mask_averages_channels() {
        let base = uniform_rgb_image(2, 2, [0.0, 0.0, 0.0]);
        let blend = uniform_rgb_image(2, 2, [1.0, 1.0, 1.0]);
        // Channel mean 0.5
        let mask = MaskImage::Rgb(uniform_rgb_image(2, 2, [1.0, 0.5, 0.0]));
        let result = blend_images(&base, &blend, BlendMode::Normal, 1.0, Some(&mask)).unwrap();
        for pixel in result.pixels() {
            assert!((pixel[0] - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn blend_images_color_dodge_with_full_blend_saturates() {
        let base = uniform_rgb_image(1, 1, [0.5, 0.5, 0.5]);
        let blend = uniform_rgb_image(1, 1, [1.0, 1.0, 1.0]);
        let result = blend_images(&base, &blend, BlendMode::ColorDodge, 1.0, None).unwrap();
        assert_eq!(*result.get_pixel(0, 0), Rgb([1.0, 1.0, 1.0]));
    }

    #[test]
    fn blend_images_color_burn_with_zero_blend_crushes_to_black() {
        let base = uniform_rgb_image(1, 1, [0.5, 0.5, 0.5]);
        let blend = uniform_rgb_image(1, 1, [0.0, 0.0, 0.0]);
        let result = blend_images(&base, &blend, BlendMode::ColorBurn, 1.0, None).unwrap();
        assert_eq!(*result.get_pixel(0, 0), Rgb([0.0, 0.0, 0.0]));
    }

    #[test]
    fn blend_images_all_modes_stay_in_unit_range() {
        let base = create_test_rgb_image();
        let blend = uniform_rgb_image(2, 2, [0.9, 0.1, 0.5]);
        let modes = [
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::SoftLight,
            BlendMode::HardLight,
            BlendMode::ColorDodge,
            BlendMode::ColorBurn,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Add,
            BlendMode::Subtract,
        ];
        for mode in modes {
            let result = blend_images(&base, &blend, mode, 0.7, None).unwrap();
            assert_in_unit_range(&result);
        }
    }

    #[test]
    fn blend_batches_truncates_to_shorter_batch() {
        let base = vec![create_test_rgb_image(), create_test_rgb_image()];
        let blend = vec![uniform_rgb_image(2, 2, [0.5, 0.5, 0.5])];
        let result = blend_batches(&base, &blend, BlendMode::Normal, 1.0, None).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn blend_batches_with_empty_base_returns_error() {
        let blend = vec![create_test_rgb_image()];
        let result = blend_batches(&[], &blend, BlendMode::Normal, 1.0, None);
        assert_eq!(result.unwrap_err(), BlendError::EmptyBaseBatch);
    }

    #[test]
    fn blend_batches_reuses_last_mask_for_longer_batches() {
        let base = vec![
            uniform_rgb_image(2, 2, [0.0, 0.0, 0.0]),
            uniform_rgb_image(2, 2, [0.0, 0.0, 0.0]),
        ];
        let blend = vec![
            uniform_rgb_image(2, 2, [1.0, 1.0, 1.0]),
            uniform_rgb_image(2, 2, [1.0, 1.0, 1.0]),
        ];
        let masks = vec![MaskImage::Gray(uniform_gray_image(2, 2, 1.0))];
        let result =
            blend_batches(&base, &blend, BlendMode::Normal, 1.0, Some(&masks)).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(*result[1].get_pixel(0, 0), Rgb([1.0, 1.0, 1.0]));
    }

    #[test]
    fn blend_mode_from_str_with_unknown_name_falls_back_to_normal() {
        assert_eq!("screen".parse::<BlendMode>().unwrap(), BlendMode::Screen);
        assert_eq!("bogus".parse::<BlendMode>().unwrap(), BlendMode::Normal);
    }
}

//! Resizing to a target megapixel budget.
//!
//! Computes target dimensions that hit a megapixel budget, snaps each axis
//! to a configurable multiple, and resamples with the crate's own sampler.
//! Snapping to multiples keeps the output friendly to tiled consumers that
//! require dimension alignment.

use std::convert::Infallible;
use std::str::FromStr;

use image::Rgb;
use imageproc::definitions::Image;
use rayon::prelude::*;

use crate::error::ScaleError;
use crate::imagefx_kit::sampler::{sample_bilinear, sample_nearest};

/// Resampling filter for the scaling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScaleFilter {
    /// Nearest-neighbor lookup
    Nearest,
    /// Bilinear interpolation
    #[default]
    Bilinear,
}

impl FromStr for ScaleFilter {
    type Err = Infallible;

    /// Parses a filter name; unrecognized names fall back to
    /// [`ScaleFilter::Bilinear`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "nearest" => Self::Nearest,
            "bilinear" => Self::Bilinear,
            _ => Self::Bilinear,
        })
    }
}

/// Megapixel scaling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleToMegapixelsParams {
    /// Target size in megapixels (1 MP = 1024 * 1024 pixels)
    pub megapixels: f32,
    /// The output width is snapped to a multiple of this
    pub width_multiple: u32,
    /// The output height is snapped to a multiple of this
    pub height_multiple: u32,
    /// Scale both axes uniformly; when false the aspect ratio is re-derived
    /// from the megapixel budget
    pub keep_aspect_ratio: bool,
    /// Resampling filter
    pub filter: ScaleFilter,
}

impl Default for ScaleToMegapixelsParams {
    fn default() -> Self {
        Self {
            megapixels: 1.0,
            width_multiple: 64,
            height_multiple: 64,
            keep_aspect_ratio: true,
            filter: ScaleFilter::Bilinear,
        }
    }
}

/// Computes the snapped output dimensions without resampling anything.
///
/// # Errors
///
/// Returns [`ScaleError::EmptyImage`] for a zero input dimension,
/// [`ScaleError::InvalidMegapixels`] for a non-positive or non-finite
/// target, and [`ScaleError::InvalidMultiple`] for a zero snap multiple.
pub fn scale_plan(
    width: u32,
    height: u32,
    params: &ScaleToMegapixelsParams,
) -> Result<(u32, u32), ScaleError> {
    if width == 0 || height == 0 {
        return Err(ScaleError::EmptyImage { width, height });
    }
    if !(params.megapixels.is_finite() && params.megapixels > 0.0) {
        return Err(ScaleError::InvalidMegapixels {
            megapixels: params.megapixels,
        });
    }
    if params.width_multiple == 0 || params.height_multiple == 0 {
        return Err(ScaleError::InvalidMultiple);
    }

    let target_pixels = f64::from(params.megapixels) * 1024.0 * 1024.0;
    let (target_width, target_height) = if params.keep_aspect_ratio {
        let scale = (target_pixels / (f64::from(width) * f64::from(height))).sqrt();
        (f64::from(width) * scale, f64::from(height) * scale)
    } else {
        let aspect = f64::from(width) / f64::from(height);
        let target_height = (target_pixels / aspect).sqrt();
        (target_pixels / target_height, target_height)
    };

    let snapped_width = snap_to_multiple_impl(target_width, params.width_multiple);
    let snapped_height = snap_to_multiple_impl(target_height, params.height_multiple);
    Ok((snapped_width, snapped_height))
}

/// Rounds to the nearest multiple, flooring at one multiple.
fn snap_to_multiple_impl(value: f64, multiple: u32) -> u32 {
    let snapped = ((value / f64::from(multiple)).round() * f64::from(multiple)) as u32;
    snapped.max(multiple)
}

/// Scales a single image to the target megapixel budget.
///
/// # Errors
///
/// See [`scale_plan`].
pub fn scale_to_megapixels(
    image: &Image<Rgb<f32>>,
    params: &ScaleToMegapixelsParams,
) -> Result<Image<Rgb<f32>>, ScaleError> {
    let (width, height) = image.dimensions();
    let (target_width, target_height) = scale_plan(width, height, params)?;
    Ok(resize_impl(image, target_width, target_height, params.filter))
}

/// Scales every image in a batch independently.
///
/// Images with different dimensions may land on different snapped targets.
///
/// # Errors
///
/// See [`scale_plan`].
pub fn scale_batch_to_megapixels(
    images: &[Image<Rgb<f32>>],
    params: &ScaleToMegapixelsParams,
) -> Result<Vec<Image<Rgb<f32>>>, ScaleError> {
    images
        .par_iter()
        .map(|image| scale_to_megapixels(image, params))
        .collect()
}

/// Resamples with half-pixel-center coordinate mapping.
fn resize_impl(
    src: &Image<Rgb<f32>>,
    width: u32,
    height: u32,
    filter: ScaleFilter,
) -> Image<Rgb<f32>> {
    let (src_width, src_height) = src.dimensions();
    let x_ratio = src_width as f32 / width as f32;
    let y_ratio = src_height as f32 / height as f32;

    Image::from_fn(width, height, |x, y| {
        let sx = (x as f32 + 0.5) * x_ratio - 0.5;
        let sy = (y as f32 + 0.5) * y_ratio - 0.5;
        match filter {
            ScaleFilter::Nearest => sample_nearest(src, sx, sy),
            ScaleFilter::Bilinear => sample_bilinear(src, sx, sy),
        }
    })
}

/// Extension trait providing a fluent megapixel scaling method.
pub trait ScaleToMegapixelsExt {
    /// Scale to a megapixel budget, consuming the image.
    ///
    /// # Errors
    ///
    /// See [`scale_plan`].
    fn scale_to_megapixels(self, params: &ScaleToMegapixelsParams) -> Result<Self, ScaleError>
    where
        Self: Sized;
}

impl ScaleToMegapixelsExt for Image<Rgb<f32>> {
    fn scale_to_megapixels(self, params: &ScaleToMegapixelsParams) -> Result<Self, ScaleError> {
        scale_to_megapixels(&self, params)
    }
}

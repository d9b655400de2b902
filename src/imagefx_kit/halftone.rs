//! Binary halftone and dithering effects.
//!
//! Every mode reduces the image to pure black and white. The pipeline is:
//! convert to luma, apply a contrast curve around mid-gray, run the mode's
//! screening or dithering pass, then replicate the binary plane to all
//! three channels.

use std::convert::Infallible;
use std::str::FromStr;

use image::Rgb;
use imageproc::definitions::Image;
use itertools::iproduct;
use rayon::prelude::*;

use crate::error::HalftoneError;
use crate::utils::{clamp01, luma_rec601};

/// The available halftone modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HalftoneMode {
    /// Rotated dot screen sized by cell brightness
    #[default]
    Dots,
    /// Rotated line screen with brightness-driven thickness
    Lines,
    /// 4x4 Bayer ordered dithering
    Bayer,
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
    /// Ordered dithering, sharing the 4x4 Bayer matrix
    Ordered,
    /// Dot screen with softened sharpness
    Newspaper,
    /// Layered hatching driven by brightness bands
    Crosshatch,
}

impl FromStr for HalftoneMode {
    type Err = Infallible;

    /// Parses a mode name; unrecognized names fall back to
    /// [`HalftoneMode::Dots`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "halftone_dots" => Self::Dots,
            "halftone_lines" => Self::Lines,
            "bayer_dithering" => Self::Bayer,
            "floyd_steinberg" => Self::FloydSteinberg,
            "ordered_dithering" => Self::Ordered,
            "newspaper" => Self::Newspaper,
            "crosshatch" => Self::Crosshatch,
            _ => Self::Dots,
        })
    }
}

/// Halftone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalftoneParams {
    /// Which screening mode to run
    pub mode: HalftoneMode,
    /// Screen cell size in pixels; also the line spacing for line modes
    pub dot_size: u32,
    /// Screen rotation in degrees for the dot and line modes
    pub angle: f32,
    /// Scales dot radius and line thickness
    pub sharpness: f32,
    /// Contrast curve applied to the luma plane before screening
    pub contrast: f32,
}

impl Default for HalftoneParams {
    fn default() -> Self {
        Self {
            mode: HalftoneMode::Dots,
            dot_size: 4,
            angle: 45.0,
            sharpness: 1.0,
            contrast: 1.0,
        }
    }
}

/// 4x4 Bayer threshold matrix, normalized to [0, 1).
const BAYER_4X4: [[f32; 4]; 4] = [
    [0.0 / 16.0, 8.0 / 16.0, 2.0 / 16.0, 10.0 / 16.0],
    [12.0 / 16.0, 4.0 / 16.0, 14.0 / 16.0, 6.0 / 16.0],
    [3.0 / 16.0, 11.0 / 16.0, 1.0 / 16.0, 9.0 / 16.0],
    [15.0 / 16.0, 7.0 / 16.0, 13.0 / 16.0, 5.0 / 16.0],
];

/// Halftones every image in a batch independently.
///
/// # Errors
///
/// Returns [`HalftoneError::EmptyImage`] if any image has a zero dimension,
/// or [`HalftoneError::InvalidCellSize`] if `dot_size` is zero.
pub fn halftone_batch(
    images: &[Image<Rgb<f32>>],
    params: &HalftoneParams,
) -> Result<Vec<Image<Rgb<f32>>>, HalftoneError> {
    images
        .par_iter()
        .map(|image| halftone(image, params))
        .collect()
}

/// Applies one halftone mode to a single image.
///
/// The output contains only pure black and pure white pixels.
///
/// # Errors
///
/// Returns [`HalftoneError::EmptyImage`] if the image has a zero dimension,
/// or [`HalftoneError::InvalidCellSize`] if `dot_size` is zero.
pub fn halftone(
    image: &Image<Rgb<f32>>,
    params: &HalftoneParams,
) -> Result<Image<Rgb<f32>>, HalftoneError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(HalftoneError::EmptyImage { width, height });
    }
    if params.dot_size == 0 {
        return Err(HalftoneError::InvalidCellSize {
            size: params.dot_size,
        });
    }

    let w = width as usize;
    let h = height as usize;
    let mut gray = vec![0.0f32; w * h];
    for (x, y, pixel) in image.enumerate_pixels() {
        let luma = luma_rec601(clamp01(pixel[0]), clamp01(pixel[1]), clamp01(pixel[2]));
        gray[y as usize * w + x as usize] = clamp01((luma - 0.5) * params.contrast + 0.5);
    }

    let binary = match params.mode {
        HalftoneMode::Dots => dots_impl(&gray, w, h, params, params.sharpness),
        HalftoneMode::Lines => lines_impl(&gray, w, h, params),
        HalftoneMode::Bayer | HalftoneMode::Ordered => bayer_impl(&gray, w, h),
        HalftoneMode::FloydSteinberg => floyd_steinberg_impl(gray.clone(), w, h),
        HalftoneMode::Newspaper => dots_impl(&gray, w, h, params, params.sharpness * 0.8),
        HalftoneMode::Crosshatch => crosshatch_impl(&gray, w, h, params),
    };

    let out = Image::from_fn(width, height, |x, y| {
        let v = binary[y as usize * w + x as usize];
        Rgb([v, v, v])
    });
    Ok(out)
}

/// Mean brightness of one screen cell.
fn cell_brightness_impl(gray: &[f32], w: usize, h: usize, cx: usize, cy: usize, cell: usize) -> f32 {
    let x_end = (cx + cell).min(w);
    let y_end = (cy + cell).min(h);
    let mut sum = 0.0;
    let mut count = 0usize;
    for (y, x) in iproduct!(cy..y_end, cx..x_end) {
        sum += gray[y * w + x];
        count += 1;
    }
    sum / count as f32
}

fn dots_impl(gray: &[f32], w: usize, h: usize, params: &HalftoneParams, sharpness: f32) -> Vec<f32> {
    let cell = params.dot_size as usize;
    let angle = params.angle.to_radians();
    let (sin, cos) = angle.sin_cos();
    let mut out = vec![1.0f32; w * h];

    for (cy, cx) in iproduct!((0..h).step_by(cell), (0..w).step_by(cell)) {
        let brightness = cell_brightness_impl(gray, w, h, cx, cy, cell);
        let radius = cell as f32 / 2.0 * brightness * sharpness;
        let center_x = cx as f32 + cell as f32 / 2.0;
        let center_y = cy as f32 + cell as f32 / 2.0;

        for (y, x) in iproduct!(cy..(cy + cell).min(h), cx..(cx + cell).min(w)) {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let rx = dx * cos - dy * sin;
            let ry = dx * sin + dy * cos;
            if rx.hypot(ry) <= radius {
                out[y * w + x] = 0.0;
            }
        }
    }
    out
}

fn lines_impl(gray: &[f32], w: usize, h: usize, params: &HalftoneParams) -> Vec<f32> {
    let line_size = params.dot_size as f32;
    let angle = params.angle.to_radians();
    let (sin, cos) = angle.sin_cos();
    let mut out = vec![1.0f32; w * h];

    for (y, x) in iproduct!(0..h, 0..w) {
        let brightness = gray[y * w + x];
        let rx = x as f32 * cos - y as f32 * sin;
        let line_position = (rx / line_size).trunc() * line_size;
        let offset = (rx - line_position).abs();
        let thickness = line_size / 2.0 * brightness * params.sharpness;
        if offset <= thickness {
            out[y * w + x] = 0.0;
        }
    }
    out
}

fn bayer_impl(gray: &[f32], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; w * h];
    for (y, x) in iproduct!(0..h, 0..w) {
        let threshold = BAYER_4X4[y % 4][x % 4];
        if gray[y * w + x] > threshold {
            out[y * w + x] = 1.0;
        }
    }
    out
}

fn floyd_steinberg_impl(mut gray: Vec<f32>, w: usize, h: usize) -> Vec<f32> {
    for y in 0..h {
        for x in 0..w {
            let old = gray[y * w + x];
            let new = if old > 0.5 { 1.0 } else { 0.0 };
            gray[y * w + x] = new;
            let error = old - new;

            if x + 1 < w {
                gray[y * w + x + 1] += error * 7.0 / 16.0;
            }
            if y + 1 < h {
                if x > 0 {
                    gray[(y + 1) * w + x - 1] += error * 3.0 / 16.0;
                }
                gray[(y + 1) * w + x] += error * 5.0 / 16.0;
                if x + 1 < w {
                    gray[(y + 1) * w + x + 1] += error * 1.0 / 16.0;
                }
            }
        }
    }
    // Diffusion can push neighbors outside [0, 1]; the quantizer above
    // already visited them, so only clipping remains
    for v in &mut gray {
        *v = clamp01(*v);
    }
    gray
}

fn crosshatch_impl(gray: &[f32], w: usize, h: usize, params: &HalftoneParams) -> Vec<f32> {
    let line_size = params.dot_size as f32;
    let ls = params.dot_size as usize;
    let mut out = vec![1.0f32; w * h];

    for (y, x) in iproduct!(0..h, 0..w) {
        let brightness = gray[y * w + x];
        // Horizontal hatching scaled by brightness
        if ((y % ls) as f32) < line_size * brightness * params.sharpness {
            out[y * w + x] = 0.0;
        }
        // Vertical hatching joins in dark regions
        if brightness < 0.5 && ((x % ls) as f32) < line_size * (1.0 - brightness) * params.sharpness
        {
            out[y * w + x] = 0.0;
        }
        // Diagonal hatching in the darkest regions
        if brightness < 0.3
            && (((x + y) % ls) as f32) < line_size * (0.3 - brightness) * 3.0 * params.sharpness
        {
            out[y * w + x] = 0.0;
        }
    }
    out
}

/// Extension trait providing a fluent halftone method.
pub trait HalftoneExt {
    /// Apply a halftone mode, consuming the image.
    ///
    /// # Errors
    ///
    /// Returns [`HalftoneError::EmptyImage`] if the image has a zero
    /// dimension, or [`HalftoneError::InvalidCellSize`] if `dot_size` is
    /// zero.
    fn halftone(self, params: &HalftoneParams) -> Result<Self, HalftoneError>
    where
        Self: Sized;
}

impl HalftoneExt for Image<Rgb<f32>> {
    fn halftone(self, params: &HalftoneParams) -> Result<Self, HalftoneError> {
        halftone(&self, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{horizontal_ramp_image, max_pixel_difference, uniform_rgb_image};

    fn assert_binary(image: &Image<Rgb<f32>>) {
        for pixel in image.pixels() {
            assert!(pixel[0] == 0.0 || pixel[0] == 1.0);
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn all_modes_produce_binary_output() {
        let image = horizontal_ramp_image(16, 16);
        let modes = [
            HalftoneMode::Dots,
            HalftoneMode::Lines,
            HalftoneMode::Bayer,
            HalftoneMode::FloydSteinberg,
            HalftoneMode::Ordered,
            HalftoneMode::Newspaper,
            HalftoneMode::Crosshatch,
        ];
        for mode in modes {
            let params = HalftoneParams {
                mode,
                ..HalftoneParams::default()
            };
            let out = halftone(&image, &params).unwrap();
            assert_eq!(out.dimensions(), image.dimensions());
            assert_binary(&out);
        }
    }

    #[test]
    fn floyd_steinberg_is_idempotent_on_binary_images() {
        let image = horizontal_ramp_image(16, 16);
        let params = HalftoneParams {
            mode: HalftoneMode::FloydSteinberg,
            ..HalftoneParams::default()
        };
        let once = halftone(&image, &params).unwrap();
        let twice = halftone(&once, &params).unwrap();
        assert!(max_pixel_difference(&once, &twice) == 0.0);
    }

    #[test]
    fn bayer_maps_black_to_black_and_white_to_white() {
        let params = HalftoneParams {
            mode: HalftoneMode::Bayer,
            ..HalftoneParams::default()
        };
        let black = halftone(&uniform_rgb_image(8, 8, [0.0; 3]), &params).unwrap();
        for pixel in black.pixels() {
            assert_eq!(*pixel, Rgb([0.0, 0.0, 0.0]));
        }
        let white = halftone(&uniform_rgb_image(8, 8, [1.0; 3]), &params).unwrap();
        for pixel in white.pixels() {
            assert_eq!(*pixel, Rgb([1.0, 1.0, 1.0]));
        }
    }

    #[test]
    fn ordered_matches_bayer_exactly() {
        let image = horizontal_ramp_image(16, 8);
        let bayer = halftone(
            &image,
            &HalftoneParams {
                mode: HalftoneMode::Bayer,
                ..HalftoneParams::default()
            },
        )
        .unwrap();
        let ordered = halftone(
            &image,
            &HalftoneParams {
                mode: HalftoneMode::Ordered,
                ..HalftoneParams::default()
            },
        )
        .unwrap();
        assert!(max_pixel_difference(&bayer, &ordered) == 0.0);
    }

    #[test]
    fn dots_grow_with_cell_brightness() {
        let params = HalftoneParams::default();
        let bright = halftone(&uniform_rgb_image(8, 8, [1.0; 3]), &params).unwrap();
        let dim = halftone(&uniform_rgb_image(8, 8, [0.3; 3]), &params).unwrap();
        let bright_dots = bright.pixels().filter(|p| p[0] == 0.0).count();
        let dim_dots = dim.pixels().filter(|p| p[0] == 0.0).count();
        assert!(bright_dots > dim_dots);
    }

    #[test]
    fn crosshatch_on_mid_gray_mixes_hatching_and_background() {
        let params = HalftoneParams {
            mode: HalftoneMode::Crosshatch,
            ..HalftoneParams::default()
        };
        let out = halftone(&uniform_rgb_image(16, 16, [0.5; 3]), &params).unwrap();
        let dark = out.pixels().filter(|p| p[0] == 0.0).count();
        let light = out.pixels().filter(|p| p[0] == 1.0).count();
        assert!(dark > 0);
        assert!(light > 0);
    }

    #[test]
    fn halftone_with_zero_dot_size_returns_error() {
        let image = horizontal_ramp_image(8, 8);
        let params = HalftoneParams {
            dot_size: 0,
            ..HalftoneParams::default()
        };
        assert_eq!(
            halftone(&image, &params).unwrap_err(),
            HalftoneError::InvalidCellSize { size: 0 }
        );
    }

    #[test]
    fn halftone_with_empty_image_returns_error() {
        let image: Image<Rgb<f32>> = Image::new(0, 8);
        assert_eq!(
            halftone(&image, &HalftoneParams::default()).unwrap_err(),
            HalftoneError::EmptyImage {
                width: 0,
                height: 8
            }
        );
    }

    #[test]
    fn halftone_mode_from_str_with_unknown_name_falls_back_to_dots() {
        assert_eq!(
            "floyd_steinberg".parse::<HalftoneMode>().unwrap(),
            HalftoneMode::FloydSteinberg
        );
        assert_eq!(
            "mystery".parse::<HalftoneMode>().unwrap(),
            HalftoneMode::Dots
        );
    }

    #[test]
    fn halftone_batch_processes_all_images() {
        let batch = vec![
            horizontal_ramp_image(8, 8),
            uniform_rgb_image(8, 8, [0.5; 3]),
        ];
        let out = halftone_batch(&batch, &HalftoneParams::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_binary(&out[0]);
    }
}

//! Gradient-based edge detection and stylized edge compositing.
//!
//! Six detectors share a pipeline: convert to luma, convolve with the
//! detector's kernels on a replicated border, normalize the gradient
//! magnitude by its own maximum, threshold into a binary edge map, then
//! optionally dilate, invert, and composite with configurable edge and
//! background colors.

use std::convert::Infallible;
use std::str::FromStr;

use image::Rgb;
use imageproc::definitions::Image;
use rayon::prelude::*;

use crate::error::EdgeDetectionError;
use crate::utils::{clamp01, luma_rec601};

/// The available edge detection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeAlgorithm {
    /// 3x3 Sobel gradient
    #[default]
    Sobel,
    /// 3x3 Prewitt gradient
    Prewitt,
    /// 3x3 Scharr gradient
    Scharr,
    /// 2x2 Roberts cross gradient
    Roberts,
    /// 3x3 Laplacian second derivative
    Laplacian,
    /// Gaussian blur, Sobel magnitude, then non-maximum suppression
    Canny,
}

impl FromStr for EdgeAlgorithm {
    type Err = Infallible;

    /// Parses an algorithm name; unrecognized names fall back to
    /// [`EdgeAlgorithm::Sobel`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sobel" => Self::Sobel,
            "prewitt" => Self::Prewitt,
            "scharr" => Self::Scharr,
            "roberts" => Self::Roberts,
            "laplacian" => Self::Laplacian,
            "canny" => Self::Canny,
            _ => Self::Sobel,
        })
    }
}

/// Edge detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeDetectionParams {
    /// Which detector to run
    pub algorithm: EdgeAlgorithm,
    /// Magnitude threshold in [0, 1] above which a pixel is an edge
    pub threshold: f32,
    /// Edge thickness in pixels; values above 1 dilate the edge map
    pub thickness: u32,
    /// Swap edge and background roles
    pub invert: bool,
    /// Color painted on edge pixels
    pub edge_color: [f32; 3],
    /// Color painted on non-edge pixels
    pub background_color: [f32; 3],
}

impl Default for EdgeDetectionParams {
    fn default() -> Self {
        Self {
            algorithm: EdgeAlgorithm::Sobel,
            threshold: 0.2,
            thickness: 1,
            invert: false,
            edge_color: [0.0, 0.0, 0.0],
            background_color: [1.0, 1.0, 1.0],
        }
    }
}

const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const PREWITT_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]];
const PREWITT_Y: [[f32; 3]; 3] = [[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

const SCHARR_X: [[f32; 3]; 3] = [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]];
const SCHARR_Y: [[f32; 3]; 3] = [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]];

const ROBERTS_X: [[f32; 2]; 2] = [[1.0, 0.0], [0.0, -1.0]];
const ROBERTS_Y: [[f32; 2]; 2] = [[0.0, 1.0], [-1.0, 0.0]];

const LAPLACIAN: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

const GAUSSIAN_3X3: [[f32; 3]; 3] = [
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
    [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
];

/// Detects edges in every image of a batch independently.
///
/// # Errors
///
/// Returns [`EdgeDetectionError::EmptyImage`] if any image has a zero
/// dimension.
pub fn detect_edges_batch(
    images: &[Image<Rgb<f32>>],
    params: &EdgeDetectionParams,
) -> Result<Vec<Image<Rgb<f32>>>, EdgeDetectionError> {
    images
        .par_iter()
        .map(|image| detect_edges(image, params))
        .collect()
}

/// Detects edges in a single image and composites the stylized result.
///
/// # Errors
///
/// Returns [`EdgeDetectionError::EmptyImage`] if the image has a zero
/// dimension.
pub fn detect_edges(
    image: &Image<Rgb<f32>>,
    params: &EdgeDetectionParams,
) -> Result<Image<Rgb<f32>>, EdgeDetectionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EdgeDetectionError::EmptyImage { width, height });
    }

    let w = width as usize;
    let h = height as usize;
    let mut gray = vec![0.0f32; w * h];
    for (x, y, pixel) in image.enumerate_pixels() {
        gray[y as usize * w + x as usize] =
            luma_rec601(clamp01(pixel[0]), clamp01(pixel[1]), clamp01(pixel[2]));
    }

    let edges = match params.algorithm {
        EdgeAlgorithm::Sobel => gradient_edges_impl(&gray, w, h, &SOBEL_X, &SOBEL_Y, params),
        EdgeAlgorithm::Prewitt => gradient_edges_impl(&gray, w, h, &PREWITT_X, &PREWITT_Y, params),
        EdgeAlgorithm::Scharr => gradient_edges_impl(&gray, w, h, &SCHARR_X, &SCHARR_Y, params),
        EdgeAlgorithm::Roberts => roberts_edges_impl(&gray, w, h, params),
        EdgeAlgorithm::Laplacian => laplacian_edges_impl(&gray, w, h, params),
        EdgeAlgorithm::Canny => canny_edges_impl(&gray, w, h, params),
    };

    let edges = dilate_impl(edges, w, h, params.thickness);

    let out = Image::from_fn(width, height, |x, y| {
        let mut e = edges[y as usize * w + x as usize];
        if params.invert {
            e = 1.0 - e;
        }
        let mut pixel = [0.0f32; 3];
        for c in 0..3 {
            pixel[c] = clamp01(
                params.background_color[c] * (1.0 - e) + params.edge_color[c] * e,
            );
        }
        Rgb(pixel)
    });
    Ok(out)
}

/// Convolves a luma plane with a square kernel, replicating the border.
fn convolve_impl<const K: usize>(
    plane: &[f32],
    w: usize,
    h: usize,
    kernel: &[[f32; K]; K],
) -> Vec<f32> {
    let half = (K / 2) as isize;
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let sy = (y as isize + ky as isize - half).clamp(0, h as isize - 1) as usize;
                    let sx = (x as isize + kx as isize - half).clamp(0, w as isize - 1) as usize;
                    acc += plane[sy * w + sx] * weight;
                }
            }
            out[y * w + x] = acc;
        }
    }
    out
}

/// Gradient magnitude normalized by its own maximum.
fn magnitude_impl(gx: &[f32], gy: &[f32]) -> Vec<f32> {
    let mut magnitude: Vec<f32> = gx
        .iter()
        .zip(gy)
        .map(|(a, b)| (a * a + b * b).sqrt())
        .collect();
    let max = magnitude.iter().fold(0.0f32, |m, &v| m.max(v));
    if max > 0.0 {
        for v in &mut magnitude {
            *v /= max;
        }
    }
    magnitude
}

fn binarize_impl(magnitude: Vec<f32>, threshold: f32) -> Vec<f32> {
    magnitude
        .into_iter()
        .map(|v| if v > threshold { 1.0 } else { 0.0 })
        .collect()
}

fn gradient_edges_impl(
    gray: &[f32],
    w: usize,
    h: usize,
    kernel_x: &[[f32; 3]; 3],
    kernel_y: &[[f32; 3]; 3],
    params: &EdgeDetectionParams,
) -> Vec<f32> {
    let gx = convolve_impl(gray, w, h, kernel_x);
    let gy = convolve_impl(gray, w, h, kernel_y);
    binarize_impl(magnitude_impl(&gx, &gy), params.threshold)
}

fn roberts_edges_impl(gray: &[f32], w: usize, h: usize, params: &EdgeDetectionParams) -> Vec<f32> {
    let gx = convolve_impl(gray, w, h, &ROBERTS_X);
    let gy = convolve_impl(gray, w, h, &ROBERTS_Y);
    binarize_impl(magnitude_impl(&gx, &gy), params.threshold)
}

fn laplacian_edges_impl(
    gray: &[f32],
    w: usize,
    h: usize,
    params: &EdgeDetectionParams,
) -> Vec<f32> {
    let mut response: Vec<f32> = convolve_impl(gray, w, h, &LAPLACIAN)
        .into_iter()
        .map(f32::abs)
        .collect();
    let max = response.iter().fold(0.0f32, |m, &v| m.max(v));
    if max > 0.0 {
        for v in &mut response {
            *v /= max;
        }
    }
    binarize_impl(response, params.threshold)
}

fn canny_edges_impl(gray: &[f32], w: usize, h: usize, params: &EdgeDetectionParams) -> Vec<f32> {
    let blurred = convolve_impl(gray, w, h, &GAUSSIAN_3X3);
    let gx = convolve_impl(&blurred, w, h, &SOBEL_X);
    let gy = convolve_impl(&blurred, w, h, &SOBEL_Y);
    let magnitude = magnitude_impl(&gx, &gy);

    // Simplified non-maximum suppression: keep interior pixels that exceed
    // the threshold and dominate their 3x3 neighborhood
    let mut suppressed = vec![0.0f32; w * h];
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let v = magnitude[y * w + x];
            if v <= params.threshold {
                continue;
            }
            let mut local_max = 0.0f32;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let ny = (y as isize + dy) as usize;
                    let nx = (x as isize + dx) as usize;
                    local_max = local_max.max(magnitude[ny * w + nx]);
                }
            }
            if v >= local_max {
                suppressed[y * w + x] = v;
            }
        }
    }

    suppressed
        .into_iter()
        .map(|v| if v > 0.0 { 1.0 } else { 0.0 })
        .collect()
}

/// Grows the binary edge map by repeated 3x3 maximum passes.
fn dilate_impl(edges: Vec<f32>, w: usize, h: usize, thickness: u32) -> Vec<f32> {
    let mut current = edges;
    for _ in 1..thickness {
        let source = current.clone();
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let mut local_max = 0.0f32;
                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        let ny = (y as isize + dy) as usize;
                        let nx = (x as isize + dx) as usize;
                        local_max = local_max.max(source[ny * w + nx]);
                    }
                }
                current[y * w + x] = local_max;
            }
        }
    }
    current
}

/// Extension trait providing a fluent edge detection method.
pub trait DetectEdgesExt {
    /// Detect and stylize edges, consuming the image.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeDetectionError::EmptyImage`] if the image has a zero
    /// dimension.
    fn detect_edges(self, params: &EdgeDetectionParams) -> Result<Self, EdgeDetectionError>
    where
        Self: Sized;
}

impl DetectEdgesExt for Image<Rgb<f32>> {
    fn detect_edges(self, params: &EdgeDetectionParams) -> Result<Self, EdgeDetectionError> {
        detect_edges(&self, params)
    }
}

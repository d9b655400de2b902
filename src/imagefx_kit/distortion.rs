//! Geometric distortion engine.
//!
//! Twelve independent coordinate-remapping effects sharing a
//! sample-and-write loop. Each effect walks every destination pixel,
//! derives a source coordinate from a closed-form formula, and reads it with
//! clamp-to-edge sampling or a per-effect fallback.
//!
//! The out-of-bounds policy intentionally differs per effect (clamp,
//! pass-through, black fill, or wrap-around) and is preserved exactly; the
//! differences are part of each effect's look.

use std::convert::Infallible;
use std::f32::consts::PI;
use std::str::FromStr;

use image::Rgb;
use imageproc::definitions::Image;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::DistortionError;
use crate::imagefx_kit::sampler::{sample_clamped, sample_nearest};
use crate::utils::clamp01;

/// The available distortion effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistortionKind {
    /// Sinusoidal offset per axis
    #[default]
    Wave,
    /// Rotation that decays with distance from the center
    Swirl,
    /// Angular mirroring into pie segments
    Kaleidoscope,
    /// Brightness-sorted runs within each scanline
    PixelSort,
    /// Trigonometric pseudo-noise displacement
    Displacement,
    /// Radial power remap, black outside the lens
    Fisheye,
    /// Concentric sine ripple from the center
    Ripple,
    /// Angular twist that decays with radius
    Twist,
    /// Radial bulge toward the center
    Spherize,
    /// Random horizontal row-block rolls
    Glitch,
    /// Tile averaging with per-tile jitter
    Mosaic,
    /// Three-octave sinusoidal warp field
    Warp,
}

impl FromStr for DistortionKind {
    type Err = Infallible;

    /// Parses an effect name; unrecognized names fall back to
    /// [`DistortionKind::Wave`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "wave" => Self::Wave,
            "swirl" => Self::Swirl,
            "kaleidoscope" => Self::Kaleidoscope,
            "pixelSort" => Self::PixelSort,
            "displacement" => Self::Displacement,
            "fisheye" => Self::Fisheye,
            "ripple" => Self::Ripple,
            "twist" => Self::Twist,
            "spherize" => Self::Spherize,
            "glitch" => Self::Glitch,
            "mosaic" => Self::Mosaic,
            "warp" => Self::Warp,
            _ => Self::Wave,
        })
    }
}

/// Distortion parameters.
///
/// `intensity` and `frequency` span 0 to 100; each effect normalizes them
/// into its own working range. `offset_x`/`offset_y` shift the effect center
/// in pixels for the effects that honor an offset (swirl, ripple). `seed`
/// drives the glitch and mosaic randomness; equal seeds give equal output.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistortionParams {
    /// Which effect to apply
    pub kind: DistortionKind,
    /// Effect strength, 0 to 100
    pub intensity: f32,
    /// Effect frequency or cell size, 0 to 100
    pub frequency: f32,
    /// Horizontal center offset in pixels, -50 to 50
    pub offset_x: f32,
    /// Vertical center offset in pixels, -50 to 50
    pub offset_y: f32,
    /// Seed for the randomized effects (glitch, mosaic)
    pub seed: u64,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            kind: DistortionKind::Wave,
            intensity: 50.0,
            frequency: 10.0,
            offset_x: 0.0,
            offset_y: 0.0,
            seed: 0,
        }
    }
}

/// Distorts every image in a batch independently.
///
/// Batch element `i` seeds its randomized effects with `seed + i` so glitch
/// and mosaic vary across the batch while staying reproducible.
///
/// # Errors
///
/// Returns [`DistortionError::EmptyImage`] if any image has a zero
/// dimension.
pub fn distort_batch(
    images: &[Image<Rgb<f32>>],
    params: &DistortionParams,
) -> Result<Vec<Image<Rgb<f32>>>, DistortionError> {
    images
        .par_iter()
        .enumerate()
        .map(|(index, image)| {
            let element_params = DistortionParams {
                seed: params.seed.wrapping_add(index as u64),
                ..*params
            };
            distort(image, &element_params)
        })
        .collect()
}

/// Applies one distortion effect to a single image.
///
/// The input is clamped to [0, 1] before remapping, so the output is also
/// within [0, 1].
///
/// # Errors
///
/// Returns [`DistortionError::EmptyImage`] if the image has a zero
/// dimension.
pub fn distort(
    image: &Image<Rgb<f32>>,
    params: &DistortionParams,
) -> Result<Image<Rgb<f32>>, DistortionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DistortionError::EmptyImage { width, height });
    }

    let mut src = image.clone();
    for pixel in src.pixels_mut() {
        *pixel = Rgb([clamp01(pixel[0]), clamp01(pixel[1]), clamp01(pixel[2])]);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let out = match params.kind {
        DistortionKind::Wave => wave_impl(&src, params),
        DistortionKind::Swirl => swirl_impl(&src, params),
        DistortionKind::Kaleidoscope => kaleidoscope_impl(&src, params),
        DistortionKind::PixelSort => pixel_sort_impl(&src, params),
        DistortionKind::Displacement => displacement_impl(&src, params),
        DistortionKind::Fisheye => fisheye_impl(&src, params),
        DistortionKind::Ripple => ripple_impl(&src, params),
        DistortionKind::Twist => twist_impl(&src, params),
        DistortionKind::Spherize => spherize_impl(&src, params),
        DistortionKind::Glitch => glitch_impl(&src, params, &mut rng),
        DistortionKind::Mosaic => mosaic_impl(&src, params, &mut rng),
        DistortionKind::Warp => warp_impl(&src, params),
    };

    Ok(out)
}

/// Rounds a source coordinate the way the remap formulas expect.
#[inline]
fn round_coord(value: f32) -> i64 {
    value.round() as i64
}

/// True if the rounded coordinate pair lies inside the image.
#[inline]
fn in_bounds(sx: i64, sy: i64, width: u32, height: u32) -> bool {
    sx >= 0 && sx < i64::from(width) && sy >= 0 && sy < i64::from(height)
}

fn wave_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let amplitude = p.intensity * 2.0;
    let frequency = p.frequency / 100.0;

    Image::from_fn(width, height, |x, y| {
        let dx = (y as f32 * frequency).sin() * amplitude;
        let dy = (x as f32 * frequency).cos() * amplitude;
        sample_nearest(src, x as f32 + dx, y as f32 + dy)
    })
}

fn swirl_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0 + p.offset_x;
    let center_y = height as f32 / 2.0 + p.offset_y;
    let max_radius = width.min(height) as f32 / 2.0;
    let strength = p.intensity / 50.0;

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = dx.hypot(dy);

        if distance < max_radius {
            let amount = (max_radius - distance) / max_radius * strength;
            let angle = dy.atan2(dx) + amount;
            let sx = round_coord(center_x + angle.cos() * distance);
            let sy = round_coord(center_y + angle.sin() * distance);
            if in_bounds(sx, sy, width, height) {
                sample_clamped(src, sx, sy)
            } else {
                *src.get_pixel(x, y)
            }
        } else {
            *src.get_pixel(x, y)
        }
    })
}

fn kaleidoscope_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    // frequency 0..100 maps to 3..12 segments
    let segments = ((3.0 + p.frequency / 100.0 * 9.0) as i64).max(3);
    let segment_angle = 2.0 * PI / segments as f32;

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        let mut angle = dy.atan2(dx);
        if angle < 0.0 {
            angle += 2.0 * PI;
        }

        let segment_index = (angle / segment_angle) as i64;
        let segment_start = segment_index as f32 * segment_angle;
        let segment_offset = angle - segment_start;
        let mirrored_offset = if segment_index % 2 == 0 {
            segment_offset
        } else {
            segment_angle - segment_offset
        };
        let new_angle = segment_start + mirrored_offset;

        let sx = round_coord(center_x + new_angle.cos() * distance);
        let sy = round_coord(center_y + new_angle.sin() * distance);
        if in_bounds(sx, sy, width, height) {
            sample_clamped(src, sx, sy)
        } else {
            *src.get_pixel(x, y)
        }
    })
}

fn pixel_sort_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let sort_len = (p.frequency.round() as i64).max(1) as u32;
    let mut out = src.clone();

    for y in 0..height {
        let mut run_start = 0u32;
        // Iterate one past the row end so the final run flushes
        for x in 0..=width {
            let flush = x == width || x - run_start >= sort_len;
            if flush {
                if x > run_start {
                    let mut run: Vec<Rgb<f32>> =
                        (run_start..x).map(|sx| *src.get_pixel(sx, y)).collect();
                    run.sort_by(|a, b| {
                        (a[0] + a[1] + a[2]).total_cmp(&(b[0] + b[1] + b[2]))
                    });
                    for (offset, pixel) in run.into_iter().enumerate() {
                        out.put_pixel(run_start + offset as u32, y, pixel);
                    }
                }
                run_start = x;
            }
        }
    }
    out
}

fn displacement_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let strength = p.intensity / 10.0;
    let scale = p.frequency / 10.0;

    Image::from_fn(width, height, |x, y| {
        let fx = x as f32;
        let fy = y as f32;
        let noise_x = (fx * scale).sin() * (fy * scale).cos() * strength;
        let noise_y = (fx * scale).cos() * (fy * scale).sin() * strength;
        sample_nearest(src, fx + noise_x, fy + noise_y)
    })
}

fn fisheye_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_radius = width.min(height) as f32 / 2.0;
    let strength = p.intensity / 100.0;
    let black = Rgb([0.0, 0.0, 0.0]);

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < max_radius {
            let amount = (distance / max_radius).powf(strength);
            let sx = round_coord(center_x + dx * amount);
            let sy = round_coord(center_y + dy * amount);
            if in_bounds(sx, sy, width, height) {
                sample_clamped(src, sx, sy)
            } else {
                black
            }
        } else {
            // Outside the lens radius
            black
        }
    })
}

fn ripple_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0 + p.offset_x;
    let center_y = height as f32 / 2.0 + p.offset_y;
    let amplitude = p.intensity / 2.0;
    let frequency = p.frequency / 50.0;

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();

        let ripple = (distance * frequency).sin() * amplitude;
        let ripple_factor = if distance > 0.0 {
            (distance + ripple) / distance
        } else {
            1.0
        };

        let sx = round_coord(center_x + dx * ripple_factor);
        let sy = round_coord(center_y + dy * ripple_factor);
        if in_bounds(sx, sy, width, height) {
            sample_clamped(src, sx, sy)
        } else {
            *src.get_pixel(x, y)
        }
    })
}

fn twist_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_radius = width.min(height) as f32 / 2.0;
    let strength = p.intensity / 100.0;

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < max_radius {
            let twist_amount = (1.0 - distance / max_radius) * strength * PI;
            let new_angle = dy.atan2(dx) + twist_amount;
            let sx = round_coord(center_x + new_angle.cos() * distance);
            let sy = round_coord(center_y + new_angle.sin() * distance);
            if in_bounds(sx, sy, width, height) {
                sample_clamped(src, sx, sy)
            } else {
                *src.get_pixel(x, y)
            }
        } else {
            *src.get_pixel(x, y)
        }
    })
}

fn spherize_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_radius = width.min(height) as f32 / 2.0;
    let strength = p.intensity / 100.0;

    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < max_radius {
            let factor = ((distance / max_radius) * PI * 0.5).sin();
            let sphere_factor = 1.0 + (factor - 1.0) * strength;
            let sx = round_coord(center_x + dx * sphere_factor);
            let sy = round_coord(center_y + dy * sphere_factor);
            if in_bounds(sx, sy, width, height) {
                sample_clamped(src, sx, sy)
            } else {
                *src.get_pixel(x, y)
            }
        } else {
            *src.get_pixel(x, y)
        }
    })
}

fn glitch_impl(
    src: &Image<Rgb<f32>>,
    p: &DistortionParams,
    rng: &mut ChaCha8Rng,
) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    let glitch_strength = p.intensity / 10.0;
    let block_size = (p.frequency as i64).max(1) as u32;
    let displacement = p.frequency;

    let mut y = 0;
    while y < height {
        if rng.gen::<f32>() < glitch_strength / 100.0 {
            let shift = ((rng.gen::<f32>() - 0.5) * displacement * 2.0) as i64;
            let block_height = block_size.min(height - y);
            for by in 0..block_height {
                roll_row_impl(&mut out, y + by, shift, width);
            }
        }
        y += block_size;
    }
    out
}

/// Rolls one row horizontally with wrap-around.
fn roll_row_impl(image: &mut Image<Rgb<f32>>, y: u32, shift: i64, width: u32) {
    let row: Vec<Rgb<f32>> = (0..width).map(|x| *image.get_pixel(x, y)).collect();
    for x in 0..width {
        let sx = (i64::from(x) - shift).rem_euclid(i64::from(width)) as usize;
        image.put_pixel(x, y, row[sx]);
    }
}

fn mosaic_impl(
    src: &Image<Rgb<f32>>,
    p: &DistortionParams,
    rng: &mut ChaCha8Rng,
) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let tile_size = (p.frequency as i64).max(2) as u32;
    let offset_strength = p.intensity / 10.0;
    // Tiles are written at jittered positions; uncovered pixels stay black
    let mut out = Image::new(width, height);

    let mut tile_y = 0;
    while tile_y < height {
        let mut tile_x = 0;
        let tile_height = tile_size.min(height - tile_y);
        while tile_x < width {
            let tile_width = tile_size.min(width - tile_x);

            let mut sum = [0.0f32; 3];
            for dy in 0..tile_height {
                for dx in 0..tile_width {
                    let pixel = src.get_pixel(tile_x + dx, tile_y + dy);
                    for c in 0..3 {
                        sum[c] += pixel[c];
                    }
                }
            }
            let count = (tile_width * tile_height) as f32;
            let average = Rgb([sum[0] / count, sum[1] / count, sum[2] / count]);

            let jitter_x = (rng.gen::<f32>() - 0.5) * offset_strength;
            let jitter_y = (rng.gen::<f32>() - 0.5) * offset_strength;

            for dy in 0..tile_height {
                for dx in 0..tile_width {
                    let target_x = ((tile_x + dx) as f32 + jitter_x)
                        .clamp(0.0, (width - 1) as f32)
                        .round() as u32;
                    let target_y = ((tile_y + dy) as f32 + jitter_y)
                        .clamp(0.0, (height - 1) as f32)
                        .round() as u32;
                    out.put_pixel(target_x, target_y, average);
                }
            }
            tile_x += tile_size;
        }
        tile_y += tile_size;
    }
    out
}

fn warp_impl(src: &Image<Rgb<f32>>, p: &DistortionParams) -> Image<Rgb<f32>> {
    let (width, height) = src.dimensions();
    let warp_strength = p.intensity / 100.0;
    let warp_scale = p.frequency / 20.0;

    Image::from_fn(width, height, |x, y| {
        let fx = x as f32;
        let fy = y as f32;
        let warp1 = (fx * warp_scale).sin() * (fy * warp_scale).cos();
        let warp2 = (fx * warp_scale * 2.0).sin() * (fy * warp_scale * 2.0).cos() * 0.5;
        let warp3 = (fx * warp_scale * 4.0).sin() * (fy * warp_scale * 4.0).cos() * 0.25;

        let total_warp = (warp1 + warp2 + warp3) * warp_strength * 20.0;
        sample_nearest(src, fx + total_warp, fy + total_warp * 0.7)
    })
}

/// Extension trait providing a fluent distortion method.
pub trait DistortExt {
    /// Apply a distortion effect, consuming the image.
    ///
    /// # Errors
    ///
    /// Returns [`DistortionError::EmptyImage`] if the image has a zero
    /// dimension.
    fn distort(self, params: &DistortionParams) -> Result<Self, DistortionError>
    where
        Self: Sized;
}

impl DistortExt for Image<Rgb<f32>> {
    fn distort(self, params: &DistortionParams) -> Result<Self, DistortionError> {
        distort(&self, params)
    }
}

//! Procedural nebula texture generation.
//!
//! Builds a fractal Perlin noise field, maps it through one of eight color
//! modes, scatters a star field on top, and finishes with optional
//! per-pixel vignette, bloom, and chromatic aberration passes.
//!
//! All intermediate work happens in a 0-255 floating point range and is
//! divided down to [0, 1] when the final image is assembled. Equal
//! parameters always produce bit-identical output; the `seed` drives both
//! the noise tables and the star placement.

use std::convert::Infallible;
use std::f32::consts::{PI, TAU};
use std::str::FromStr;

use image::Rgb;
use imageproc::definitions::Image;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::NebulaError;
use crate::utils::{clamp01, hsl_to_rgb_255};

/// How the noise field is translated into color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorMode {
    /// Piecewise-linear interpolation through the configured color stops
    #[default]
    Custom,
    /// Full-circle HSL rainbow
    Rainbow,
    /// 300-degree spectral sweep with brightness-linked lightness
    Spectrum,
    /// Color stops indexed by distance from the center
    Radial,
    /// Color stops indexed by angle around the center
    Angular,
    /// Color stops indexed along a rotated linear gradient
    Gradient,
    /// Mean of the noise and radial indices
    Dual,
    /// Noise blended with interference sinusoids
    Plasma,
}

impl FromStr for ColorMode {
    type Err = Infallible;

    /// Parses a mode name; unrecognized names fall back to
    /// [`ColorMode::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "custom" => Self::Custom,
            "rainbow" => Self::Rainbow,
            "spectrum" => Self::Spectrum,
            "radial" => Self::Radial,
            "angular" => Self::Angular,
            "gradient" => Self::Gradient,
            "dual" => Self::Dual,
            "plasma" => Self::Plasma,
            _ => Self::Custom,
        })
    }
}

/// Shape transform applied to each noise octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoiseType {
    /// Classic gradient noise
    #[default]
    Perlin,
    /// Two offset-frequency samples averaged
    Simplex,
    /// Sharp inverted ridges, `1 - |n|`
    Ridged,
    /// Soft billowing clouds, `|n|`
    Billow,
    /// Folded turbulence, `|n| * 2 - 1`
    Turbulence,
}

impl FromStr for NoiseType {
    type Err = Infallible;

    /// Parses a noise type name; unrecognized names fall back to
    /// [`NoiseType::Perlin`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "perlin" => Self::Perlin,
            "simplex" => Self::Simplex,
            "ridged" => Self::Ridged,
            "billow" => Self::Billow,
            "turbulence" => Self::Turbulence,
            _ => Self::Perlin,
        })
    }
}

/// One anchor of the custom color gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorStop {
    /// Position along the gradient in [0, 1]
    pub position: f32,
    /// RGB color in [0, 1]
    pub color: [f32; 3],
}

/// Nebula generator parameters.
///
/// The defaults produce a deep-space purple and pink nebula with a sparse
/// white star field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NebulaParams {
    /// Base noise frequency
    pub scale: f32,
    /// Number of fractal octaves
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub persistence: f32,
    /// Frequency growth per octave
    pub lacunarity: f32,
    /// Seed for the noise tables and star field
    pub seed: f32,
    /// Color translation mode
    pub color_mode: ColorMode,
    /// Octave shape transform
    pub noise_type: NoiseType,
    /// Gradient anchors for the stop-based color modes, strictly increasing
    pub color_stops: Vec<ColorStop>,
    /// Rotation in degrees for the angular and gradient modes
    pub gradient_rotation: f32,
    /// Index scale for the radial and gradient modes
    pub gradient_scale: f32,
    /// Hue rotation in degrees for the rainbow and spectrum modes
    pub hue_shift: f32,
    /// Extra saturation for the spectrum mode, 0 to 1
    pub saturation_boost: f32,
    /// Tone-map brightness multiplier
    pub brightness: f32,
    /// Tone-map contrast exponent
    pub contrast: f32,
    /// Tone-map gamma
    pub gamma: f32,
    /// Invert the final colors
    pub invert_colors: bool,
    /// Domain warp strength; zero disables warping
    pub warp_strength: f32,
    /// Domain warp frequency
    pub warp_frequency: f32,
    /// Stars per pixel
    pub star_density: f32,
    /// Peak star brightness, 0 to 1
    pub star_brightness: f32,
    /// Give each star a random hue instead of white
    pub star_colors: bool,
    /// Expand roughly one star in ten into a twinkle disc
    pub star_twinkle: bool,
    /// Enable the bloom pass
    pub bloom: bool,
    /// Bloom strength, 0 to 1
    pub bloom_intensity: f32,
    /// Enable the vignette pass
    pub vignette: bool,
    /// Vignette strength, 0 to 1
    pub vignette_intensity: f32,
    /// Enable the chromatic aberration pass
    pub chromatic_aberration: bool,
    /// Chromatic aberration strength, 0 to 1
    pub aberration_intensity: f32,
}

impl Default for NebulaParams {
    fn default() -> Self {
        Self {
            scale: 0.01,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0.5,
            color_mode: ColorMode::Custom,
            noise_type: NoiseType::Perlin,
            color_stops: vec![
                ColorStop {
                    position: 0.0,
                    color: [0.02, 0.02, 0.06],
                },
                ColorStop {
                    position: 0.3,
                    color: [0.10, 0.06, 0.24],
                },
                ColorStop {
                    position: 0.6,
                    color: [0.47, 0.16, 0.59],
                },
                ColorStop {
                    position: 0.8,
                    color: [1.0, 0.39, 0.78],
                },
                ColorStop {
                    position: 1.0,
                    color: [1.0, 1.0, 1.0],
                },
            ],
            gradient_rotation: 0.0,
            gradient_scale: 1.0,
            hue_shift: 0.0,
            saturation_boost: 0.0,
            brightness: 1.0,
            contrast: 1.0,
            gamma: 1.0,
            invert_colors: false,
            warp_strength: 0.0,
            warp_frequency: 0.01,
            star_density: 0.001,
            star_brightness: 0.8,
            star_colors: false,
            star_twinkle: false,
            bloom: false,
            bloom_intensity: 0.5,
            vignette: false,
            vignette_intensity: 0.3,
            chromatic_aberration: false,
            aberration_intensity: 0.1,
        }
    }
}

/// Classic 2-D gradient noise with seeded gradient and permutation tables.
struct PerlinNoise {
    gradients: Vec<[f32; 2]>,
    permutation: Vec<usize>,
}

impl PerlinNoise {
    fn new(rng: &mut ChaCha8Rng) -> Self {
        let gradients: Vec<[f32; 2]> = (0..256)
            .map(|_| {
                let angle = rng.gen::<f32>() * TAU;
                [angle.cos(), angle.sin()]
            })
            .collect();
        let mut permutation: Vec<usize> = (0..256).collect();
        permutation.shuffle(rng);
        permutation.extend_from_within(..);
        Self {
            gradients,
            permutation,
        }
    }

    /// Quintic fade curve, `6t^5 - 15t^4 + 10t^3`.
    fn fade(t: f32) -> f32 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    fn grad_dot(&self, index: usize, dx: f32, dy: f32) -> f32 {
        let g = self.gradients[index & 255];
        g[0] * dx + g[1] * dy
    }

    fn noise(&self, x: f32, y: f32) -> f32 {
        let xf0 = x.floor();
        let yf0 = y.floor();
        let xi = (xf0 as i64 & 255) as usize;
        let yi = (yf0 as i64 & 255) as usize;
        let xf = x - xf0;
        let yf = y - yf0;

        let u = Self::fade(xf);
        let v = Self::fade(yf);

        let a = self.permutation[xi] + yi;
        let b = self.permutation[xi + 1] + yi;

        let n00 = self.grad_dot(self.permutation[a], xf, yf);
        let n01 = self.grad_dot(self.permutation[a + 1], xf, yf - 1.0);
        let n10 = self.grad_dot(self.permutation[b], xf - 1.0, yf);
        let n11 = self.grad_dot(self.permutation[b + 1], xf - 1.0, yf - 1.0);

        let x1 = Self::lerp(n00, n10, u);
        let x2 = Self::lerp(n01, n11, u);
        Self::lerp(x1, x2, v)
    }

    fn shaped_noise(&self, x: f32, y: f32, noise_type: NoiseType) -> f32 {
        let n = self.noise(x, y);
        match noise_type {
            NoiseType::Perlin => n,
            NoiseType::Simplex => (n + self.noise(x * 1.414, y * 1.414)) * 0.5,
            NoiseType::Ridged => 1.0 - n.abs(),
            NoiseType::Billow => n.abs(),
            NoiseType::Turbulence => n.abs() * 2.0 - 1.0,
        }
    }
}

fn seed_to_u64(seed: f32) -> u64 {
    (f64::from(seed) * 1_000_000.0) as u64
}

/// Generates a nebula texture.
///
/// # Errors
///
/// Returns [`NebulaError::EmptyDimensions`] if either dimension is zero, or
/// [`NebulaError::ColorStopsNotIncreasing`] if the stop positions are not
/// strictly increasing.
///
/// # Examples
///
/// ```
/// use imagefx_kit::{generate_nebula, NebulaParams};
///
/// let nebula = generate_nebula(64, 64, &NebulaParams::default())?;
/// assert_eq!(nebula.dimensions(), (64, 64));
/// # Ok::<(), imagefx_kit::NebulaError>(())
/// ```
pub fn generate_nebula(
    width: u32,
    height: u32,
    params: &NebulaParams,
) -> Result<Image<Rgb<f32>>, NebulaError> {
    if width == 0 || height == 0 {
        return Err(NebulaError::EmptyDimensions { width, height });
    }
    for (index, pair) in params.color_stops.windows(2).enumerate() {
        if pair[1].position <= pair[0].position {
            return Err(NebulaError::ColorStopsNotIncreasing { index: index + 1 });
        }
    }

    let stops: Vec<(f32, [f32; 3])> = params
        .color_stops
        .iter()
        .map(|stop| {
            (
                stop.position,
                [
                    stop.color[0] * 255.0,
                    stop.color[1] * 255.0,
                    stop.color[2] * 255.0,
                ],
            )
        })
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed_to_u64(params.seed));
    let perlin = PerlinNoise::new(&mut rng);

    let w = width as usize;
    let h = height as usize;
    let mut buffer = vec![[0.0f32; 3]; w * h];

    for y in 0..h {
        for x in 0..w {
            let fx = x as f32;
            let fy = y as f32;

            let (warped_x, warped_y) = if params.warp_strength > 0.0 {
                let wf = params.warp_frequency;
                (
                    fx + params.warp_strength * perlin.noise(fx * wf, fy * wf) * 50.0,
                    fy + params.warp_strength * perlin.noise((fx + 1000.0) * wf, fy * wf) * 50.0,
                )
            } else {
                (fx, fy)
            };

            let mut total = 0.0f32;
            let mut amplitude = 1.0f32;
            let mut frequency = params.scale;
            let mut amplitude_sum = 0.0f32;
            for _ in 0..params.octaves {
                total += perlin.shaped_noise(
                    warped_x * frequency,
                    warped_y * frequency,
                    params.noise_type,
                ) * amplitude;
                amplitude_sum += amplitude;
                amplitude *= params.persistence;
                frequency *= params.lacunarity;
            }
            let normalized = if amplitude_sum > 0.0 {
                total / amplitude_sum
            } else {
                0.0
            };
            let noise_t = (normalized + 1.0) / 2.0;

            let t = position_for_mode_impl(noise_t, fx, fy, width, height, params);
            let t = tone_map_impl(t, params);

            let mut color = interpolate_color_impl(t, params, &stops);
            if params.invert_colors {
                for c in &mut color {
                    *c = 255.0 - *c;
                }
            }
            buffer[y * w + x] = color;
        }
    }

    render_stars_impl(&mut buffer, width, height, params);
    apply_post_effects_impl(&mut buffer, width, height, params);

    Ok(Image::from_fn(width, height, |x, y| {
        let color = buffer[y as usize * w + x as usize];
        Rgb([
            clamp01(color[0] / 255.0),
            clamp01(color[1] / 255.0),
            clamp01(color[2] / 255.0),
        ])
    }))
}

/// Reshapes the gradient index for the spatial color modes.
fn position_for_mode_impl(
    noise_t: f32,
    fx: f32,
    fy: f32,
    width: u32,
    height: u32,
    params: &NebulaParams,
) -> f32 {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let dx = fx - center_x;
    let dy = fy - center_y;

    match params.color_mode {
        ColorMode::Radial => {
            let nx = dx / width as f32;
            let ny = dy / height as f32;
            (nx * nx + ny * ny).sqrt() * params.gradient_scale
        }
        ColorMode::Angular => {
            let angle = (dy.atan2(dx) + PI) / TAU;
            (angle + params.gradient_rotation / 360.0).rem_euclid(1.0)
        }
        ColorMode::Gradient => {
            let theta = params.gradient_rotation.to_radians();
            let rotated_x = dx * theta.cos() - dy * theta.sin();
            (rotated_x / width as f32 + 0.5) * params.gradient_scale
        }
        ColorMode::Dual => {
            // Unscaled radial distance; gradient_scale only affects the
            // pure radial and gradient modes
            let nx = dx / width as f32;
            let ny = dy / height as f32;
            let radial = (nx * nx + ny * ny).sqrt();
            (noise_t + radial) * 0.5
        }
        ColorMode::Plasma => {
            let interference = ((fx * 0.02).sin() * (fy * 0.02).cos()
                + ((fx * fx + fy * fy).sqrt() * 0.02).sin())
                * 0.5;
            (noise_t + interference) * 0.5
        }
        ColorMode::Custom | ColorMode::Rainbow | ColorMode::Spectrum => noise_t,
    }
}

fn tone_map_impl(t: f32, params: &NebulaParams) -> f32 {
    let t = (t * params.brightness).max(0.0).powf(params.contrast);
    clamp01(t.powf(1.0 / params.gamma))
}

/// Maps a gradient index in [0, 1] to a 0-255 RGB color.
fn interpolate_color_impl(t: f32, params: &NebulaParams, stops: &[(f32, [f32; 3])]) -> [f32; 3] {
    match params.color_mode {
        ColorMode::Rainbow => {
            let hue = (t + params.hue_shift / 360.0).rem_euclid(1.0);
            hsl_to_rgb_255(hue, 1.0, 0.5)
        }
        ColorMode::Spectrum => {
            let hue = (t * 300.0 / 360.0 + params.hue_shift / 360.0).rem_euclid(1.0);
            let saturation = 0.8 + params.saturation_boost * 0.2;
            let lightness = 0.4 + t * 0.4;
            hsl_to_rgb_255(hue, saturation, lightness)
        }
        _ => {
            for pair in stops.windows(2) {
                let (pos1, color1) = pair[0];
                let (pos2, color2) = pair[1];
                if t >= pos1 && t <= pos2 {
                    let local_t = if pos2 > pos1 {
                        (t - pos1) / (pos2 - pos1)
                    } else {
                        0.0
                    };
                    return [
                        (color1[0] + (color2[0] - color1[0]) * local_t).trunc(),
                        (color1[1] + (color2[1] - color1[1]) * local_t).trunc(),
                        (color1[2] + (color2[2] - color1[2]) * local_t).trunc(),
                    ];
                }
            }
            let last = stops[stops.len() - 1].1;
            [last[0].trunc(), last[1].trunc(), last[2].trunc()]
        }
    }
}

/// Scatters the star field, additively, over the working buffer.
fn render_stars_impl(buffer: &mut [[f32; 3]], width: u32, height: u32, params: &NebulaParams) {
    let w = width as usize;
    // Fresh generator with the same seed so stars are independent of how
    // much noise state was consumed above
    let mut rng = ChaCha8Rng::seed_from_u64(seed_to_u64(params.seed));
    let count = (width as f32 * height as f32 * params.star_density) as u32;

    for _ in 0..count {
        let x = rng.gen_range(0..width) as usize;
        let y = rng.gen_range(0..height) as usize;
        let brightness = rng.gen::<f32>() * params.star_brightness;

        let star_color = if params.star_colors {
            let base = hsl_to_rgb_255(rng.gen::<f32>(), 0.8, 0.7);
            [
                base[0] * brightness,
                base[1] * brightness,
                base[2] * brightness,
            ]
        } else {
            [255.0 * brightness; 3]
        };

        let pixel = &mut buffer[y * w + x];
        for c in 0..3 {
            pixel[c] = (pixel[c] + star_color[c]).min(255.0);
        }

        if params.star_twinkle && rng.gen::<f32>() < 0.1 {
            let size = 1 + rng.gen_range(0..2i32);
            for dy in -size..=size {
                for dx in -size..=size {
                    let tx = x as i64 + i64::from(dx);
                    let ty = y as i64 + i64::from(dy);
                    if tx < 0 || tx >= i64::from(width) || ty < 0 || ty >= i64::from(height) {
                        continue;
                    }
                    let distance = ((dx * dx + dy * dy) as f32).sqrt();
                    let falloff = (1.0 - distance / size as f32).max(0.0);
                    let twinkle_brightness = brightness * falloff * 0.5;
                    let twinkle_color = if params.star_colors {
                        let base = hsl_to_rgb_255(rng.gen::<f32>(), 0.8, 0.7);
                        [
                            base[0] * twinkle_brightness,
                            base[1] * twinkle_brightness,
                            base[2] * twinkle_brightness,
                        ]
                    } else {
                        [255.0 * twinkle_brightness; 3]
                    };
                    let pixel = &mut buffer[ty as usize * w + tx as usize];
                    for c in 0..3 {
                        pixel[c] = (pixel[c] + twinkle_color[c]).min(255.0);
                    }
                }
            }
        }
    }
}

/// Vignette, bloom, and chromatic aberration, in that per-pixel order.
fn apply_post_effects_impl(buffer: &mut [[f32; 3]], width: u32, height: u32, params: &NebulaParams) {
    if !(params.vignette || params.bloom || params.chromatic_aberration) {
        return;
    }

    let w = width as usize;
    let h = height as usize;
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_distance = (center_x * center_x + center_y * center_y).sqrt();

    for y in 0..h {
        for x in 0..w {
            let pixel = &mut buffer[y * w + x];
            let fx = x as f32;
            let fy = y as f32;

            if params.vignette {
                let dx = fx - center_x;
                let dy = fy - center_y;
                let distance = (dx * dx + dy * dy).sqrt();
                let factor = 1.0 - (distance / max_distance) * params.vignette_intensity;
                for c in pixel.iter_mut() {
                    *c *= factor;
                }
            }

            if params.bloom {
                let mean = (pixel[0] + pixel[1] + pixel[2]) / 3.0;
                if mean > 200.0 {
                    for c in pixel.iter_mut() {
                        *c = (*c + mean * params.bloom_intensity * 0.1).min(255.0);
                    }
                }
            }

            if params.chromatic_aberration {
                let aberration = params.aberration_intensity * 2.0;
                let offset_x = (fx - center_x) * aberration * 0.01;
                pixel[0] *= 1.0 + offset_x * 0.1;
                pixel[2] *= 1.0 - offset_x * 0.1;
            }

            for c in pixel.iter_mut() {
                *c = c.clamp(0.0, 255.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_in_unit_range, max_pixel_difference};

    #[test]
    fn generate_nebula_with_equal_seeds_is_bit_identical() {
        let params = NebulaParams::default();
        let a = generate_nebula(32, 32, &params).unwrap();
        let b = generate_nebula(32, 32, &params).unwrap();
        assert!(max_pixel_difference(&a, &b) == 0.0);
    }

    #[test]
    fn generate_nebula_with_different_seeds_differs() {
        let a = generate_nebula(32, 32, &NebulaParams::default()).unwrap();
        let params = NebulaParams {
            seed: 7.25,
            ..NebulaParams::default()
        };
        let b = generate_nebula(32, 32, &params).unwrap();
        assert!(max_pixel_difference(&a, &b) > 0.0);
    }

    #[test]
    fn generate_nebula_output_has_requested_dimensions_and_unit_range() {
        let out = generate_nebula(48, 24, &NebulaParams::default()).unwrap();
        assert_eq!(out.dimensions(), (48, 24));
        assert_in_unit_range(&out);
    }

    #[test]
    fn all_color_modes_stay_in_unit_range() {
        let modes = [
            ColorMode::Custom,
            ColorMode::Rainbow,
            ColorMode::Spectrum,
            ColorMode::Radial,
            ColorMode::Angular,
            ColorMode::Gradient,
            ColorMode::Dual,
            ColorMode::Plasma,
        ];
        for color_mode in modes {
            let params = NebulaParams {
                color_mode,
                ..NebulaParams::default()
            };
            let out = generate_nebula(24, 24, &params).unwrap();
            assert_in_unit_range(&out);
        }
    }

    #[test]
    fn all_noise_types_stay_in_unit_range() {
        let types = [
            NoiseType::Perlin,
            NoiseType::Simplex,
            NoiseType::Ridged,
            NoiseType::Billow,
            NoiseType::Turbulence,
        ];
        for noise_type in types {
            let params = NebulaParams {
                noise_type,
                ..NebulaParams::default()
            };
            let out = generate_nebula(24, 24, &params).unwrap();
            assert_in_unit_range(&out);
        }
    }

    #[test]
    fn post_effects_and_stars_keep_output_in_unit_range() {
        let params = NebulaParams {
            star_density: 0.05,
            star_colors: true,
            star_twinkle: true,
            bloom: true,
            vignette: true,
            chromatic_aberration: true,
            warp_strength: 0.5,
            ..NebulaParams::default()
        };
        let out = generate_nebula(32, 32, &params).unwrap();
        assert_in_unit_range(&out);
    }

    #[test]
    fn dual_mode_is_invariant_under_gradient_scale() {
        let base = NebulaParams {
            color_mode: ColorMode::Dual,
            ..NebulaParams::default()
        };
        let scaled = NebulaParams {
            gradient_scale: 3.0,
            ..base.clone()
        };
        let a = generate_nebula(32, 32, &base).unwrap();
        let b = generate_nebula(32, 32, &scaled).unwrap();
        assert!(max_pixel_difference(&a, &b) == 0.0);
    }

    #[test]
    fn radial_mode_responds_to_gradient_scale() {
        let base = NebulaParams {
            color_mode: ColorMode::Radial,
            ..NebulaParams::default()
        };
        let scaled = NebulaParams {
            gradient_scale: 3.0,
            ..base.clone()
        };
        let a = generate_nebula(32, 32, &base).unwrap();
        let b = generate_nebula(32, 32, &scaled).unwrap();
        assert!(max_pixel_difference(&a, &b) > 0.0);
    }

    #[test]
    fn invert_colors_flips_the_palette() {
        let base = NebulaParams {
            star_density: 0.0,
            ..NebulaParams::default()
        };
        let inverted = NebulaParams {
            invert_colors: true,
            ..base.clone()
        };
        let a = generate_nebula(16, 16, &base).unwrap();
        let b = generate_nebula(16, 16, &inverted).unwrap();
        // Same field, complementary colors
        for (pa, pb) in a.pixels().zip(b.pixels()) {
            for c in 0..3 {
                assert!((pa[c] + pb[c] - 1.0).abs() < 2.0 / 255.0 + 1e-4);
            }
        }
    }

    #[test]
    fn generate_nebula_with_zero_dimension_returns_error() {
        let result = generate_nebula(0, 16, &NebulaParams::default());
        assert_eq!(
            result.unwrap_err(),
            NebulaError::EmptyDimensions {
                width: 0,
                height: 16
            }
        );
    }

    #[test]
    fn generate_nebula_with_unordered_stops_returns_error() {
        let params = NebulaParams {
            color_stops: vec![
                ColorStop {
                    position: 0.0,
                    color: [0.0; 3],
                },
                ColorStop {
                    position: 0.5,
                    color: [0.5; 3],
                },
                ColorStop {
                    position: 0.5,
                    color: [1.0; 3],
                },
            ],
            ..NebulaParams::default()
        };
        let result = generate_nebula(8, 8, &params);
        assert_eq!(
            result.unwrap_err(),
            NebulaError::ColorStopsNotIncreasing { index: 2 }
        );
    }

    #[test]
    fn color_mode_from_str_with_unknown_name_falls_back_to_custom() {
        assert_eq!("plasma".parse::<ColorMode>().unwrap(), ColorMode::Plasma);
        assert_eq!("nope".parse::<ColorMode>().unwrap(), ColorMode::Custom);
    }

    #[test]
    fn noise_type_from_str_with_unknown_name_falls_back_to_perlin() {
        assert_eq!("ridged".parse::<NoiseType>().unwrap(), NoiseType::Ridged);
        assert_eq!("nope".parse::<NoiseType>().unwrap(), NoiseType::Perlin);
    }

    #[test]
    fn perlin_noise_is_zero_mean_at_lattice_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let perlin = PerlinNoise::new(&mut rng);
        // Gradient noise vanishes exactly on the integer lattice
        for (x, y) in [(0.0, 0.0), (3.0, 5.0), (17.0, 2.0)] {
            assert!(perlin.noise(x, y).abs() < 1e-6);
        }
    }
}

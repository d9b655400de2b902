//! Sequential tone and color adjustment pipeline.
//!
//! The pipeline applies, in a fixed order: invert, exposure, temperature and
//! tint, luma-masked highlights/shadows, blacks/whites lift and gain,
//! contrast, brightness, a clamp to [0, 1], and finally hue/saturation in
//! HSV space. Each stage only runs when its parameter differs from neutral,
//! so the default parameters are an exact identity.

use image::Rgb;
use imageproc::definitions::Image;
use rayon::prelude::*;

use crate::error::ColorGradeError;
use crate::utils::{clamp01, hsv_to_rgb, luma_rec709, rgb_to_hsv};

/// Tone and color adjustment knobs.
///
/// `Default` is the neutral identity configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorGradeParams {
    /// Hue rotation in degrees, -180 to 180. 0 is neutral.
    pub hue: f32,
    /// Saturation multiplier, 0 to 2. 1 is neutral.
    pub saturation: f32,
    /// Additive brightness, -1 to 1. 0 is neutral.
    pub brightness: f32,
    /// Contrast multiplier around mid gray, 0 to 2. 1 is neutral.
    pub contrast: f32,
    /// Exposure in stops, -2 to 2, applied as a `2^exposure` gain.
    pub exposure: f32,
    /// Warm/cool channel shift, -1 to 1.
    pub temperature: f32,
    /// Green/magenta channel shift, -1 to 1.
    pub tint: f32,
    /// Lift applied toward white in dark values, -1 to 1.
    pub blacks: f32,
    /// Gain proportional to the value itself, -1 to 1.
    pub whites: f32,
    /// Luma-masked additive highlight adjustment, -1 to 1.
    pub highlights: f32,
    /// Luma-masked additive shadow adjustment, -1 to 1.
    pub shadows: f32,
    /// Invert the image before any other adjustment.
    pub invert: bool,
}

impl Default for ColorGradeParams {
    fn default() -> Self {
        Self {
            hue: 0.0,
            saturation: 1.0,
            brightness: 0.0,
            contrast: 1.0,
            exposure: 0.0,
            temperature: 0.0,
            tint: 0.0,
            blacks: 0.0,
            whites: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            invert: false,
        }
    }
}

/// Grades every image in a batch independently.
///
/// # Errors
///
/// Returns [`ColorGradeError::EmptyImage`] if any image has a zero dimension.
pub fn grade_colors_batch(
    images: &[Image<Rgb<f32>>],
    params: &ColorGradeParams,
) -> Result<Vec<Image<Rgb<f32>>>, ColorGradeError> {
    images
        .par_iter()
        .map(|image| grade_colors(image, params))
        .collect()
}

/// Applies the grading pipeline to a single image.
///
/// Output values are clamped to [0, 1].
///
/// # Errors
///
/// Returns [`ColorGradeError::EmptyImage`] if the image has a zero dimension.
///
/// # Examples
/// ```
/// use image::Rgb;
/// use imagefx_kit::{grade_colors, ColorGradeParams, Image};
///
/// let image: Image<Rgb<f32>> = Image::from_pixel(2, 2, Rgb([0.25, 0.25, 0.25]));
/// let params = ColorGradeParams {
///     exposure: 1.0,
///     ..ColorGradeParams::default()
/// };
/// let graded = grade_colors(&image, &params).unwrap();
/// assert!((graded.get_pixel(0, 0)[0] - 0.5).abs() < 1e-6);
/// ```
pub fn grade_colors(
    image: &Image<Rgb<f32>>,
    params: &ColorGradeParams,
) -> Result<Image<Rgb<f32>>, ColorGradeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ColorGradeError::EmptyImage { width, height });
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        *pixel = grade_pixel_impl(*pixel, params);
    }
    Ok(out)
}

/// Runs the full pipeline on one pixel.
fn grade_pixel_impl(pixel: Rgb<f32>, p: &ColorGradeParams) -> Rgb<f32> {
    let Rgb([mut r, mut g, mut b]) = pixel;

    if p.invert {
        r = 1.0 - r;
        g = 1.0 - g;
        b = 1.0 - b;
    }

    if p.exposure != 0.0 {
        let gain = 2.0f32.powf(p.exposure);
        r *= gain;
        g *= gain;
        b *= gain;
    }

    if p.temperature != 0.0 {
        if p.temperature > 0.0 {
            r *= 1.0 + p.temperature * 0.5;
            b *= 1.0 - p.temperature * 0.3;
        } else {
            r *= 1.0 + p.temperature * 0.3;
            b *= 1.0 - p.temperature * 0.5;
        }
    }

    if p.tint != 0.0 {
        if p.tint > 0.0 {
            g *= 1.0 + p.tint * 0.5;
        } else {
            r *= 1.0 - p.tint * 0.3;
            b *= 1.0 - p.tint * 0.3;
        }
    }

    if p.highlights != 0.0 || p.shadows != 0.0 {
        let luma = luma_rec709(r, g, b);

        if p.highlights != 0.0 {
            let mask = clamp01((luma - 0.5) * 2.0).powi(2);
            r += p.highlights * mask;
            g += p.highlights * mask;
            b += p.highlights * mask;
        }

        if p.shadows != 0.0 {
            let mask = clamp01((0.5 - luma) * 2.0).powi(2);
            r += p.shadows * mask;
            g += p.shadows * mask;
            b += p.shadows * mask;
        }
    }

    if p.blacks != 0.0 {
        r += p.blacks * (1.0 - r);
        g += p.blacks * (1.0 - g);
        b += p.blacks * (1.0 - b);
    }

    if p.whites != 0.0 {
        r += p.whites * r;
        g += p.whites * g;
        b += p.whites * b;
    }

    if p.contrast != 1.0 {
        r = (r - 0.5) * p.contrast + 0.5;
        g = (g - 0.5) * p.contrast + 0.5;
        b = (b - 0.5) * p.contrast + 0.5;
    }

    if p.brightness != 0.0 {
        r += p.brightness;
        g += p.brightness;
        b += p.brightness;
    }

    r = clamp01(r);
    g = clamp01(g);
    b = clamp01(b);

    if p.hue != 0.0 || p.saturation != 1.0 {
        let (mut h, mut s, v) = rgb_to_hsv(r, g, b);

        if p.hue != 0.0 {
            h = (h + p.hue / 360.0).rem_euclid(1.0);
        }
        if p.saturation != 1.0 {
            s = clamp01(s * p.saturation);
        }

        let (nr, ng, nb) = hsv_to_rgb(h, s, v);
        r = nr;
        g = ng;
        b = nb;
    }

    Rgb([clamp01(r), clamp01(g), clamp01(b)])
}

/// Extension trait providing a fluent color grading method.
pub trait ColorGradeExt {
    /// Apply the grading pipeline, consuming the image.
    ///
    /// # Errors
    ///
    /// Returns [`ColorGradeError::EmptyImage`] if the image has a zero
    /// dimension.
    fn grade_colors(self, params: &ColorGradeParams) -> Result<Self, ColorGradeError>
    where
        Self: Sized;
}

impl ColorGradeExt for Image<Rgb<f32>> {
    fn grade_colors(self, params: &ColorGradeParams) -> Result<Self, ColorGradeError> {
        grade_colors(&self, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        assert_in_unit_range, create_test_rgb_image, max_pixel_difference, uniform_rgb_image,
    };

    #[test]
    fn grade_colors_with_neutral_params_is_identity() {
        let image = create_test_rgb_image();
        let graded = grade_colors(&image, &ColorGradeParams::default()).unwrap();
        assert!(max_pixel_difference(&image, &graded) < 1e-6);
    }

    #[test]
    fn grade_colors_with_invert_flips_values() {
        let image = uniform_rgb_image(2, 2, [0.2, 0.5, 0.9]);
        let params = ColorGradeParams {
            invert: true,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors(&image, &params).unwrap();
        let pixel = graded.get_pixel(0, 0);
        assert!((pixel[0] - 0.8).abs() < 1e-6);
        assert!((pixel[1] - 0.5).abs() < 1e-6);
        assert!((pixel[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn grade_colors_with_one_stop_exposure_doubles_values() {
        let image = uniform_rgb_image(2, 2, [0.25, 0.1, 0.3]);
        let params = ColorGradeParams {
            exposure: 1.0,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors(&image, &params).unwrap();
        let pixel = graded.get_pixel(1, 1);
        assert!((pixel[0] - 0.5).abs() < 1e-6);
        assert!((pixel[1] - 0.2).abs() < 1e-6);
        assert!((pixel[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn grade_colors_with_warm_temperature_boosts_red_and_cuts_blue() {
        let image = uniform_rgb_image(1, 1, [0.5, 0.5, 0.5]);
        let params = ColorGradeParams {
            temperature: 1.0,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors(&image, &params).unwrap();
        let pixel = graded.get_pixel(0, 0);
        assert!((pixel[0] - 0.75).abs() < 1e-6);
        assert!((pixel[1] - 0.5).abs() < 1e-6);
        assert!((pixel[2] - 0.35).abs() < 1e-6);
    }

    #[test]
    fn grade_colors_with_extreme_brightness_clamps_output() {
        let image = create_test_rgb_image();
        let params = ColorGradeParams {
            brightness: 1.0,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors(&image, &params).unwrap();
        assert_in_unit_range(&graded);
        assert_eq!(graded.get_pixel(0, 0)[0], 1.0);
    }

    #[test]
    fn grade_colors_with_full_hue_rotation_returns_original() {
        let image = uniform_rgb_image(1, 1, [0.9, 0.2, 0.4]);
        let params = ColorGradeParams {
            hue: 180.0,
            ..ColorGradeParams::default()
        };
        let twice = grade_colors(&grade_colors(&image, &params).unwrap(), &params).unwrap();
        assert!(max_pixel_difference(&image, &twice) < 1e-4);
    }

    #[test]
    fn grade_colors_with_zero_saturation_produces_gray() {
        let image = uniform_rgb_image(1, 1, [0.9, 0.2, 0.4]);
        let params = ColorGradeParams {
            saturation: 0.0,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors(&image, &params).unwrap();
        let pixel = graded.get_pixel(0, 0);
        assert!((pixel[0] - pixel[1]).abs() < 1e-6);
        assert!((pixel[1] - pixel[2]).abs() < 1e-6);
    }

    #[test]
    fn grade_colors_with_empty_image_returns_error() {
        let image: Image<Rgb<f32>> = Image::new(0, 0);
        let result = grade_colors(&image, &ColorGradeParams::default());
        assert_eq!(
            result.unwrap_err(),
            ColorGradeError::EmptyImage {
                width: 0,
                height: 0
            }
        );
    }

    #[test]
    fn grade_colors_batch_processes_each_image_independently() {
        let batch = vec![
            uniform_rgb_image(2, 2, [0.2, 0.2, 0.2]),
            uniform_rgb_image(2, 2, [0.4, 0.4, 0.4]),
        ];
        let params = ColorGradeParams {
            brightness: 0.1,
            ..ColorGradeParams::default()
        };
        let graded = grade_colors_batch(&batch, &params).unwrap();
        assert_eq!(graded.len(), 2);
        assert!((graded[0].get_pixel(0, 0)[0] - 0.3).abs() < 1e-6);
        assert!((graded[1].get_pixel(0, 0)[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn grade_colors_ext_matches_free_function() {
        let image = create_test_rgb_image();
        let params = ColorGradeParams {
            contrast: 1.5,
            ..ColorGradeParams::default()
        };
        let via_fn = grade_colors(&image, &params).unwrap();
        let via_ext = image.grade_colors(&params).unwrap();
        assert!(max_pixel_difference(&via_fn, &via_ext) < 1e-6);
    }
}

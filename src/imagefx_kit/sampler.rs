//! Clamp-to-edge pixel sampling.
//!
//! Every effect that remaps coordinates reads pixels through these
//! functions. The edge policy is always clamp-to-edge: out-of-range
//! coordinates snap to the nearest border pixel, never wrap or mirror.

use image::Rgb;
use imageproc::definitions::Image;

/// Samples a pixel at integer coordinates, clamping to the nearest edge.
///
/// The image must have non-zero dimensions; callers validate this at the
/// operation boundary.
#[inline]
#[must_use]
pub fn sample_clamped(image: &Image<Rgb<f32>>, x: i64, y: i64) -> Rgb<f32> {
    let (width, height) = image.dimensions();
    let sx = x.clamp(0, i64::from(width) - 1) as u32;
    let sy = y.clamp(0, i64::from(height) - 1) as u32;
    *image.get_pixel(sx, sy)
}

/// Samples the pixel nearest to fractional coordinates, clamping to the edge.
#[inline]
#[must_use]
pub fn sample_nearest(image: &Image<Rgb<f32>>, x: f32, y: f32) -> Rgb<f32> {
    sample_clamped(image, x.round() as i64, y.round() as i64)
}

/// Bilinearly interpolates the four pixels around fractional coordinates.
///
/// Corner lookups are individually clamped to the edge, so coordinates
/// outside the image blend toward the border pixels.
#[must_use]
pub fn sample_bilinear(image: &Image<Rgb<f32>>, x: f32, y: f32) -> Rgb<f32> {
    let x0f = x.floor();
    let y0f = y.floor();
    let tx = x - x0f;
    let ty = y - y0f;
    let x0 = x0f as i64;
    let y0 = y0f as i64;

    let p00 = sample_clamped(image, x0, y0);
    let p10 = sample_clamped(image, x0 + 1, y0);
    let p01 = sample_clamped(image, x0, y0 + 1);
    let p11 = sample_clamped(image, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let top = p00[c] + (p10[c] - p00[c]) * tx;
        let bottom = p01[c] + (p11[c] - p01[c]) * tx;
        *value = top + (bottom - top) * ty;
    }
    Rgb(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_rgb_image;

    #[test]
    fn sample_clamped_inside_image_returns_exact_pixel() {
        let image = create_test_rgb_image();
        assert_eq!(sample_clamped(&image, 1, 0), *image.get_pixel(1, 0));
    }

    #[test]
    fn sample_clamped_outside_image_snaps_to_edge() {
        let image = create_test_rgb_image();
        assert_eq!(sample_clamped(&image, -5, 0), *image.get_pixel(0, 0));
        assert_eq!(sample_clamped(&image, 10, 10), *image.get_pixel(1, 1));
        assert_eq!(sample_clamped(&image, 0, -1), *image.get_pixel(0, 0));
    }

    #[test]
    fn sample_nearest_rounds_to_closest_pixel() {
        let image = create_test_rgb_image();
        assert_eq!(sample_nearest(&image, 0.4, 0.4), *image.get_pixel(0, 0));
        assert_eq!(sample_nearest(&image, 0.6, 0.9), *image.get_pixel(1, 1));
    }

    #[test]
    fn sample_bilinear_at_integer_coordinates_matches_pixel() {
        let image = create_test_rgb_image();
        let sampled = sample_bilinear(&image, 1.0, 1.0);
        let expected = *image.get_pixel(1, 1);
        for c in 0..3 {
            assert!((sampled[c] - expected[c]).abs() < 1e-6);
        }
    }

    #[test]
    fn sample_bilinear_at_midpoint_averages_neighbors() {
        let image = create_test_rgb_image();
        let sampled = sample_bilinear(&image, 0.5, 0.0);
        let a = *image.get_pixel(0, 0);
        let b = *image.get_pixel(1, 0);
        for c in 0..3 {
            assert!((sampled[c] - (a[c] + b[c]) / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sample_bilinear_far_outside_image_clamps_to_corner() {
        let image = create_test_rgb_image();
        let sampled = sample_bilinear(&image, -3.0, -3.0);
        let corner = *image.get_pixel(0, 0);
        for c in 0..3 {
            assert!((sampled[c] - corner[c]).abs() < 1e-6);
        }
    }
}

//! Shared image fixtures for unit tests.

use image::{Luma, Rgb};
use imageproc::definitions::Image;

/// A 2x2 RGB image with four distinct pixel values.
pub fn create_test_rgb_image() -> Image<Rgb<f32>> {
    let mut image = Image::new(2, 2);
    image.put_pixel(0, 0, Rgb([0.8, 0.6, 0.4]));
    image.put_pixel(1, 0, Rgb([0.2, 0.4, 0.6]));
    image.put_pixel(0, 1, Rgb([0.1, 0.9, 0.5]));
    image.put_pixel(1, 1, Rgb([0.7, 0.3, 0.0]));
    image
}

/// An image filled with a single RGB color.
pub fn uniform_rgb_image(width: u32, height: u32, color: [f32; 3]) -> Image<Rgb<f32>> {
    Image::from_pixel(width, height, Rgb(color))
}

/// An image with a horizontal black-to-white ramp.
pub fn horizontal_ramp_image(width: u32, height: u32) -> Image<Rgb<f32>> {
    Image::from_fn(width, height, |x, _| {
        let v = x as f32 / (width - 1).max(1) as f32;
        Rgb([v, v, v])
    })
}

/// A grayscale mask filled with a single coverage value.
pub fn uniform_gray_image(width: u32, height: u32, value: f32) -> Image<Luma<f32>> {
    Image::from_pixel(width, height, Luma([value]))
}

/// Largest absolute per-channel difference between two equally sized images.
pub fn max_pixel_difference(a: &Image<Rgb<f32>>, b: &Image<Rgb<f32>>) -> f32 {
    assert_eq!(a.dimensions(), b.dimensions());
    a.pixels()
        .zip(b.pixels())
        .flat_map(|(pa, pb)| (0..3).map(move |c| (pa[c] - pb[c]).abs()))
        .fold(0.0, f32::max)
}

/// Asserts that every channel of every pixel lies in [0, 1].
pub fn assert_in_unit_range(image: &Image<Rgb<f32>>) {
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            assert!(
                (0.0..=1.0).contains(&pixel[c]),
                "channel {c} at ({x}, {y}) out of range: {}",
                pixel[c]
            );
        }
    }
}

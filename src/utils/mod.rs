//! Internal utility functions for imagefx-kit.
//!
//! This module contains the scalar color math shared across the image
//! effects: luma weights, value clamping, and the RGB/HSV/HSL conversions.

/// Clamps a value to the [0, 1] range.
#[inline]
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Rec. 601 luma from RGB components.
///
/// This is the grayscale conversion used by the edge detection and halftone
/// effects.
#[inline]
#[must_use]
pub fn luma_rec601(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Rec. 709 luma from RGB components.
///
/// Used by the color grading highlight/shadow masks.
#[inline]
#[must_use]
pub fn luma_rec709(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Converts an RGB triple to HSV.
///
/// Hue is returned in [0, 1) and wraps modulo 1.0. When the channels are
/// equal (gray) the hue is 0. Equal-maximum ties resolve in
/// blue-over-green-over-red priority.
///
/// # Returns
///
/// `(hue, saturation, value)` with all components in [0, 1].
#[must_use]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let value = maxc;

    let delta = maxc - minc;
    let saturation = if maxc != 0.0 { delta / maxc } else { 0.0 };

    if delta == 0.0 {
        return (0.0, saturation, value);
    }

    let rc = (maxc - r) / delta;
    let gc = (maxc - g) / delta;
    let bc = (maxc - b) / delta;

    let hue = if maxc == b {
        4.0 + gc - rc
    } else if maxc == g {
        2.0 + rc - bc
    } else {
        bc - gc
    };

    ((hue / 6.0).rem_euclid(1.0), saturation, value)
}

/// Converts an HSV triple back to RGB.
///
/// Inverse of [`rgb_to_hsv`]; hue values outside [0, 1) wrap.
#[must_use]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let sector = (h * 6.0) as i32;
    let f = h * 6.0 - sector as f32;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Converts an HSL triple to RGB in the 0-255 working range.
///
/// Components are rounded to whole values, matching the 8-bit color ramp the
/// nebula generator composes in before its final normalization.
#[must_use]
pub(crate) fn hsl_to_rgb_255(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 1.0 / 6.0 {
        (c, x, 0.0)
    } else if h < 2.0 / 6.0 {
        (x, c, 0.0)
    } else if h < 3.0 / 6.0 {
        (0.0, c, x)
    } else if h < 4.0 / 6.0 {
        (0.0, x, c)
    } else if h < 5.0 / 6.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0).round(),
        ((g + m) * 255.0).round(),
        ((b + m) * 255.0).round(),
    ]
}

//! Error types for the image effect operations.
//!
//! Each effect has its own error enum so callers can match precisely on the
//! failures of the operation they invoked. Variants carry the offending
//! values for diagnostics.

use thiserror::Error;

/// Errors from the color grading operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ColorGradeError {
    /// The input image has a zero dimension.
    #[error("Cannot grade an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
}

/// Errors from the alpha blend compositor.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BlendError {
    /// The base image batch contains no images.
    #[error("Base image batch is empty")]
    EmptyBaseBatch,
    /// The blend image batch contains no images.
    #[error("Blend image batch is empty")]
    EmptyBlendBatch,
    /// An input image has a zero dimension.
    #[error("Cannot blend an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
}

/// Errors from the distortion engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DistortionError {
    /// The input image has a zero dimension.
    #[error("Cannot distort an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
}

/// Errors from the edge detection operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDetectionError {
    /// The input image has a zero dimension.
    #[error("Cannot detect edges in an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
}

/// Errors from the halftone engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HalftoneError {
    /// The input image has a zero dimension.
    #[error("Cannot halftone an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// The cell/line size is zero, which would make cells degenerate.
    #[error("Halftone cell size must be at least 1, got {size}")]
    InvalidCellSize {
        /// The rejected cell size
        size: u32,
    },
}

/// Errors from the nebula texture generator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NebulaError {
    /// The requested output has a zero dimension.
    #[error("Nebula dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Color stop positions must be strictly increasing.
    #[error("Color stop {index} is not positioned after its predecessor")]
    ColorStopsNotIncreasing {
        /// Index of the offending stop
        index: usize,
    },
}

/// Errors from the megapixel scaling operation.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ScaleError {
    /// The input image has a zero dimension.
    #[error("Cannot scale an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// The megapixel target is not a positive finite number.
    #[error("Target megapixels must be positive and finite, got {megapixels}")]
    InvalidMegapixels {
        /// The rejected target
        megapixels: f32,
    },
    /// A dimension snapping multiple is zero.
    #[error("Snap multiple must be at least 1")]
    InvalidMultiple,
}

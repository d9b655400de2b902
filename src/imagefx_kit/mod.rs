//! The image effect engines.

pub mod blend;
pub mod color_grade;
pub mod distortion;
pub mod edge_detection;
pub mod halftone;
pub mod nebula;
pub mod sampler;
pub mod scale_megapixels;

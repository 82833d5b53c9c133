#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for the pipeline.
pub mod image;

/// Drawing utilities for debug images.
pub mod draw;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{ColorImage, DepthImage, Image, ImageSize};

//! Texture extraction from terrain containers.
//!
//! - [`BlockDecoder`] - block decompression, defaulting to [`Texture2dDecoder`]
//! - [`extract_albedo`] / [`extract_alpha`] - chunk payload to image

mod block;
mod extract;

pub use block::{BlockCodec, BlockDecoder, Texture2dDecoder};
pub use extract::*;

/// Decoded RGBA8 raster, row-major.
pub type DecodedImage = image::RgbaImage;

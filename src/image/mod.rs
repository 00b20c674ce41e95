//! Sprite image handling
//!
//! Diffusion backends render far above sprite resolution; this module brings
//! their output back onto the requested pixel grid and handles the base64
//! transport encoding used in responses.

pub mod processor;

pub use processor::{decode_base64, downscale_base64_png, encode_base64};

/// 1x1 transparent PNG, base64-encoded.
pub const TRANSPARENT_PIXEL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// 8x8 red and blue checkerboard PNG, base64-encoded.
pub const CHECKERBOARD_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAgAAAAICAIAAABLbSncAAAAJ0lEQVQY02P4/x8DAxgYGBhgAIwMjAyMjAzwAKMDrAyMjIxgEgAA//8DAK0DDhU2XoYAAAAASUVORK5CYII=";

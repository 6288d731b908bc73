// src/engine.rs
//
// Decoding, editing and encoding of raster images.
// 1. Decode bytes (or a memory-mapped file) into a `Picture`
// 2. Edit through a Static or Animated editor (resize, convert mode)
// 3. Encode to JPEG / PNG / GIF / WebP into a caller-supplied sink
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod bulk;
mod common;
mod decoder;
mod editor;
mod encoder;
mod io;
mod picture;
mod pipeline;

pub use bulk::{BulkResizeSaveEditor, MemorySink, OutputSink, TempFileSink};
pub use common::run_with_panic_policy;
pub use decoder::{check_dimensions, decode_picture, detect_format};
pub use editor::{AnimatedEditor, Editor, FrameStream, ImageEditor, StaticEditor};
pub use encoder::{encode, encode_gif, encode_jpeg, encode_png, encode_webp, save};
pub use picture::{ContainerFormat, Frame, Picture, PixelMode};
pub use pipeline::{convert, resize};

// src/error.rs
//
// Unified error handling for lazy-palette
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Caller contract violations, recoverable
// - CodecError: Format/encoding issues, unsupported images
// - ResourceLimit: Memory/dimension limits, file system failures
// - InternalBug: Library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy for callers that need to branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Caller contract violation, recoverable by the caller
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Memory/dimension limits and I/O failures
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }

    /// Get the LAZY_PALETTE_* error code string for this category
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "LAZY_PALETTE_USER_ERROR",
            ErrorCategory::CodecError => "LAZY_PALETTE_CODEC_ERROR",
            ErrorCategory::ResourceLimit => "LAZY_PALETTE_RESOURCE_LIMIT",
            ErrorCategory::InternalBug => "LAZY_PALETTE_INTERNAL_BUG",
        }
    }
}

/// lazy-palette error types
#[derive(Debug, Error)]
pub enum LazyPaletteError {
    // File I/O Errors
    #[error("File not found: {path}")]
    FileNotFound { path: Cow<'static, str> },

    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to memory-map file '{path}': {source}")]
    MmapFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {source}")]
    OutputWriteFailed {
        #[source]
        source: std::io::Error,
    },

    // Decode Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Image contains no frames")]
    NoFrames,

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Classification Errors
    #[error("Unsupported image type: {format}/{mode}")]
    UnsupportedImage {
        format: Cow<'static, str>,
        mode: Cow<'static, str>,
    },

    #[error("No save options registered for format {format}")]
    MissingSaveOptions { format: Cow<'static, str> },

    // Palette Errors
    #[error("Requested {requested} bands but the image only exposes {available}")]
    BandCountMismatch { requested: usize, available: usize },

    #[error("Band {band} has {actual} samples, expected {expected}")]
    BandLengthMismatch {
        band: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Palette is empty: the image has no pixels")]
    EmptyPalette,

    // Operation Errors
    #[error("Invalid resize dimensions: {width}x{height}")]
    InvalidResizeDimensions { width: u32, height: u32 },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    #[error("Cannot convert pixel mode {from} to {to}")]
    UnsupportedConversion {
        from: Cow<'static, str>,
        to: Cow<'static, str>,
    },

    // Encode Errors
    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl LazyPaletteError {
    pub fn file_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn mmap_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::MmapFailed {
            path: path.into(),
            source,
        }
    }

    pub fn output_write_failed(source: std::io::Error) -> Self {
        Self::OutputWriteFailed { source }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn no_frames() -> Self {
        Self::NoFrames
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn unsupported_image(
        format: impl Into<Cow<'static, str>>,
        mode: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::UnsupportedImage {
            format: format.into(),
            mode: mode.into(),
        }
    }

    pub fn missing_save_options(format: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingSaveOptions {
            format: format.into(),
        }
    }

    pub fn band_count_mismatch(requested: usize, available: usize) -> Self {
        Self::BandCountMismatch {
            requested,
            available,
        }
    }

    pub fn band_length_mismatch(band: usize, expected: usize, actual: usize) -> Self {
        Self::BandLengthMismatch {
            band,
            expected,
            actual,
        }
    }

    pub fn empty_palette() -> Self {
        Self::EmptyPalette
    }

    pub fn invalid_resize_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidResizeDimensions { width, height }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn unsupported_conversion(
        from: impl Into<Cow<'static, str>>,
        to: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::UnsupportedConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (caller can fix it)
    ///
    /// Consistent with category(): UserError and ResourceLimit are recoverable,
    /// CodecError and InternalBug are not.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. }
            | Self::MissingSaveOptions { .. }
            | Self::BandCountMismatch { .. }
            | Self::BandLengthMismatch { .. }
            | Self::EmptyPalette
            | Self::InvalidResizeDimensions { .. }
            | Self::UnsupportedConversion { .. }
            | Self::InvalidArgument { .. } => ErrorCategory::UserError,

            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::NoFrames
            | Self::UnsupportedImage { .. }
            | Self::EncodeFailed { .. }
            // ResizeFailed is a processing failure inside the codec stack,
            // grouped with encode/decode failures.
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::FileReadFailed { .. }
            | Self::MmapFailed { .. }
            | Self::OutputWriteFailed { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, LazyPaletteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LazyPaletteError::file_not_found("/path/to/file.jpg");
        assert!(err.to_string().contains("/path/to/file.jpg"));

        let err = LazyPaletteError::unsupported_image("BMP", "RGB");
        assert_eq!(err.to_string(), "Unsupported image type: BMP/RGB");
    }

    #[test]
    fn test_error_recoverable() {
        assert!(LazyPaletteError::file_not_found("test.jpg").is_recoverable());
        assert!(LazyPaletteError::empty_palette().is_recoverable());
        assert!(LazyPaletteError::band_count_mismatch(4, 3).is_recoverable());
        assert!(!LazyPaletteError::decode_failed("test").is_recoverable());
        assert!(!LazyPaletteError::unsupported_image("GIF", "L").is_recoverable());
        assert!(!LazyPaletteError::internal_panic("test").is_recoverable());
    }

    #[test]
    fn test_error_category_user_error() {
        assert_eq!(
            LazyPaletteError::band_length_mismatch(1, 4, 3).category(),
            ErrorCategory::UserError
        );
        assert_eq!(
            LazyPaletteError::invalid_resize_dimensions(0, 10).category(),
            ErrorCategory::UserError
        );
        assert_eq!(
            LazyPaletteError::missing_save_options("PNG").category(),
            ErrorCategory::UserError
        );
        assert_eq!(
            LazyPaletteError::invalid_argument("step", "0", "must be non-zero").category(),
            ErrorCategory::UserError
        );
    }

    #[test]
    fn test_error_category_codec_error() {
        assert_eq!(
            LazyPaletteError::unsupported_format("bmp").category(),
            ErrorCategory::CodecError
        );
        assert_eq!(
            LazyPaletteError::encode_failed("jpeg", "test").category(),
            ErrorCategory::CodecError
        );
        assert_eq!(
            LazyPaletteError::resize_failed((100, 100), (50, 50), "test").category(),
            ErrorCategory::CodecError
        );
        assert_eq!(LazyPaletteError::no_frames().category(), ErrorCategory::CodecError);
    }

    #[test]
    fn test_error_category_resource_limit() {
        assert_eq!(
            LazyPaletteError::dimension_exceeds_limit(40000, 32768).category(),
            ErrorCategory::ResourceLimit
        );
        assert_eq!(
            LazyPaletteError::pixel_count_exceeds_limit(1_000_000_000, 100_000_000).category(),
            ErrorCategory::ResourceLimit
        );
        assert_eq!(
            LazyPaletteError::from(LazyPaletteError::OutputWriteFailed { source: std::io::Error::from(std::io::ErrorKind::WriteZero) })
                .category(),
            ErrorCategory::ResourceLimit
        );
    }

    #[test]
    fn test_error_category_codes() {
        assert_eq!(ErrorCategory::UserError.as_str(), "UserError");
        assert_eq!(ErrorCategory::InternalBug.code(), "LAZY_PALETTE_INTERNAL_BUG");
    }
}

// src/profile/rules.rs
//
// Profile rules as data: when a profile counts as optimized and which format
// it falls back to otherwise.

use crate::engine::{Picture, PixelMode};
use crate::ops::OutputFormat;

/// Static pictures have one frame; animated ones have several or are GIFs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Static,
    Animated,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Animated => "animated",
        }
    }
}

/// When a profile's source is already in its best native format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizedRule {
    Always,
    Never,
    /// Alpha is actually used (translucent pixels present)
    TranslucentAlpha,
    /// More than one frame
    MultiFrame,
}

impl OptimizedRule {
    pub fn evaluate(&self, picture: &Picture) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::TranslucentAlpha => picture.has_translucent_alpha(),
            Self::MultiFrame => picture.is_animated(),
        }
    }
}

/// Format to re-encode into, optionally after a mode conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackTarget {
    pub format: OutputFormat,
    pub convert: Option<PixelMode>,
}

impl FallbackTarget {
    pub const fn to(format: OutputFormat) -> Self {
        Self {
            format,
            convert: None,
        }
    }

    pub const fn converted(format: OutputFormat, mode: PixelMode) -> Self {
        Self {
            format,
            convert: Some(mode),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackRule {
    None,
    Fixed(FallbackTarget),
    ByAlpha {
        opaque: FallbackTarget,
        translucent: FallbackTarget,
    },
    ByTransparencyMarker {
        absent: FallbackTarget,
        present: FallbackTarget,
    },
}

impl FallbackRule {
    pub fn resolve(&self, picture: &Picture) -> Option<FallbackTarget> {
        match *self {
            Self::None => None,
            Self::Fixed(target) => Some(target),
            Self::ByAlpha {
                opaque,
                translucent,
            } => Some(if picture.has_translucent_alpha() {
                translucent
            } else {
                opaque
            }),
            Self::ByTransparencyMarker { absent, present } => {
                Some(if picture.has_transparency_marker() {
                    present
                } else {
                    absent
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileRule {
    /// `<FORMAT>_<MODE>` classification key
    pub key: &'static str,
    pub category: Category,
    pub optimized: OptimizedRule,
    pub fallback: FallbackRule,
}

const JPEG: FallbackTarget = FallbackTarget::to(OutputFormat::Jpeg);
const JPEG_FROM_RGB: FallbackTarget = FallbackTarget::converted(OutputFormat::Jpeg, PixelMode::Rgb);
const PNG: FallbackTarget = FallbackTarget::to(OutputFormat::Png);
const GIF: FallbackTarget = FallbackTarget::to(OutputFormat::Gif);

const JPEG_RGB: ProfileRule = ProfileRule {
    key: "JPEG_RGB",
    category: Category::Static,
    optimized: OptimizedRule::Always,
    fallback: FallbackRule::None,
};

const PNG_RGB: ProfileRule = ProfileRule {
    key: "PNG_RGB",
    category: Category::Static,
    optimized: OptimizedRule::Never,
    fallback: FallbackRule::Fixed(JPEG),
};

const PNG_RGBA: ProfileRule = ProfileRule {
    key: "PNG_RGBA",
    category: Category::Static,
    optimized: OptimizedRule::TranslucentAlpha,
    fallback: FallbackRule::Fixed(JPEG_FROM_RGB),
};

const WEBP_RGB: ProfileRule = ProfileRule {
    key: "WEBP_RGB",
    category: Category::Static,
    optimized: OptimizedRule::Never,
    fallback: FallbackRule::Fixed(JPEG),
};

const WEBP_RGBA: ProfileRule = ProfileRule {
    key: "WEBP_RGBA",
    category: Category::Static,
    optimized: OptimizedRule::Never,
    fallback: FallbackRule::ByAlpha {
        opaque: JPEG_FROM_RGB,
        translucent: PNG,
    },
};

const GIF_P: ProfileRule = ProfileRule {
    key: "GIF_P",
    category: Category::Animated,
    optimized: OptimizedRule::MultiFrame,
    fallback: FallbackRule::ByTransparencyMarker {
        absent: JPEG,
        present: PNG,
    },
};

const ANIMATED_WEBP_RGB: ProfileRule = ProfileRule {
    key: "WEBP_RGB",
    category: Category::Animated,
    optimized: OptimizedRule::Never,
    fallback: FallbackRule::Fixed(GIF),
};

const ANIMATED_WEBP_RGBA: ProfileRule = ProfileRule {
    key: "WEBP_RGBA",
    category: Category::Animated,
    optimized: OptimizedRule::Never,
    fallback: FallbackRule::Fixed(GIF),
};

/// Every profile the crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    JpegRgb,
    PngRgb,
    PngRgba,
    WebpRgb,
    WebpRgba,
    GifP,
    AnimatedWebpRgb,
    AnimatedWebpRgba,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 8] = [
        Self::JpegRgb,
        Self::PngRgb,
        Self::PngRgba,
        Self::WebpRgb,
        Self::WebpRgba,
        Self::GifP,
        Self::AnimatedWebpRgb,
        Self::AnimatedWebpRgba,
    ];

    pub fn rule(&self) -> &'static ProfileRule {
        match self {
            Self::JpegRgb => &JPEG_RGB,
            Self::PngRgb => &PNG_RGB,
            Self::PngRgba => &PNG_RGBA,
            Self::WebpRgb => &WEBP_RGB,
            Self::WebpRgba => &WEBP_RGBA,
            Self::GifP => &GIF_P,
            Self::AnimatedWebpRgb => &ANIMATED_WEBP_RGB,
            Self::AnimatedWebpRgba => &ANIMATED_WEBP_RGBA,
        }
    }

    pub fn key(&self) -> &'static str {
        self.rule().key
    }

    pub fn category(&self) -> Category {
        self.rule().category
    }
}

// src/ops.rs
//
// Resize and save option records.
// These are plain data supplied by the caller - the engine never invents
// defaults beyond the documented fallbacks below.

use crate::error::{LazyPaletteError, Result};
use std::collections::HashMap;

/// Quality used for JPEG when the save options do not carry one.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Quality used for WebP when the save options do not carry one.
pub const DEFAULT_WEBP_QUALITY: u8 = 80;

/// Resampling filter, numbered the way existing configuration tables number them
/// (0 nearest, 1 lanczos, 2 bilinear, 3 bicubic, 4 box, 5 hamming).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResampleFilter {
    Nearest,
    Lanczos,
    Bilinear,
    Bicubic,
    Box,
    Hamming,
}

impl ResampleFilter {
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::Lanczos),
            2 => Ok(Self::Bilinear),
            3 => Ok(Self::Bicubic),
            4 => Ok(Self::Box),
            5 => Ok(Self::Hamming),
            other => Err(LazyPaletteError::invalid_argument(
                "resample",
                other.to_string(),
                "expected a filter id between 0 and 5",
            )),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Self::Nearest => 0,
            Self::Lanczos => 1,
            Self::Bilinear => 2,
            Self::Bicubic => 3,
            Self::Box => 4,
            Self::Hamming => 5,
        }
    }
}

/// Target size and resampling parameters for one resize.
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeOptions {
    /// Exact output size (width, height); aspect ratio is not preserved
    pub size: (u32, u32),
    pub resample: ResampleFilter,
    /// Box-reduce first when the source is at least this many times larger
    pub reducing_gap: Option<f32>,
}

impl ResizeOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            resample: ResampleFilter::Bicubic,
            reducing_gap: None,
        }
    }

    pub fn resample(mut self, resample: ResampleFilter) -> Self {
        self.resample = resample;
        self
    }

    pub fn reducing_gap(mut self, gap: f32) -> Self {
        self.reducing_gap = Some(gap);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            return Err(LazyPaletteError::invalid_resize_dimensions(width, height));
        }
        if let Some(gap) = self.reducing_gap {
            if !(gap >= 1.0) {
                return Err(LazyPaletteError::invalid_argument(
                    "reducing_gap",
                    gap.to_string(),
                    "must be at least 1.0",
                ));
            }
        }
        Ok(())
    }
}

/// Output container format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn from_str(format: &str) -> Result<Self> {
        match format.to_ascii_uppercase().as_str() {
            "JPEG" | "JPG" => Ok(Self::Jpeg),
            "PNG" => Ok(Self::Png),
            "GIF" => Ok(Self::Gif),
            "WEBP" => Ok(Self::WebP),
            _ => Err(LazyPaletteError::unsupported_format(format.to_string())),
        }
    }

    /// Name used as the key of a [`SaveOptionsTable`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::WebP => "WEBP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Whether the encoder can write more than one frame
    pub fn supports_animation(&self) -> bool {
        matches!(self, Self::Gif)
    }
}

/// GIF frame disposal, numbered as in the GIF89a graphic control extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Disposal {
    Unspecified,
    Keep,
    RestoreBackground,
    RestorePrevious,
}

impl Disposal {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::Keep),
            2 => Ok(Self::RestoreBackground),
            3 => Ok(Self::RestorePrevious),
            other => Err(LazyPaletteError::invalid_argument(
                "disposal",
                other.to_string(),
                "expected a disposal code between 0 and 3",
            )),
        }
    }
}

/// Encoder parameters for one save.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOptions {
    pub format: OutputFormat,
    pub optimize: bool,
    /// 0-100, JPEG and WebP only
    pub quality: Option<u8>,
    /// GIF only
    pub disposal: Option<Disposal>,
    /// GIF only; RGBA, alpha is not representable in the GIF screen descriptor
    pub background: Option<[u8; 4]>,
    /// Write every frame instead of only the first. On by default; formats
    /// without animation support write the first frame regardless.
    pub save_all: bool,
    /// GIF loop count, 0 loops forever
    pub loop_count: u16,
}

impl SaveOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            optimize: false,
            quality: None,
            disposal: None,
            background: None,
            save_all: true,
            loop_count: 0,
        }
    }

    pub fn gif() -> Self {
        Self {
            optimize: true,
            disposal: Some(Disposal::RestoreBackground),
            background: Some([0, 0, 0, 0]),
            save_all: true,
            ..Self::new(OutputFormat::Gif)
        }
    }

    pub fn jpeg() -> Self {
        Self {
            optimize: true,
            quality: Some(DEFAULT_JPEG_QUALITY),
            ..Self::new(OutputFormat::Jpeg)
        }
    }

    pub fn png() -> Self {
        Self {
            optimize: true,
            ..Self::new(OutputFormat::Png)
        }
    }

    pub fn webp(quality: u8) -> Self {
        Self {
            quality: Some(quality),
            ..Self::new(OutputFormat::WebP)
        }
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.min(100));
        self
    }

    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn save_all(mut self, save_all: bool) -> Self {
        self.save_all = save_all;
        self
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_JPEG_QUALITY).min(100)
    }

    pub fn webp_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_WEBP_QUALITY).min(100)
    }
}

/// Save options keyed by format name ("GIF", "JPEG", "PNG", ...).
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOptionsTable {
    entries: HashMap<String, SaveOptions>,
}

impl SaveOptionsTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register options under their format's name, replacing any previous entry.
    pub fn insert(&mut self, options: SaveOptions) -> &mut Self {
        self.entries.insert(options.format.name().to_string(), options);
        self
    }

    pub fn get(&self, format: OutputFormat) -> Option<&SaveOptions> {
        self.entries.get(format.name())
    }

    pub fn require(&self, format: OutputFormat) -> Result<&SaveOptions> {
        self.get(format)
            .ok_or_else(|| LazyPaletteError::missing_save_options(format.name()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SaveOptionsTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .insert(SaveOptions::gif())
            .insert(SaveOptions::jpeg())
            .insert(SaveOptions::png());
        table
    }
}

/// One (resize, save) pair of a bulk resize plan.
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeSaveOptions {
    pub resize: ResizeOptions,
    pub save: SaveOptions,
}

impl ResizeSaveOptions {
    pub fn new(resize: ResizeOptions, save: SaveOptions) -> Self {
        Self { resize, save }
    }

    pub fn resize_options(&self) -> &ResizeOptions {
        &self.resize
    }

    pub fn save_options(&self) -> &SaveOptions {
        &self.save
    }

    /// Build a plan that saves every size with the same options.
    pub fn plan(
        sizes: &[(u32, u32)],
        resample: ResampleFilter,
        reducing_gap: Option<f32>,
        save: &SaveOptions,
    ) -> Vec<Self> {
        sizes
            .iter()
            .map(|&(width, height)| {
                let mut resize = ResizeOptions::new(width, height).resample(resample);
                resize.reducing_gap = reducing_gap;
                Self::new(resize, save.clone())
            })
            .collect()
    }
}

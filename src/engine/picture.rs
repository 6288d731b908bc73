// src/engine/picture.rs
//
// Decoded image: container format, pixel mode, frames and the transparency
// marker carried by the container.

use super::{decoder, io};
use crate::color::BandSource;
use crate::error::{LazyPaletteError, Result};
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

/// Container formats the engine can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ContainerFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::WebP => "WEBP",
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Pixel mode, named the way classification keys spell it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelMode {
    L,
    La,
    /// Palette-indexed (GIF)
    P,
    Rgb,
    Rgba,
    Other(&'static str),
}

impl PixelMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::La => "LA",
            Self::P => "P",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Other(name) => name,
        }
    }

    /// Mode of a decoded buffer. Buffers are never palette-indexed, so this
    /// never returns `P`.
    pub fn of(img: &DynamicImage) -> Self {
        match img.color() {
            ColorType::L8 => Self::L,
            ColorType::La8 => Self::La,
            ColorType::Rgb8 => Self::Rgb,
            ColorType::Rgba8 => Self::Rgba,
            ColorType::L16 => Self::Other("I;16"),
            ColorType::La16 => Self::Other("LA;16"),
            ColorType::Rgb16 => Self::Other("RGB;16"),
            ColorType::Rgba16 => Self::Other("RGBA;16"),
            ColorType::Rgb32F => Self::Other("RGBF"),
            ColorType::Rgba32F => Self::Other("RGBAF"),
            _ => Self::Other("unknown"),
        }
    }
}

/// One fully composited frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: DynamicImage,
    pub delay_ms: u32,
}

impl Frame {
    pub fn still(image: DynamicImage) -> Self {
        Self { image, delay_ms: 0 }
    }
}

/// A decoded image with at least one frame.
#[derive(Clone, Debug)]
pub struct Picture {
    format: Option<ContainerFormat>,
    mode: PixelMode,
    frames: Vec<Frame>,
    transparency: bool,
}

impl Picture {
    pub fn new(
        format: Option<ContainerFormat>,
        mode: PixelMode,
        frames: Vec<Frame>,
        transparency: bool,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(LazyPaletteError::no_frames());
        }
        Ok(Self {
            format,
            mode,
            frames,
            transparency,
        })
    }

    /// Single-frame picture with no container.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            format: None,
            mode: PixelMode::of(&image),
            frames: vec![Frame::still(image)],
            transparency: false,
        }
    }

    pub fn with_format(mut self, format: Option<ContainerFormat>) -> Self {
        self.format = format;
        self
    }

    /// Sniff and decode an encoded image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decoder::decode_picture(bytes)
    }

    /// Memory-map and decode a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mapped = io::map_file(path.as_ref())?;
        Self::decode(&mapped)
    }

    pub fn format(&self) -> Option<ContainerFormat> {
        self.format
    }

    /// Container name, empty when unknown
    pub fn format_name(&self) -> &'static str {
        self.format.map(|format| format.name()).unwrap_or("")
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    /// `<FORMAT>_<MODE>`, e.g. `PNG_RGBA` or `GIF_P`
    pub fn format_mode_key(&self) -> String {
        format!("{}_{}", self.format_name(), self.mode.name())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn first_frame(&self) -> &DynamicImage {
        // `new` rejects empty frame lists
        &self.frames[0].image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.first_frame().dimensions()
    }

    /// (min, max) per band of the first frame
    pub fn extrema(&self) -> Vec<(u8, u8)> {
        let first = self.first_frame();
        (0..first.band_count())
            .map(|index| {
                first
                    .band(index)
                    .iter()
                    .fold((u8::MAX, u8::MIN), |(lo, hi), &sample| {
                        (lo.min(sample), hi.max(sample))
                    })
            })
            .collect()
    }

    /// Four bands and an alpha minimum below 255.
    pub fn has_translucent_alpha(&self) -> bool {
        match self.first_frame() {
            DynamicImage::ImageRgba8(buf) => buf.pixels().any(|px| px[3] < u8::MAX),
            other if other.band_count() == 4 => other.to_rgba8().pixels().any(|px| px[3] < u8::MAX),
            _ => false,
        }
    }

    /// The container declared a transparent color or palette index.
    pub fn has_transparency_marker(&self) -> bool {
        self.transparency
    }
}

impl BandSource for Picture {
    fn band_count(&self) -> usize {
        self.first_frame().band_count()
    }

    fn band(&self, index: usize) -> Vec<u8> {
        self.first_frame().band(index)
    }
}

// src/engine/editor.rs
//
// Editors apply resize / mode conversion to a decoded picture and save it.
// StaticEditor works on the first frame; AnimatedEditor streams every frame
// through a pending per-frame operation.

use super::encoder;
use super::picture::{Frame, Picture, PixelMode};
use super::pipeline;
use crate::error::{LazyPaletteError, Result};
use crate::ops::{ResizeOptions, SaveOptions};
use image::DynamicImage;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::io::Write;

/// Common editing surface for still and animated pictures.
pub trait ImageEditor {
    fn resize(&mut self, options: &ResizeOptions) -> Result<()>;

    fn convert_mode(&mut self, mode: PixelMode) -> Result<()>;

    /// Encode the current result into `out`.
    fn save<W: Write + ?Sized>(&mut self, out: &mut W, options: &SaveOptions) -> Result<()>;
}

/// Edits the first frame. Every operation starts again from the original,
/// so successive calls are alternatives rather than a chain.
#[derive(Debug)]
pub struct StaticEditor<'p> {
    original: &'p Picture,
    processed: Option<Frame>,
}

impl<'p> StaticEditor<'p> {
    pub fn new(original: &'p Picture) -> Self {
        Self {
            original,
            processed: None,
        }
    }

    pub fn original(&self) -> &'p Picture {
        self.original
    }

    /// The last processed image, or the original when nothing ran yet.
    pub fn image(&self) -> &DynamicImage {
        match &self.processed {
            Some(frame) => &frame.image,
            None => self.original.first_frame(),
        }
    }

    fn current_frame(&self) -> &Frame {
        match &self.processed {
            Some(frame) => frame,
            None => &self.original.frames()[0],
        }
    }
}

impl ImageEditor for StaticEditor<'_> {
    fn resize(&mut self, options: &ResizeOptions) -> Result<()> {
        let resized = pipeline::resize(self.original.first_frame(), options)?;
        self.processed = Some(Frame::still(resized));
        Ok(())
    }

    fn convert_mode(&mut self, mode: PixelMode) -> Result<()> {
        let converted = pipeline::convert(self.original.first_frame(), mode)?;
        self.processed = Some(Frame::still(converted));
        Ok(())
    }

    fn save<W: Write + ?Sized>(&mut self, out: &mut W, options: &SaveOptions) -> Result<()> {
        encoder::save(std::slice::from_ref(self.current_frame()), out, options)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum FrameOp {
    Resize(ResizeOptions),
    Convert(PixelMode),
}

/// Edits every frame lazily. `resize` and `convert_mode` only register the
/// operation; work happens while frames are pulled from [`FrameStream`].
#[derive(Debug)]
pub struct AnimatedEditor<'p> {
    original: &'p Picture,
    pending: Option<FrameOp>,
    actual_mode: OnceCell<PixelMode>,
}

impl<'p> AnimatedEditor<'p> {
    pub fn new(original: &'p Picture) -> Self {
        Self {
            original,
            pending: None,
            actual_mode: OnceCell::new(),
        }
    }

    pub fn original(&self) -> &'p Picture {
        self.original
    }

    /// Mode every frame is normalized to before the pending operation runs.
    /// RGBA sources stay RGBA only when translucent; other sources become RGBA
    /// when the container declares transparency, RGB otherwise.
    pub fn actual_mode(&self) -> PixelMode {
        *self.actual_mode.get_or_init(|| {
            let source = self.original;
            let keeps_alpha = if source.mode() == PixelMode::Rgba {
                source.has_translucent_alpha()
            } else {
                source.has_transparency_marker()
            };
            let mode = if keeps_alpha {
                PixelMode::Rgba
            } else {
                PixelMode::Rgb
            };
            tracing::debug!(
                source = source.mode().name(),
                actual = mode.name(),
                "resolved animated frame mode"
            );
            mode
        })
    }

    /// Lazily transformed frames, one unit of work per pull.
    pub fn frames(&self) -> FrameStream<'_> {
        FrameStream {
            frames: self.original.frames().iter(),
            mode: self.actual_mode(),
            op: self.pending.as_ref(),
        }
    }

    /// First frame normalized to the actual mode, ignoring any pending operation.
    pub fn first_frame_in_actual_mode(&self) -> Cow<'p, DynamicImage> {
        let first = self.original.first_frame();
        match self.actual_mode() {
            mode if PixelMode::of(first) == mode => Cow::Borrowed(first),
            PixelMode::Rgba => Cow::Owned(DynamicImage::ImageRgba8(first.to_rgba8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(first.to_rgb8())),
        }
    }
}

impl ImageEditor for AnimatedEditor<'_> {
    fn resize(&mut self, options: &ResizeOptions) -> Result<()> {
        options.validate()?;
        self.pending = Some(FrameOp::Resize(options.clone()));
        Ok(())
    }

    fn convert_mode(&mut self, mode: PixelMode) -> Result<()> {
        if matches!(mode, PixelMode::P | PixelMode::Other(_)) {
            return Err(LazyPaletteError::unsupported_conversion(
                self.actual_mode().name(),
                mode.name(),
            ));
        }
        self.pending = Some(FrameOp::Convert(mode));
        Ok(())
    }

    fn save<W: Write + ?Sized>(&mut self, out: &mut W, options: &SaveOptions) -> Result<()> {
        let mut stream = self.frames();
        let first = stream.next().ok_or_else(LazyPaletteError::no_frames)??;
        let mut frames = vec![first];
        if options.save_all && options.format.supports_animation() {
            for frame in stream {
                frames.push(frame?);
            }
        }
        encoder::save(&frames, out, options)
    }
}

/// Iterator over an animated picture's frames with the editor's
/// normalization and pending operation applied.
pub struct FrameStream<'e> {
    frames: std::slice::Iter<'e, Frame>,
    mode: PixelMode,
    op: Option<&'e FrameOp>,
}

impl FrameStream<'_> {
    fn transform(&self, frame: &Frame) -> Result<Frame> {
        let normalized: Cow<'_, DynamicImage> = if PixelMode::of(&frame.image) != self.mode {
            Cow::Owned(pipeline::convert(&frame.image, self.mode)?)
        } else {
            Cow::Borrowed(&frame.image)
        };

        let image = match self.op {
            None => normalized.into_owned(),
            Some(FrameOp::Resize(options)) => pipeline::resize(&normalized, options)?,
            Some(FrameOp::Convert(mode)) => pipeline::convert_owned(normalized.into_owned(), *mode)?,
        };

        Ok(Frame {
            image,
            delay_ms: frame.delay_ms,
        })
    }
}

impl Iterator for FrameStream<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.next()?;
        tracing::trace!(
            remaining = self.frames.len(),
            mode = self.mode.name(),
            "transforming frame"
        );
        Some(self.transform(frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

/// Either editor behind one type, so profiles can hand out a single editor.
#[derive(Debug)]
pub enum Editor<'p> {
    Static(StaticEditor<'p>),
    Animated(AnimatedEditor<'p>),
}

impl<'p> Editor<'p> {
    pub fn new(picture: &'p Picture, animated: bool) -> Self {
        if animated {
            Editor::Animated(AnimatedEditor::new(picture))
        } else {
            Editor::Static(StaticEditor::new(picture))
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Editor::Animated(_))
    }
}

impl ImageEditor for Editor<'_> {
    fn resize(&mut self, options: &ResizeOptions) -> Result<()> {
        match self {
            Editor::Static(editor) => editor.resize(options),
            Editor::Animated(editor) => editor.resize(options),
        }
    }

    fn convert_mode(&mut self, mode: PixelMode) -> Result<()> {
        match self {
            Editor::Static(editor) => editor.convert_mode(mode),
            Editor::Animated(editor) => editor.convert_mode(mode),
        }
    }

    fn save<W: Write + ?Sized>(&mut self, out: &mut W, options: &SaveOptions) -> Result<()> {
        match self {
            Editor::Static(editor) => editor.save(out, options),
            Editor::Animated(editor) => editor.save(out, options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::picture::ContainerFormat;
    use crate::ops::OutputFormat;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn rgb_frame(width: u32, height: u32, color: [u8; 3], delay_ms: u32) -> Frame {
        Frame {
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
            delay_ms,
        }
    }

    fn rgba_frame(width: u32, height: u32, color: [u8; 4]) -> Frame {
        Frame::still(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba(color),
        )))
    }

    fn animated(frames: Vec<Frame>, mode: PixelMode, transparency: bool) -> Picture {
        Picture::new(Some(ContainerFormat::Gif), mode, frames, transparency).unwrap()
    }

    #[test]
    fn test_static_operations_start_from_original() {
        let picture = Picture::from_image(rgba_frame(40, 20, [1, 2, 3, 255]).image);
        let mut editor = StaticEditor::new(&picture);
        editor.resize(&ResizeOptions::new(10, 5)).unwrap();
        assert_eq!(editor.image().dimensions(), (10, 5));

        // Converting discards the resize and works from the 40x20 original
        editor.convert_mode(PixelMode::Rgb).unwrap();
        assert_eq!(editor.image().dimensions(), (40, 20));
        assert_eq!(PixelMode::of(editor.image()), PixelMode::Rgb);
    }

    #[test]
    fn test_static_save_defaults_to_original() {
        let picture = Picture::from_image(rgb_frame(6, 4, [9, 9, 9], 0).image);
        let mut editor = StaticEditor::new(&picture);
        let mut out = Vec::new();
        editor.save(&mut out, &SaveOptions::png()).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
    }

    #[test]
    fn test_actual_mode_rules() {
        let opaque = animated(
            vec![rgba_frame(2, 2, [1, 1, 1, 255]), rgba_frame(2, 2, [2, 2, 2, 255])],
            PixelMode::Rgba,
            false,
        );
        assert_eq!(AnimatedEditor::new(&opaque).actual_mode(), PixelMode::Rgb);

        let translucent = animated(
            vec![rgba_frame(2, 2, [1, 1, 1, 10]), rgba_frame(2, 2, [2, 2, 2, 255])],
            PixelMode::Rgba,
            false,
        );
        assert_eq!(AnimatedEditor::new(&translucent).actual_mode(), PixelMode::Rgba);

        let marked = animated(vec![rgba_frame(2, 2, [0, 0, 0, 0])], PixelMode::P, true);
        assert_eq!(AnimatedEditor::new(&marked).actual_mode(), PixelMode::Rgba);

        let unmarked = animated(vec![rgba_frame(2, 2, [0, 0, 0, 255])], PixelMode::P, false);
        assert_eq!(AnimatedEditor::new(&unmarked).actual_mode(), PixelMode::Rgb);
    }

    #[test]
    fn test_frame_stream_applies_pending_resize() {
        let picture = animated(
            vec![rgb_frame(20, 20, [255, 0, 0], 30), rgb_frame(20, 20, [0, 255, 0], 70)],
            PixelMode::Rgb,
            false,
        );
        let mut editor = AnimatedEditor::new(&picture);
        editor.resize(&ResizeOptions::new(5, 4)).unwrap();

        let frames: Vec<Frame> = editor.frames().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.image.dimensions() == (5, 4)));
        assert_eq!(frames[1].delay_ms, 70);
    }

    #[test]
    fn test_frame_stream_is_lazy() {
        let picture = animated(
            vec![rgb_frame(4, 4, [1, 1, 1], 0), rgb_frame(4, 4, [2, 2, 2], 0)],
            PixelMode::Rgb,
            false,
        );
        let editor = AnimatedEditor::new(&picture);
        let mut stream = editor.frames();
        assert_eq!(stream.size_hint(), (2, Some(2)));
        stream.next().unwrap().unwrap();
        assert_eq!(stream.size_hint(), (1, Some(1)));
    }

    #[test]
    fn test_animated_save_respects_save_all() {
        let picture = animated(
            vec![
                rgb_frame(4, 4, [255, 0, 0], 100),
                rgb_frame(4, 4, [0, 255, 0], 100),
                rgb_frame(4, 4, [0, 0, 255], 100),
            ],
            PixelMode::Rgb,
            false,
        );
        let count_frames = |bytes: &[u8]| {
            let mut decoder = gif::DecodeOptions::new()
                .read_info(std::io::Cursor::new(bytes))
                .unwrap();
            let mut count = 0;
            while decoder.read_next_frame().unwrap().is_some() {
                count += 1;
            }
            count
        };

        let mut editor = AnimatedEditor::new(&picture);
        let mut all = Vec::new();
        editor.save(&mut all, &SaveOptions::gif()).unwrap();
        assert_eq!(count_frames(&all), 3);

        let mut plain = Vec::new();
        editor
            .save(&mut plain, &SaveOptions::new(OutputFormat::Gif))
            .unwrap();
        assert_eq!(count_frames(&plain), 3);

        let mut first_only = Vec::new();
        editor
            .save(&mut first_only, &SaveOptions::gif().save_all(false))
            .unwrap();
        assert_eq!(count_frames(&first_only), 1);
    }

    #[test]
    fn test_animated_save_to_still_format_keeps_first_frame() {
        let picture = animated(
            vec![
                rgb_frame(4, 4, [255, 0, 0], 100),
                rgb_frame(4, 4, [0, 0, 255], 100),
            ],
            PixelMode::Rgb,
            false,
        );
        let mut editor = AnimatedEditor::new(&picture);
        let mut out = Vec::new();
        editor
            .save(&mut out, &SaveOptions::new(OutputFormat::Png))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_animated_convert_to_palette_is_rejected() {
        let picture = animated(vec![rgb_frame(2, 2, [0, 0, 0], 0)], PixelMode::Rgb, false);
        let mut editor = AnimatedEditor::new(&picture);
        assert!(editor.convert_mode(PixelMode::P).is_err());
    }

    #[test]
    fn test_editor_enum_dispatch() {
        let picture = animated(
            vec![rgb_frame(8, 8, [1, 2, 3], 0), rgb_frame(8, 8, [3, 2, 1], 0)],
            PixelMode::Rgb,
            false,
        );
        let mut editor = Editor::new(&picture, true);
        assert!(editor.is_animated());
        editor.resize(&ResizeOptions::new(4, 4)).unwrap();
        let mut out = Vec::new();
        editor
            .save(&mut out, &SaveOptions::new(OutputFormat::Jpeg))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }
}

// src/engine/decoder.rs
//
// Decoder operations: JPEG (mozjpeg), PNG (zune-png / APNG), WebP (libwebp /
// animated), GIF (gif crate with frame compositing).

use super::common::run_with_panic_policy;
use super::io::png_has_transparency_chunk;
use super::picture::{ContainerFormat, Frame, Picture, PixelMode};
use super::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::{LazyPaletteError, Result};
use image::codecs::png::PngDecoder as ApngProbe;
use image::codecs::webp::WebPDecoder as AnimatedWebPDecoder;
use image::{
    AnimationDecoder, ColorType, DynamicImage, Frames, GrayAlphaImage, GrayImage, ImageDecoder,
    ImageFormat, ImageReader, RgbImage, RgbaImage,
};
use mozjpeg::Decompress;
use std::io::Cursor;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint:
/// - Detect format once (magic bytes)
/// - Refuse oversized images before allocating pixel buffers
/// - Route each container to its decoder
pub fn decode_picture(bytes: &[u8]) -> Result<Picture> {
    let detected = detect_format(bytes);
    let format = match detected.and_then(ContainerFormat::from_image_format) {
        Some(format) => format,
        None => {
            let name = detected
                .map(|f| format!("{f:?}"))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(LazyPaletteError::unsupported_format(name));
        }
    };

    ensure_dimensions_safe(bytes)?;

    let picture = match format {
        ContainerFormat::Jpeg => single_frame(format, decode_jpeg_mozjpeg(bytes)?, false)?,
        ContainerFormat::Png => decode_png(bytes)?,
        ContainerFormat::WebP => decode_webp(bytes)?,
        ContainerFormat::Gif => decode_gif(bytes)?,
    };

    tracing::debug!(
        key = %picture.format_mode_key(),
        frames = picture.frame_count(),
        transparency = picture.has_transparency_marker(),
        "decoded picture"
    );
    Ok(picture)
}

fn single_frame(format: ContainerFormat, image: DynamicImage, transparency: bool) -> Result<Picture> {
    let mode = PixelMode::of(&image);
    Picture::new(Some(format), mode, vec![Frame::still(image)], transparency)
}

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo). Output is always RGB.
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:mozjpeg", || {
        if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(LazyPaletteError::decode_failed(
                "mozjpeg: missing JPEG EOI marker",
            ));
        }

        let decompress = Decompress::new_mem(data).map_err(|e| {
            LazyPaletteError::decode_failed(format!("mozjpeg decompress init failed: {e:?}"))
        })?;

        let mut decompress = decompress.rgb().map_err(|e| {
            LazyPaletteError::decode_failed(format!("mozjpeg rgb conversion failed: {e:?}"))
        })?;

        let width = u32::try_from(decompress.width()).unwrap_or(u32::MAX);
        let height = u32::try_from(decompress.height()).unwrap_or(u32::MAX);
        check_dimensions(width, height)?;

        let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            LazyPaletteError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}"))
        })?;
        let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

        let rgb_image = RgbImage::from_raw(width, height, flat_pixels).ok_or_else(|| {
            LazyPaletteError::decode_failed("mozjpeg: failed to create image from raw data")
        })?;

        Ok(DynamicImage::ImageRgb8(rgb_image))
    })
}

fn decode_png(data: &[u8]) -> Result<Picture> {
    let transparency = png_has_transparency_chunk(data);
    if is_apng(data) {
        return decode_apng(data, transparency);
    }
    single_frame(ContainerFormat::Png, decode_png_zune(data)?, transparency)
}

/// Decode PNG using zune-png (SIMD decoder). 16-bit input is stripped to 8-bit
/// and palettes are expanded.
pub fn decode_png_zune(data: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:png", || {
        let options = DecoderOptions::default().png_set_strip_to_8bit(true);
        let mut decoder = PngDecoder::new_with_options(ZCursor::new(data), options);
        let pixels = decoder
            .decode()
            .map_err(|e| LazyPaletteError::decode_failed(format!("png: decode failed: {e}")))?;

        let info = decoder
            .info()
            .ok_or_else(|| LazyPaletteError::decode_failed("png: missing header info"))?;

        let width = info.width as u32;
        let height = info.height as u32;
        check_dimensions(width, height)?;

        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(LazyPaletteError::decode_failed(
                    "png: unexpected non-U8 pixel buffer",
                ))
            }
        };

        let colorspace = decoder
            .colorspace()
            .ok_or_else(|| LazyPaletteError::decode_failed("png: missing colorspace"))?;

        let built = match colorspace {
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA | ColorSpace::YCbCr | ColorSpace::BGRA | ColorSpace::ARGB => {
                RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
            }
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
            ColorSpace::LumaA => {
                GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
            }
            other => {
                return Err(LazyPaletteError::decode_failed(format!(
                    "png: unsupported colorspace {other:?}"
                )))
            }
        };

        built.ok_or_else(|| {
            LazyPaletteError::decode_failed(format!("png: buffer does not match {colorspace:?}"))
        })
    })
}

fn is_apng(data: &[u8]) -> bool {
    ApngProbe::new(Cursor::new(data))
        .and_then(|decoder| decoder.is_apng())
        .unwrap_or(false)
}

fn decode_apng(data: &[u8], transparency: bool) -> Result<Picture> {
    run_with_panic_policy("decode:apng", || {
        let decoder = ApngProbe::new(Cursor::new(data))
            .map_err(|e| LazyPaletteError::decode_failed(format!("apng: {e}")))?;
        let (width, height) = decoder.dimensions();
        check_dimensions(width, height)?;
        let mode = mode_of_color_type(decoder.color_type());
        let apng = decoder
            .apng()
            .map_err(|e| LazyPaletteError::decode_failed(format!("apng: {e}")))?;
        let frames = collect_animation(apng.into_frames(), mode)?;
        Picture::new(Some(ContainerFormat::Png), mode, frames, transparency)
    })
}

fn decode_webp(data: &[u8]) -> Result<Picture> {
    let features = BitstreamFeatures::new(data).ok_or_else(|| {
        LazyPaletteError::decode_failed("webp: failed to read bitstream features")
    })?;
    if features.has_animation() {
        return decode_animated_webp(data);
    }
    single_frame(ContainerFormat::WebP, decode_webp_libwebp(data)?, false)
}

/// Decode a still WebP using libwebp (via webp crate).
pub fn decode_webp_libwebp(data: &[u8]) -> Result<DynamicImage> {
    run_with_panic_policy("decode:webp", || {
        let features = BitstreamFeatures::new(data).ok_or_else(|| {
            LazyPaletteError::decode_failed("webp: failed to read bitstream features")
        })?;
        check_dimensions(features.width(), features.height())?;

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| LazyPaletteError::decode_failed("webp: decode failed"))?;
        check_dimensions(decoded.width(), decoded.height())?;

        Ok(decoded.to_image())
    })
}

fn decode_animated_webp(data: &[u8]) -> Result<Picture> {
    run_with_panic_policy("decode:webp:animated", || {
        let decoder = AnimatedWebPDecoder::new(Cursor::new(data))
            .map_err(|e| LazyPaletteError::decode_failed(format!("webp (animated): {e}")))?;
        let (width, height) = decoder.dimensions();
        check_dimensions(width, height)?;
        let mode = if decoder.color_type().has_alpha() {
            PixelMode::Rgba
        } else {
            PixelMode::Rgb
        };
        let frames = collect_animation(decoder.into_frames(), mode)?;
        Picture::new(Some(ContainerFormat::WebP), mode, frames, false)
    })
}

fn mode_of_color_type(color: ColorType) -> PixelMode {
    match (color.has_color(), color.has_alpha()) {
        (false, false) => PixelMode::L,
        (false, true) => PixelMode::La,
        (true, false) => PixelMode::Rgb,
        (true, true) => PixelMode::Rgba,
    }
}

/// Composited RGBA frames from the `image` animation decoders, stored in `mode`.
fn collect_animation(frames: Frames<'_>, mode: PixelMode) -> Result<Vec<Frame>> {
    frames
        .map(|frame| {
            let frame = frame.map_err(|e| {
                LazyPaletteError::decode_failed(format!("animation frame decode failed: {e}"))
            })?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = numer.checked_div(denom).unwrap_or(0);
            let image = rgba_in_mode(frame.into_buffer(), mode);
            tracing::trace!(delay_ms, mode = mode.name(), "decoded animation frame");
            Ok(Frame { image, delay_ms })
        })
        .collect()
}

fn rgba_in_mode(buffer: RgbaImage, mode: PixelMode) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(buffer);
    match mode {
        PixelMode::Rgb => DynamicImage::ImageRgb8(rgba.to_rgb8()),
        PixelMode::L => DynamicImage::ImageLuma8(rgba.to_luma8()),
        PixelMode::La => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        _ => rgba,
    }
}

/// Decode GIF frames onto a shared RGBA canvas, honoring each frame's
/// disposal. Any frame with a transparent index sets the transparency marker.
pub fn decode_gif(data: &[u8]) -> Result<Picture> {
    run_with_panic_policy("decode:gif", || {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options
            .read_info(Cursor::new(data))
            .map_err(|e| LazyPaletteError::decode_failed(format!("gif: {e}")))?;

        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        check_dimensions(width, height)?;

        let mut canvas = RgbaImage::new(width, height);
        let mut frames = Vec::new();
        let mut transparency = false;

        while let Some(frame) = decoder
            .read_next_frame()
            .map_err(|e| LazyPaletteError::decode_failed(format!("gif: {e}")))?
        {
            transparency |= frame.transparent.is_some();
            let restore = match frame.dispose {
                gif::DisposalMethod::Previous => Some(canvas.clone()),
                _ => None,
            };

            let left = u32::from(frame.left);
            let top = u32::from(frame.top);
            let frame_w = u32::from(frame.width);
            let frame_h = u32::from(frame.height);
            for (i, px) in frame.buffer.chunks_exact(4).enumerate() {
                if px[3] == 0 {
                    continue;
                }
                let i = i as u32;
                let x = left + i % frame_w.max(1);
                let y = top + i / frame_w.max(1);
                if x < width && y < height {
                    canvas.put_pixel(x, y, image::Rgba([px[0], px[1], px[2], px[3]]));
                }
            }

            frames.push(Frame {
                image: DynamicImage::ImageRgba8(canvas.clone()),
                delay_ms: u32::from(frame.delay) * 10,
            });
            tracing::trace!(index = frames.len() - 1, "decoded gif frame");

            match frame.dispose {
                gif::DisposalMethod::Background => {
                    for y in top..(top + frame_h).min(height) {
                        for x in left..(left + frame_w).min(width) {
                            canvas.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
                        }
                    }
                }
                gif::DisposalMethod::Previous => {
                    if let Some(previous) = restore {
                        canvas = previous;
                    }
                }
                _ => {}
            }
        }

        Picture::new(Some(ContainerFormat::Gif), PixelMode::P, frames, transparency)
    })
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(LazyPaletteError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(LazyPaletteError::pixel_count_exceeds_limit(
            pixels, MAX_PIXELS,
        ));
    }
    Ok(())
}

/// Inspect encoded bytes and ensure the image dimensions are safe before decoding.
pub fn ensure_dimensions_safe(bytes: &[u8]) -> Result<()> {
    let cursor = Cursor::new(bytes);
    if let Ok(reader) = ImageReader::new(cursor).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            return check_dimensions(width, height);
        }
    }
    Ok(())
}

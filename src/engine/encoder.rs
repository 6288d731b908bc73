// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), PNG (image + oxipng), WebP (libwebp),
// GIF (gif crate, multi-frame).

use super::common::run_with_panic_policy;
use super::picture::Frame;
use super::MAX_DIMENSION;
use crate::error::{LazyPaletteError, Result};
use crate::ops::{Disposal, OutputFormat, SaveOptions};
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::{Cursor, Write};

/// oxipng preset used when PNG optimization is requested
const OXIPNG_PRESET: u8 = 2;

/// Encode frames with the given options and write them to `out`.
pub fn save<W: Write + ?Sized>(frames: &[Frame], out: &mut W, options: &SaveOptions) -> Result<()> {
    let bytes = encode(frames, options)?;
    out.write_all(&bytes)
        .map_err(LazyPaletteError::output_write_failed)?;
    out.flush().map_err(LazyPaletteError::output_write_failed)
}

/// Encode frames with the given options. Only GIF keeps more than one frame.
pub fn encode(frames: &[Frame], options: &SaveOptions) -> Result<Vec<u8>> {
    let first = frames.first().ok_or_else(LazyPaletteError::no_frames)?;
    if frames.len() > 1 && !options.format.supports_animation() {
        tracing::warn!(
            format = options.format.name(),
            dropped = frames.len() - 1,
            "format cannot hold multiple frames, writing the first only"
        );
    }

    let encoded = match options.format {
        OutputFormat::Jpeg => encode_jpeg(&first.image, options.jpeg_quality(), options.optimize)?,
        OutputFormat::Png => encode_png(&first.image, options.optimize)?,
        OutputFormat::WebP => encode_webp(&first.image, options.webp_quality())?,
        OutputFormat::Gif => encode_gif(frames, options)?,
    };

    tracing::debug!(
        format = options.format.name(),
        frames = if options.format.supports_animation() { frames.len() } else { 1 },
        bytes = encoded.len(),
        "encoded image"
    );
    Ok(encoded)
}

/// Encode to progressive JPEG using mozjpeg.
///
/// `optimize` enables optimized Huffman tables and scan optimization;
/// without it the encoder matches libjpeg-turbo defaults.
pub fn encode_jpeg(img: &DynamicImage, quality: u8, optimize: bool) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let quality = quality.min(100);

        // Zero-copy when already RGB8
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        if w == 0 || h == 0 {
            return Err(LazyPaletteError::encode_failed(
                "jpeg",
                "width or height is zero",
            ));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(LazyPaletteError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality as f32);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();

        if optimize {
            comp.set_optimize_coding(true);
            comp.set_optimize_scans(true);
            comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        } else {
            comp.set_optimize_coding(false);
            comp.set_optimize_scans(false);
        }

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                LazyPaletteError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to start compress: {e:?}"),
                )
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    LazyPaletteError::encode_failed(
                        "jpeg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                LazyPaletteError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode to PNG with the image crate, then recompress losslessly with
/// oxipng when `optimize` is set.
pub fn encode_png(img: &DynamicImage, optimize: bool) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| LazyPaletteError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        if !optimize {
            return Ok(buf);
        }

        // Color type stays as written so the decoded pixel mode is unchanged
        let mut options = oxipng::Options::from_preset(OXIPNG_PRESET);
        options.strip = oxipng::StripChunks::None;
        options.color_type_reduction = false;
        options.grayscale_reduction = false;
        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            LazyPaletteError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// libwebp settings per quality band. Higher quality gets gentler noise
/// shaping and filtering.
fn webp_config(quality: u8) -> Result<webp::WebPConfig> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| LazyPaletteError::internal_panic("failed to create WebPConfig"))?;
    let quality = f32::from(quality.min(100));
    config.quality = quality;
    config.method = 4;
    config.pass = 1;
    config.preprocessing = 0;
    config.autofilter = 1;
    config.sns_strength = if quality >= 85.0 {
        50
    } else if quality >= 70.0 {
        70
    } else {
        80
    };
    config.filter_strength = if quality >= 80.0 {
        20
    } else if quality >= 60.0 {
        30
    } else {
        40
    };
    config.filter_sharpness = if quality >= 85.0 { 2 } else { 0 };
    Ok(config)
}

/// Encode a still image to lossy WebP. Alpha is kept when the image has it.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let config = webp_config(quality)?;
        let mem = if img.color().has_alpha() {
            let rgba: Cow<'_, image::RgbaImage> = match img {
                DynamicImage::ImageRgba8(rgba_img) => Cow::Borrowed(rgba_img),
                _ => Cow::Owned(img.to_rgba8()),
            };
            let (w, h) = rgba.dimensions();
            webp::Encoder::from_rgba(&rgba, w, h).encode_advanced(&config)
        } else {
            let rgb: Cow<'_, image::RgbImage> = match img {
                DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
                _ => Cow::Owned(img.to_rgb8()),
            };
            let (w, h) = rgb.dimensions();
            webp::Encoder::from_rgb(&rgb, w, h).encode_advanced(&config)
        }
        .map_err(|e| LazyPaletteError::encode_failed("webp", format!("WebP encode failed: {e:?}")))?;

        Ok(mem.to_vec())
    })
}

fn gif_disposal(disposal: Disposal) -> gif::DisposalMethod {
    match disposal {
        Disposal::Unspecified => gif::DisposalMethod::Any,
        Disposal::Keep => gif::DisposalMethod::Keep,
        Disposal::RestoreBackground => gif::DisposalMethod::Background,
        Disposal::RestorePrevious => gif::DisposalMethod::Previous,
    }
}

fn gif_dimension(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        LazyPaletteError::encode_failed("gif", format!("dimension {value} exceeds 65535"))
    })
}

/// Encode one or more frames to GIF. Each frame is quantized on its own
/// (local palette); the background color, if any, is global palette index 0.
pub fn encode_gif(frames: &[Frame], options: &SaveOptions) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:gif", || {
        let first = frames.first().ok_or_else(LazyPaletteError::no_frames)?;
        let width = gif_dimension(first.image.width())?;
        let height = gif_dimension(first.image.height())?;
        let global_palette: Vec<u8> = options
            .background
            .map(|[r, g, b, _]| vec![r, g, b])
            .unwrap_or_default();
        let speed = if options.optimize { 10 } else { 30 };
        let encode_err =
            |e: gif::EncodingError| LazyPaletteError::encode_failed("gif", e.to_string());

        let mut output = Vec::new();
        {
            let mut encoder =
                gif::Encoder::new(&mut output, width, height, &global_palette).map_err(encode_err)?;
            let repeat = match options.loop_count {
                0 => gif::Repeat::Infinite,
                n => gif::Repeat::Finite(n),
            };
            encoder.set_repeat(repeat).map_err(encode_err)?;

            for (index, frame) in frames.iter().enumerate() {
                let mut rgba = frame.image.to_rgba8();
                let frame_width = gif_dimension(rgba.width())?;
                let frame_height = gif_dimension(rgba.height())?;
                let mut gif_frame =
                    gif::Frame::from_rgba_speed(frame_width, frame_height, &mut rgba, speed);
                gif_frame.delay = u16::try_from(frame.delay_ms / 10).unwrap_or(u16::MAX);
                if let Some(disposal) = options.disposal {
                    gif_frame.dispose = gif_disposal(disposal);
                }
                encoder.write_frame(&gif_frame).map_err(encode_err)?;
                tracing::trace!(index, delay_ms = frame.delay_ms, "wrote gif frame");
            }
        }

        Ok(output)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn create_test_image_rgba(width: u32, height: u32, alpha: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, alpha])
        }))
    }

    fn still(image: DynamicImage) -> Vec<Frame> {
        vec![Frame::still(image)]
    }

    #[test]
    fn test_encode_jpeg_produces_valid_jpeg() {
        let img = create_test_image(100, 100);
        let result = encode_jpeg(&img, 80, true).unwrap();
        assert_eq!(&result[0..2], &[0xFF, 0xD8]);
        assert_eq!(&result[result.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        // High-frequency content so quantization dominates the file size
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
            let v = (x.wrapping_mul(73) ^ y.wrapping_mul(151)).wrapping_mul(2_654_435_761) >> 24;
            Rgb([v as u8, (v as u8).wrapping_mul(3), (v as u8).wrapping_add(x as u8)])
        }));
        let low = encode_jpeg(&img, 20, true).unwrap();
        let high = encode_jpeg(&img, 95, true).unwrap();
        for bytes in [&low, &high] {
            assert_eq!(image::load_from_memory(bytes).unwrap().dimensions(), (128, 128));
        }
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_encode_png_optimize_keeps_color_type() {
        let gray_translucent =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([90, 90, 90, 128])));
        let gray_opaque = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([90, 90, 90])));
        let opaque_rgba = create_test_image_rgba(16, 16, 255);

        for (img, expected) in [
            (gray_translucent, image::ColorType::Rgba8),
            (gray_opaque, image::ColorType::Rgb8),
            (opaque_rgba, image::ColorType::Rgba8),
        ] {
            let bytes = encode_png(&img, true).unwrap();
            assert_eq!(image::load_from_memory(&bytes).unwrap().color(), expected);
        }
    }

    #[test]
    fn test_encode_png_keeps_alpha() {
        let img = create_test_image_rgba(20, 10, 100);
        for optimize in [false, true] {
            let result = encode_png(&img, optimize).unwrap();
            assert_eq!(&result[0..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
            let decoded = image::load_from_memory(&result).unwrap();
            assert_eq!(decoded.dimensions(), (20, 10));
            assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0[3], 100);
        }
    }

    #[test]
    fn test_encode_webp_rgb_and_rgba() {
        let rgb = encode_webp(&create_test_image(16, 16), 80).unwrap();
        assert_eq!(&rgb[0..4], b"RIFF");
        assert_eq!(&rgb[8..12], b"WEBP");
        let rgba = encode_webp(&create_test_image_rgba(16, 16, 50), 80).unwrap();
        let decoded = image::load_from_memory(&rgba).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_encode_gif_writes_every_frame() {
        let frames = vec![
            Frame {
                image: create_test_image(8, 8),
                delay_ms: 100,
            },
            Frame {
                image: create_test_image_rgba(8, 8, 255),
                delay_ms: 40,
            },
        ];
        let bytes = encode_gif(&frames, &SaveOptions::gif()).unwrap();
        assert_eq!(&bytes[0..6], b"GIF89a");

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(Cursor::new(&bytes)).unwrap();
        let mut count = 0;
        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.dispose, gif::DisposalMethod::Background);
            delays.push(frame.delay);
            count += 1;
        }
        assert_eq!(count, 2);
        assert_eq!(delays, vec![10, 4]);
    }

    #[test]
    fn test_single_frame_formats_keep_first_frame() {
        let frames = vec![
            Frame::still(create_test_image(8, 8)),
            Frame::still(create_test_image(8, 8)),
        ];
        let bytes = encode(&frames, &SaveOptions::png()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_encode_without_frames_fails() {
        let err = encode(&[], &SaveOptions::jpeg()).unwrap_err();
        assert!(matches!(err, LazyPaletteError::NoFrames));
    }

    #[test]
    fn test_save_writes_to_sink() {
        let mut out = Vec::new();
        save(&still(create_test_image(4, 4)), &mut out, &SaveOptions::jpeg()).unwrap();
        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
    }
}

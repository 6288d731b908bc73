// src/engine/pipeline.rs
//
// Pixel operations applied by the editors: resize and mode conversion.

use super::picture::PixelMode;
use crate::error::{LazyPaletteError, Result};
use crate::ops::{ResampleFilter, ResizeOptions};
use fast_image_resize::{self as fir, MulDiv, PixelType};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use image::{GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

/// 8-bit interleaved pixels in a layout fir understands.
struct Raster {
    width: u32,
    height: u32,
    pixel_type: PixelType,
    pixels: Vec<u8>,
}

impl Raster {
    /// Select pixel layout without forcing RGBA when not needed.
    fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let (pixel_type, pixels) = match img {
            DynamicImage::ImageLuma8(buf) => (PixelType::U8, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (PixelType::U8x2, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (PixelType::U8x3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (PixelType::U8x4, buf.as_raw().clone()),
            other => match other.color().channel_count() {
                1 => (PixelType::U8, other.to_luma8().into_raw()),
                2 => (PixelType::U8x2, other.to_luma_alpha8().into_raw()),
                3 => (PixelType::U8x3, other.to_rgb8().into_raw()),
                _ => (PixelType::U8x4, other.to_rgba8().into_raw()),
            },
        };
        Self {
            width,
            height,
            pixel_type,
            pixels,
        }
    }

    fn into_image(self) -> std::result::Result<DynamicImage, String> {
        let Self {
            width,
            height,
            pixel_type,
            pixels,
        } = self;
        let image = match pixel_type {
            PixelType::U8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
            PixelType::U8x2 => {
                GrayAlphaImage::from_raw(width, height, pixels).map(DynamicImage::ImageLumaA8)
            }
            PixelType::U8x3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
            PixelType::U8x4 => {
                RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
            }
            other => return Err(format!("unsupported pixel type {other:?}")),
        };
        image.ok_or_else(|| "resized buffer does not match its dimensions".to_string())
    }
}

fn resize_alg(filter: ResampleFilter) -> fir::ResizeAlg {
    match filter {
        ResampleFilter::Nearest => fir::ResizeAlg::Nearest,
        ResampleFilter::Lanczos => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        ResampleFilter::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
        ResampleFilter::Bicubic => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
        ResampleFilter::Box => fir::ResizeAlg::Convolution(fir::FilterType::Box),
        ResampleFilter::Hamming => fir::ResizeAlg::Convolution(fir::FilterType::Hamming),
    }
}

fn fallback_filter(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Lanczos => FilterType::Lanczos3,
        ResampleFilter::Bicubic => FilterType::CatmullRom,
        ResampleFilter::Bilinear | ResampleFilter::Box | ResampleFilter::Hamming => {
            FilterType::Triangle
        }
    }
}

/// Decide whether alpha premultiplication is required for a given pixel layout.
#[inline]
fn requires_premultiply(pixel_type: PixelType) -> bool {
    matches!(pixel_type, PixelType::U8x2 | PixelType::U8x4)
}

/// Integer box-reduction factor for one axis: floor(src / dst / gap), at least 1.
pub fn reduce_factor(src: u32, dst: u32, gap: f32) -> u32 {
    if dst == 0 || gap <= 0.0 {
        return 1;
    }
    let factor = (f64::from(src) / f64::from(dst) / f64::from(gap)).floor();
    if factor >= 1.0 {
        factor.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

fn resize_raster(
    src: Raster,
    dst_width: u32,
    dst_height: u32,
    filter: ResampleFilter,
    alg: fir::ResizeAlg,
) -> std::result::Result<Raster, String> {
    let pixel_type = src.pixel_type;
    let primary = resize_with_fir(&src, dst_width, dst_height, alg);
    match primary {
        Ok(pixels) => Ok(Raster {
            width: dst_width,
            height: dst_height,
            pixel_type,
            pixels,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "fir resize failed, falling back to image crate");
            let resized = src
                .into_image()
                .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}"))?
                .resize_exact(dst_width, dst_height, fallback_filter(filter));
            Ok(Raster::from_image(&resized))
        }
    }
}

fn resize_with_fir(
    src: &Raster,
    dst_width: u32,
    dst_height: u32,
    alg: fir::ResizeAlg,
) -> std::result::Result<Vec<u8>, String> {
    let mut src_image =
        fir::images::Image::from_vec_u8(src.width, src.height, src.pixels.clone(), src.pixel_type)
            .map_err(|e| format!("fir source image error: {e:?}"))?;
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, src.pixel_type);

    let needs_premultiply = requires_premultiply(src.pixel_type);
    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let options = fir::ResizeOptions::new().resize_alg(alg);
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    Ok(dst_image.into_vec())
}

/// Resize to exactly `options.size`. With a reducing gap, a box reduction by
/// an integer factor runs first when the source is large enough.
pub fn resize(img: &DynamicImage, options: &ResizeOptions) -> Result<DynamicImage> {
    options.validate()?;
    let (dst_width, dst_height) = options.size;
    let (src_width, src_height) = img.dimensions();
    let fail = |reason: String| {
        LazyPaletteError::resize_failed((src_width, src_height), (dst_width, dst_height), reason)
    };

    if src_width == 0 || src_height == 0 {
        return Err(fail("source image is empty".to_string()));
    }

    let mut raster = Raster::from_image(img);

    if let Some(gap) = options.reducing_gap {
        let factor_x = reduce_factor(src_width, dst_width, gap);
        let factor_y = reduce_factor(src_height, dst_height, gap);
        if factor_x > 1 || factor_y > 1 {
            let reduced_width = src_width.div_ceil(factor_x);
            let reduced_height = src_height.div_ceil(factor_y);
            tracing::trace!(factor_x, factor_y, reduced_width, reduced_height, "box pre-reduction");
            raster = resize_raster(
                raster,
                reduced_width,
                reduced_height,
                ResampleFilter::Box,
                fir::ResizeAlg::Convolution(fir::FilterType::Box),
            )
            .map_err(fail)?;
        }
    }

    if (raster.width, raster.height) != (dst_width, dst_height) {
        raster = resize_raster(
            raster,
            dst_width,
            dst_height,
            options.resample,
            resize_alg(options.resample),
        )
        .map_err(fail)?;
    }

    raster.into_image().map_err(fail)
}

/// Convert to an 8-bit pixel mode. Converting to RGB drops alpha without
/// compositing.
pub fn convert(img: &DynamicImage, mode: PixelMode) -> Result<DynamicImage> {
    match mode {
        PixelMode::Rgb => Ok(DynamicImage::ImageRgb8(img.to_rgb8())),
        PixelMode::Rgba => Ok(DynamicImage::ImageRgba8(img.to_rgba8())),
        PixelMode::L => Ok(DynamicImage::ImageLuma8(img.to_luma8())),
        PixelMode::La => Ok(DynamicImage::ImageLumaA8(img.to_luma_alpha8())),
        PixelMode::P | PixelMode::Other(_) => Err(LazyPaletteError::unsupported_conversion(
            PixelMode::of(img).name(),
            mode.name(),
        )),
    }
}

/// Like [`convert`] but skips the copy when the image is already in `mode`.
pub fn convert_owned(img: DynamicImage, mode: PixelMode) -> Result<DynamicImage> {
    if PixelMode::of(&img) == mode {
        return Ok(img);
    }
    convert(&img, mode)
}

// src/color/bands.rs
//
// Per-band pixel access. A band is one channel's full sequence of samples.

use crate::error::{LazyPaletteError, Result};
use image::DynamicImage;
use std::borrow::Cow;

/// Anything that can hand out its pixel data one band at a time.
pub trait BandSource {
    /// Number of bands (channels) the source exposes
    fn band_count(&self) -> usize;

    /// Samples of band `index`, one per pixel in row-major order.
    /// Callers only ask for `index < band_count()`.
    fn band(&self, index: usize) -> Vec<u8>;
}

/// Read the first `band_count` bands of `source`.
///
/// Asking for more bands than the source has (e.g. 4 bands from an RGB image)
/// is a caller error and fails with `BandCountMismatch`.
pub fn read_bands<S: BandSource + ?Sized>(source: &S, band_count: usize) -> Result<Vec<Vec<u8>>> {
    let available = source.band_count();
    if band_count > available {
        return Err(LazyPaletteError::band_count_mismatch(band_count, available));
    }
    Ok((0..band_count).map(|index| source.band(index)).collect())
}

/// 8-bit interleaved samples plus the channel count.
/// Zero-copy for the 8-bit layouts, converted otherwise.
fn interleaved(img: &DynamicImage) -> (Cow<'_, [u8]>, usize) {
    match img {
        DynamicImage::ImageLuma8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), 1),
        DynamicImage::ImageLumaA8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), 2),
        DynamicImage::ImageRgb8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), 3),
        DynamicImage::ImageRgba8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), 4),
        other => match other.color().channel_count() {
            1 => (Cow::Owned(other.to_luma8().into_raw()), 1),
            2 => (Cow::Owned(other.to_luma_alpha8().into_raw()), 2),
            3 => (Cow::Owned(other.to_rgb8().into_raw()), 3),
            _ => (Cow::Owned(other.to_rgba8().into_raw()), 4),
        },
    }
}

impl BandSource for DynamicImage {
    fn band_count(&self) -> usize {
        match self.color().channel_count() {
            0 => 0,
            1 => 1,
            2 => 2,
            3 => 3,
            _ => 4,
        }
    }

    fn band(&self, index: usize) -> Vec<u8> {
        let (samples, channels) = interleaved(self);
        samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }
}

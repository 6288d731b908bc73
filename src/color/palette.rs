// src/color/palette.rs
//
// Palette extraction on top of a ColorCluster ranking.

use super::bands::BandSource;
use super::cluster::ColorCluster;
use super::Color;
use crate::error::{LazyPaletteError, Result};

/// The most frequent color of an image.
pub struct DominantColor<'c, 'a, S: BandSource + ?Sized> {
    cluster: &'c ColorCluster<'a, S>,
}

impl<'c, 'a, S: BandSource + ?Sized> DominantColor<'c, 'a, S> {
    pub fn new(cluster: &'c ColorCluster<'a, S>) -> Self {
        Self { cluster }
    }

    /// Fails with `EmptyPalette` when the image has no pixels.
    pub fn palette_data(&self) -> Result<Color> {
        self.cluster
            .get_colors()?
            .first()
            .ok_or_else(LazyPaletteError::empty_palette)
    }

    pub fn palette_data_as_hex(&self) -> Result<String> {
        Ok(self.palette_data()?.to_hex())
    }
}

/// A slice over the ranking, with Python slice semantics:
/// negative bounds count from the end and out-of-range bounds are clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteSlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl PaletteSlice {
    /// Every ranked color
    pub fn all() -> Self {
        Self {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// The first `stop` colors (start 0, step 1)
    pub fn to(stop: isize) -> Self {
        Self {
            start: Some(0),
            stop: Some(stop),
            step: 1,
        }
    }

    pub fn from(mut self, start: isize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn step(mut self, step: isize) -> Self {
        self.step = step;
        self
    }

    /// Resolve the slice against a sequence of `len` items.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>> {
        let step = self.step;
        if step == 0 {
            return Err(LazyPaletteError::invalid_argument(
                "step",
                "0",
                "slice step cannot be zero",
            ));
        }

        let len = isize::try_from(len).unwrap_or(isize::MAX);
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(b) if b < 0 => b.saturating_add(len).max(lower),
            Some(b) => b.min(upper),
        };
        let start = clamp(self.start, if step > 0 { lower } else { upper });
        let stop = clamp(self.stop, if step > 0 { upper } else { lower });

        let mut indices = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            indices.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(indices)
    }
}

impl Default for PaletteSlice {
    fn default() -> Self {
        Self::all()
    }
}

/// A run of ranked colors selected by a [`PaletteSlice`].
pub struct RangeColorPalette<'c, 'a, S: BandSource + ?Sized> {
    cluster: &'c ColorCluster<'a, S>,
}

impl<'c, 'a, S: BandSource + ?Sized> RangeColorPalette<'c, 'a, S> {
    pub fn new(cluster: &'c ColorCluster<'a, S>) -> Self {
        Self { cluster }
    }

    pub fn palette_data(&self, slice: PaletteSlice) -> Result<Vec<Color>> {
        let ranked = self.cluster.get_colors()?;
        Ok(slice
            .indices(ranked.len())?
            .into_iter()
            .filter_map(|index| ranked.get(index))
            .collect())
    }

    pub fn palette_data_as_hex(&self, slice: PaletteSlice) -> Result<Vec<String>> {
        Ok(self
            .palette_data(slice)?
            .iter()
            .map(Color::to_hex)
            .collect())
    }
}

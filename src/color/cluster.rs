// src/color/cluster.rs
//
// Incidence counting and ranking of distinct colors.

use super::bands::{read_bands, BandSource};
use super::Color;
use crate::error::{LazyPaletteError, Result};
use once_cell::unsync::OnceCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Which bands are zipped into a [`Color`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    Rgb,
    Rgba,
}

impl Channels {
    pub fn band_count(&self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }
}

/// Color -> incidence count, remembering the order colors were first seen.
#[derive(Debug, Default)]
pub struct ColorIncidenceTable {
    index: HashMap<Color, usize>,
    entries: Vec<(Color, u64)>,
}

impl ColorIncidenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, color: Color) {
        match self.index.entry(color) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((color, 1));
            }
        }
    }

    pub fn count(&self, color: &Color) -> u64 {
        self.index
            .get(color)
            .map(|&position| self.entries[position].1)
            .unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Sort by count, descending. `sort_by` is stable, so equal counts keep
    /// first-seen order.
    pub fn into_ranked(self) -> RankedPalette {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        RankedPalette { entries }
    }
}

impl FromIterator<Color> for ColorIncidenceTable {
    fn from_iter<I: IntoIterator<Item = Color>>(colors: I) -> Self {
        let mut table = Self::new();
        for color in colors {
            table.record(color);
        }
        table
    }
}

/// Distinct colors ordered by descending incidence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankedPalette {
    entries: Vec<(Color, u64)>,
}

impl RankedPalette {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<Color> {
        self.entries.first().map(|(color, _)| *color)
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.entries.get(index).map(|(color, _)| *color)
    }

    /// (color, count) pairs in rank order
    pub fn entries(&self) -> &[(Color, u64)] {
        &self.entries
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.entries.iter().map(|(color, _)| *color)
    }

    pub fn to_colors(&self) -> Vec<Color> {
        self.colors().collect()
    }

    /// Total number of pixels that contributed to the ranking
    pub fn pixel_count(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

/// Zip equal-length bands into colors and rank them.
///
/// Takes 3 bands (RGB) or 4 bands (RGBA). Zero-length bands produce an
/// empty palette.
pub fn rank_bands(bands: &[Vec<u8>]) -> Result<RankedPalette> {
    let expected = bands.first().map(Vec::len).unwrap_or(0);
    for (band, samples) in bands.iter().enumerate() {
        if samples.len() != expected {
            return Err(LazyPaletteError::band_length_mismatch(
                band,
                expected,
                samples.len(),
            ));
        }
    }

    let table: ColorIncidenceTable = match bands {
        [r, g, b] => (0..expected)
            .map(|i| Color::Rgb([r[i], g[i], b[i]]))
            .collect(),
        [r, g, b, a] => (0..expected)
            .map(|i| Color::Rgba([r[i], g[i], b[i], a[i]]))
            .collect(),
        other => {
            return Err(LazyPaletteError::invalid_argument(
                "bands",
                other.len().to_string(),
                "expected 3 (RGB) or 4 (RGBA) bands",
            ))
        }
    };

    Ok(table.into_ranked())
}

/// Ranks the colors of one image. The ranking is computed on first use and
/// reused afterwards.
pub struct ColorCluster<'a, S: BandSource + ?Sized> {
    source: &'a S,
    alpha: Option<bool>,
    ranked: OnceCell<RankedPalette>,
}

impl<'a, S: BandSource + ?Sized> ColorCluster<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            alpha: None,
            ranked: OnceCell::new(),
        }
    }

    /// Force alpha in (`true`) or out (`false`) of the clustered colors.
    /// By default alpha is included whenever the source has a fourth band.
    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = Some(alpha);
        self.ranked = OnceCell::new();
        self
    }

    pub fn channels(&self) -> Channels {
        match self.alpha {
            Some(true) => Channels::Rgba,
            Some(false) => Channels::Rgb,
            None if self.source.band_count() >= 4 => Channels::Rgba,
            None => Channels::Rgb,
        }
    }

    pub fn get_colors(&self) -> Result<&RankedPalette> {
        self.ranked.get_or_try_init(|| {
            let channels = self.channels();
            let bands = read_bands(self.source, channels.band_count())?;
            let ranked = rank_bands(&bands)?;
            tracing::debug!(
                ?channels,
                pixels = ranked.pixel_count(),
                distinct = ranked.len(),
                "ranked image colors"
            );
            Ok(ranked)
        })
    }
}

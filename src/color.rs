// src/color.rs
//
// Color clustering and palette ranking.
// 1. Read per-band sample sequences from an image-like source
// 2. Zip them into per-pixel colors and count incidence
// 3. Rank distinct colors by incidence (stable on first appearance)
// 4. Extract the dominant color or a slice of the ranking, optionally as hex

mod bands;
mod cluster;
mod hex;
mod palette;

pub use self::bands::{read_bands, BandSource};
pub use self::cluster::{rank_bands, Channels, ColorCluster, ColorIncidenceTable, RankedPalette};
pub use self::hex::{samples_to_hex, to_hex};
pub use self::palette::{DominantColor, PaletteSlice, RangeColorPalette};

/// A single pixel color. Samples are stored in band order (R, G, B[, A]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl Color {
    pub fn samples(&self) -> &[u8] {
        match self {
            Color::Rgb(samples) => samples,
            Color::Rgba(samples) => samples,
        }
    }

    pub fn channels(&self) -> Channels {
        match self {
            Color::Rgb(_) => Channels::Rgb,
            Color::Rgba(_) => Channels::Rgba,
        }
    }

    pub fn to_hex(&self) -> String {
        to_hex(self)
    }
}

impl From<[u8; 3]> for Color {
    fn from(samples: [u8; 3]) -> Self {
        Color::Rgb(samples)
    }
}

impl From<[u8; 4]> for Color {
    fn from(samples: [u8; 4]) -> Self {
        Color::Rgba(samples)
    }
}

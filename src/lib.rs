// lib.rs
//
// lazy-palette: palette extraction and format-aware image optimization.
//
// - Rank the colors of an image by incidence and pick the dominant one
// - Classify a decoded image into a profile and re-encode it into its best
//   native format when it is not there already
// - Resize and save one image to many sizes and formats

pub mod color;
pub mod engine;
pub mod error;
pub mod ops;
pub mod profile;

pub use color::{Color, ColorCluster, DominantColor, PaletteSlice, RangeColorPalette, RankedPalette};
pub use engine::{
    BulkResizeSaveEditor, Editor, ImageEditor, MemorySink, Picture, PixelMode, TempFileSink,
};
pub use error::{ErrorCategory, LazyPaletteError, Result};
pub use ops::{
    OutputFormat, ResampleFilter, ResizeOptions, ResizeSaveOptions, SaveOptions, SaveOptionsTable,
};
pub use profile::{ImageCategory, Profile, ProfileKind, SupportedProfiles};

/// Dominant color and ranked palette of one image, as hex strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteReport {
    pub dominant: String,
    pub palette: Vec<String>,
}

/// Decode `bytes`, classify them, and rank the colors of the profile's
/// clustering image. Alpha is ignored, so colors come back as `#rrggbb`.
///
/// Fails with `UnsupportedImage` when no profile in `supported` matches and
/// with `EmptyPalette` when the image has no pixels.
pub fn extract_palette(
    bytes: &[u8],
    supported: &SupportedProfiles,
    slice: PaletteSlice,
) -> Result<PaletteReport> {
    let picture = Picture::decode(bytes)?;
    let category = ImageCategory::new(&picture, supported);
    let profile = category.require_profile()?;
    let image = profile.color_clustering_image();

    let cluster = ColorCluster::new(&*image).with_alpha(false);
    let dominant = DominantColor::new(&cluster).palette_data_as_hex()?;
    let palette = RangeColorPalette::new(&cluster).palette_data_as_hex(slice)?;

    Ok(PaletteReport { dominant, palette })
}

/// Decode `bytes`, re-encode them into their best native format if needed,
/// then resize and save once per `plan` entry. Outputs come back in plan order.
pub fn optimize_and_resize(
    bytes: &[u8],
    supported: &SupportedProfiles,
    save_options: &SaveOptionsTable,
    plan: &[ResizeSaveOptions],
) -> Result<Vec<Vec<u8>>> {
    let picture = Picture::decode(bytes)?;
    let mut profile = ImageCategory::new(&picture, supported).require_profile()?;

    if profile.is_optimized() {
        return bulk_resize(profile.editor(), plan);
    }

    let mut optimized = Vec::new();
    match profile.optimize(&mut optimized, save_options)? {
        Some(format) => {
            tracing::debug!(
                from = profile.name(),
                to = format.name(),
                bytes = optimized.len(),
                "resizing optimized picture"
            );
            let optimized_picture = Picture::decode(&optimized)?;
            let mut optimized_profile =
                ImageCategory::new(&optimized_picture, supported).require_profile()?;
            bulk_resize(optimized_profile.editor(), plan)
        }
        None => bulk_resize(profile.editor(), plan),
    }
}

fn bulk_resize<E: ImageEditor>(editor: &mut E, plan: &[ResizeSaveOptions]) -> Result<Vec<Vec<u8>>> {
    BulkResizeSaveEditor::in_memory(editor, plan.iter().cloned()).collect()
}

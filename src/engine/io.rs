// src/engine/io.rs
//
// I/O helpers: memory-mapped file access and container metadata lookups.

use crate::error::{LazyPaletteError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

/// Map a file into memory for zero-copy decoding.
pub fn map_file(path: &Path) -> Result<Mmap> {
    let display = path.to_string_lossy().to_string();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LazyPaletteError::file_not_found(display.clone()),
        _ => LazyPaletteError::file_read_failed(display.clone(), e),
    })?;

    // Safety: the file must not be modified externally while mapped.
    // A concurrent truncation can fault the process on some platforms.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| LazyPaletteError::mmap_failed(display, e))?;
    Ok(mmap)
}

/// Whether a PNG stream carries a tRNS chunk (a transparency marker that is
/// not an alpha channel). Only the chunks ahead of the first IDAT are read.
pub fn png_has_transparency_chunk(data: &[u8]) -> bool {
    let mut limits = png::Limits::default();
    limits.bytes = usize::MAX;
    let decoder = png::Decoder::new_with_limits(Cursor::new(data), limits);
    match decoder.read_info() {
        Ok(reader) => reader.info().trns.is_some(),
        Err(_) => false,
    }
}

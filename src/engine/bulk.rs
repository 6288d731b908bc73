// src/engine/bulk.rs
//
// Bulk resize: drive one editor through an ordered list of
// (resize, save) pairs, yielding one output per pair.

use super::editor::ImageEditor;
use crate::error::{LazyPaletteError, Result};
use crate::ops::{ResizeSaveOptions, SaveOptions};
use std::collections::VecDeque;
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;
use tempfile::{Builder, NamedTempFile};

/// Where each bulk output goes. Every call produces a fresh output owned by
/// the caller.
pub trait OutputSink {
    type Output;

    fn save<E: ImageEditor>(&mut self, editor: &mut E, options: &SaveOptions) -> Result<Self::Output>;
}

/// Collects each output into its own byte buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySink;

impl OutputSink for MemorySink {
    type Output = Vec<u8>;

    fn save<E: ImageEditor>(&mut self, editor: &mut E, options: &SaveOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        editor.save(&mut buffer, options)?;
        Ok(buffer)
    }
}

/// Writes each output to a new named temporary file, rewound to the start.
/// The file is deleted when the returned handle is dropped unless persisted.
#[derive(Clone, Debug)]
pub struct TempFileSink {
    dir: Option<PathBuf>,
    prefix: String,
}

impl TempFileSink {
    pub fn new() -> Self {
        Self {
            dir: None,
            prefix: "lazy-palette-".to_string(),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl Default for TempFileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for TempFileSink {
    type Output = NamedTempFile;

    fn save<E: ImageEditor>(&mut self, editor: &mut E, options: &SaveOptions) -> Result<NamedTempFile> {
        let suffix = format!(".{}", options.format.extension());
        let mut builder = Builder::new();
        builder.prefix(&self.prefix).suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(LazyPaletteError::output_write_failed)?;

        editor.save(&mut file, options)?;

        let handle = file.as_file_mut();
        handle
            .sync_all()
            .map_err(LazyPaletteError::output_write_failed)?;
        handle
            .seek(SeekFrom::Start(0))
            .map_err(LazyPaletteError::output_write_failed)?;
        Ok(file)
    }
}

/// Iterator over bulk outputs. Each `next()` resizes the shared editor for
/// the next pair, saves it, and yields the result.
pub struct BulkResizeSaveEditor<'e, E: ImageEditor, S: OutputSink> {
    editor: &'e mut E,
    queue: VecDeque<ResizeSaveOptions>,
    sink: S,
}

impl<'e, E: ImageEditor> BulkResizeSaveEditor<'e, E, MemorySink> {
    pub fn in_memory(editor: &'e mut E, plan: impl IntoIterator<Item = ResizeSaveOptions>) -> Self {
        Self::new(editor, plan, MemorySink)
    }
}

impl<'e, E: ImageEditor, S: OutputSink> BulkResizeSaveEditor<'e, E, S> {
    pub fn new(
        editor: &'e mut E,
        plan: impl IntoIterator<Item = ResizeSaveOptions>,
        sink: S,
    ) -> Self {
        Self {
            editor,
            queue: plan.into_iter().collect(),
            sink,
        }
    }

    /// Pairs not yet processed
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    fn process(&mut self, pair: &ResizeSaveOptions) -> Result<S::Output> {
        self.editor.resize(pair.resize_options())?;
        self.sink.save(&mut *self.editor, pair.save_options())
    }
}

impl<E: ImageEditor, S: OutputSink> Iterator for BulkResizeSaveEditor<'_, E, S> {
    type Item = Result<S::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.queue.pop_front()?;
        tracing::debug!(
            size = ?pair.resize_options().size,
            format = pair.save_options().format.name(),
            remaining = self.queue.len(),
            "bulk resize step"
        );
        Some(self.process(&pair))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::editor::StaticEditor;
    use crate::engine::picture::Picture;
    use crate::ops::{ResampleFilter, ResizeOptions};
    use image::{DynamicImage, GenericImageView, RgbImage};
    use std::io::Read;

    fn picture() -> Picture {
        Picture::from_image(DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
            image::Rgb([x as u8, y as u8, 7])
        })))
    }

    #[test]
    fn test_outputs_follow_plan_order() {
        let picture = picture();
        let mut editor = StaticEditor::new(&picture);
        let plan = ResizeSaveOptions::plan(
            &[(32, 32), (16, 8)],
            ResampleFilter::Lanczos,
            None,
            &SaveOptions::png(),
        );
        let outputs: Vec<Vec<u8>> = BulkResizeSaveEditor::in_memory(&mut editor, plan)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(outputs.len(), 2);
        let dims: Vec<(u32, u32)> = outputs
            .iter()
            .map(|bytes| image::load_from_memory(bytes).unwrap().dimensions())
            .collect();
        assert_eq!(dims, vec![(32, 32), (16, 8)]);
    }

    #[test]
    fn test_one_pair_per_pull() {
        let picture = picture();
        let mut editor = StaticEditor::new(&picture);
        let plan = ResizeSaveOptions::plan(
            &[(8, 8), (4, 4), (2, 2)],
            ResampleFilter::Bicubic,
            None,
            &SaveOptions::jpeg(),
        );
        let mut bulk = BulkResizeSaveEditor::in_memory(&mut editor, plan);
        assert_eq!(bulk.remaining(), 3);
        bulk.next().unwrap().unwrap();
        assert_eq!(bulk.remaining(), 2);
        assert_eq!(bulk.count(), 2);
    }

    #[test]
    fn test_empty_plan_yields_nothing() {
        let picture = picture();
        let mut editor = StaticEditor::new(&picture);
        let mut bulk = BulkResizeSaveEditor::in_memory(&mut editor, Vec::new());
        assert!(bulk.next().is_none());
    }

    #[test]
    fn test_invalid_size_surfaces_error() {
        let picture = picture();
        let mut editor = StaticEditor::new(&picture);
        let plan = vec![ResizeSaveOptions::new(
            ResizeOptions::new(0, 4),
            SaveOptions::png(),
        )];
        let mut bulk = BulkResizeSaveEditor::in_memory(&mut editor, plan);
        assert!(bulk.next().unwrap().is_err());
    }

    #[test]
    fn test_temp_file_sink_writes_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        let picture = picture();
        let mut editor = StaticEditor::new(&picture);
        let plan = ResizeSaveOptions::plan(
            &[(10, 10), (5, 5)],
            ResampleFilter::Bilinear,
            None,
            &SaveOptions::jpeg(),
        );
        let sink = TempFileSink::new().in_dir(dir.path());
        let files: Vec<NamedTempFile> = BulkResizeSaveEditor::new(&mut editor, plan, sink)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(files.len(), 2);
        assert_ne!(files[0].path(), files[1].path());

        for (mut file, expected) in files.into_iter().zip([(10, 10), (5, 5)]) {
            assert_eq!(
                file.path().extension().and_then(|ext| ext.to_str()),
                Some("jpg")
            );
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), expected);
        }
    }
}

// src/profile.rs
//
// Classification of decoded pictures into profiles.
// A profile knows whether its source is already in the best native format
// and, when it is not, how to re-encode it.

mod registry;
mod rules;

pub use registry::SupportedProfiles;
pub use rules::{Category, FallbackRule, FallbackTarget, OptimizedRule, ProfileKind, ProfileRule};

use crate::engine::{Editor, ImageEditor, Picture};
use crate::error::{LazyPaletteError, Result};
use crate::ops::{OutputFormat, SaveOptionsTable};
use image::DynamicImage;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::io::Write;

/// Animated when there is more than one frame or the container is GIF.
pub fn classify(picture: &Picture) -> Category {
    if picture.is_animated() || picture.format() == Some(crate::engine::ContainerFormat::Gif) {
        Category::Animated
    } else {
        Category::Static
    }
}

/// Look up the profile for `picture`; `None` means unsupported.
pub fn get_profile<'a>(picture: &'a Picture, supported: &SupportedProfiles) -> Option<Profile<'a>> {
    ImageCategory::new(picture, supported).profile()
}

/// Memoized category and profile lookup for one picture.
pub struct ImageCategory<'a, 's> {
    picture: &'a Picture,
    supported: &'s SupportedProfiles,
    category: OnceCell<Category>,
    kind: OnceCell<Option<ProfileKind>>,
}

impl<'a, 's> ImageCategory<'a, 's> {
    pub fn new(picture: &'a Picture, supported: &'s SupportedProfiles) -> Self {
        Self {
            picture,
            supported,
            category: OnceCell::new(),
            kind: OnceCell::new(),
        }
    }

    pub fn category(&self) -> Category {
        *self.category.get_or_init(|| classify(self.picture))
    }

    pub fn profile_kind(&self) -> Option<ProfileKind> {
        *self.kind.get_or_init(|| {
            let category = self.category();
            let key = self.picture.format_mode_key();
            let kind = self.supported.lookup(category, &key);
            tracing::debug!(
                category = category.name(),
                %key,
                supported = kind.is_some(),
                "classified picture"
            );
            kind
        })
    }

    pub fn is_supported(&self) -> bool {
        self.profile_kind().is_some()
    }

    pub fn profile(&self) -> Option<Profile<'a>> {
        self.profile_kind()
            .map(|kind| Profile::new(kind, self.picture))
    }

    /// Like [`profile`](Self::profile) but reports the format and mode that
    /// have no registered profile.
    pub fn require_profile(&self) -> Result<Profile<'a>> {
        self.profile().ok_or_else(|| {
            LazyPaletteError::unsupported_image(
                self.picture.format_name(),
                self.picture.mode().name(),
            )
        })
    }
}

/// A classified picture together with its lazily created editor.
#[derive(Debug)]
pub struct Profile<'a> {
    kind: ProfileKind,
    picture: &'a Picture,
    editor: Option<Editor<'a>>,
}

impl<'a> Profile<'a> {
    pub fn new(kind: ProfileKind, picture: &'a Picture) -> Self {
        Self {
            kind,
            picture,
            editor: None,
        }
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.key()
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn rule(&self) -> &'static ProfileRule {
        self.kind.rule()
    }

    pub fn picture(&self) -> &'a Picture {
        self.picture
    }

    pub fn is_optimized(&self) -> bool {
        self.rule().optimized.evaluate(self.picture)
    }

    /// Where `optimize` would re-encode to, if anywhere.
    pub fn fallback(&self) -> Option<FallbackTarget> {
        self.rule().fallback.resolve(self.picture)
    }

    /// Re-encode into the fallback format using that format's entry in
    /// `table`. Returns the format written, or `None` when the profile has
    /// no fallback and nothing was written.
    pub fn optimize<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        table: &SaveOptionsTable,
    ) -> Result<Option<OutputFormat>> {
        let name = self.name();
        let Some(target) = self.fallback() else {
            tracing::debug!(profile = name, "no fallback format, nothing written");
            return Ok(None);
        };
        let options = table.require(target.format)?;

        let editor = self.editor();
        if let Some(mode) = target.convert {
            editor.convert_mode(mode)?;
        }
        editor.save(out, options)?;

        tracing::debug!(
            profile = name,
            format = target.format.name(),
            converted = target.convert.map(|mode| mode.name()),
            "optimized picture"
        );
        Ok(Some(target.format))
    }

    /// The image palette extraction should look at: the original first frame
    /// for static pictures, the first frame in the animated editor's actual
    /// mode otherwise.
    pub fn color_clustering_image(&self) -> Cow<'a, DynamicImage> {
        match (&self.editor, self.category()) {
            (Some(Editor::Animated(editor)), _) => editor.first_frame_in_actual_mode(),
            (_, Category::Animated) => {
                crate::engine::AnimatedEditor::new(self.picture).first_frame_in_actual_mode()
            }
            (_, Category::Static) => Cow::Borrowed(self.picture.first_frame()),
        }
    }

    /// The profile's editor, created on first use.
    pub fn editor(&mut self) -> &mut Editor<'a> {
        let picture = self.picture;
        let animated = self.category() == Category::Animated;
        self.editor
            .get_or_insert_with(|| Editor::new(picture, animated))
    }

    pub fn into_editor(self) -> Editor<'a> {
        let animated = self.category() == Category::Animated;
        self.editor
            .unwrap_or_else(|| Editor::new(self.picture, animated))
    }
}

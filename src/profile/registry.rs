// src/profile/registry.rs

use super::rules::{Category, ProfileKind};
use std::collections::HashMap;

/// Profiles registered per category, keyed by `<FORMAT>_<MODE>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportedProfiles {
    static_profiles: HashMap<&'static str, ProfileKind>,
    animated_profiles: HashMap<&'static str, ProfileKind>,
}

impl SupportedProfiles {
    pub fn empty() -> Self {
        Self {
            static_profiles: HashMap::new(),
            animated_profiles: HashMap::new(),
        }
    }

    /// Register a profile under its category and key, replacing any previous one.
    pub fn register(&mut self, kind: ProfileKind) -> &mut Self {
        self.table_mut(kind.category()).insert(kind.key(), kind);
        self
    }

    pub fn lookup(&self, category: Category, key: &str) -> Option<ProfileKind> {
        self.table(category).get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.static_profiles.len() + self.animated_profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, category: Category) -> &HashMap<&'static str, ProfileKind> {
        match category {
            Category::Static => &self.static_profiles,
            Category::Animated => &self.animated_profiles,
        }
    }

    fn table_mut(&mut self, category: Category) -> &mut HashMap<&'static str, ProfileKind> {
        match category {
            Category::Static => &mut self.static_profiles,
            Category::Animated => &mut self.animated_profiles,
        }
    }
}

impl Default for SupportedProfiles {
    fn default() -> Self {
        let mut supported = Self::empty();
        for kind in ProfileKind::ALL {
            supported.register(kind);
        }
        supported
    }
}

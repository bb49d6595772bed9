//! Language Resolver
//!
//! Static lookup table from file extensions to content types, and from
//! content types to each widget family's mode id.

use std::collections::HashMap;

use super::schema::{ContentType, LanguageDef, LanguageEntry, LanguageFile};
use crate::device::DeviceProfile;
use crate::widget::WidgetFamily;

/// Plain-text mode id of the compact widget
pub const COMPACT_PLAIN_TEXT_MODE: &str = "text/plain";
/// Plain-text mode id of the full widget
pub const FULL_PLAIN_TEXT_MODE: &str = "plaintext";

/// Language table with extension and content type indexes
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    entries: Vec<LanguageEntry>,
    by_extension: HashMap<String, usize>,
    by_content_type: HashMap<ContentType, usize>,
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageResolver {
    /// Empty table: every path resolves to plain text
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_extension: HashMap::new(),
            by_content_type: HashMap::new(),
        }
    }

    /// Table built from the embedded language definitions
    pub fn builtin() -> Self {
        let mut resolver = Self::new();
        resolver.add_embedded_languages();
        resolver
    }

    /// Table built from the embedded definitions plus user overrides
    pub fn with_overrides(overrides: impl IntoIterator<Item = LanguageDef>) -> Self {
        let mut resolver = Self::builtin();
        for def in overrides {
            resolver.add_entry(LanguageEntry::from(def));
        }
        resolver
    }

    /// Add or replace an entry. Later entries win for shared extensions.
    pub fn add_entry(&mut self, entry: LanguageEntry) {
        let index = match self.by_content_type.get(&entry.content_type) {
            Some(&existing) => {
                for ext in &self.entries[existing].extensions {
                    if self.by_extension.get(ext) == Some(&existing) {
                        self.by_extension.remove(ext);
                    }
                }
                self.entries[existing] = entry;
                existing
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };

        let entry = &self.entries[index];
        for ext in &entry.extensions {
            self.by_extension.insert(ext.clone(), index);
        }
        self.by_content_type
            .insert(entry.content_type.clone(), index);
    }

    fn add_embedded_languages(&mut self) {
        let embedded_toml = include_str!("../../resources/languages.toml");

        match toml::from_str::<LanguageFile>(embedded_toml) {
            Ok(file) => {
                for def in file.languages {
                    self.add_entry(LanguageEntry::from(def));
                }
            }
            Err(e) => {
                log::warn!(
                    "Failed to parse embedded language table: {}. Using plain text only.",
                    e
                );
                self.add_entry(LanguageEntry {
                    extensions: vec!["txt".to_string()],
                    content_type: ContentType::plain_text(),
                    compact_mode_id: COMPACT_PLAIN_TEXT_MODE.to_string(),
                    full_mode_id: FULL_PLAIN_TEXT_MODE.to_string(),
                    display_name: "Plain Text".to_string(),
                });
            }
        }
    }

    /// Content type for a file path, plain text when unknown
    pub fn resolve_from_path(&self, path: &str) -> ContentType {
        extension_of(path)
            .and_then(|ext| self.by_extension.get(&ext))
            .map(|&index| self.entries[index].content_type.clone())
            .unwrap_or_default()
    }

    /// Mode id for the widget family selected by `profile`
    pub fn to_editor_mode_id(&self, content_type: &ContentType, profile: DeviceProfile) -> &str {
        self.mode_id_for(content_type, WidgetFamily::for_profile(profile))
    }

    /// Mode id in the vocabulary of `family`
    pub fn mode_id_for(&self, content_type: &ContentType, family: WidgetFamily) -> &str {
        match (self.entry(content_type), family) {
            (Some(entry), WidgetFamily::Compact) => &entry.compact_mode_id,
            (Some(entry), WidgetFamily::Full) => &entry.full_mode_id,
            (None, WidgetFamily::Compact) => COMPACT_PLAIN_TEXT_MODE,
            (None, WidgetFamily::Full) => FULL_PLAIN_TEXT_MODE,
        }
    }

    pub fn entry(&self, content_type: &ContentType) -> Option<&LanguageEntry> {
        self.by_content_type
            .get(content_type)
            .map(|&index| &self.entries[index])
    }

    /// Entries in table order, for the language selector
    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn display_name(&self, content_type: &ContentType) -> String {
        self.entry(content_type)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| content_type.to_string())
    }

    pub fn is_known(&self, content_type: &ContentType) -> bool {
        self.by_content_type.contains_key(content_type)
    }
}

/// Lower-cased text after the last `.` of the final path segment.
///
/// A name without a dot is its own extension (`Dockerfile`).
fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => file_name,
    };
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

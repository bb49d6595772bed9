//! Language Table Schema
//!
//! Types for language definitions, as read from TOML and as held at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical, widget-agnostic identifier for a file's language
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(String);

impl ContentType {
    pub const PLAIN_TEXT: &'static str = "plaintext";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn plain_text() -> Self {
        Self(Self::PLAIN_TEXT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_plain_text(&self) -> bool {
        self.0 == Self::PLAIN_TEXT
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::plain_text()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Root language file structure (matches TOML)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LanguageFile {
    #[serde(default)]
    pub languages: Vec<LanguageDef>,
}

/// One `[[languages]]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LanguageDef {
    pub content_type: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    pub compact_mode: String,
    pub full_mode: String,
    pub display_name: Option<String>,
}

/// Runtime language table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageEntry {
    pub extensions: Vec<String>,
    pub content_type: ContentType,
    pub compact_mode_id: String,
    pub full_mode_id: String,
    pub display_name: String,
}

impl From<LanguageDef> for LanguageEntry {
    fn from(def: LanguageDef) -> Self {
        let display_name = def
            .display_name
            .unwrap_or_else(|| def.content_type.clone());

        Self {
            extensions: def
                .extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            content_type: ContentType::new(&def.content_type),
            compact_mode_id: def.compact_mode,
            full_mode_id: def.full_mode,
            display_name,
        }
    }
}

//! Language Resolution
//!
//! Maps file paths to content types and content types to widget mode ids.

pub mod registry;
pub mod schema;

pub use registry::{COMPACT_PLAIN_TEXT_MODE, FULL_PLAIN_TEXT_MODE, LanguageResolver};
pub use schema::{ContentType, LanguageDef, LanguageEntry, LanguageFile};

//! Error taxonomy for the editor subsystem.

use thiserror::Error;

use crate::assets::AssetError;
use crate::persistence::PersistenceError;
use crate::widget::WidgetFamily;

/// Errors surfaced by the loader and content controller.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to load file contents: {0}")]
    LoadFailure(#[source] PersistenceError),

    #[error("Failed to save file contents: {0}")]
    SaveFailure(#[source] PersistenceError),

    #[error("Failed to load the {family} editor runtime: {source}")]
    AssetLoad {
        family: WidgetFamily,
        #[source]
        source: AssetError,
    },

    #[error("No language support available for '{content_type}': {source}")]
    UnsupportedLanguageExtension {
        content_type: String,
        #[source]
        source: AssetError,
    },

    #[error("Editor session is not ready")]
    SessionNotReady,

    #[error("A file name is required before saving")]
    FileNameRequired,

    #[error("The {0} editor cannot switch language on a live instance")]
    LanguageRequiresReload(WidgetFamily),

    #[error("Container surface is already occupied by another editor")]
    SurfaceOccupied,
}

impl EditorError {
    /// Message suitable for the flash channel.
    pub fn to_human(&self) -> String {
        match self {
            EditorError::LoadFailure(e) | EditorError::SaveFailure(e) => e.to_human(),
            other => other.to_string(),
        }
    }
}

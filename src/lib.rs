//! Panel Editor
//!
//! The adaptive code editor behind a game-server panel's file view.
//!
//! This library provides:
//! - Language resolution from file paths to editor modes
//! - Device classification with resize coalescing
//! - A single adapter over the full and compact widget families
//! - The loader that owns editor lifecycle, reloads and teardown
//! - Document load/save through a persistence gateway
//! - Configuration management

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod assets;
pub mod config;
pub mod content;
pub mod device;
pub mod editor;
pub mod error;
pub mod host;
pub mod keyboard;
pub mod language;
pub mod page;
pub mod persistence;
pub mod widget;

// Re-exports for clean public API
pub use config::Config;
pub use content::{ContentController, Document};
pub use device::{DeviceClassifier, DeviceProfile, Viewport};
pub use editor::{Adapter, EditorAdapter, EditorLoader, LoadOutcome, SessionState};
pub use error::EditorError;
pub use language::{ContentType, LanguageResolver};
pub use page::{EditorPage, PageAction};

/// Locks ignoring poison; no state here is left half-written by a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

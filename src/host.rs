//! Page Collaborators
//!
//! Ports for the parts of the surrounding page this subsystem talks to but
//! does not own: flash messages, navigation, the file browser and the
//! filename prompt.

use std::sync::Mutex;

use crate::lock;

/// Flash key used for file view messages
pub const FILES_VIEW_FLASH_KEY: &str = "files:view";

/// User-visible error messages
pub trait FlashChannel: Send + Sync {
    fn clear(&self, key: &str);
    fn add_error(&self, key: &str, message: &str);
}

/// Client-side router
pub trait Navigator: Send + Sync {
    fn push(&self, url: &str);
}

/// File browser state shared with the listing view
pub trait FileBrowser: Send + Sync {
    fn set_directory(&self, directory: &str);
}

/// The dialog asking for a new file's name
pub trait FileNamePrompt: Send + Sync {
    fn request_name(&self);
}

/// Flash channel that writes to the log
#[derive(Debug, Default)]
pub struct LogFlash;

impl FlashChannel for LogFlash {
    fn clear(&self, key: &str) {
        log::trace!("[{}] flashes cleared", key);
    }

    fn add_error(&self, key: &str, message: &str) {
        log::error!("[{}] {}", key, message);
    }
}

/// Keeps the latest location and directory in memory
#[derive(Debug, Default)]
pub struct MemoryLocation {
    url: Mutex<Option<String>>,
    directory: Mutex<Option<String>>,
    prompts: Mutex<usize>,
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(&self) -> Option<String> {
        lock(&self.url).clone()
    }

    pub fn directory(&self) -> Option<String> {
        lock(&self.directory).clone()
    }

    /// How often the filename prompt was requested
    pub fn prompts(&self) -> usize {
        *lock(&self.prompts)
    }
}

impl Navigator for MemoryLocation {
    fn push(&self, url: &str) {
        log::info!("Navigating to {}", url);
        *lock(&self.url) = Some(url.to_string());
    }
}

impl FileBrowser for MemoryLocation {
    fn set_directory(&self, directory: &str) {
        *lock(&self.directory) = Some(directory.to_string());
    }
}

impl FileNamePrompt for MemoryLocation {
    fn request_name(&self) {
        log::info!("A file name is required before saving");
        *lock(&self.prompts) += 1;
    }
}

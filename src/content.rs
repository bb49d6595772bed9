//! Content Controller
//!
//! Owns the open document, keeps it in sync with the live adapter and runs
//! the load/save round trips through the persistence gateway.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::editor::{EditorAdapter, EditorLoader};
use crate::error::EditorError;
use crate::host::{FILES_VIEW_FLASH_KEY, FileBrowser, FlashChannel, Navigator};
use crate::language::{ContentType, LanguageResolver};
use crate::lock;
use crate::persistence::PersistenceGateway;

/// The file being viewed or created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Absolute path inside the server, empty for an unnamed new file
    pub path: String,
    pub content: String,
    pub language: ContentType,
    pub is_new: bool,
}

/// Collaborators the controller reports to
#[derive(Clone)]
pub struct ContentPorts {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub flash: Arc<dyn FlashChannel>,
    pub navigator: Arc<dyn Navigator>,
    pub file_browser: Arc<dyn FileBrowser>,
}

pub struct ContentController {
    server_id: String,
    resolver: Arc<LanguageResolver>,
    ports: ContentPorts,
    document: Mutex<Document>,
    /// Content as last loaded from or written to the server
    persisted: Mutex<Option<String>>,
    in_flight: AtomicUsize,
}

/// Clears the loading flag when the operation ends, on every path
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContentController {
    pub fn new(
        server_id: impl Into<String>,
        resolver: Arc<LanguageResolver>,
        ports: ContentPorts,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            resolver,
            ports,
            document: Mutex::new(Document {
                is_new: true,
                ..Default::default()
            }),
            persisted: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn document(&self) -> Document {
        lock(&self.document).clone()
    }

    pub fn content_type(&self) -> ContentType {
        lock(&self.document).language.clone()
    }

    pub fn is_new(&self) -> bool {
        lock(&self.document).is_new
    }

    /// A load or save is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The document differs from what the server last confirmed
    pub fn is_dirty(&self) -> bool {
        let content = lock(&self.document).content.clone();
        match lock(&self.persisted).as_deref() {
            Some(persisted) => persisted != content,
            None => !content.is_empty(),
        }
    }

    /// Switch to an existing file; its contents still need to be loaded
    pub fn open(&self, path: &str) -> ContentType {
        let path = absolute_path(path);
        let language = self.resolver.resolve_from_path(&path);
        log::debug!("Opening {} as {}", path, language);

        *lock(&self.document) = Document {
            path: path.clone(),
            content: String::new(),
            language: language.clone(),
            is_new: false,
        };
        *lock(&self.persisted) = None;
        self.ports.file_browser.set_directory(&parent_directory(&path));
        language
    }

    /// Start an unnamed, empty file
    pub fn new_document(&self) {
        *lock(&self.document) = Document {
            is_new: true,
            ..Default::default()
        };
        *lock(&self.persisted) = None;
    }

    /// Language chosen in the selector
    pub fn set_language(&self, language: ContentType) {
        lock(&self.document).language = language;
    }

    /// Called for every user edit reported by the adapter
    pub fn record_edit(&self, value: &str) {
        let mut document = lock(&self.document);
        if document.content != value {
            document.content = value.to_string();
        }
    }

    /// Fetch the document's contents from the server.
    ///
    /// A live session receives the text through `set_value`; otherwise it
    /// becomes the initial value of the next session.
    pub async fn load(&self, loader: &EditorLoader) -> Result<(), EditorError> {
        let (path, is_new) = {
            let document = lock(&self.document);
            (document.path.clone(), document.is_new)
        };
        if is_new {
            return Ok(());
        }

        let _loading = LoadingGuard::start(&self.in_flight);
        self.ports.flash.clear(FILES_VIEW_FLASH_KEY);

        match self
            .ports
            .gateway
            .load_file(&self.server_id, api_path(&path))
            .await
        {
            Ok(content) => {
                {
                    let mut document = lock(&self.document);
                    if document.path != path || document.is_new {
                        log::debug!("Discarding contents of {}, document changed", path);
                        return Ok(());
                    }
                    document.content = content.clone();
                }
                *lock(&self.persisted) = Some(content.clone());

                if let Some(adapter) = loader.adapter() {
                    if adapter.get_value() != content {
                        adapter.set_value(&content);
                    }
                }
                log::info!("Loaded {} ({} bytes)", path, content.len());
                Ok(())
            }
            Err(source) => {
                let err = EditorError::LoadFailure(source);
                log::error!("Failed to load {}: {}", path, err);
                self.ports
                    .flash
                    .add_error(FILES_VIEW_FLASH_KEY, &err.to_human());
                Err(err)
            }
        }
    }

    /// Persist the adapter's current text.
    ///
    /// With `name`, saves under that path instead and moves the page to it.
    pub async fn save(&self, loader: &EditorLoader, name: Option<&str>) -> Result<(), EditorError> {
        let adapter = loader.adapter().ok_or(EditorError::SessionNotReady)?;
        let value = adapter.get_value();
        let target = match name {
            Some(name) => absolute_path(name),
            None => lock(&self.document).path.clone(),
        };
        if api_path(&target).is_empty() {
            return Err(EditorError::FileNameRequired);
        }

        let _loading = LoadingGuard::start(&self.in_flight);
        self.ports.flash.clear(FILES_VIEW_FLASH_KEY);

        let result = self
            .ports
            .gateway
            .save_file(&self.server_id, api_path(&target), &value)
            .await;

        if let Err(source) = result {
            let err = EditorError::SaveFailure(source);
            log::error!("Failed to save {}: {}", target, err);
            self.ports
                .flash
                .add_error(FILES_VIEW_FLASH_KEY, &err.to_human());
            return Err(err);
        }

        log::info!("Saved {} ({} bytes)", target, value.len());
        let language = name.map(|_| self.resolver.resolve_from_path(&target));
        {
            let mut document = lock(&self.document);
            document.content = value.clone();
            if let Some(language) = language {
                document.path = target.clone();
                document.language = language;
                document.is_new = false;
            }
        }
        *lock(&self.persisted) = Some(value);

        if name.is_some() {
            self.ports.navigator.push(&self.edit_url(&target));
            self.ports
                .file_browser
                .set_directory(&parent_directory(&target));
        }
        Ok(())
    }

    /// Route of the edit view for `path`
    pub fn edit_url(&self, path: &str) -> String {
        format!(
            "/server/{}/files/edit#/{}",
            self.server_id,
            encode_path_segments(api_path(path))
        )
    }
}

/// Path with exactly one leading slash
pub fn absolute_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

/// Path as the persistence API expects it, without the leading slash
pub fn api_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Directory containing `path`, `/` for top-level files
pub fn parent_directory(path: &str) -> String {
    match absolute_path(path).rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => "/".to_string(),
    }
}

/// Percent-encode each segment, keeping the separators
pub fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

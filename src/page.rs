//! Editor Page
//!
//! Orchestration boundary driven by the UI: routes, resizes, the language
//! selector, keyboard shortcuts, the save/create buttons and teardown.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::assets::AssetProvider;
use crate::content::{ContentController, ContentPorts, Document};
use crate::device::{DeviceClassifier, ResizeCoalescer, Viewport};
use crate::editor::{
    EditorAdapter, EditorLoader, LoadOutcome, SessionHost, SessionInfo, SessionState, WidgetSettings,
};
use crate::error::EditorError;
use crate::host::FileNamePrompt;
use crate::keyboard::KeyEvent;
use crate::language::{ContentType, LanguageResolver};
use crate::lock;

/// Which view the route asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    /// Create a new, unnamed file
    New,
    /// Edit the file at this path
    Edit(String),
}

/// Work queued by keyboard listeners for the page to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Save,
    PromptForName,
}

/// Static inputs of a page instance
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub server_id: String,
    pub classifier: DeviceClassifier,
    pub user_agent: String,
    pub viewport: Viewport,
    pub settings: WidgetSettings,
}

/// Session host handed to the loader
struct PageHost {
    content: Arc<ContentController>,
    commands: mpsc::UnboundedSender<PageCommand>,
}

impl SessionHost for PageHost {
    fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    fn initial_value(&self) -> String {
        self.content.document().content
    }

    fn on_user_edit(&self, value: &str) {
        self.content.record_edit(value);
    }

    fn on_save_shortcut(&self) {
        let command = if self.content.is_new() {
            PageCommand::PromptForName
        } else {
            PageCommand::Save
        };
        if self.commands.send(command).is_err() {
            log::warn!("Save shortcut ignored, page is gone");
        }
    }
}

pub struct EditorPage {
    content: Arc<ContentController>,
    loader: EditorLoader,
    resolver: Arc<LanguageResolver>,
    resize: Mutex<ResizeCoalescer>,
    prompt: Arc<dyn FileNamePrompt>,
    commands: Mutex<mpsc::UnboundedReceiver<PageCommand>>,
}

impl EditorPage {
    pub fn new(
        options: PageOptions,
        resolver: Arc<LanguageResolver>,
        assets: Arc<dyn AssetProvider>,
        ports: ContentPorts,
        prompt: Arc<dyn FileNamePrompt>,
    ) -> Self {
        let content = Arc::new(ContentController::new(
            options.server_id,
            resolver.clone(),
            ports,
        ));
        let resize = ResizeCoalescer::new(options.classifier, options.user_agent, options.viewport);
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::new(PageHost {
            content: content.clone(),
            commands: tx,
        });
        let loader = EditorLoader::new(assets, resolver.clone(), host, resize.profile())
            .with_settings(options.settings);

        Self {
            content,
            loader,
            resolver,
            resize: Mutex::new(resize),
            prompt,
            commands: Mutex::new(rx),
        }
    }

    pub fn content(&self) -> &ContentController {
        &self.content
    }

    pub fn loader(&self) -> &EditorLoader {
        &self.loader
    }

    pub fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    pub fn document(&self) -> Document {
        self.content.document()
    }

    pub fn session(&self) -> SessionInfo {
        self.loader.info()
    }

    /// Spinner visibility: a file round trip or an editor load is running
    pub fn is_loading(&self) -> bool {
        self.content.is_loading() || self.loader.state() == SessionState::Loading
    }

    /// The container surface exists; bring up the editor
    pub async fn mount(&self) -> Result<LoadOutcome, EditorError> {
        self.loader.load().await
    }

    /// Apply a route change
    pub async fn open(&self, action: PageAction) -> Result<(), EditorError> {
        match action {
            PageAction::New => {
                self.content.new_document();
                self.loader.sync_language().await?;
                if let Some(adapter) = self.loader.adapter() {
                    adapter.set_value("");
                }
                Ok(())
            }
            PageAction::Edit(path) => {
                self.content.open(&path);
                self.loader.sync_language().await?;
                self.content.load(&self.loader).await
            }
        }
    }

    pub fn resize(&self, viewport: Viewport) {
        lock(&self.resize).on_resize(viewport);
    }

    /// Re-classify once per frame and reload the editor if the profile flipped
    pub async fn animation_frame(&self) -> Result<LoadOutcome, EditorError> {
        let changed = lock(&self.resize).on_animation_frame();
        match changed {
            Some(profile) => self.loader.change_profile(profile).await,
            None => Ok(LoadOutcome::Unchanged),
        }
    }

    /// Language picked in the selector
    pub async fn select_language(&self, language: ContentType) -> Result<LoadOutcome, EditorError> {
        log::debug!("Language selector set to {}", language);
        self.content.set_language(language);
        self.loader.sync_language().await
    }

    /// Deliver a key press to the document-level listeners
    pub async fn handle_key(&self, event: &mut KeyEvent) -> Result<(), EditorError> {
        self.loader.keyboard().dispatch(event);
        self.process_commands().await
    }

    /// Run everything keyboard listeners queued
    pub async fn process_commands(&self) -> Result<(), EditorError> {
        let mut result = Ok(());
        while let Some(command) = self.next_command() {
            let outcome = match command {
                PageCommand::Save => self.content.save(&self.loader, None).await,
                PageCommand::PromptForName => {
                    self.prompt.request_name();
                    Ok(())
                }
            };
            if let Err(err) = outcome {
                result = Err(err);
            }
        }
        result
    }

    fn next_command(&self) -> Option<PageCommand> {
        lock(&self.commands).try_recv().ok()
    }

    /// The "Save Content" / "Create File" button
    pub async fn save_clicked(&self) -> Result<(), EditorError> {
        if self.content.is_new() {
            self.prompt.request_name();
            return Ok(());
        }
        self.content.save(&self.loader, None).await
    }

    /// The filename prompt was confirmed
    pub async fn file_named(&self, name: &str) -> Result<(), EditorError> {
        self.content.save(&self.loader, Some(name)).await?;
        self.loader.sync_language().await?;
        Ok(())
    }

    /// The error affordance shown when the runtime failed to load
    pub async fn retry(&self) -> Result<LoadOutcome, EditorError> {
        self.loader.retry().await
    }

    pub fn teardown(&self) {
        self.loader.teardown();
    }
}

impl Drop for EditorPage {
    fn drop(&mut self) {
        self.loader.teardown();
    }
}

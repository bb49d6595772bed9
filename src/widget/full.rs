//! Full Widget
//!
//! Desktop-class editing engine. Owns a text model whose language can be
//! rebound while the widget is live.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::{ContainerSurface, ListenerId, Listeners, MountToken, TextEdit, WidgetFamily, apply_edit};
use crate::error::EditorError;
use crate::lock;

/// Construction options of the full widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullOptions {
    pub value: String,
    pub language: String,
    pub theme: String,
    pub automatic_layout: bool,
    pub minimap: bool,
    pub font_size: u16,
    pub word_wrap: bool,
    pub scroll_beyond_last_line: bool,
}

impl Default for FullOptions {
    fn default() -> Self {
        Self {
            value: String::new(),
            language: "plaintext".to_string(),
            theme: "vs-dark".to_string(),
            automatic_layout: true,
            minimap: true,
            font_size: 14,
            word_wrap: true,
            scroll_beyond_last_line: false,
        }
    }
}

/// Event fired after the model content changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelContentChange {
    pub version_id: u64,
    /// The whole model was replaced through `set_value`
    pub is_flush: bool,
    pub value: String,
}

/// Loaded runtime of the full widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullRuntime {
    pub source_url: String,
}

impl FullRuntime {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }

    /// Create a widget inside `surface`
    pub fn create(
        &self,
        surface: &ContainerSurface,
        options: FullOptions,
    ) -> Result<FullWidget, EditorError> {
        let mount = surface.mount(WidgetFamily::Full)?;
        log::debug!(
            "Created full widget (language '{}', theme '{}')",
            options.language,
            options.theme
        );
        Ok(FullWidget {
            state: Arc::new(Mutex::new(FullState {
                value: options.value.clone(),
                language: options.language.clone(),
                version_id: 1,
                options,
                listeners: Listeners::default(),
                mount: Some(mount),
            })),
        })
    }
}

struct FullState {
    value: String,
    language: String,
    version_id: u64,
    options: FullOptions,
    listeners: Listeners<ModelContentChange>,
    mount: Option<MountToken>,
}

/// A live full widget instance
#[derive(Clone)]
pub struct FullWidget {
    state: Arc<Mutex<FullState>>,
}

impl std::fmt::Debug for FullWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("FullWidget")
            .field("language", &state.language)
            .field("version_id", &state.version_id)
            .field("disposed", &state.mount.is_none())
            .finish()
    }
}

impl FullWidget {
    pub fn get_value(&self) -> String {
        lock(&self.state).value.clone()
    }

    /// Replace the whole model; listeners see a flush event
    pub fn set_value(&self, value: &str) {
        self.mutate(true, |buffer| {
            buffer.clear();
            buffer.push_str(value);
        });
    }

    /// Apply a batch of user edits as one change event
    pub fn execute_edits(&self, edits: &[TextEdit]) {
        if edits.is_empty() {
            return;
        }
        self.mutate(false, |buffer| {
            for edit in edits {
                apply_edit(buffer, edit);
            }
        });
    }

    fn mutate(&self, is_flush: bool, apply: impl FnOnce(&mut String)) {
        let (event, listeners) = {
            let mut state = lock(&self.state);
            if state.mount.is_none() {
                return;
            }
            apply(&mut state.value);
            state.version_id += 1;
            let event = ModelContentChange {
                version_id: state.version_id,
                is_flush,
                value: state.value.clone(),
            };
            (event, state.listeners.snapshot())
        };

        for listener in listeners {
            listener(&event);
        }
    }

    pub fn on_did_change_model_content(
        &self,
        listener: impl Fn(&ModelContentChange) + Send + Sync + 'static,
    ) -> ListenerId {
        lock(&self.state).listeners.add(Arc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        lock(&self.state).listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn language(&self) -> String {
        lock(&self.state).language.clone()
    }

    /// Rebind the model language in place
    pub fn set_model_language(&self, language: &str) {
        let mut state = lock(&self.state);
        if state.language != language {
            log::debug!("Full widget language {} -> {}", state.language, language);
            state.language = language.to_string();
        }
    }

    pub fn options(&self) -> FullOptions {
        lock(&self.state).options.clone()
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.state).mount.is_none()
    }

    /// Detach listeners and vacate the surface
    pub fn dispose(&self) {
        let mount = {
            let mut state = lock(&self.state);
            state.listeners.clear();
            state.mount.take()
        };
        if let Some(mount) = mount {
            mount.release();
        }
    }
}

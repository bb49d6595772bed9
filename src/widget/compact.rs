//! Compact Widget
//!
//! Lightweight editing engine for constrained devices. Language support is
//! bound when the widget is constructed and cannot be changed afterwards.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::{ContainerSurface, ListenerId, Listeners, MountToken, TextEdit, WidgetFamily, apply_edit};
use crate::error::EditorError;
use crate::language::ContentType;
use crate::lock;

/// Syntax support extension loaded for one content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageSupport {
    pub content_type: ContentType,
    pub source_url: String,
}

/// Construction options of the compact widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactOptions {
    pub value: String,
    pub mode: String,
    pub theme: String,
    pub line_numbers: bool,
    pub indent_unit: u8,
    pub tab_size: u8,
    pub indent_with_tabs: bool,
    pub auto_close_brackets: bool,
    pub match_brackets: bool,
    #[serde(skip)]
    pub language_support: Option<LanguageSupport>,
}

impl Default for CompactOptions {
    fn default() -> Self {
        Self {
            value: String::new(),
            mode: "text/plain".to_string(),
            theme: "darcula".to_string(),
            line_numbers: true,
            indent_unit: 4,
            tab_size: 4,
            indent_with_tabs: false,
            auto_close_brackets: true,
            match_brackets: true,
            language_support: None,
        }
    }
}

/// Where a change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Input,
    Paste,
    SetValue,
}

/// Event fired after the document changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactChange {
    pub origin: ChangeOrigin,
    pub value: String,
}

/// Loaded runtime of the compact widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactRuntime {
    pub source_url: String,
}

impl CompactRuntime {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }

    /// Construct a widget inside `surface`
    pub fn construct(
        &self,
        surface: &ContainerSurface,
        options: CompactOptions,
    ) -> Result<CompactWidget, EditorError> {
        let mount = surface.mount(WidgetFamily::Compact)?;
        log::debug!(
            "Constructed compact widget (mode '{}', highlighting {})",
            options.mode,
            if options.language_support.is_some() { "on" } else { "off" }
        );
        Ok(CompactWidget {
            state: Arc::new(Mutex::new(CompactState {
                value: options.value.clone(),
                options,
                listeners: Listeners::default(),
                mount: Some(mount),
            })),
        })
    }
}

struct CompactState {
    value: String,
    options: CompactOptions,
    listeners: Listeners<CompactChange>,
    mount: Option<MountToken>,
}

/// A live compact widget instance
#[derive(Clone)]
pub struct CompactWidget {
    state: Arc<Mutex<CompactState>>,
}

impl std::fmt::Debug for CompactWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("CompactWidget")
            .field("mode", &state.options.mode)
            .field("disposed", &state.mount.is_none())
            .finish()
    }
}

impl CompactWidget {
    pub fn get_value(&self) -> String {
        lock(&self.state).value.clone()
    }

    /// Replace the document; listeners see a `SetValue` change
    pub fn set_value(&self, value: &str) {
        self.change(ChangeOrigin::SetValue, |buffer| {
            buffer.clear();
            buffer.push_str(value);
        });
    }

    /// Apply a batch of edits as one change event
    pub fn apply_edits(&self, origin: ChangeOrigin, edits: &[TextEdit]) {
        if edits.is_empty() {
            return;
        }
        self.change(origin, |buffer| {
            for edit in edits {
                apply_edit(buffer, edit);
            }
        });
    }

    fn change(&self, origin: ChangeOrigin, apply: impl FnOnce(&mut String)) {
        let (event, listeners) = {
            let mut state = lock(&self.state);
            if state.mount.is_none() {
                return;
            }
            apply(&mut state.value);
            let event = CompactChange {
                origin,
                value: state.value.clone(),
            };
            (event, state.listeners.snapshot())
        };

        for listener in listeners {
            listener(&event);
        }
    }

    pub fn on_change(&self, listener: impl Fn(&CompactChange) + Send + Sync + 'static) -> ListenerId {
        lock(&self.state).listeners.add(Arc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        lock(&self.state).listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn mode(&self) -> String {
        lock(&self.state).options.mode.clone()
    }

    pub fn language_support(&self) -> Option<LanguageSupport> {
        lock(&self.state).options.language_support.clone()
    }

    pub fn options(&self) -> CompactOptions {
        lock(&self.state).options.clone()
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.state).mount.is_none()
    }

    /// Tear the widget down and hand back its final text
    pub fn to_text_area(&self) -> String {
        let (value, mount) = {
            let mut state = lock(&self.state);
            state.listeners.clear();
            (state.value.clone(), state.mount.take())
        };
        if let Some(mount) = mount {
            mount.release();
        }
        value
    }
}

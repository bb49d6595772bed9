//! Keyboard Surface
//!
//! Process-wide key listener list, the equivalent of a document-level
//! `keydown` handler. Registrations are removed when dropped.

use std::sync::{Arc, Mutex};

use crate::lock;

/// A key press delivered to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
            default_prevented: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Parse a chord such as `ctrl+s` or `cmd+shift+s`
    pub fn parse(chord: &str) -> Option<Self> {
        let mut parts: Vec<&str> = chord.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty())?;
        let mut event = KeyEvent::new(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => event.ctrl = true,
                "cmd" | "meta" | "super" => event.meta = true,
                "shift" => event.shift = true,
                "alt" | "option" => event.alt = true,
                _ => return None,
            }
        }
        Some(event)
    }

    /// Ctrl+S or Cmd+S
    pub fn is_save_chord(&self) -> bool {
        (self.ctrl || self.meta) && self.key.eq_ignore_ascii_case("s")
    }

    /// Suppress the browser's native handling (e.g. the save dialog)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type KeyListener = Arc<dyn Fn(&mut KeyEvent) + Send + Sync>;

#[derive(Default)]
struct KeyboardState {
    next_id: u64,
    listeners: Vec<(u64, KeyListener)>,
}

/// Shared list of key listeners
#[derive(Clone, Default)]
pub struct KeyboardSurface {
    state: Arc<Mutex<KeyboardState>>,
}

impl std::fmt::Debug for KeyboardSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardSurface")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl KeyboardSurface {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the listener is removed when the registration is dropped"]
    pub fn add_listener(
        &self,
        listener: impl Fn(&mut KeyEvent) + Send + Sync + 'static,
    ) -> KeyRegistration {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.push((id, Arc::new(listener)));
        KeyRegistration {
            surface: self.clone(),
            id,
        }
    }

    /// Deliver an event to every listener in registration order
    pub fn dispatch(&self, event: &mut KeyEvent) {
        let listeners: Vec<KeyListener> = lock(&self.state)
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    fn remove(&self, id: u64) {
        lock(&self.state).listeners.retain(|(entry, _)| *entry != id);
    }
}

/// Keeps a key listener attached until dropped
#[derive(Debug)]
pub struct KeyRegistration {
    surface: KeyboardSurface,
    id: u64,
}

impl Drop for KeyRegistration {
    fn drop(&mut self) {
        self.surface.remove(self.id);
    }
}

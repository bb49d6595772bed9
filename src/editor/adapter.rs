//! Editor Adapters
//!
//! One capability set over both widget families. Callers pick the variant
//! once at construction and never branch on widget identity afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EditorError;
use crate::widget::{ChangeOrigin, CompactWidget, FullWidget, WidgetFamily};

/// Called with the new document value after a user edit
pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Keeps an `on_change` callback attached until dropped
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach now rather than on drop
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Capability interface implemented once per widget family
pub trait EditorAdapter: Send + Sync {
    fn family(&self) -> WidgetFamily;

    fn get_value(&self) -> String;

    /// Replace the text without reporting a change to `on_change` callbacks
    fn set_value(&self, text: &str);

    /// Fires once per user edit batch with the latest value
    fn on_change(&self, callback: ChangeCallback) -> Subscription;

    /// Switch the highlighting mode of the live instance.
    ///
    /// Families that bind language support at construction return
    /// [`EditorError::LanguageRequiresReload`]; the session must then be
    /// disposed and rebuilt.
    fn set_language(&self, mode_id: &str) -> Result<(), EditorError>;

    fn mode_id(&self) -> String;

    /// Release the widget and detach every listener. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// Adapter over the full widget
#[derive(Debug)]
pub struct FullAdapter {
    widget: FullWidget,
    disposed: AtomicBool,
}

impl FullAdapter {
    pub fn new(widget: FullWidget) -> Self {
        Self {
            widget,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn widget(&self) -> &FullWidget {
        &self.widget
    }
}

impl EditorAdapter for FullAdapter {
    fn family(&self) -> WidgetFamily {
        WidgetFamily::Full
    }

    fn get_value(&self) -> String {
        self.widget.get_value()
    }

    fn set_value(&self, text: &str) {
        self.widget.set_value(text);
    }

    fn on_change(&self, callback: ChangeCallback) -> Subscription {
        let id = self.widget.on_did_change_model_content(move |change| {
            // flushes come from set_value
            if !change.is_flush {
                callback(&change.value);
            }
        });
        let widget = self.widget.clone();
        Subscription::new(move || {
            widget.remove_listener(id);
        })
    }

    fn set_language(&self, mode_id: &str) -> Result<(), EditorError> {
        self.widget.set_model_language(mode_id);
        Ok(())
    }

    fn mode_id(&self) -> String {
        self.widget.language()
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.widget.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Adapter over the compact widget
#[derive(Debug)]
pub struct CompactAdapter {
    widget: CompactWidget,
    disposed: AtomicBool,
}

impl CompactAdapter {
    pub fn new(widget: CompactWidget) -> Self {
        Self {
            widget,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn widget(&self) -> &CompactWidget {
        &self.widget
    }
}

impl EditorAdapter for CompactAdapter {
    fn family(&self) -> WidgetFamily {
        WidgetFamily::Compact
    }

    fn get_value(&self) -> String {
        self.widget.get_value()
    }

    fn set_value(&self, text: &str) {
        self.widget.set_value(text);
    }

    fn on_change(&self, callback: ChangeCallback) -> Subscription {
        let id = self.widget.on_change(move |change| {
            if change.origin != ChangeOrigin::SetValue {
                callback(&change.value);
            }
        });
        let widget = self.widget.clone();
        Subscription::new(move || {
            widget.off(id);
        })
    }

    fn set_language(&self, mode_id: &str) -> Result<(), EditorError> {
        if self.widget.mode() == mode_id {
            return Ok(());
        }
        Err(EditorError::LanguageRequiresReload(WidgetFamily::Compact))
    }

    fn mode_id(&self) -> String {
        self.widget.mode()
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.widget.to_text_area();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// The adapter of a session, tagged by widget family
#[derive(Debug)]
pub enum Adapter {
    Full(FullAdapter),
    Compact(CompactAdapter),
}

impl Adapter {
    fn inner(&self) -> &dyn EditorAdapter {
        match self {
            Adapter::Full(adapter) => adapter,
            Adapter::Compact(adapter) => adapter,
        }
    }
}

impl EditorAdapter for Adapter {
    fn family(&self) -> WidgetFamily {
        self.inner().family()
    }

    fn get_value(&self) -> String {
        self.inner().get_value()
    }

    fn set_value(&self, text: &str) {
        self.inner().set_value(text)
    }

    fn on_change(&self, callback: ChangeCallback) -> Subscription {
        self.inner().on_change(callback)
    }

    fn set_language(&self, mode_id: &str) -> Result<(), EditorError> {
        self.inner().set_language(mode_id)
    }

    fn mode_id(&self) -> String {
        self.inner().mode_id()
    }

    fn dispose(&self) {
        self.inner().dispose()
    }

    fn is_disposed(&self) -> bool {
        self.inner().is_disposed()
    }
}

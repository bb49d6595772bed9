//! Session types shared by the loader and its host.

use std::fmt;

use serde::Serialize;

use crate::device::DeviceProfile;
use crate::language::ContentType;
use crate::widget::{CompactOptions, FullOptions, WidgetFamily};

/// Lifecycle of the editing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Unloaded,
    Loading,
    Ready,
    Disposed,
    /// The widget runtime could not be loaded
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unloaded => "unloaded",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Disposed => "disposed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a loader call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new session reached `Ready`
    Ready,
    AlreadyReady,
    /// Another load is in flight; this trigger was ignored
    AlreadyLoading,
    /// Recorded and applied once the in-flight load settles
    Queued,
    /// The live instance switched language in place
    Rebound,
    Unchanged,
    /// Torn down or replaced while loading; nothing was installed
    Superseded,
}

/// Callbacks from a live session into the page that owns the document
pub trait SessionHost: Send + Sync {
    /// Language the session should be built for
    fn content_type(&self) -> ContentType;

    /// Text a freshly constructed widget starts with
    fn initial_value(&self) -> String;

    /// A user edit changed the widget text
    fn on_user_edit(&self, value: &str);

    /// Ctrl/Cmd+S was pressed while the session is live
    fn on_save_shortcut(&self);
}

/// Construction defaults for each widget family
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetSettings {
    pub full: FullOptions,
    pub compact: CompactOptions,
}

/// Observable snapshot of the loader
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub state: SessionState,
    pub profile: DeviceProfile,
    pub generation: u64,
    pub family: Option<WidgetFamily>,
    pub mode_id: Option<String>,
    pub content_type: Option<ContentType>,
    pub last_error: Option<String>,
}

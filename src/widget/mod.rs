//! Widget Engines
//!
//! In-process editing engines standing in for the two third-party runtimes,
//! plus the container surface they mount into.

pub mod compact;
pub mod full;

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use serde::Serialize;

pub use compact::{ChangeOrigin, CompactChange, CompactOptions, CompactRuntime, CompactWidget, LanguageSupport};
pub use full::{FullOptions, FullRuntime, FullWidget, ModelContentChange};

use crate::device::DeviceProfile;
use crate::error::EditorError;
use crate::lock;

/// One of the two interchangeable editing engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetFamily {
    /// Full-featured editor for desktop-class devices
    Full,
    /// Lightweight editor for compact devices
    Compact,
}

impl WidgetFamily {
    pub fn for_profile(profile: DeviceProfile) -> Self {
        if profile.is_compact {
            WidgetFamily::Compact
        } else {
            WidgetFamily::Full
        }
    }
}

impl fmt::Display for WidgetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetFamily::Full => f.write_str("full"),
            WidgetFamily::Compact => f.write_str("compact"),
        }
    }
}

/// A loaded runtime able to construct widgets of its family
#[derive(Debug, Clone)]
pub enum WidgetRuntime {
    Full(FullRuntime),
    Compact(CompactRuntime),
}

impl WidgetRuntime {
    pub fn family(&self) -> WidgetFamily {
        match self {
            WidgetRuntime::Full(_) => WidgetFamily::Full,
            WidgetRuntime::Compact(_) => WidgetFamily::Compact,
        }
    }
}

/// A single text replacement, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub text: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Apply an edit, clamping offsets to the buffer and to char boundaries
pub(crate) fn apply_edit(buffer: &mut String, edit: &TextEdit) {
    let clamp = |mut offset: usize| {
        offset = offset.min(buffer.len());
        while !buffer.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    };
    let start = clamp(edit.range.start);
    let end = clamp(edit.range.end).max(start);
    buffer.replace_range(start..end, &edit.text);
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registered change listeners of a widget
pub(crate) struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub(crate) fn add(&mut self, listener: Listener<E>) -> ListenerId {
        self.next_id += 1;
        self.entries.push((self.next_id, listener));
        ListenerId(self.next_id)
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id.0);
        before != self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of the listeners, so they can be invoked without holding a lock
    pub(crate) fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries.iter().map(|(_, l)| l.clone()).collect()
    }
}

/// Handle returned when registering a widget listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

#[derive(Debug, Default)]
struct SurfaceState {
    occupant: Option<(u64, WidgetFamily)>,
    next_token: u64,
    mounts: u64,
    releases: u64,
}

/// The single mount point an editor widget renders into.
///
/// At most one widget occupies it at a time.
#[derive(Debug, Clone, Default)]
pub struct ContainerSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl ContainerSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mount(&self, family: WidgetFamily) -> Result<MountToken, EditorError> {
        let mut state = lock(&self.state);
        if state.occupant.is_some() {
            return Err(EditorError::SurfaceOccupied);
        }
        state.next_token += 1;
        state.mounts += 1;
        let token = state.next_token;
        state.occupant = Some((token, family));
        Ok(MountToken {
            surface: self.clone(),
            token,
        })
    }

    /// Family of the widget currently mounted, if any
    pub fn occupant(&self) -> Option<WidgetFamily> {
        lock(&self.state).occupant.map(|(_, family)| family)
    }

    pub fn is_vacant(&self) -> bool {
        self.occupant().is_none()
    }

    /// Total widgets ever mounted
    pub fn mount_count(&self) -> u64 {
        lock(&self.state).mounts
    }

    /// Total widgets ever released
    pub fn release_count(&self) -> u64 {
        lock(&self.state).releases
    }
}

/// Proof of occupancy; releasing it vacates the surface
#[derive(Debug)]
pub(crate) struct MountToken {
    surface: ContainerSurface,
    token: u64,
}

impl MountToken {
    pub(crate) fn release(self) {
        let mut state = lock(&self.surface.state);
        if matches!(state.occupant, Some((token, _)) if token == self.token) {
            state.occupant = None;
            state.releases += 1;
        }
    }
}

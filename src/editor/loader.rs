//! Editor Loader
//!
//! Owns the session state machine:
//!
//! ```text
//! Unloaded -> Loading -> Ready -> Disposed
//!                |         |
//!                v         +--> Loading   (profile change, compact language change)
//!              Failed --------> Loading   (retry, profile change)
//! ```
//!
//! Only one load is ever in flight. Every load runs under a generation
//! number; a completion whose generation is no longer current is discarded.

use std::sync::{Arc, Mutex};

use super::adapter::{Adapter, CompactAdapter, EditorAdapter, FullAdapter, Subscription};
use super::session::{LoadOutcome, SessionHost, SessionInfo, SessionState, WidgetSettings};
use crate::assets::{AssetError, AssetProvider};
use crate::device::DeviceProfile;
use crate::error::EditorError;
use crate::keyboard::{KeyRegistration, KeyboardSurface};
use crate::language::{ContentType, LanguageResolver};
use crate::lock;
use crate::widget::{
    CompactOptions, ContainerSurface, FullOptions, LanguageSupport, WidgetFamily, WidgetRuntime,
};

/// A live widget plus everything attached to it
struct EditorSession {
    adapter: Arc<Adapter>,
    content_type: ContentType,
    _changes: Subscription,
    _shortcut: KeyRegistration,
}

impl EditorSession {
    /// Dispose the widget; dropping the rest detaches the listeners
    fn dispose(self) {
        self.adapter.dispose();
    }
}

struct LoaderState {
    state: SessionState,
    profile: DeviceProfile,
    generation: u64,
    session: Option<EditorSession>,
    pending_profile: Option<DeviceProfile>,
    last_error: Option<String>,
}

/// Loads, reloads and disposes the editor widget for one container surface
pub struct EditorLoader {
    assets: Arc<dyn AssetProvider>,
    resolver: Arc<LanguageResolver>,
    host: Arc<dyn SessionHost>,
    surface: ContainerSurface,
    keyboard: KeyboardSurface,
    settings: WidgetSettings,
    inner: Mutex<LoaderState>,
}

impl EditorLoader {
    pub fn new(
        assets: Arc<dyn AssetProvider>,
        resolver: Arc<LanguageResolver>,
        host: Arc<dyn SessionHost>,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            assets,
            resolver,
            host,
            surface: ContainerSurface::new(),
            keyboard: KeyboardSurface::new(),
            settings: WidgetSettings::default(),
            inner: Mutex::new(LoaderState {
                state: SessionState::Unloaded,
                profile,
                generation: 0,
                session: None,
                pending_profile: None,
                last_error: None,
            }),
        }
    }

    pub fn with_surface(mut self, surface: ContainerSurface) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_keyboard(mut self, keyboard: KeyboardSurface) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn with_settings(mut self, settings: WidgetSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    pub fn profile(&self) -> DeviceProfile {
        lock(&self.inner).profile
    }

    pub fn generation(&self) -> u64 {
        lock(&self.inner).generation
    }

    pub fn surface(&self) -> &ContainerSurface {
        &self.surface
    }

    pub fn keyboard(&self) -> &KeyboardSurface {
        &self.keyboard
    }

    /// The live adapter, only while `Ready`
    pub fn adapter(&self) -> Option<Arc<Adapter>> {
        let inner = lock(&self.inner);
        match inner.state {
            SessionState::Ready => inner.session.as_ref().map(|s| s.adapter.clone()),
            _ => None,
        }
    }

    pub fn family(&self) -> Option<WidgetFamily> {
        self.adapter().map(|adapter| adapter.family())
    }

    pub fn info(&self) -> SessionInfo {
        let inner = lock(&self.inner);
        let session = inner
            .session
            .as_ref()
            .filter(|_| inner.state == SessionState::Ready);
        SessionInfo {
            state: inner.state,
            profile: inner.profile,
            generation: inner.generation,
            family: session.map(|s| s.adapter.family()),
            mode_id: session.map(|s| s.adapter.mode_id()),
            content_type: session.map(|s| s.content_type.clone()),
            last_error: inner.last_error.clone(),
        }
    }

    /// Start loading the editor into the surface.
    ///
    /// A second call while a load is in flight is a no-op.
    pub async fn load(&self) -> Result<LoadOutcome, EditorError> {
        let generation = {
            let mut inner = lock(&self.inner);
            match inner.state {
                SessionState::Loading => return Ok(LoadOutcome::AlreadyLoading),
                SessionState::Ready => return Ok(LoadOutcome::AlreadyReady),
                SessionState::Unloaded | SessionState::Disposed | SessionState::Failed => {}
            }
            Self::begin_loading(&mut inner)
        };
        self.drive(generation).await
    }

    /// Load again after a runtime failure
    pub async fn retry(&self) -> Result<LoadOutcome, EditorError> {
        let generation = {
            let mut inner = lock(&self.inner);
            match inner.state {
                SessionState::Failed => Self::begin_loading(&mut inner),
                SessionState::Loading => return Ok(LoadOutcome::AlreadyLoading),
                _ => return Ok(LoadOutcome::Unchanged),
            }
        };
        log::info!("Retrying editor load");
        self.drive(generation).await
    }

    /// Apply a new device classification.
    ///
    /// While loading, the change is queued and applied once the load settles.
    pub async fn change_profile(&self, profile: DeviceProfile) -> Result<LoadOutcome, EditorError> {
        let generation = {
            let mut inner = lock(&self.inner);
            match inner.state {
                SessionState::Loading => {
                    log::debug!("Queueing profile change until the current load settles");
                    inner.pending_profile = Some(profile);
                    return Ok(LoadOutcome::Queued);
                }
                SessionState::Ready | SessionState::Failed if inner.profile != profile => {
                    log::info!(
                        "Device profile changed to {}, reloading editor",
                        WidgetFamily::for_profile(profile)
                    );
                    inner.profile = profile;
                    Self::begin_reload(&mut inner)
                }
                SessionState::Unloaded | SessionState::Disposed => {
                    inner.profile = profile;
                    return Ok(LoadOutcome::Unchanged);
                }
                _ => return Ok(LoadOutcome::Unchanged),
            }
        };
        self.drive(generation).await
    }

    /// Bring the session's language in line with the host's content type.
    ///
    /// The full widget switches in place; the compact widget is rebuilt.
    pub async fn sync_language(&self) -> Result<LoadOutcome, EditorError> {
        let outcome = {
            let mut inner = lock(&self.inner);
            match inner.state {
                SessionState::Loading => return Ok(LoadOutcome::Queued),
                SessionState::Ready => self.reconcile_language(&mut inner),
                _ => return Ok(LoadOutcome::Unchanged),
            }
        };
        match outcome {
            LanguageSync::InSync => Ok(LoadOutcome::Unchanged),
            LanguageSync::Rebound => Ok(LoadOutcome::Rebound),
            LanguageSync::Reloading(generation) => self.drive(generation).await,
        }
    }

    /// Dispose the session for good; in-flight loads are discarded
    pub fn teardown(&self) {
        let mut inner = lock(&self.inner);
        if let Some(session) = inner.session.take() {
            session.dispose();
        }
        inner.pending_profile = None;
        inner.generation += 1;
        if inner.state != SessionState::Disposed {
            log::debug!("Editor session disposed");
        }
        inner.state = SessionState::Disposed;
    }

    /// Enter `Loading`; returns the generation the load runs under
    fn begin_loading(inner: &mut LoaderState) -> u64 {
        inner.state = SessionState::Loading;
        inner.generation += 1;
        inner.last_error = None;
        inner.generation
    }

    /// Vacate the surface and go back to `Loading` under a new generation
    fn begin_reload(inner: &mut LoaderState) -> u64 {
        if let Some(session) = inner.session.take() {
            session.dispose();
        }
        Self::begin_loading(inner)
    }

    /// Run loads until no follow-up is pending
    async fn drive(&self, mut generation: u64) -> Result<LoadOutcome, EditorError> {
        loop {
            let result = self.load_session(generation).await;
            if matches!(result, Ok(LoadOutcome::Superseded)) {
                return result;
            }
            match self.settle(generation) {
                Some(next) => generation = next,
                None => return result,
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.inner).generation == generation
    }

    async fn load_session(&self, generation: u64) -> Result<LoadOutcome, EditorError> {
        let profile = self.profile();
        let family = WidgetFamily::for_profile(profile);
        let content_type = self.host.content_type();
        log::info!("Loading {} editor for {}", family, content_type);

        let runtime = match self.assets.load_runtime(family).await {
            Ok(runtime) if runtime.family() == family => runtime,
            Ok(runtime) => {
                let source = AssetError::Unavailable(format!(
                    "asked for the {} runtime, got {}",
                    family,
                    runtime.family()
                ));
                return self.fail(generation, EditorError::AssetLoad { family, source });
            }
            Err(source) => {
                return self.fail(generation, EditorError::AssetLoad { family, source });
            }
        };
        if !self.is_current(generation) {
            log::debug!("Discarding stale {} runtime", family);
            return Ok(LoadOutcome::Superseded);
        }

        let support = match family {
            WidgetFamily::Compact => self.load_language_support(&content_type).await,
            WidgetFamily::Full => None,
        };

        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            log::debug!("Discarding stale {} session", family);
            return Ok(LoadOutcome::Superseded);
        }

        // Compact support was fetched for `content_type`; a newer language
        // is picked up by `settle`, which rebuilds the widget.
        let content_type = match family {
            WidgetFamily::Full => self.host.content_type(),
            WidgetFamily::Compact => content_type,
        };
        let mode_id = self.resolver.mode_id_for(&content_type, family).to_string();
        let value = self.host.initial_value();
        let adapter = match self.construct(&runtime, value, mode_id, support) {
            Ok(adapter) => Arc::new(adapter),
            Err(err) => {
                log::error!("Failed to construct {} editor: {}", family, err);
                inner.state = SessionState::Failed;
                inner.last_error = Some(err.to_human());
                return Err(err);
            }
        };

        let host = self.host.clone();
        let changes = adapter.on_change(Arc::new(move |value: &str| host.on_user_edit(value)));
        let host = self.host.clone();
        let shortcut = self.keyboard.add_listener(move |event| {
            if event.is_save_chord() {
                event.prevent_default();
                host.on_save_shortcut();
            }
        });

        inner.session = Some(EditorSession {
            adapter,
            content_type,
            _changes: changes,
            _shortcut: shortcut,
        });
        inner.state = SessionState::Ready;
        log::info!("{} editor ready", family);
        Ok(LoadOutcome::Ready)
    }

    async fn load_language_support(&self, content_type: &ContentType) -> Option<LanguageSupport> {
        match self.assets.load_language_support(content_type).await {
            Ok(support) => support,
            Err(source) => {
                let err = EditorError::UnsupportedLanguageExtension {
                    content_type: content_type.to_string(),
                    source,
                };
                log::warn!("{}; using plain text highlighting", err);
                None
            }
        }
    }

    fn construct(
        &self,
        runtime: &WidgetRuntime,
        value: String,
        mode_id: String,
        language_support: Option<LanguageSupport>,
    ) -> Result<Adapter, EditorError> {
        match runtime {
            WidgetRuntime::Full(runtime) => {
                let options = FullOptions {
                    value,
                    language: mode_id,
                    ..self.settings.full.clone()
                };
                Ok(Adapter::Full(FullAdapter::new(
                    runtime.create(&self.surface, options)?,
                )))
            }
            WidgetRuntime::Compact(runtime) => {
                let options = CompactOptions {
                    value,
                    mode: mode_id,
                    language_support,
                    ..self.settings.compact.clone()
                };
                Ok(Adapter::Compact(CompactAdapter::new(
                    runtime.construct(&self.surface, options)?,
                )))
            }
        }
    }

    fn fail(&self, generation: u64, err: EditorError) -> Result<LoadOutcome, EditorError> {
        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            return Ok(LoadOutcome::Superseded);
        }
        log::error!("{}", err);
        inner.state = SessionState::Failed;
        inner.last_error = Some(err.to_human());
        Err(err)
    }

    /// Apply queued follow-ups once a load settled.
    ///
    /// Returns the generation of the reload it started, if any.
    fn settle(&self, generation: u64) -> Option<u64> {
        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            return None;
        }
        let pending = inner.pending_profile.take();
        if !matches!(inner.state, SessionState::Ready | SessionState::Failed) {
            return None;
        }

        if let Some(profile) = pending.filter(|p| *p != inner.profile) {
            log::info!(
                "Applying queued profile change to {}",
                WidgetFamily::for_profile(profile)
            );
            inner.profile = profile;
            return Some(Self::begin_reload(&mut inner));
        }

        if inner.state == SessionState::Ready {
            if let LanguageSync::Reloading(next) = self.reconcile_language(&mut inner) {
                return Some(next);
            }
        }
        None
    }

    fn reconcile_language(&self, inner: &mut LoaderState) -> LanguageSync {
        let wanted = self.host.content_type();
        let Some(session) = inner.session.as_mut() else {
            return LanguageSync::InSync;
        };
        if session.content_type == wanted {
            return LanguageSync::InSync;
        }

        let family = session.adapter.family();
        let mode_id = self.resolver.mode_id_for(&wanted, family);
        match session.adapter.set_language(mode_id) {
            Ok(()) => {
                log::debug!("Switched {} editor to {}", family, wanted);
                session.content_type = wanted;
                LanguageSync::Rebound
            }
            Err(EditorError::LanguageRequiresReload(_)) => {
                log::info!("Rebuilding {} editor for {}", family, wanted);
                LanguageSync::Reloading(Self::begin_reload(inner))
            }
            Err(err) => {
                log::warn!("Could not switch editor language: {}", err);
                LanguageSync::InSync
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LanguageSync {
    InSync,
    Rebound,
    /// A rebuild started under this generation
    Reloading(u64),
}

//! Test doubles shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use panel_editor::assets::{AssetError, AssetProvider, BundledAssets};
use panel_editor::content::ContentPorts;
use panel_editor::device::{DeviceClassifier, Viewport};
use panel_editor::editor::WidgetSettings;
use panel_editor::host::{FlashChannel, MemoryLocation};
use panel_editor::language::{ContentType, LanguageResolver};
use panel_editor::page::{EditorPage, PageOptions};
use panel_editor::persistence::{PersistenceError, PersistenceGateway};
use panel_editor::widget::{LanguageSupport, WidgetFamily, WidgetRuntime};

/// Holds every runtime load until the test releases it
pub struct GatedAssets {
    inner: BundledAssets,
    gate: Semaphore,
    runtime_calls: AtomicUsize,
    failures: AtomicUsize,
}

impl GatedAssets {
    pub fn new() -> Self {
        Self {
            inner: BundledAssets::default(),
            gate: Semaphore::new(0),
            runtime_calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// The next `loads` released runtime loads fail
    pub fn fail_next(&self, loads: usize) {
        self.failures.store(loads, Ordering::SeqCst);
    }

    /// Let `loads` pending runtime loads complete
    pub fn release(&self, loads: usize) {
        self.gate.add_permits(loads);
    }

    pub fn runtime_calls(&self) -> usize {
        self.runtime_calls.load(Ordering::SeqCst)
    }

    /// Yield until `count` runtime loads have started
    pub async fn wait_for_calls(&self, count: usize) {
        while self.runtime_calls() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AssetProvider for GatedAssets {
    async fn load_runtime(&self, family: WidgetFamily) -> Result<WidgetRuntime, AssetError> {
        self.runtime_calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .map_err(|_| AssetError::Unavailable("gate closed".to_string()))?
            .forget();
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AssetError::Unavailable(format!("{} runtime", family)));
        }
        self.inner.load_runtime(family).await
    }

    async fn load_language_support(
        &self,
        content_type: &ContentType,
    ) -> Result<Option<LanguageSupport>, AssetError> {
        self.inner.load_language_support(content_type).await
    }
}

/// Runtimes load at once; language extensions wait for the test
pub struct GatedExtensions {
    inner: BundledAssets,
    gate: Semaphore,
    extension_calls: AtomicUsize,
}

impl GatedExtensions {
    pub fn new() -> Self {
        Self {
            inner: BundledAssets::default(),
            gate: Semaphore::new(0),
            extension_calls: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, loads: usize) {
        self.gate.add_permits(loads);
    }

    /// Yield until `count` extension loads have started
    pub async fn wait_for_calls(&self, count: usize) {
        while self.extension_calls.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AssetProvider for GatedExtensions {
    async fn load_runtime(&self, family: WidgetFamily) -> Result<WidgetRuntime, AssetError> {
        self.inner.load_runtime(family).await
    }

    async fn load_language_support(
        &self,
        content_type: &ContentType,
    ) -> Result<Option<LanguageSupport>, AssetError> {
        self.extension_calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .map_err(|_| AssetError::Unavailable("gate closed".to_string()))?
            .forget();
        self.inner.load_language_support(content_type).await
    }
}

/// Runtime loads fail while `offline` is set; extensions always fail
pub struct FlakyAssets {
    inner: BundledAssets,
    offline: AtomicBool,
}

impl FlakyAssets {
    pub fn offline() -> Self {
        Self {
            inner: BundledAssets::default(),
            offline: AtomicBool::new(true),
        }
    }

    pub fn online() -> Self {
        Self {
            inner: BundledAssets::default(),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetProvider for FlakyAssets {
    async fn load_runtime(&self, family: WidgetFamily) -> Result<WidgetRuntime, AssetError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AssetError::Unavailable(format!("{} runtime", family)));
        }
        self.inner.load_runtime(family).await
    }

    async fn load_language_support(
        &self,
        content_type: &ContentType,
    ) -> Result<Option<LanguageSupport>, AssetError> {
        Err(AssetError::Unavailable(format!("{} extension", content_type)))
    }
}

/// In-memory gateway that records every save
#[derive(Default)]
pub struct RecordingGateway {
    files: Mutex<HashMap<String, String>>,
    saves: Mutex<Vec<(String, String)>>,
    loads: AtomicUsize,
    fail_saves: Mutex<Option<PersistenceError>>,
}

impl RecordingGateway {
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn fail_saves_with(&self, err: PersistenceError) {
        *self.fail_saves.lock().unwrap() = Some(err);
    }

    pub fn saves(&self) -> Vec<(String, String)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn load_file(&self, _server_id: &str, path: &str) -> Result<String, PersistenceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(path.to_string()))
    }

    async fn save_file(
        &self,
        _server_id: &str,
        path: &str,
        content: &str,
    ) -> Result<(), PersistenceError> {
        self.saves
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_string()));
        if let Some(err) = self.fail_saves.lock().unwrap().clone() {
            return Err(err);
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}

/// Flash channel that keeps every error it was given
#[derive(Default)]
pub struct RecordingFlash {
    errors: Mutex<Vec<(String, String)>>,
    clears: AtomicUsize,
}

impl RecordingFlash {
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl FlashChannel for RecordingFlash {
    fn clear(&self, _key: &str) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn add_error(&self, key: &str, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((key.to_string(), message.to_string()));
    }
}

pub struct Harness {
    pub page: EditorPage,
    pub gateway: Arc<RecordingGateway>,
    pub flash: Arc<RecordingFlash>,
    pub location: Arc<MemoryLocation>,
}

pub fn desktop() -> Viewport {
    Viewport::new(1280, 800)
}

pub fn phone() -> Viewport {
    Viewport::new(390, 844)
}

/// Page wired to recording doubles
pub fn harness(
    gateway: RecordingGateway,
    assets: Arc<dyn AssetProvider>,
    viewport: Viewport,
) -> Harness {
    let gateway = Arc::new(gateway);
    let flash = Arc::new(RecordingFlash::default());
    let location = Arc::new(MemoryLocation::new());

    let page = EditorPage::new(
        PageOptions {
            server_id: "srv-1".to_string(),
            classifier: DeviceClassifier::default(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            viewport,
            settings: WidgetSettings::default(),
        },
        Arc::new(LanguageResolver::builtin()),
        assets,
        ContentPorts {
            gateway: gateway.clone(),
            flash: flash.clone(),
            navigator: location.clone(),
            file_browser: location.clone(),
        },
        location.clone(),
    );

    Harness {
        page,
        gateway,
        flash,
        location,
    }
}

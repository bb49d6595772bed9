//! Asset Provider
//!
//! Port through which widget runtimes and compact-widget language extensions
//! are obtained, plus the bundled in-process provider.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::ContentType;
use crate::widget::{CompactRuntime, FullRuntime, LanguageSupport, WidgetFamily, WidgetRuntime};

/// Failure to obtain an asset
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset unavailable: {0}")]
    Unavailable(String),

    #[error("no asset configured for {0}")]
    NotConfigured(String),
}

/// Fetches widget runtimes and language extensions
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Load the runtime of a widget family. Failure is fatal to the session.
    async fn load_runtime(&self, family: WidgetFamily) -> Result<WidgetRuntime, AssetError>;

    /// Load compact-widget syntax support for a content type.
    ///
    /// `Ok(None)` means the content type needs no extension.
    async fn load_language_support(
        &self,
        content_type: &ContentType,
    ) -> Result<Option<LanguageSupport>, AssetError>;
}

/// Where each asset would be fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub full_runtime: Option<String>,
    pub compact_runtime: Option<String>,
    /// Compact-widget language extensions keyed by content type
    pub compact_extensions: BTreeMap<String, String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        let cdn = "https://cdn.jsdelivr.net/npm";
        let compact_extensions = [
            ("javascript", "lang-javascript@6.1.1"),
            ("html", "lang-html@6.4.1"),
            ("css", "lang-css@6.0.1"),
            ("json", "lang-json@6.0.1"),
            ("markdown", "lang-markdown@6.1.1"),
            ("python", "lang-python@6.0.1"),
            ("shell", "lang-shell@6.0.1"),
            ("sql", "lang-sql@6.0.1"),
        ]
        .into_iter()
        .map(|(content_type, package)| {
            (
                content_type.to_string(),
                format!("{}/@codemirror/{}/dist/index.min.js", cdn, package),
            )
        })
        .collect();

        Self {
            full_runtime: Some(format!("{}/monaco-editor@0.45.0/min/vs/loader.js", cdn)),
            compact_runtime: Some(format!("{}/codemirror@6.0.2/lib/codemirror.min.js", cdn)),
            compact_extensions,
        }
    }
}

impl AssetManifest {
    pub fn runtime_url(&self, family: WidgetFamily) -> Option<&str> {
        match family {
            WidgetFamily::Full => self.full_runtime.as_deref(),
            WidgetFamily::Compact => self.compact_runtime.as_deref(),
        }
    }

    pub fn extension_url(&self, content_type: &ContentType) -> Option<&str> {
        self.compact_extensions
            .get(content_type.as_str())
            .map(String::as_str)
    }
}

/// Provider backed by the in-process widget engines.
///
/// The manifest decides which assets exist; an optional latency simulates
/// the network round trip.
#[derive(Debug, Clone, Default)]
pub struct BundledAssets {
    manifest: AssetManifest,
    latency: Option<Duration>,
}

impl BundledAssets {
    pub fn new(manifest: AssetManifest) -> Self {
        Self {
            manifest,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency).filter(|d| !d.is_zero());
        self
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    async fn simulate_fetch(&self, url: &str) {
        log::debug!("Fetching asset {}", url);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AssetProvider for BundledAssets {
    async fn load_runtime(&self, family: WidgetFamily) -> Result<WidgetRuntime, AssetError> {
        let url = self
            .manifest
            .runtime_url(family)
            .ok_or_else(|| AssetError::NotConfigured(format!("{} runtime", family)))?;
        self.simulate_fetch(url).await;

        Ok(match family {
            WidgetFamily::Full => WidgetRuntime::Full(FullRuntime::new(url)),
            WidgetFamily::Compact => WidgetRuntime::Compact(CompactRuntime::new(url)),
        })
    }

    async fn load_language_support(
        &self,
        content_type: &ContentType,
    ) -> Result<Option<LanguageSupport>, AssetError> {
        let Some(url) = self.manifest.extension_url(content_type) else {
            return Ok(None);
        };
        self.simulate_fetch(url).await;

        Ok(Some(LanguageSupport {
            content_type: content_type.clone(),
            source_url: url.to_string(),
        }))
    }
}

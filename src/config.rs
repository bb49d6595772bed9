//! Configuration management for the panel editor.
//!
//! Handles:
//! - Command-line argument parsing
//! - The TOML config file (device threshold, themes, assets, languages)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::AssetManifest;
use crate::device::{DeviceClassifier, Viewport, DEFAULT_COMPACT_WIDTH, DEFAULT_MOBILE_PATTERN};
use crate::editor::WidgetSettings;
use crate::language::{LanguageDef, LanguageResolver};
use crate::widget::{CompactOptions, FullOptions};

/// Command-line arguments for the panel editor
#[derive(Debug, Parser)]
#[command(name = "panel-editor")]
#[command(about = "Adaptive file editor of the server panel")]
#[command(version)]
pub struct Args {
    /// File to open, relative to the root directory
    #[arg(long, conflicts_with = "new", help = "File to edit (e.g., 'plugins/config.yml')")]
    pub file: Option<String>,

    /// Start an unnamed new file
    #[arg(long, help = "Create a new file instead of editing one")]
    pub new: bool,

    /// Directory the server's files live in
    #[arg(long, help = "Root directory of the server files")]
    pub root: Option<PathBuf>,

    /// Server identifier used in edit URLs
    #[arg(long, help = "Server identifier")]
    pub server: Option<String>,

    #[arg(long, default_value_t = 1280, help = "Viewport width in pixels")]
    pub width: u32,

    #[arg(long, default_value_t = 800, help = "Viewport height in pixels")]
    pub height: u32,

    #[arg(long, default_value = "", help = "User agent used for device classification")]
    pub user_agent: String,

    /// Config file to read instead of the default location
    #[arg(long, help = "Path to a config.toml")]
    pub config: Option<PathBuf>,

    /// Log level for the editor
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub compact_width: Option<u32>,
    pub mobile_pattern: Option<String>,
    pub server_id: Option<String>,
    pub root: Option<PathBuf>,
    /// Simulated asset latency in milliseconds
    pub asset_latency_ms: Option<u64>,
    pub full: FullOptions,
    pub compact: CompactOptions,
    pub assets: AssetManifest,
    pub languages: Vec<LanguageDef>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// What the page should open first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupTarget {
    New,
    Edit(String),
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub target: StartupTarget,
    pub root: PathBuf,
    pub server_id: String,
    pub viewport: Viewport,
    pub user_agent: String,
    pub classifier: DeviceClassifier,
    pub settings: WidgetSettings,
    pub assets: AssetManifest,
    pub asset_latency: Option<Duration>,
    pub languages: Vec<LanguageDef>,
    /// Config file that was read, if any
    pub config_path: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        // An explicit path must exist; the default location is optional
        let (file, config_path) = match args.config {
            Some(path) => (ConfigFile::load(&path)?, Some(path)),
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => (ConfigFile::load(&path)?, Some(path)),
                None => (ConfigFile::default(), None),
            },
        };

        let classifier = DeviceClassifier::new(
            file.compact_width.unwrap_or(DEFAULT_COMPACT_WIDTH),
            file.mobile_pattern.as_deref().unwrap_or(DEFAULT_MOBILE_PATTERN),
        )
        .context("Invalid mobile_pattern in config")?;

        let root = match args.root.or(file.root) {
            Some(root) => root,
            None => std::env::current_dir().context("Could not determine current directory")?,
        };

        let target = match args.file {
            Some(file) if !args.new => StartupTarget::Edit(file),
            _ => StartupTarget::New,
        };

        Ok(Config {
            target,
            root,
            server_id: args
                .server
                .or(file.server_id)
                .unwrap_or_else(|| "local".to_string()),
            viewport: Viewport::new(args.width, args.height),
            user_agent: args.user_agent,
            classifier,
            settings: WidgetSettings {
                full: file.full,
                compact: file.compact,
            },
            assets: file.assets,
            asset_latency: file.asset_latency_ms.map(Duration::from_millis),
            languages: file.languages,
            config_path,
            log_level: args.log_level,
        })
    }

    /// Built-in languages with the configured ones layered on top
    pub fn resolver(&self) -> LanguageResolver {
        LanguageResolver::with_overrides(self.languages.iter().cloned())
    }
}

/// `<config dir>/panel-editor/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("panel-editor").join("config.toml"))
}

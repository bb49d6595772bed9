//! Device classification.
//!
//! Decides between the compact and full editing experience from the viewport
//! and the user agent, and coalesces resize bursts to one decision per frame.

use regex::Regex;
use serde::Serialize;

/// Viewport widths below this use the compact editor
pub const DEFAULT_COMPACT_WIDTH: u32 = 768;

/// User agents treated as mobile devices
pub const DEFAULT_MOBILE_PATTERN: &str = "Mobi|Android|iPhone|iPad";

/// Which editing experience a device gets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceProfile {
    pub is_compact: bool,
}

impl DeviceProfile {
    pub const FULL: DeviceProfile = DeviceProfile { is_compact: false };
    pub const COMPACT: DeviceProfile = DeviceProfile { is_compact: true };
}

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Classifies devices from fixed inputs
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    compact_width: u32,
    mobile_agent: Regex,
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self {
            compact_width: DEFAULT_COMPACT_WIDTH,
            mobile_agent: mobile_regex(DEFAULT_MOBILE_PATTERN)
                .expect("default mobile pattern is a valid regex"),
        }
    }
}

fn mobile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}

impl DeviceClassifier {
    /// Classifier with a custom width threshold and user-agent pattern
    pub fn new(compact_width: u32, mobile_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            compact_width,
            mobile_agent: mobile_regex(mobile_pattern)?,
        })
    }

    pub fn compact_width(&self) -> u32 {
        self.compact_width
    }

    pub fn is_mobile_agent(&self, user_agent: &str) -> bool {
        self.mobile_agent.is_match(user_agent)
    }

    pub fn classify(&self, viewport: Viewport, user_agent: &str) -> DeviceProfile {
        DeviceProfile {
            is_compact: self.is_mobile_agent(user_agent) || viewport.width < self.compact_width,
        }
    }
}

/// Collapses resize events so classification runs at most once per frame.
#[derive(Debug, Clone)]
pub struct ResizeCoalescer {
    classifier: DeviceClassifier,
    user_agent: String,
    pending: Option<Viewport>,
    current: DeviceProfile,
}

impl ResizeCoalescer {
    pub fn new(classifier: DeviceClassifier, user_agent: impl Into<String>, initial: Viewport) -> Self {
        let user_agent = user_agent.into();
        let current = classifier.classify(initial, &user_agent);
        Self {
            classifier,
            user_agent,
            pending: None,
            current,
        }
    }

    pub fn profile(&self) -> DeviceProfile {
        self.current
    }

    pub fn classifier(&self) -> &DeviceClassifier {
        &self.classifier
    }

    /// Record a resize; only the latest viewport before the next frame counts
    pub fn on_resize(&mut self, viewport: Viewport) {
        self.pending = Some(viewport);
    }

    /// Returns the new profile if the classification changed this frame
    pub fn on_animation_frame(&mut self) -> Option<DeviceProfile> {
        let viewport = self.pending.take()?;
        let profile = self.classifier.classify(viewport, &self.user_agent);
        if profile == self.current {
            return None;
        }
        log::debug!(
            "Viewport {}x{} reclassified device as {}",
            viewport.width,
            viewport.height,
            if profile.is_compact { "compact" } else { "full" }
        );
        self.current = profile;
        Some(profile)
    }
}

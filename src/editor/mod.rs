//! Adaptive Editor
//!
//! Adapter abstraction over the widget families and the loader that owns
//! their lifecycle.

pub mod adapter;
pub mod loader;
pub mod session;

pub use adapter::{Adapter, ChangeCallback, CompactAdapter, EditorAdapter, FullAdapter, Subscription};
pub use loader::EditorLoader;
pub use session::{LoadOutcome, SessionHost, SessionInfo, SessionState, WidgetSettings};

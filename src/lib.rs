//! comet - danmaku comment layout and playback engine.
//!
//! Positions and times scrolling/fixed text overlays on a video-like
//! timeline: comments appear at their timecode, travel or sit on screen
//! for a bounded duration, and avoid overlapping concurrently visible
//! comments. The engine is headless; rendering happens through the
//! [`Viewer`] trait, and the host drives time by calling
//! [`Engine::update`] once per frame.

pub mod core;
pub mod entities;

// Re-export commonly used types
pub use self::core::config::{EngineConfig, SizingMode};
pub use self::core::engine::{Engine, EngineError};
pub use self::core::event_bus::{EngineEvent, EventBus, ObserverId};
pub use self::core::viewer::{ChatMetrics, Viewer};

// Re-export entities
pub use entities::{Comment, CommentId, CommentInput, CommentStore, Lane};

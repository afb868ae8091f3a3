//! Core engine modules - clock, config, engine, events, layout, scheduler.
//!
//! These form the layout/playback engine, independent of any renderer.

pub mod clock;
pub mod config;
pub mod engine;
pub mod event_bus;
pub mod layout;
pub mod scheduler;
pub mod viewer;

// Re-exports for convenience
pub use clock::FrameClock;
pub use config::{EngineConfig, SizingMode};
pub use engine::{Engine, EngineError};
pub use event_bus::{EngineEvent, EventBus, ObserverId};
pub use viewer::{ChatMetrics, Viewer};

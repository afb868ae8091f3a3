//! Engine-wide configuration.
//!
//! One explicit struct owned by the engine instance; every component that
//! needs a tunable reads it from here. No globals.

use serde::{Deserialize, Serialize};

/// Lower clamp bound for the display durations, ms.
pub const DURATION_MIN: i64 = 100;
/// Upper clamp bound for the display durations, ms.
pub const DURATION_MAX: i64 = 10_000;

/// How the base font size is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Use the configured `base_font_size` as-is.
    #[default]
    FixedFontSize,
    /// Derive the font size so `rows` chat rows fill the viewport height.
    FixedRows,
}

/// Mutable engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Visible lifespan of a flow comment, ms. Clamped to [100, 10000].
    pub duration: i64,
    /// Visible lifespan of a top/bottom comment, ms. Same clamp.
    pub duration_alt: i64,
    /// Max concurrently rendered comments, >= 1.
    pub limit: usize,
    /// Chat rows used by `SizingMode::FixedRows`.
    pub rows: u32,
    pub sizing_mode: SizingMode,
    /// Base font size used by `SizingMode::FixedFontSize`, e.g. `"32px"`.
    pub base_font_size: String,
    /// Live-ingest mode: the timeline grows with the clock and expired
    /// comments are dropped from the store entirely.
    pub realtime: bool,
    /// Store size above which refresh switches to simple mode.
    pub simple_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duration: 4000,
            duration_alt: 3000,
            limit: 100,
            rows: 12,
            sizing_mode: SizingMode::FixedFontSize,
            base_font_size: "32px".into(),
            realtime: false,
            simple_threshold: 1000,
        }
    }
}

impl EngineConfig {
    /// Force externally supplied values back into their valid ranges.
    pub(crate) fn sanitize(&mut self) {
        self.duration = self.duration.clamp(DURATION_MIN, DURATION_MAX);
        self.duration_alt = self.duration_alt.clamp(DURATION_MIN, DURATION_MAX);
        self.limit = self.limit.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.duration, 4000);
        assert_eq!(cfg.duration_alt, 3000);
        assert_eq!(cfg.limit, 100);
        assert_eq!(cfg.sizing_mode, SizingMode::FixedFontSize);
        assert!(!cfg.realtime);
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut cfg = EngineConfig {
            duration: 5,
            duration_alt: 1_000_000,
            limit: 0,
            ..Default::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.duration, DURATION_MIN);
        assert_eq!(cfg.duration_alt, DURATION_MAX);
        assert_eq!(cfg.limit, 1);
    }
}

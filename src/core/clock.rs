//! Wall-clock delta tracking for the playback loop.
//!
//! The host calls the engine once per frame; this clock turns those calls
//! into whole-millisecond deltas. It keeps an origin instant plus the
//! total already reported, so truncation never accumulates drift.

use std::time::Instant;

/// Elapsed-time source for the frame-driven tick.
///
/// [`FrameClock::arm`] sets a fresh baseline; the first
/// [`FrameClock::elapsed_ms`] after arming measures from that instant,
/// which gives playback its one-frame startup delay.
#[derive(Debug, Default)]
pub struct FrameClock {
    origin: Option<Instant>,
    reported_ms: i64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin measuring from now, discarding any previous baseline.
    pub fn arm(&mut self) {
        self.origin = Some(Instant::now());
        self.reported_ms = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.origin.is_some()
    }

    /// Whole milliseconds since the previous call. A disarmed clock arms
    /// itself and reports zero.
    pub fn elapsed_ms(&mut self) -> i64 {
        let Some(origin) = self.origin else {
            self.arm();
            return 0;
        };

        let total = origin.elapsed().as_millis() as i64;
        let delta = total - self.reported_ms;
        self.reported_ms = total;
        delta
    }
}

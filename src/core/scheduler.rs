//! Incremental refresh scheduler for oversized comment sets.
//!
//! In simple mode a refresh lays out only a bounded window synchronously;
//! the rest of the store is processed in deferred slices. This type holds
//! the bookkeeping: one pending slice at a time, armed with a countdown
//! that the engine decrements with its tick deltas.
//!
//! Cancellation is by generation: every refresh bumps the generation, and
//! a slice carrying a stale generation is discarded before it runs. There
//! is no explicit cancel call in the refresh path; a newer refresh simply
//! supersedes the pending continuation.

/// How far past the playhead a deferred slice reaches, ms.
pub const SLICE_LOOKAHEAD_MS: i64 = 500;
/// Delay between deferred slices, ms.
pub const SLICE_DELAY_MS: i64 = 100;

/// A pending continuation of a windowed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceTask {
    pub generation: u64,
    /// First store index the slice will lay out.
    pub start: usize,
    /// Countdown until the slice is due, ms.
    pub due_in_ms: i64,
}

/// Single-slot deferred-slice scheduler.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    generation: u64,
    task: Option<SliceTask>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh cycle: invalidates any pending slice and
    /// returns the generation the new cycle runs under.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.task = None;
        self.generation
    }

    /// Arm a slice starting at `start` under `generation`. A stale
    /// generation is rejected outright.
    pub fn schedule(&mut self, generation: u64, start: usize) {
        if generation != self.generation {
            return;
        }
        self.task = Some(SliceTask {
            generation,
            start,
            due_in_ms: SLICE_DELAY_MS,
        });
    }

    /// Advance the countdown by `elapsed_ms`; returns the slice if it just
    /// became due. Stale slices are dropped without being returned.
    pub fn advance(&mut self, elapsed_ms: i64) -> Option<SliceTask> {
        let task = self.task.as_mut()?;
        task.due_in_ms -= elapsed_ms;
        if task.due_in_ms > 0 {
            return None;
        }

        let task = self.task.take()?;
        if task.generation != self.generation {
            return None;
        }
        Some(task)
    }

    pub fn pending(&self) -> Option<SliceTask> {
        self.task
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

//! The comment engine: sorted store, playback clock, render-set
//! synchronization, and the refresh scheduler, behind one host-facing
//! surface.
//!
//! # Timing model
//!
//! Single-threaded and host-frame-driven. The host calls
//! [`Engine::update`] once per frame; the engine turns that into a
//! millisecond delta, pumps any pending deferred refresh slice, advances
//! the playhead while playing, and reconciles the render set against the
//! viewer. [`Engine::tick`] is the deterministic core for hosts (and
//! tests) that supply their own deltas.
//!
//! # Render-set contract
//!
//! The render set is a capacity-bounded subset of the store, sorted by
//! `vpos`. Within one tick, eviction and creation always precede geometry
//! for newly visible comments, which precedes viewer notification.
//! Capacity eviction is strict FIFO by timecode: the rendered comment
//! with the smallest `vpos` goes first, regardless of arrival order.

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::core::clock::FrameClock;
use crate::core::config::{DURATION_MAX, DURATION_MIN, EngineConfig, SizingMode};
use crate::core::event_bus::{EngineEvent, EventBus, ObserverId};
use crate::core::layout;
use crate::core::scheduler::{RefreshScheduler, SLICE_LOOKAHEAD_MS, SliceTask};
use crate::core::viewer::Viewer;
use crate::entities::{Comment, CommentId, CommentInput, CommentStore};

/// Coarse seek step, ms.
pub const SEEK_STEP_MS: i64 = 10_000;
/// Fine seek step, ms.
pub const SEEK_STEP_BIT_MS: i64 = 1_000;

/// Invalid-argument failures. These are immediate and leave engine state
/// unchanged; range-clamped tunables never raise them.
#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    /// `limit` must be at least 1.
    LimitOutOfRange(usize),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::LimitOutOfRange(v) => write!(f, "limit must be > 0, got {v}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Render-set entry. `vpos` is cached so ordering never needs a store
/// lookup.
#[derive(Debug, Clone, Copy)]
struct RenderEntry {
    id: CommentId,
    vpos: i64,
}

/// Comment layout and playback engine.
///
/// Owns the comment store, the render set, the configuration, and the
/// playback state; drives an external [`Viewer`] when one is attached.
pub struct Engine<V: Viewer> {
    store: CommentStore,
    render_set: Vec<RenderEntry>,
    config: EngineConfig,
    position: i64,
    length: i64,
    playing: bool,
    clock: FrameClock,
    scheduler: RefreshScheduler,
    bus: EventBus,
    viewer: Option<V>,
    rng: SmallRng,
    /// Chats removed since the last advisory GC hint.
    removed_since_hint: u64,
}

impl<V: Viewer> Engine<V> {
    pub fn new() -> Self {
        Self::from_parts(EngineConfig::default(), SmallRng::from_os_rng())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::from_parts(config, SmallRng::from_os_rng())
    }

    /// Engine with a deterministic placement RNG. Bullet rows become
    /// reproducible, which hosts replaying a session may want.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_parts(EngineConfig::default(), SmallRng::seed_from_u64(seed))
    }

    fn from_parts(mut config: EngineConfig, rng: SmallRng) -> Self {
        config.sanitize();
        Self {
            store: CommentStore::new(),
            render_set: Vec::new(),
            config,
            position: 0,
            length: 0,
            playing: false,
            clock: FrameClock::new(),
            scheduler: RefreshScheduler::new(),
            bus: EventBus::new(),
            viewer: None,
            rng,
            removed_since_hint: 0,
        }
    }

    // ========== Viewer attachment ==========

    /// Attach the viewer. Stops playback and pushes the base font size.
    pub fn set_viewer(&mut self, viewer: V) {
        self.stop();
        self.viewer = Some(viewer);
        self.apply_base_font_size();
    }

    pub fn take_viewer(&mut self) -> Option<V> {
        self.viewer.take()
    }

    pub fn viewer(&self) -> Option<&V> {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> Option<&mut V> {
        self.viewer.as_mut()
    }

    // ========== Observation ==========

    /// Subscribe to position/length changes; notified synchronously at
    /// the point of mutation.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: FnMut(EngineEvent) + Send + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.bus.unsubscribe(id);
    }

    /// Cloneable handle onto the same observer registry.
    pub fn event_bus(&self) -> EventBus {
        self.bus.clone()
    }

    // ========== Tunables ==========

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn duration(&self) -> i64 {
        self.config.duration
    }

    /// Out-of-range values are silently ignored; these tunables are
    /// adjusted from UI sliders where failing would be noise.
    pub fn set_duration(&mut self, duration: i64) {
        if (DURATION_MIN..=DURATION_MAX).contains(&duration) {
            self.config.duration = duration;
        }
    }

    pub fn duration_alt(&self) -> i64 {
        self.config.duration_alt
    }

    pub fn set_duration_alt(&mut self, duration: i64) {
        if (DURATION_MIN..=DURATION_MAX).contains(&duration) {
            self.config.duration_alt = duration;
        }
    }

    pub fn limit(&self) -> usize {
        self.config.limit
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<(), EngineError> {
        if limit < 1 {
            return Err(EngineError::LimitOutOfRange(limit));
        }
        self.config.limit = limit;
        Ok(())
    }

    pub fn rows(&self) -> u32 {
        self.config.rows
    }

    pub fn set_rows(&mut self, rows: u32) {
        self.config.rows = rows;
    }

    pub fn sizing_mode(&self) -> SizingMode {
        self.config.sizing_mode
    }

    pub fn set_sizing_mode(&mut self, mode: SizingMode) {
        self.config.sizing_mode = mode;
    }

    pub fn base_font_size(&self) -> &str {
        &self.config.base_font_size
    }

    pub fn set_base_font_size(&mut self, font_size: impl Into<String>) {
        self.config.base_font_size = font_size.into();
    }

    pub fn realtime(&self) -> bool {
        self.config.realtime
    }

    pub fn set_realtime(&mut self, realtime: bool) {
        self.config.realtime = realtime;
    }

    pub fn simple_threshold(&self) -> usize {
        self.config.simple_threshold
    }

    pub fn set_simple_threshold(&mut self, threshold: usize) {
        if self.config.simple_threshold == threshold {
            return;
        }
        self.config.simple_threshold = threshold;
        if self.is_simple_mode() {
            self.refresh();
        }
    }

    // ========== Playback state ==========

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Move the playhead, clamped to `[0, length]`. Simple mode refreshes
    /// immediately so the new window is laid out.
    pub fn set_position(&mut self, position: i64) {
        if self.position == position {
            return;
        }
        self.position = position.clamp(0, self.length);
        self.bus.emit(EngineEvent::PositionChanged(self.position));
        if self.is_simple_mode() {
            self.refresh();
        }
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    /// Set the timeline extent; the playhead is re-clamped and both
    /// changes are announced.
    pub fn set_length(&mut self, length: i64) {
        if self.length == length {
            return;
        }
        self.length = length;
        self.position = self.position.min(length);
        self.bus.emit(EngineEvent::LengthChanged(self.length));
        self.bus.emit(EngineEvent::PositionChanged(self.position));
    }

    /// Degraded windowed-refresh mode for oversized stores.
    pub fn is_simple_mode(&self) -> bool {
        !self.config.realtime && self.store.len() > self.config.simple_threshold
    }

    // ========== Store access ==========

    pub fn comment_count(&self) -> usize {
        self.store.len()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.store.iter()
    }

    /// Currently rendered comments, ordered by `vpos`.
    pub fn rendered(&self) -> impl Iterator<Item = &Comment> {
        self.render_set
            .iter()
            .filter_map(|entry| self.store.index_of(entry.id).and_then(|i| self.store.get(i)))
    }

    pub fn rendered_count(&self) -> usize {
        self.render_set.len()
    }

    /// True iff the comment's active window contains the playhead.
    pub fn is_visible(&self, comment: &Comment) -> bool {
        comment.is_visible_at(self.position, self.config.duration, self.config.duration_alt)
    }

    // ========== Commands ==========

    pub fn add_chat(&mut self, input: CommentInput) {
        self.add_comment(vec![input]);
    }

    /// Insert a batch, update the timeline extent, and re-lay-out from
    /// the earliest affected index.
    pub fn add_comment(&mut self, batch: Vec<CommentInput>) {
        if batch.is_empty() {
            return;
        }
        let index = self.store.insert(batch);

        if self.config.realtime {
            // A live chat ahead of the stream head stretches the timeline
            // out to meet it.
            if let Some(last) = self.store.last()
                && last.vpos > self.length
            {
                let vpos = last.vpos;
                self.set_length(vpos);
            }
        } else if let Some(last) = self.store.last() {
            let end = last.vpos + last.active_duration(self.config.duration, self.config.duration_alt);
            self.set_length(end);
        }

        self.refresh_from(index);
    }

    /// Remove every comment: rendered chats are torn down in the viewer,
    /// the store and render set are emptied, and the timeline collapses
    /// to zero.
    pub fn clear_comment(&mut self) {
        if let Some(viewer) = self.viewer.as_mut() {
            for entry in &self.render_set {
                if let Some(i) = self.store.index_of(entry.id) {
                    viewer.remove_chat(&self.store[i]);
                }
            }
        }
        self.store.clear();
        self.render_set.clear();
        self.set_length(0);
        self.refresh();
        info!("comment store cleared");
    }

    /// Blank rendered comments without evicting them.
    pub fn hide_comment(&mut self) {
        for i in 0..self.render_set.len() {
            if let Some(si) = self.store.index_of(self.render_set[i].id) {
                self.store[si].visibility = false;
            }
        }
    }

    pub fn show_comment(&mut self) {
        for i in 0..self.render_set.len() {
            if let Some(si) = self.store.index_of(self.render_set[i].id) {
                self.store[si].visibility = true;
            }
        }
    }

    /// Begin playback. No-op while playing, or at the end of a bounded
    /// timeline. Realtime playback restarts from a zeroed timeline.
    pub fn start(&mut self) {
        if self.playing || (!self.config.realtime && self.position == self.length) {
            return;
        }
        if self.config.realtime {
            self.position = 0;
            self.length = 0;
        }
        self.playing = true;
        self.clock.arm();
        debug!("playback started at {} ms", self.position);
    }

    /// Stop playback; the next `update` becomes a pure scheduler pump.
    pub fn stop(&mut self) {
        if self.playing {
            self.playing = false;
            debug!("playback stopped at {} ms", self.position);
        }
    }

    /// Per-frame entry point: measures wall-clock elapsed time and ticks.
    pub fn update(&mut self) {
        let elapsed = self.clock.elapsed_ms();
        self.tick(elapsed);
    }

    /// Deterministic tick: pump the deferred refresh slice, then advance
    /// playback by `elapsed_ms` and render.
    pub fn tick(&mut self, elapsed_ms: i64) {
        if let Some(task) = self.scheduler.advance(elapsed_ms) {
            self.run_refresh_slice(task);
        }

        if !self.playing {
            return;
        }

        if self.config.realtime {
            // Unbounded stream: the timeline grows in lockstep.
            self.position += elapsed_ms;
            self.length += elapsed_ms;
        } else {
            self.position = (self.position + elapsed_ms).clamp(0, self.length);
        }
        self.bus.emit(EngineEvent::PositionChanged(self.position));

        self.render();

        if !self.config.realtime && self.position == self.length {
            self.stop();
        }
    }

    // ========== Seeking ==========

    pub fn seek_forward(&mut self) {
        self.seek_by(SEEK_STEP_MS);
    }

    pub fn seek_backward(&mut self) {
        self.seek_by(-SEEK_STEP_MS);
    }

    pub fn seek_forward_bit(&mut self) {
        self.seek_by(SEEK_STEP_BIT_MS);
    }

    pub fn seek_backward_bit(&mut self) {
        self.seek_by(-SEEK_STEP_BIT_MS);
    }

    pub fn seek_to_start(&mut self) {
        self.set_position(0);
        self.render_if_paused();
    }

    pub fn seek_to_end(&mut self) {
        let length = self.length;
        self.set_position(length);
        self.render_if_paused();
    }

    fn seek_by(&mut self, delta: i64) {
        let target = self.position + delta;
        self.set_position(target);
        self.render_if_paused();
    }

    fn render_if_paused(&mut self) {
        if !self.playing {
            self.render();
        }
    }

    // ========== Rendering ==========

    /// Host resize notification: stored geometry is stale, so re-lay-out
    /// everything; a paused engine repaints immediately, a playing one
    /// picks the new geometry up on its next tick.
    pub fn resize(&mut self) {
        if self.viewer.is_none() {
            return;
        }
        self.refresh();
        self.render_if_paused();
    }

    /// Reconcile the render set against the currently visible comments.
    /// No-op without a viewer.
    pub fn render(&mut self) {
        let Some(mut viewer) = self.viewer.take() else {
            return;
        };
        self.render_with(&mut viewer);
        self.viewer = Some(viewer);
    }

    fn render_with(&mut self, viewer: &mut V) {
        let duration = self.config.duration;
        let duration_alt = self.config.duration_alt;
        let viewer_width = viewer.width();

        // Phase 1: expire rendered comments whose window closed; refresh
        // the scroll position of the rest.
        let mut i = 0;
        while i < self.render_set.len() {
            let Some(si) = self.store.index_of(self.render_set[i].id) else {
                self.render_set.remove(i);
                continue;
            };
            if self.store[si].is_visible_at(self.position, duration, duration_alt) {
                self.store[si].x =
                    layout::calc_x(&self.store[si], self.position, viewer_width, duration);
                i += 1;
            } else {
                self.store[si].visibility = false;
                viewer.remove_chat(&self.store[si]);
                self.render_set.remove(i);
                if self.config.realtime {
                    // Live feeds drop expired comments from the store
                    // entirely to bound memory.
                    self.store.remove_at(si);
                }
                self.removed_since_hint += 1;
            }
        }

        // Phase 2: bring newly visible comments in, evicting the
        // earliest-vpos rendered comment when at capacity.
        let candidates: Vec<(CommentId, i64)> = self
            .store
            .iter()
            .filter(|c| c.is_visible_at(self.position, duration, duration_alt))
            .filter(|c| !self.render_set.iter().any(|e| e.id == c.id))
            .map(|c| (c.id, c.vpos))
            .collect();

        for (id, vpos) in candidates {
            let Some(si) = self.store.index_of(id) else {
                // Evicted from the store while handling this batch.
                continue;
            };
            self.store[si].x =
                layout::calc_x(&self.store[si], self.position, viewer_width, duration);

            while self.render_set.len() >= self.config.limit {
                let evicted = self.render_set.remove(0);
                if let Some(ei) = self.store.index_of(evicted.id) {
                    viewer.remove_chat(&self.store[ei]);
                }
                if self.config.realtime {
                    self.store.remove_front();
                }
                self.removed_since_hint += 1;
            }

            let Some(si) = self.store.index_of(id) else {
                continue;
            };
            self.store[si].visibility = true;
            viewer.create_chat(&self.store[si]);

            let at = self.render_set.partition_point(|e| e.vpos <= vpos);
            self.render_set.insert(at, RenderEntry { id, vpos });
        }

        let threshold = ((self.store.len() / 10) as u64).clamp(100, 10_000);
        if self.removed_since_hint > threshold {
            viewer.hint_gc();
            self.removed_since_hint = 0;
        }
    }

    // ========== Layout ==========

    /// Recompute geometry for the whole store (or the simple-mode window
    /// around the playhead, continuing incrementally).
    pub fn refresh(&mut self) {
        self.refresh_from(0);
    }

    /// Recompute geometry starting at `index`; earlier comments keep
    /// theirs. Any pending incremental pass is superseded.
    pub fn refresh_from(&mut self, index: usize) {
        self.apply_base_font_size();
        let generation = self.scheduler.begin();

        let (start, end) = if self.is_simple_mode() {
            let end = self.store.upper_bound(self.position);
            let start = end.saturating_sub(self.config.limit);
            self.scheduler.schedule(generation, end);
            (start, end)
        } else {
            (index, self.store.len())
        };

        self.layout_range(start, end);
    }

    fn run_refresh_slice(&mut self, task: SliceTask) {
        let end = self
            .store
            .upper_bound(self.position + SLICE_LOOKAHEAD_MS)
            .max(task.start);
        self.layout_range(task.start, end);
        if end < self.store.len() {
            self.scheduler.schedule(task.generation, end);
        }
    }

    fn layout_range(&mut self, start: usize, end: usize) {
        let Some(mut viewer) = self.viewer.take() else {
            return;
        };
        let end = end.min(self.store.len());
        let viewer_width = viewer.width();
        let viewer_height = viewer.height();
        let simple = self.is_simple_mode();

        for i in start..end {
            let resolved = layout::resolve_size(&mut viewer, &self.store[i], viewer_width);
            {
                let comment = &mut self.store[i];
                comment.width = resolved.width;
                comment.height = resolved.height;
                comment.size = resolved.size;
            }

            let scan_base = if simple {
                i.saturating_sub(self.config.limit)
            } else {
                0
            };
            let slot = layout::slot_y(
                &self.store,
                i,
                scan_base,
                &self.config,
                viewer_width,
                viewer_height,
                &mut self.rng,
            );
            let comment = &mut self.store[i];
            comment.y = slot.y;
            comment.bullet = slot.bullet;
        }

        self.viewer = Some(viewer);
    }

    fn apply_base_font_size(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if self.config.sizing_mode == SizingMode::FixedRows && self.config.rows > 0 {
            let px =
                viewer.calc_chat_font_size_from_height(viewer.height() as f32 / self.config.rows as f32);
            viewer.set_base_font_size(&format!("{px}px"));
        } else {
            viewer.set_base_font_size(&self.config.base_font_size);
        }
    }

    // ========== Density ==========

    /// Comment-load histogram over the timeline in `divisions` buckets.
    ///
    /// Realtime mode drops expired comments from the store, so a
    /// histogram taken later under-counts historical density. Known
    /// limitation.
    pub fn influence(&self, divisions: usize) -> Vec<u32> {
        self.store.influence(
            divisions,
            self.length,
            self.config.duration,
            self.config.duration_alt,
        )
    }
}

impl<V: Viewer> Default for Engine<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewer::ChatMetrics;
    use crate::entities::Lane;
    use std::sync::{Arc, Mutex};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Fixed-metrics viewer: glyphs are 0.6 em wide, rows one em tall.
    struct StubViewer {
        w: i32,
        h: i32,
        created: Vec<CommentId>,
        removed: Vec<CommentId>,
        base_font: String,
        gc_hints: usize,
    }

    impl StubViewer {
        fn new(w: i32, h: i32) -> Self {
            Self {
                w,
                h,
                created: Vec::new(),
                removed: Vec::new(),
                base_font: String::new(),
                gc_hints: 0,
            }
        }
    }

    fn font_px(size: Option<&str>) -> f32 {
        size.and_then(|s| s.strip_suffix("px"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(32.0)
    }

    impl Viewer for StubViewer {
        fn width(&self) -> i32 {
            self.w
        }

        fn height(&self) -> i32 {
            self.h
        }

        fn create_chat(&mut self, comment: &Comment) {
            self.created.push(comment.id);
        }

        fn remove_chat(&mut self, comment: &Comment) {
            self.removed.push(comment.id);
        }

        fn measure_chat(
            &mut self,
            text: &str,
            _color: Option<&str>,
            size: Option<&str>,
        ) -> ChatMetrics {
            let px = font_px(size);
            ChatMetrics {
                width: (text.chars().count() as f32 * px * 0.6) as i32,
                height: px as i32,
                computed_font_size: px,
            }
        }

        fn set_base_font_size(&mut self, font_size: &str) {
            self.base_font = font_size.to_string();
        }

        fn calc_chat_font_size_from_height(&self, height: f32) -> f32 {
            height
        }

        fn hint_gc(&mut self) {
            self.gc_hints += 1;
        }
    }

    fn engine(w: i32, h: i32) -> Engine<StubViewer> {
        let mut engine = Engine::with_seed(42);
        engine.set_viewer(StubViewer::new(w, h));
        engine
    }

    fn input(vpos: i64) -> CommentInput {
        CommentInput {
            text: "hello".into(),
            vpos,
            ..Default::default()
        }
    }

    fn input_lane(vpos: i64, lane: Lane) -> CommentInput {
        CommentInput {
            lane,
            ..input(vpos)
        }
    }

    #[test]
    fn test_capacity_eviction_is_fifo_by_vpos() {
        let mut engine = engine(640, 480);
        engine.set_limit(2).unwrap();
        engine.add_comment(vec![input(0), input(100), input(200)]);

        engine.set_position(250);
        engine.render();

        let rendered: Vec<i64> = engine.rendered().map(|c| c.vpos).collect();
        assert_eq!(rendered, vec![100, 200]);
        // The vpos=0 comment was created, then evicted as the earliest.
        let viewer = engine.viewer().unwrap();
        assert_eq!(viewer.created.len(), 3);
        assert_eq!(viewer.removed.len(), 1);
    }

    #[test]
    fn test_render_set_never_exceeds_limit() {
        let mut engine = engine(640, 480);
        engine.set_duration(10_000);
        engine.add_comment((0..150).map(input).collect());

        engine.set_position(150);
        engine.render();

        assert_eq!(engine.rendered_count(), engine.limit());
        // FIFO by timecode: the survivors are the latest hundred.
        assert_eq!(engine.rendered().next().map(|c| c.vpos), Some(50));
    }

    #[test]
    fn test_clear_round_trip() {
        let mut engine = engine(640, 480);
        engine.add_chat(input(0));
        engine.render();
        assert_eq!(engine.rendered_count(), 1);

        engine.clear_comment();
        assert_eq!(engine.comment_count(), 0);
        assert_eq!(engine.rendered_count(), 0);
        assert_eq!(engine.length(), 0);
        // The rendered chat was torn down in the viewer.
        assert_eq!(engine.viewer().unwrap().removed.len(), 1);
    }

    #[test]
    fn test_length_tracks_last_comment_window() {
        let mut engine = engine(640, 480);
        engine.add_chat(input(1000));
        assert_eq!(engine.length(), 1000 + engine.duration());

        engine.add_chat(input_lane(8000, Lane::Top));
        assert_eq!(engine.length(), 8000 + engine.duration_alt());
    }

    #[test]
    fn test_playback_advances_and_autostops() {
        init_logs();
        let mut engine = engine(640, 480);
        engine.add_chat(input(0));
        assert_eq!(engine.length(), 4000);

        engine.start();
        assert!(engine.playing());

        engine.tick(1500);
        assert_eq!(engine.position(), 1500);
        assert!(engine.playing());
        assert_eq!(engine.rendered_count(), 1);

        engine.tick(10_000);
        assert_eq!(engine.position(), 4000);
        assert!(!engine.playing(), "clamped at length must stop playback");
    }

    #[test]
    fn test_start_is_noop_at_timeline_end() {
        let mut engine = engine(640, 480);
        engine.start();
        assert!(!engine.playing(), "empty timeline: position == length");

        engine.add_chat(input(0));
        engine.seek_to_end();
        engine.start();
        assert!(!engine.playing());

        engine.seek_to_start();
        engine.start();
        assert!(engine.playing());
        engine.start(); // no-op while playing
        assert!(engine.playing());
    }

    #[test]
    fn test_realtime_growth() {
        let mut engine = engine(640, 480);
        engine.set_realtime(true);
        engine.start();
        assert_eq!((engine.position(), engine.length()), (0, 0));

        // A live chat ahead of the stream head stretches the timeline.
        engine.add_chat(input(5000));
        assert_eq!(engine.length(), 5000);

        engine.tick(250);
        assert_eq!(engine.position(), 250);
        assert_eq!(engine.length(), 5250);
        assert!(engine.playing(), "realtime playback never auto-stops");
    }

    #[test]
    fn test_realtime_drops_expired_comments_from_store() {
        let mut engine = engine(640, 480);
        engine.set_realtime(true);
        engine.start();
        engine.add_chat(input(0));

        engine.tick(100);
        assert_eq!(engine.rendered_count(), 1);

        // Past the comment's window: gone from render set AND store.
        engine.tick(5000);
        assert_eq!(engine.rendered_count(), 0);
        assert_eq!(engine.comment_count(), 0);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut engine = engine(640, 480);
        engine.add_comment(vec![input(0), input(5000), input(10_000)]);

        let snapshot = |e: &Engine<StubViewer>| {
            e.comments()
                .map(|c| (c.x, c.y, c.width, c.height, c.bullet))
                .collect::<Vec<_>>()
        };

        let first = snapshot(&engine);
        engine.refresh();
        assert_eq!(snapshot(&engine), first);
    }

    #[test]
    fn test_top_overflow_sets_bullet() {
        let mut engine = engine(640, 50);
        engine.add_comment(vec![input_lane(0, Lane::Top), input_lane(100, Lane::Top)]);

        let comments: Vec<&Comment> = engine.comments().collect();
        assert!(!comments[0].bullet);
        assert!(comments[1].bullet);
        assert!(
            (0..50 - comments[1].height).contains(&comments[1].y),
            "bullet row {} outside viewport",
            comments[1].y
        );
    }

    #[test]
    fn test_fixed_lane_auto_shrinks_to_viewport() {
        let mut engine = engine(640, 480);
        let wide = CommentInput {
            text: "x".repeat(50),
            size: Some("32px".into()),
            ..input_lane(0, Lane::Top)
        };
        engine.add_chat(wide);

        let c = engine.comments().next().unwrap();
        assert!(c.width <= 640, "width {} still exceeds viewport", c.width);
        assert_eq!(c.raw_size.as_deref(), Some("32px"));
        let shrunk = c.size.as_deref().unwrap();
        assert!(shrunk.ends_with("px") && shrunk != "32px", "size = {shrunk}");
    }

    #[test]
    fn test_flow_comments_never_shrink() {
        let mut engine = engine(640, 480);
        engine.add_chat(CommentInput {
            text: "x".repeat(50),
            size: Some("32px".into()),
            ..input(0)
        });

        let c = engine.comments().next().unwrap();
        assert!(c.width > 640);
        assert_eq!(c.size.as_deref(), Some("32px"));
    }

    #[test]
    fn test_limit_validation() {
        let mut engine = engine(640, 480);
        assert_eq!(engine.set_limit(0), Err(EngineError::LimitOutOfRange(0)));
        assert_eq!(engine.limit(), 100, "failed setter must not change state");
        assert_eq!(engine.set_limit(5), Ok(()));
        assert_eq!(engine.limit(), 5);
    }

    #[test]
    fn test_duration_setters_ignore_out_of_range() {
        let mut engine = engine(640, 480);
        engine.set_duration(99);
        engine.set_duration(10_001);
        assert_eq!(engine.duration(), 4000);
        engine.set_duration(100);
        assert_eq!(engine.duration(), 100);

        engine.set_duration_alt(0);
        assert_eq!(engine.duration_alt(), 3000);
        engine.set_duration_alt(10_000);
        assert_eq!(engine.duration_alt(), 10_000);
    }

    #[test]
    fn test_observer_notifications() {
        let mut engine = engine(640, 480);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = engine.subscribe(move |e| sink.lock().unwrap().push(e));

        engine.add_chat(input(0));
        engine.set_position(500);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                EngineEvent::LengthChanged(4000),
                EngineEvent::PositionChanged(0),
                EngineEvent::PositionChanged(500),
            ]
        );

        engine.unsubscribe(id);
        engine.set_position(600);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_hide_show_keep_render_set() {
        let mut engine = engine(640, 480);
        engine.add_chat(input(0));
        engine.render();

        engine.hide_comment();
        assert!(engine.rendered().all(|c| !c.visibility));
        assert_eq!(engine.rendered_count(), 1);
        assert!(engine.viewer().unwrap().removed.is_empty());

        engine.show_comment();
        assert!(engine.rendered().all(|c| c.visibility));
    }

    #[test]
    fn test_seek_clamps_and_renders_when_paused() {
        let mut engine = engine(640, 480);
        engine.add_chat(input(0));

        engine.seek_backward();
        assert_eq!(engine.position(), 0);

        engine.seek_forward_bit();
        assert_eq!(engine.position(), 1000);
        assert_eq!(engine.rendered_count(), 1, "paused seek must repaint");

        engine.seek_forward();
        assert_eq!(engine.position(), 4000, "clamped to length");
    }

    #[test]
    fn test_influence_histogram() {
        let mut engine = engine(640, 480);
        engine.set_duration(400);
        engine.add_chat(input(0));
        engine.set_length(1000);

        assert_eq!(engine.influence(10), vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_simple_mode_incremental_refresh() {
        init_logs();
        let mut engine = engine(640, 480);
        engine.set_limit(2).unwrap();
        engine.set_simple_threshold(5);
        engine.add_comment((0..12).map(|i| input(i * 1000)).collect());
        assert!(engine.is_simple_mode());

        // Synchronous pass covered only the window around the playhead.
        let width_at = |e: &Engine<StubViewer>, i: usize| e.comments().nth(i).unwrap().width;
        assert!(width_at(&engine, 0) > 0);
        assert_eq!(width_at(&engine, 1), 0);

        // Sparse future comments: the deferred slice makes no progress
        // until the playhead approaches them.
        engine.tick(100);
        assert_eq!(width_at(&engine, 1), 0);

        // Moving the playhead re-windows synchronously and re-arms the
        // continuation past the new window.
        engine.set_position(2600);
        assert!(width_at(&engine, 1) > 0);
        assert!(width_at(&engine, 2) > 0);
        assert_eq!(width_at(&engine, 3), 0);

        // Continuation picks up the next 500 ms worth of comments.
        engine.tick(100);
        assert!(width_at(&engine, 3) > 0);
        assert_eq!(width_at(&engine, 4), 0);

        // Delay accumulates across ticks before the next slice fires.
        engine.tick(50);
        assert_eq!(width_at(&engine, 4), 0);
    }

    #[test]
    fn test_gc_hint_after_heavy_churn() {
        let mut engine = engine(640, 480);
        engine.set_limit(1).unwrap();
        engine.set_duration(10_000);
        engine.add_comment((0..150).map(input).collect());

        engine.set_position(150);
        engine.render();

        assert_eq!(engine.viewer().unwrap().gc_hints, 1);
    }

    #[test]
    fn test_fixed_rows_sizing_mode() {
        let mut engine = engine(640, 480);
        engine.set_sizing_mode(SizingMode::FixedRows);
        engine.set_rows(12);
        engine.refresh();

        assert_eq!(engine.viewer().unwrap().base_font, "40px");
    }

    #[test]
    fn test_render_without_viewer_is_noop() {
        let mut engine: Engine<StubViewer> = Engine::with_seed(1);
        engine.add_chat(input(0));
        engine.render();
        assert_eq!(engine.rendered_count(), 0);
    }
}

//! Placement engine: horizontal scroll math, vertical slot assignment,
//! and size resolution.
//!
//! Slot assignment is a fixed-point iteration: each pass scans prior
//! same-lane comments whose active windows overlap the new comment, and
//! any stacking adjustment restarts the scan, because the new row may now
//! collide with a different candidate. The loop is capped; both the cap
//! and a stack that would leave the viewport degrade to a random row,
//! marking the comment a bullet.

use log::{debug, warn};
use rand::Rng;

use crate::core::config::EngineConfig;
use crate::entities::{Comment, CommentStore, Lane};

/// Upper bound on fixed-point passes before placement gives up and takes
/// the random-row fallback.
pub(crate) const MAX_PLACEMENT_PASSES: usize = 1024;

/// Assigned vertical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub y: i32,
    pub bullet: bool,
}

/// Size resolved against the viewer, possibly shrunk to fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedSize {
    pub width: i32,
    pub height: i32,
    pub size: Option<String>,
}

/// Horizontal position of a comment at `position`.
///
/// Flow comments interpolate linearly over `duration`: the left edge
/// starts at the viewport's right edge and the right edge reaches the
/// viewport's left edge when the window closes. Fixed comments are
/// centered.
pub fn calc_x(comment: &Comment, position: i64, viewer_width: i32, duration: i64) -> i32 {
    if comment.lane.is_fixed() {
        return (viewer_width - comment.width) / 2;
    }
    let rate = (position - comment.vpos) as f64 / duration as f64;
    (f64::from(viewer_width) - rate * f64::from(viewer_width + comment.width)) as i32
}

/// Resolve a comment's render extent via the viewer. Fixed-lane comments
/// wider than the viewport shrink proportionally and are re-measured;
/// flow comments never shrink.
pub(crate) fn resolve_size<V: crate::core::viewer::Viewer>(
    viewer: &mut V,
    comment: &Comment,
    viewer_width: i32,
) -> ResolvedSize {
    let metrics = viewer.measure_chat(
        &comment.text,
        comment.color.as_deref(),
        comment.raw_size.as_deref(),
    );
    let mut resolved = ResolvedSize {
        width: metrics.width,
        height: metrics.height,
        size: comment.raw_size.clone(),
    };

    if comment.lane.is_fixed() && metrics.width > 0 {
        let ratio = viewer_width as f32 / metrics.width as f32;
        if ratio < 1.0 {
            let shrunk = format!("{}px", metrics.computed_font_size * ratio);
            let remeasured =
                viewer.measure_chat(&comment.text, comment.color.as_deref(), Some(&shrunk));
            debug!(
                "comment {} shrunk to {} ({} -> {} px wide)",
                comment.id, shrunk, metrics.width, remeasured.width
            );
            resolved.width = remeasured.width;
            resolved.height = remeasured.height;
            resolved.size = Some(shrunk);
        }
    }

    resolved
}

/// Assign the vertical slot for the comment at `chat_index`.
///
/// Candidates are comments before `chat_index` in store order, starting
/// at `scan_base` (simple mode bounds the scan to `limit` entries back).
/// Only same-lane, temporally overlapping, already-measured candidates
/// can collide. The returned `y` is already mirrored for the bottom lane
/// unless the bullet fallback fired; bullet rows are absolute.
pub(crate) fn slot_y<R: Rng>(
    store: &CommentStore,
    chat_index: usize,
    scan_base: usize,
    config: &EngineConfig,
    viewer_width: i32,
    viewer_height: i32,
    rng: &mut R,
) -> Slot {
    let comments = store.as_slice();
    let chat = &comments[chat_index];
    let dur = chat.active_duration(config.duration, config.duration_alt);
    let fixed = chat.lane.is_fixed();
    let mirror = chat.lane == Lane::Bottom;

    let mut y: i32 = 0;
    let mut bullet = false;
    let mut passes = 0usize;

    'fixed_point: loop {
        if passes >= MAX_PLACEMENT_PASSES {
            warn!(
                "slot search for comment {} did not settle in {} passes, taking random row",
                chat.id, passes
            );
            y = random_row(viewer_height, chat.height, rng);
            bullet = true;
            break;
        }
        passes += 1;

        let mut stacked = false;
        for candidate in &comments[scan_base..chat_index] {
            if candidate.lane != chat.lane {
                continue;
            }
            if chat.vpos - candidate.vpos > dur {
                continue;
            }
            let candidate_y = if mirror {
                viewer_height - candidate.y - candidate.height
            } else {
                candidate.y
            };
            if y >= candidate_y + candidate.height || candidate_y >= y + chat.height {
                continue;
            }
            // Not yet measured, cannot collide.
            if candidate.height == 0 {
                continue;
            }

            if !fixed {
                // Moving comments collide only when their trajectories
                // overlap during the shared window; sample both ends.
                let vstart = chat.vpos.max(candidate.vpos);
                let vend = (chat.vpos + dur).min(candidate.vpos + dur);
                let chat_start = calc_x(chat, vstart, viewer_width, config.duration);
                let chat_end = calc_x(chat, vend, viewer_width, config.duration);
                let cand_start = calc_x(candidate, vstart, viewer_width, config.duration);
                let cand_end = calc_x(candidate, vend, viewer_width, config.duration);

                let clear_at_start = chat_start >= cand_start + candidate.width
                    || cand_start >= chat_start + chat.width;
                let clear_at_end =
                    chat_end >= cand_end + candidate.width || cand_end >= chat_end + chat.width;
                if clear_at_start && clear_at_end {
                    continue;
                }
            }

            y += candidate.height;
            if y > viewer_height - chat.height {
                y = random_row(viewer_height, chat.height, rng);
                bullet = true;
                debug!("no free slot for comment {}, random row {}", chat.id, y);
                break 'fixed_point;
            }
            stacked = true;
            break;
        }

        if !stacked {
            break;
        }
    }

    let y = if mirror && !bullet {
        viewer_height - y - chat.height
    } else {
        y
    };
    Slot { y, bullet }
}

fn random_row<R: Rng>(viewer_height: i32, chat_height: i32, rng: &mut R) -> i32 {
    let span = (viewer_height - chat_height).max(1);
    rng.random_range(0..span)
}

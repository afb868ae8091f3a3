//! Comment records - the timed overlay items the engine positions.
//!
//! A [`CommentInput`] is what callers hand to the engine; the store
//! normalizes it into a [`Comment`] with an assigned id and zeroed
//! geometry. Geometry fields are owned by the placement pass and the
//! render pass; everything else is immutable after insertion except
//! `size`, which auto-shrink may rewrite (the original is kept in
//! `raw_size`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity of a comment inside a store. Monotonic per store,
/// so equal-`vpos` comments keep their insertion order.
pub type CommentId = u64;

/// Vertical lane a comment occupies.
///
/// `Flow` comments scroll right-to-left; `Top` and `Bottom` comments sit
/// fixed against the respective viewport edge for their active window.
/// Lanes are independent for collision purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    #[default]
    Flow,
    Top,
    Bottom,
}

impl Lane {
    /// True for the stationary lanes (`Top`, `Bottom`).
    pub fn is_fixed(self) -> bool {
        matches!(self, Lane::Top | Lane::Bottom)
    }
}

/// Caller-facing comment description for `add_comment` / `add_chat`.
///
/// Every field has a sane default, so sparse inputs deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentInput {
    pub text: String,
    pub color: Option<String>,
    /// CSS-ish font size, e.g. `"32px"`. `None` means the viewer's base size.
    pub size: Option<String>,
    pub lane: Lane,
    /// Timecode (ms) at which the comment becomes eligible to display.
    pub vpos: i64,
    /// Opaque payload passed through untouched.
    pub data: Value,
}

/// A timed overlay item, owned by the store once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub color: Option<String>,
    /// Effective font size; auto-shrink may rewrite it.
    pub size: Option<String>,
    /// Font size as originally supplied, never mutated.
    pub raw_size: Option<String>,
    pub lane: Lane,
    pub vpos: i64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// True while the comment is in the render set (and not mass-hidden).
    pub visibility: bool,
    /// True when placement fell back to a random row.
    pub bullet: bool,
    pub data: Value,
}

impl Comment {
    pub(crate) fn from_input(id: CommentId, input: CommentInput) -> Self {
        Self {
            id,
            text: input.text,
            color: input.color,
            raw_size: input.size.clone(),
            size: input.size,
            lane: input.lane,
            vpos: input.vpos,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            visibility: false,
            bullet: false,
            data: input.data,
        }
    }

    /// Visible lifespan in ms: `duration_alt` for fixed lanes, `duration`
    /// for flow.
    pub fn active_duration(&self, duration: i64, duration_alt: i64) -> i64 {
        if self.lane.is_fixed() {
            duration_alt
        } else {
            duration
        }
    }

    /// True iff `position` falls inside the comment's active window,
    /// inclusive at both ends.
    pub fn is_visible_at(&self, position: i64, duration: i64, duration_alt: i64) -> bool {
        let dur = self.active_duration(duration, duration_alt);
        self.vpos <= position && position <= self.vpos + dur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_at(vpos: i64) -> Comment {
        Comment::from_input(
            0,
            CommentInput {
                text: "hello".into(),
                vpos,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_input_defaults() {
        let input = CommentInput::default();
        assert_eq!(input.text, "");
        assert_eq!(input.lane, Lane::Flow);
        assert_eq!(input.vpos, 0);
        assert!(input.data.is_null());
    }

    #[test]
    fn test_visibility_boundaries_inclusive() {
        let c = flow_at(1000);
        assert!(!c.is_visible_at(999, 4000, 3000));
        assert!(c.is_visible_at(1000, 4000, 3000));
        assert!(c.is_visible_at(3000, 4000, 3000));
        assert!(c.is_visible_at(5000, 4000, 3000));
        assert!(!c.is_visible_at(5001, 4000, 3000));
    }

    #[test]
    fn test_active_duration_by_lane() {
        let mut c = flow_at(0);
        assert_eq!(c.active_duration(4000, 3000), 4000);
        c.lane = Lane::Top;
        assert_eq!(c.active_duration(4000, 3000), 3000);
        c.lane = Lane::Bottom;
        assert_eq!(c.active_duration(4000, 3000), 3000);
    }

    #[test]
    fn test_raw_size_preserved() {
        let c = Comment::from_input(
            7,
            CommentInput {
                size: Some("24px".into()),
                ..Default::default()
            },
        );
        assert_eq!(c.raw_size.as_deref(), Some("24px"));
        assert_eq!(c.size.as_deref(), Some("24px"));
    }

    #[test]
    fn test_lane_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Lane::Top).unwrap(), "\"top\"");
        let lane: Lane = serde_json::from_str("\"bottom\"").unwrap();
        assert_eq!(lane, Lane::Bottom);
    }
}

//! Sorted comment store.
//!
//! Invariant: comments are always ordered ascending by `vpos`, with ties
//! kept in insertion order. Inserts go through an upper-bound binary
//! search so same-timecode comments land after existing ones (FIFO).
//!
//! Also hosts the density histogram (`influence`), a read-only utility
//! over the store contents.

use std::ops::{Index, IndexMut};

use crate::entities::comment::{Comment, CommentId, CommentInput};

/// Ordered collection of comments, sorted ascending by `vpos`.
#[derive(Debug, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
    next_id: CommentId,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Comment> {
        self.comments.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Comment> {
        self.comments.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Comment> {
        self.comments.get_mut(index)
    }

    pub fn last(&self) -> Option<&Comment> {
        self.comments.last()
    }

    /// Store index of the comment with `id`, if present.
    pub fn index_of(&self, id: CommentId) -> Option<usize> {
        self.comments.iter().position(|c| c.id == id)
    }

    /// First index whose `vpos` exceeds the given timecode. Always a valid
    /// insertion index in `[0, len]`, even for timecodes below or above
    /// every stored comment.
    pub fn upper_bound(&self, vpos: i64) -> usize {
        self.comments.partition_point(|c| c.vpos <= vpos)
    }

    /// Normalize and insert a batch, keeping the sort order. Returns the
    /// earliest index touched, which callers use to bound re-layout work.
    /// An empty batch leaves the store untouched and returns `len`.
    pub fn insert(&mut self, inputs: Vec<CommentInput>) -> usize {
        let mut earliest = self.comments.len();
        for input in inputs {
            let id = self.next_id;
            self.next_id += 1;

            let comment = Comment::from_input(id, input);
            let at = self.upper_bound(comment.vpos);
            earliest = earliest.min(at);
            self.comments.insert(at, comment);
        }
        earliest
    }

    pub fn remove_at(&mut self, index: usize) -> Comment {
        self.comments.remove(index)
    }

    pub fn remove_front(&mut self) -> Option<Comment> {
        if self.comments.is_empty() {
            None
        } else {
            Some(self.comments.remove(0))
        }
    }

    pub fn clear(&mut self) {
        self.comments.clear();
    }

    /// Comment-load histogram over `[0, length]` split into `divisions`
    /// buckets: each comment increments every bucket its active window
    /// touches, inclusive. Indices that round up to `divisions` (an end
    /// time exactly at `length`) are dropped rather than indexed.
    pub fn influence(
        &self,
        divisions: usize,
        length: i64,
        duration: i64,
        duration_alt: i64,
    ) -> Vec<u32> {
        let mut buckets = vec![0u32; divisions];
        if divisions == 0 || length <= 0 {
            return buckets;
        }

        for c in &self.comments {
            let start = c.vpos;
            let end = c.vpos + c.active_duration(duration, duration_alt);
            let s = ((start as f64 / length as f64).min(1.0) * divisions as f64) as usize;
            let e = ((end as f64 / length as f64).min(1.0) * divisions as f64) as usize;

            for bucket in buckets.iter_mut().take(divisions.min(e + 1)).skip(s) {
                *bucket += 1;
            }
        }
        buckets
    }
}

impl Index<usize> for CommentStore {
    type Output = Comment;

    fn index(&self, index: usize) -> &Comment {
        &self.comments[index]
    }
}

impl IndexMut<usize> for CommentStore {
    fn index_mut(&mut self, index: usize) -> &mut Comment {
        &mut self.comments[index]
    }
}

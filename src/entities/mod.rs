//! Entities module - comment records and the sorted store.

pub mod comment;
pub mod store;

pub use comment::{Comment, CommentId, CommentInput, Lane};
pub use store::CommentStore;

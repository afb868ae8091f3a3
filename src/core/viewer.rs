//! External viewer interface.
//!
//! The engine never paints; it drives a viewer through this trait:
//! create/remove chats, measure text off-screen, and adjust the base
//! font. All calls are synchronous and are assumed to have no side
//! effects beyond the requested operation. The display surface extent
//! is read back through `width`/`height`.

use crate::entities::Comment;

/// Measured extent of a chat as the viewer would lay it out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatMetrics {
    pub width: i32,
    pub height: i32,
    /// Resolved font size in px, used as the shrink baseline.
    pub computed_font_size: f32,
}

/// Rendering collaborator owned by the host.
pub trait Viewer {
    /// Display surface width in px.
    fn width(&self) -> i32;

    /// Display surface height in px.
    fn height(&self) -> i32;

    /// Instantiate a chat. The comment's geometry fields are already set.
    fn create_chat(&mut self, comment: &Comment);

    /// Tear down a previously created chat.
    fn remove_chat(&mut self, comment: &Comment);

    /// Off-screen measurement of a chat that is not necessarily rendered.
    fn measure_chat(&mut self, text: &str, color: Option<&str>, size: Option<&str>)
    -> ChatMetrics;

    /// Push the base font size, a CSS-ish value like `"32px"`.
    fn set_base_font_size(&mut self, font_size: &str);

    /// Font size in px that makes one chat row fit the given height.
    fn calc_chat_font_size_from_height(&self, height: f32) -> f32;

    /// Advisory memory-pressure hint after heavy chat churn.
    fn hint_gc(&mut self) {}
}

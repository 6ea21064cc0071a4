//! The resolved-geometry query surface the engine reads from.
//!
//! A host renders the document however it likes and answers two questions
//! per element: its post-cascade style and its border box. The engine never
//! lays anything out itself.

use crate::dom::NodeId;
use crate::style::{ComputedStyle, StyleMap};

/// Border box of an element, relative to the top-left of the content flow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxGeometry {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

pub trait Surface {
    /// Computed styles of every element of the measured subtree.
    fn styles(&self) -> &StyleMap;

    /// Border box of an element, `None` when it generates no box.
    fn geometry(&self, node: NodeId) -> Option<BoxGeometry>;

    /// Bumped whenever the host's geometry changes. Two equal readings bracket
    /// a consistent view.
    fn revision(&self) -> u64;

    fn style(&self, node: NodeId) -> Option<&ComputedStyle> {
        self.styles().get(node)
    }
}

//! Prompt nodes: edit instructions bound to exactly one parent object.

use super::{ObjectId, ObjectKind, ObjectRef};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Horizontal gap between a prompt node and the left edge of its parent.
pub const PROMPT_NODE_MARGIN: f64 = 20.0;

/// A prompt node attached to an image or frame.
///
/// The node has no position state of its own: its geometry is always derived
/// from the parent's current bounds via [`PromptNode::layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptNode {
    pub(crate) id: ObjectId,
    /// The owning image or frame.
    pub attached_to: ObjectRef,
    /// Node width; height follows the parent.
    pub width: f64,
    /// Stacking order within the node band.
    pub z_index: i64,
    /// Edit instructions. May be empty while the user is typing.
    #[serde(default)]
    pub prompt: String,
}

impl PromptNode {
    pub fn new(attached_to: ObjectRef, width: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            attached_to,
            width,
            z_index: 0,
            prompt: String::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::PromptNode
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::PromptNode(self.id)
    }

    /// Node bounds for a parent with the given (unrotated) bounds.
    ///
    /// `x = parent.x - width - margin`, vertically centered on the parent,
    /// with the parent's height.
    pub fn layout(&self, parent: Rect) -> Rect {
        let height = parent.height();
        let x = parent.x0 - self.width - PROMPT_NODE_MARGIN;
        let y = parent.y0 + parent.height() / 2.0 - height / 2.0;
        Rect::from_origin_size(Point::new(x, y), (self.width, height))
    }

    /// Trimmed prompt text, or `None` if blank.
    pub fn prompt_text(&self) -> Option<&str> {
        let text = self.prompt.trim();
        (!text.is_empty()).then_some(text)
    }
}

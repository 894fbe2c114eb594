//! Canvas object definitions.
//!
//! A canvas holds three independent collections (bands): images, frames and
//! prompt nodes. Every entity carries its kind explicitly through
//! [`ObjectKind`], and cross references use the tagged [`ObjectRef`].

mod frame;
mod image;
mod prompt_node;

pub use frame::{FrameObject, parse_aspect_ratio};
pub use image::ImageObject;
pub use prompt_node::{PROMPT_NODE_MARGIN, PromptNode};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for canvas objects, unique across all bands.
pub type ObjectId = Uuid;

/// The kind of a canvas object. Each kind has its own z-index band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Image,
    Frame,
    PromptNode,
}

impl ObjectKind {
    /// Draw layer of the band. Higher bands always draw above lower ones.
    pub fn layer(self) -> u8 {
        match self {
            ObjectKind::Image => 0,
            ObjectKind::Frame => 1,
            ObjectKind::PromptNode => 2,
        }
    }
}

/// A typed reference to an object on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectRef {
    Image(ObjectId),
    Frame(ObjectId),
    PromptNode(ObjectId),
}

impl ObjectRef {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectRef::Image(id) | ObjectRef::Frame(id) | ObjectRef::PromptNode(id) => *id,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::Image(_) => ObjectKind::Image,
            ObjectRef::Frame(_) => ObjectKind::Frame,
            ObjectRef::PromptNode(_) => ObjectKind::PromptNode,
        }
    }

    /// Images and frames can own a prompt node; prompt nodes cannot.
    pub fn can_own_prompt(&self) -> bool {
        !matches!(self, ObjectRef::PromptNode(_))
    }
}

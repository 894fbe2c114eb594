//! Canvas document: the three object bands of one named workspace.

use crate::error::{ValidationError, ValidationResult};
use crate::geometry::bounds_overlap;
use crate::objects::{FrameObject, ImageObject, ObjectId, ObjectKind, ObjectRef, PromptNode};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A named canvas holding images, frames and prompt nodes.
///
/// Z-indices are only compared within their own band. Every prompt node's
/// parent is a live image or frame on the same canvas; removing a parent
/// removes its node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    /// Unique canvas identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    images: HashMap<ObjectId, ImageObject>,
    frames: HashMap<ObjectId, FrameObject>,
    prompt_nodes: HashMap<ObjectId, PromptNode>,
}

impl Canvas {
    /// Create a new empty canvas.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            images: HashMap::new(),
            frames: HashMap::new(),
            prompt_nodes: HashMap::new(),
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageObject> {
        self.images.values()
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameObject> {
        self.frames.values()
    }

    pub fn prompt_nodes(&self) -> impl Iterator<Item = &PromptNode> {
        self.prompt_nodes.values()
    }

    pub fn image(&self, id: ObjectId) -> Option<&ImageObject> {
        self.images.get(&id)
    }

    pub fn image_mut(&mut self, id: ObjectId) -> Option<&mut ImageObject> {
        self.images.get_mut(&id)
    }

    pub fn frame(&self, id: ObjectId) -> Option<&FrameObject> {
        self.frames.get(&id)
    }

    pub fn frame_mut(&mut self, id: ObjectId) -> Option<&mut FrameObject> {
        self.frames.get_mut(&id)
    }

    pub fn prompt_node(&self, id: ObjectId) -> Option<&PromptNode> {
        self.prompt_nodes.get(&id)
    }

    /// Resolve a bare id to a typed reference.
    pub fn resolve(&self, id: ObjectId) -> Option<ObjectRef> {
        if self.images.contains_key(&id) {
            Some(ObjectRef::Image(id))
        } else if self.frames.contains_key(&id) {
            Some(ObjectRef::Frame(id))
        } else if self.prompt_nodes.contains_key(&id) {
            Some(ObjectRef::PromptNode(id))
        } else {
            None
        }
    }

    /// Check whether the referenced object is live on this canvas.
    pub fn contains(&self, obj: ObjectRef) -> bool {
        match obj {
            ObjectRef::Image(id) => self.images.contains_key(&id),
            ObjectRef::Frame(id) => self.frames.contains_key(&id),
            ObjectRef::PromptNode(id) => self.prompt_nodes.contains_key(&id),
        }
    }

    /// Highest z-index in a band, if the band is non-empty.
    pub fn max_z(&self, kind: ObjectKind) -> Option<i64> {
        match kind {
            ObjectKind::Image => self.images.values().map(|o| o.z_index).max(),
            ObjectKind::Frame => self.frames.values().map(|o| o.z_index).max(),
            ObjectKind::PromptNode => self.prompt_nodes.values().map(|o| o.z_index).max(),
        }
    }

    /// The z-index a new topmost object in `kind`'s band receives.
    pub fn next_z(&self, kind: ObjectKind) -> i64 {
        self.max_z(kind).map_or(0, |z| z + 1)
    }

    /// Add an image on top of the image band.
    pub fn add_image(&mut self, mut image: ImageObject) -> ObjectId {
        image.z_index = self.next_z(ObjectKind::Image);
        let id = image.id();
        self.images.insert(id, image);
        id
    }

    /// Add a frame on top of the frame band.
    pub fn add_frame(&mut self, mut frame: FrameObject) -> ObjectId {
        frame.z_index = self.next_z(ObjectKind::Frame);
        let id = frame.id();
        self.frames.insert(id, frame);
        id
    }

    /// Attach a new, empty prompt node to an image or frame.
    pub fn attach_prompt_node(&mut self, parent: ObjectRef, width: f64) -> ValidationResult<ObjectId> {
        if !parent.can_own_prompt() {
            return Err(ValidationError::InvalidPromptTarget(parent));
        }
        if !self.contains(parent) {
            return Err(ValidationError::UnknownObject(parent.id()));
        }
        if self.prompt_node_for(parent.id()).is_some() {
            return Err(ValidationError::PromptNodeExists);
        }
        let mut node = PromptNode::new(parent, width);
        node.z_index = self.next_z(ObjectKind::PromptNode);
        let id = node.id();
        self.prompt_nodes.insert(id, node);
        Ok(id)
    }

    /// The prompt node attached to `parent`, if any.
    pub fn prompt_node_for(&self, parent: ObjectId) -> Option<&PromptNode> {
        self.prompt_nodes
            .values()
            .find(|node| node.attached_to.id() == parent)
    }

    /// Replace a prompt node's text.
    pub fn set_prompt(&mut self, node_id: ObjectId, text: impl Into<String>) -> ValidationResult<()> {
        let node = self
            .prompt_nodes
            .get_mut(&node_id)
            .ok_or(ValidationError::UnknownObject(node_id))?;
        node.prompt = text.into();
        Ok(())
    }

    /// Remove an object, cascading to its prompt node.
    /// Returns every object that was removed.
    pub fn remove(&mut self, obj: ObjectRef) -> Vec<ObjectRef> {
        let existed = match obj {
            ObjectRef::Image(id) => self.images.remove(&id).is_some(),
            ObjectRef::Frame(id) => self.frames.remove(&id).is_some(),
            ObjectRef::PromptNode(id) => self.prompt_nodes.remove(&id).is_some(),
        };
        if !existed {
            return Vec::new();
        }

        let mut removed = vec![obj];
        if obj.can_own_prompt() {
            let orphans: Vec<ObjectId> = self
                .prompt_nodes
                .values()
                .filter(|node| node.attached_to == obj)
                .map(|node| node.id())
                .collect();
            for id in orphans {
                self.prompt_nodes.remove(&id);
                removed.push(ObjectRef::PromptNode(id));
            }
        }
        removed
    }

    /// Drop prompt nodes whose parent no longer exists.
    pub fn prune_orphans(&mut self) -> usize {
        let before = self.prompt_nodes.len();
        let images = &self.images;
        let frames = &self.frames;
        self.prompt_nodes.retain(|_, node| match node.attached_to {
            ObjectRef::Image(id) => images.contains_key(&id),
            ObjectRef::Frame(id) => frames.contains_key(&id),
            ObjectRef::PromptNode(_) => false,
        });
        let pruned = before - self.prompt_nodes.len();
        if pruned > 0 {
            log::warn!("Removed {} orphaned prompt node(s) from canvas {}", pruned, self.id);
        }
        pruned
    }

    /// Remove every object from the canvas.
    pub fn clear(&mut self) {
        self.images.clear();
        self.frames.clear();
        self.prompt_nodes.clear();
    }

    /// Unrotated bounds of an object. Prompt node bounds are derived from
    /// the parent.
    pub fn bounds_of(&self, obj: ObjectRef) -> Option<Rect> {
        match obj {
            ObjectRef::Image(id) => self.images.get(&id).map(ImageObject::bounds),
            ObjectRef::Frame(id) => self.frames.get(&id).map(FrameObject::bounds),
            ObjectRef::PromptNode(id) => self
                .prompt_nodes
                .get(&id)
                .and_then(|node| self.prompt_node_bounds(node)),
        }
    }

    /// Current geometry of a prompt node, derived from its live parent.
    pub fn prompt_node_bounds(&self, node: &PromptNode) -> Option<Rect> {
        let parent = match node.attached_to {
            ObjectRef::Image(id) => self.images.get(&id)?.bounds(),
            ObjectRef::Frame(id) => self.frames.get(&id)?.bounds(),
            ObjectRef::PromptNode(_) => return None,
        };
        Some(node.layout(parent))
    }

    /// Highest z-index among the other objects of `obj`'s band.
    fn max_z_excluding(&self, obj: ObjectRef) -> Option<i64> {
        let id = obj.id();
        match obj.kind() {
            ObjectKind::Image => self.images.values().filter(|o| o.id() != id).map(|o| o.z_index).max(),
            ObjectKind::Frame => self.frames.values().filter(|o| o.id() != id).map(|o| o.z_index).max(),
            ObjectKind::PromptNode => self
                .prompt_nodes
                .values()
                .filter(|o| o.id() != id)
                .map(|o| o.z_index)
                .max(),
        }
    }

    /// Raise an object to the top of its band. An image or frame also
    /// raises its prompt node within the node band.
    ///
    /// Objects that are already strictly topmost keep their z-index; an
    /// object tied with the band maximum is raised above it.
    /// Returns true if any z-index changed.
    pub fn bring_to_front(&mut self, obj: ObjectRef) -> bool {
        let others = self.max_z_excluding(obj);
        let raise = |z: &mut i64| match others {
            Some(m) if *z <= m => {
                *z = m + 1;
                true
            }
            _ => false,
        };

        let mut changed = match obj {
            ObjectRef::Image(id) => self.images.get_mut(&id).is_some_and(|o| raise(&mut o.z_index)),
            ObjectRef::Frame(id) => self.frames.get_mut(&id).is_some_and(|o| raise(&mut o.z_index)),
            ObjectRef::PromptNode(id) => self
                .prompt_nodes
                .get_mut(&id)
                .is_some_and(|o| raise(&mut o.z_index)),
        };

        if obj.can_own_prompt() {
            if let Some(node_id) = self.prompt_node_for(obj.id()).map(PromptNode::id) {
                changed |= self.bring_to_front(ObjectRef::PromptNode(node_id));
            }
        }
        changed
    }

    /// Topmost image under a canvas point, rotation aware.
    pub fn topmost_image_at(&self, point: Point) -> Option<ObjectId> {
        self.images
            .values()
            .filter(|img| img.hit_test(point))
            .max_by_key(|img| img.z_index)
            .map(ImageObject::id)
    }

    /// Find the object under a canvas point.
    ///
    /// Bands are checked from the top: prompt nodes, then frames, then
    /// images. A point inside a frame that also lies on an image resolves to
    /// the topmost such image.
    pub fn hit_test(&self, point: Point) -> Option<ObjectRef> {
        let node = self
            .prompt_nodes
            .values()
            .filter(|node| self.prompt_node_bounds(node).is_some_and(|r| r.contains(point)))
            .max_by_key(|node| node.z_index);
        if let Some(node) = node {
            return Some(node.object_ref());
        }

        let frame = self
            .frames
            .values()
            .filter(|frame| frame.contains(point))
            .max_by_key(|frame| frame.z_index);
        if let Some(frame) = frame {
            return Some(match self.topmost_image_at(point) {
                Some(image) => ObjectRef::Image(image),
                None => frame.object_ref(),
            });
        }

        self.topmost_image_at(point).map(ObjectRef::Image)
    }

    /// Images whose bounding boxes overlap `rect`, in ascending z order.
    pub fn images_overlapping(&self, rect: Rect) -> Vec<&ImageObject> {
        let mut hits: Vec<&ImageObject> = self
            .images
            .values()
            .filter(|img| bounds_overlap(img.bounds(), rect))
            .collect();
        hits.sort_by_key(|img| img.z_index);
        hits
    }

    /// Whether any image inside the frame's region owns a prompt node.
    pub fn frame_has_nested_prompt(&self, frame_id: ObjectId) -> bool {
        let Some(frame) = self.frames.get(&frame_id) else {
            return false;
        };
        self.images_overlapping(frame.bounds())
            .iter()
            .any(|img| self.prompt_node_for(img.id()).is_some())
    }

    /// All objects in draw order: by band, then by z-index within the band.
    pub fn draw_order(&self) -> Vec<ObjectRef> {
        let mut layers: Vec<(u8, i64, ObjectRef)> = self
            .images
            .values()
            .map(|o| (ObjectKind::Image.layer(), o.z_index, o.object_ref()))
            .chain(
                self.frames
                    .values()
                    .map(|o| (ObjectKind::Frame.layer(), o.z_index, o.object_ref())),
            )
            .chain(
                self.prompt_nodes
                    .values()
                    .map(|o| (ObjectKind::PromptNode.layer(), o.z_index, o.object_ref())),
            )
            .collect();
        layers.sort_by_key(|(layer, z, _)| (*layer, *z));
        layers.into_iter().map(|(_, _, obj)| obj).collect()
    }

    /// Check if the canvas is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.frames.is_empty() && self.prompt_nodes.is_empty()
    }

    /// Total number of objects across all bands.
    pub fn len(&self) -> usize {
        self.images.len() + self.frames.len() + self.prompt_nodes.len()
    }
}

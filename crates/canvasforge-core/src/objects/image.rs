//! Image objects.

use super::{ObjectId, ObjectKind, ObjectRef};
use crate::geometry::RotatedRect;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A placed raster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub(crate) id: ObjectId,
    /// Opaque image reference (data URL, file path or remote URL).
    pub src: String,
    /// Top-left corner in canvas space (before rotation).
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Clockwise rotation about the center, in degrees. Unbounded.
    pub rotation: f64,
    /// Stacking order within the image band.
    pub z_index: i64,
    /// Whether this image was produced by a provider.
    #[serde(default)]
    pub is_ai_result: bool,
}

impl ImageObject {
    /// Create a new image. The z-index is assigned on insertion into a canvas.
    pub fn new(src: impl Into<String>, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: src.into(),
            position,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
            is_ai_result: false,
        }
    }

    /// Mark the image as provider output.
    pub fn as_ai_result(mut self) -> Self {
        self.is_ai_result = true;
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::Image
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::Image(self.id)
    }

    /// Unrotated axis-aligned bounds.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Bounds with rotation applied, for hit testing.
    pub fn rotated(&self) -> RotatedRect {
        RotatedRect::new(self.bounds(), self.rotation)
    }

    /// Rotation-aware point containment.
    pub fn hit_test(&self, point: Point) -> bool {
        self.rotated().contains(point)
    }

    /// Bottom-right resize handle, following the rotation.
    pub fn resize_handle(&self) -> Point {
        self.rotated()
            .to_world(Vec2::new(self.width / 2.0, self.height / 2.0))
    }

    /// Top rotate handle, `offset` units above the top edge.
    pub fn rotate_handle(&self, offset: f64) -> Point {
        self.rotated()
            .to_world(Vec2::new(0.0, -self.height / 2.0 - offset))
    }
}

//! Frame objects: aspect-locked capture regions.

use super::{ObjectId, ObjectKind, ObjectRef};
use crate::error::{ValidationError, ValidationResult};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An aspect-locked rectangular region that groups images for capture.
///
/// Frames carry no rotation. `height == width / aspect_ratio` holds after
/// every resize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObject {
    pub(crate) id: ObjectId,
    /// Top-left corner in canvas space.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Width divided by height. Always positive.
    pub aspect_ratio: f64,
    /// Stacking order within the frame band.
    pub z_index: i64,
}

impl FrameObject {
    /// Create a frame whose longest side is `extent`, centered on `center`.
    pub fn centered(center: Point, aspect_ratio: f64, extent: f64) -> Self {
        let (width, height) = if aspect_ratio >= 1.0 {
            (extent, extent / aspect_ratio)
        } else {
            (extent * aspect_ratio, extent)
        };
        Self {
            id: Uuid::new_v4(),
            position: Point::new(center.x - width / 2.0, center.y - height / 2.0),
            width,
            height,
            aspect_ratio,
            z_index: 0,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::Frame
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::Frame(self.id)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    /// Set the width and derive the height from the locked aspect ratio.
    pub fn set_width(&mut self, width: f64) {
        self.width = width;
        self.height = width / self.aspect_ratio;
    }

    /// Bottom-right resize handle.
    pub fn resize_handle(&self) -> Point {
        Point::new(self.position.x + self.width, self.position.y + self.height)
    }
}

/// Parse an aspect ratio string such as `"16:9"` or `"4 : 3"` into W/H.
pub fn parse_aspect_ratio(input: &str) -> ValidationResult<f64> {
    let invalid = || ValidationError::InvalidAspectRatio(input.to_string());
    let (w, h) = input.split_once(':').ok_or_else(invalid)?;
    let w: f64 = w.trim().parse().map_err(|_| invalid())?;
    let h: f64 = h.trim().parse().map_err(|_| invalid())?;
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Err(invalid());
    }
    Ok(w / h)
}

//! Geometry helpers: rotated rectangles, angles and overlap tests.

use kurbo::{Point, Rect, Vec2};

/// Rotate a vector by `radians`. Positive angles turn clockwise in a y-down
/// coordinate system.
pub fn rotate_vec(v: Vec2, radians: f64) -> Vec2 {
    let (sin, cos) = radians.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate `point` about `center` by `degrees`.
pub fn rotate_about(point: Point, center: Point, degrees: f64) -> Point {
    center + rotate_vec(point - center, degrees.to_radians())
}

/// Angle of the ray from `from` to `to`, in degrees.
pub fn angle_degrees(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Axis-aligned bounding box overlap with strict inequalities.
///
/// Rectangles that merely touch do not overlap. Rotation is not considered.
pub fn bounds_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// An axis-aligned rectangle rotated about its own center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    /// Unrotated bounds.
    pub rect: Rect,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
}

impl RotatedRect {
    pub fn new(rect: Rect, rotation: f64) -> Self {
        Self { rect, rotation }
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    /// Express a world point in the rectangle's local frame: origin at the
    /// center, axes aligned with the unrotated rectangle.
    pub fn to_local(&self, point: Point) -> Vec2 {
        rotate_vec(point - self.center(), -self.rotation.to_radians())
    }

    /// Map a local offset (relative to the center) back to world space.
    pub fn to_world(&self, local: Vec2) -> Point {
        self.center() + rotate_vec(local, self.rotation.to_radians())
    }

    /// Point containment, edges inclusive.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.rect.width() / 2.0 && local.y.abs() <= self.rect.height() / 2.0
    }
}

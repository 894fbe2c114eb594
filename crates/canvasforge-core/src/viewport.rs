//! Viewport module for pan/zoom transforms.

use crate::settings::EngineSettings;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the view transform between screen and canvas space.
///
/// `pan` is kept in screen pixels and is never scaled by zoom, so
/// `to_canvas(p) = (p - origin - pan) / zoom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen position of the viewport's top-left corner.
    pub origin: Point,
    /// Viewport size in screen pixels.
    pub size: Size,
    /// Current translation offset in screen pixels.
    pub pan: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            size: Size::new(1280.0, 800.0),
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl Viewport {
    /// Create a viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport whose zoom limits come from the engine settings.
    pub fn with_settings(settings: &EngineSettings) -> Self {
        Self {
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            ..Self::default()
        }
    }

    /// Set the screen rectangle the canvas is shown in.
    pub fn set_bounds(&mut self, origin: Point, size: Size) {
        self.origin = origin;
        self.size = size;
    }

    /// Get the affine transform for rendering (canvas to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2() + self.pan) * Affine::scale(self.zoom)
    }

    /// Convert a screen point to canvas coordinates.
    pub fn to_canvas(&self, screen_point: Point) -> Point {
        let p = screen_point - self.origin.to_vec2() - self.pan;
        Point::new(p.x / self.zoom, p.y / self.zoom)
    }

    /// Convert a canvas point to screen coordinates.
    pub fn to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Convert a screen-space delta to a canvas-space delta.
    pub fn screen_delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Screen position of the viewport center.
    pub fn screen_center(&self) -> Point {
        self.origin + Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Canvas point currently shown at the viewport center.
    pub fn view_center(&self) -> Point {
        self.to_canvas(self.screen_center())
    }

    /// Pan by a raw screen-pixel delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Change zoom to `target`, keeping the canvas point under `anchor` fixed.
    ///
    /// Returns false if the clamped zoom equals the current one.
    pub fn zoom_at(&mut self, anchor: Point, target: f64) -> bool {
        let new_zoom = target.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let canvas_point = self.to_canvas(anchor);
        self.zoom = new_zoom;

        // Solve anchor = origin + pan + canvas_point * zoom for pan.
        self.pan = anchor - self.origin - canvas_point.to_vec2() * self.zoom;
        true
    }

    /// Step the zoom, anchored at the viewport center.
    pub fn zoom_step(&mut self, step: f64) -> bool {
        let center = self.screen_center();
        self.zoom_at(center, self.zoom + step)
    }

    /// Wheel zoom anchored at the cursor. Negative `delta_y` zooms in.
    pub fn zoom_wheel(&mut self, anchor: Point, delta_y: f64, sensitivity: f64) -> bool {
        let factor = (1.0 - delta_y * sensitivity).max(0.01);
        self.zoom_at(anchor, self.zoom * factor)
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

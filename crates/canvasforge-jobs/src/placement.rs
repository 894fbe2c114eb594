//! Where provider results land on the canvas.

use canvasforge_core::EngineSettings;
use kurbo::{Point, Rect, Size, Vec2};

/// Bounds for the `index`-th result image of pixel size `result_size`.
///
/// Results are `result_width` wide with the height following their aspect
/// ratio. With a source they sit below its bounding box, horizontally
/// centered, `result_margin` under its bottom edge; without one they are
/// centered on `view_center`. Additional results of the same job cascade
/// diagonally.
pub fn place_result(
    source: Option<Rect>,
    view_center: Point,
    result_size: (u32, u32),
    index: usize,
    settings: &EngineSettings,
) -> Rect {
    let (w, h) = result_size;
    let width = settings.result_width;
    let height = if w == 0 { width } else { width * h as f64 / w as f64 };
    let size = Size::new(width, height);

    let origin = match source {
        Some(src) => Point::new(src.center().x - width / 2.0, src.y1 + settings.result_margin),
        None => view_center - size.to_vec2() / 2.0,
    };
    let cascade = Vec2::new(settings.import_cascade_offset, settings.import_cascade_offset) * index as f64;
    Rect::from_origin_size(origin + cascade, size)
}

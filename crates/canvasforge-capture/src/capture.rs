//! Single-image and frame capture.

use crate::loader::ImageLoader;
use crate::raster::{draw_image, fill};
use crate::{CaptureError, CaptureResult};
use canvasforge_core::{Canvas, ImageObject, ObjectId, ObjectRef};
use image::RgbaImage;
use kurbo::{Affine, Point, Vec2};
use peniko::Color;

/// Background of frame captures.
pub const FRAME_BACKGROUND: Color = Color::WHITE;

/// Captured pixels: RGBA, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PixelBuffer {
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            rgba_data: image.into_raw(),
            width,
            height,
        }
    }

    /// Aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Largest capture surface, in pixels (16384 x 16384).
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

fn surface(width: f64, height: f64) -> CaptureResult<RgbaImage> {
    let w = width.round();
    let h = height.round();
    let fits = w >= 1.0
        && h >= 1.0
        && w <= u32::MAX as f64
        && h <= u32::MAX as f64
        && (w as u64).checked_mul(h as u64).is_some_and(|area| area <= MAX_SURFACE_PIXELS);
    if !fits {
        return Err(CaptureError::NoContext {
            width: w.max(0.0) as u32,
            height: h.max(0.0) as u32,
        });
    }
    Ok(RgbaImage::new(w as u32, h as u32))
}

/// Transform placing `source` pixels so the image covers
/// `width x height` centered at `center`, rotated by `rotation` degrees.
fn placement(center: Point, rotation: f64, width: f64, height: f64, source: &RgbaImage) -> Affine {
    let (sw, sh) = source.dimensions();
    Affine::translate(center.to_vec2())
        * Affine::rotate(rotation.to_radians())
        * Affine::translate(Vec2::new(-width / 2.0, -height / 2.0))
        * Affine::scale_non_uniform(width / sw as f64, height / sh as f64)
}

/// Capture one image object at its own size with its rotation baked in.
pub fn capture_image(image: &ImageObject, loader: &dyn ImageLoader) -> CaptureResult<PixelBuffer> {
    let mut target = surface(image.width, image.height)?;
    let source = loader.load(&image.src)?;
    let center = Point::new(target.width() as f64 / 2.0, target.height() as f64 / 2.0);
    let transform = placement(center, image.rotation, image.width, image.height, &source);
    draw_image(&mut target, &source, transform);
    log::debug!("Captured image {} at {}x{}", image.id(), target.width(), target.height());
    Ok(PixelBuffer::from_image(target))
}

/// Composite everything inside a frame.
///
/// Images are selected by axis-aligned bounding-box overlap with the frame,
/// ignoring their rotation, and drawn in ascending z order onto a white
/// background. Each image keeps its own rotation. Any load failure aborts
/// the whole capture.
pub fn capture_frame(canvas: &Canvas, frame_id: ObjectId, loader: &dyn ImageLoader) -> CaptureResult<PixelBuffer> {
    let frame = canvas
        .frame(frame_id)
        .ok_or(CaptureError::UnknownObject(ObjectRef::Frame(frame_id)))?;
    let mut target = surface(frame.width, frame.height)?;

    let contents = canvas.images_overlapping(frame.bounds());
    // Decode everything first so a failure leaves no partial composite.
    let sources = contents
        .iter()
        .map(|img| loader.load(&img.src))
        .collect::<CaptureResult<Vec<_>>>()?;

    fill(&mut target, FRAME_BACKGROUND);
    for (img, source) in contents.iter().zip(&sources) {
        let local_center = img.center() - frame.position.to_vec2();
        let transform = placement(local_center, img.rotation, img.width, img.height, source);
        draw_image(&mut target, source, transform);
    }
    log::debug!(
        "Captured frame {} with {} image(s) at {}x{}",
        frame_id,
        contents.len(),
        target.width(),
        target.height()
    );
    Ok(PixelBuffer::from_image(target))
}

/// Capture an image or a frame.
pub fn capture(canvas: &Canvas, target: ObjectRef, loader: &dyn ImageLoader) -> CaptureResult<PixelBuffer> {
    match target {
        ObjectRef::Image(id) => {
            let image = canvas.image(id).ok_or(CaptureError::UnknownObject(target))?;
            capture_image(image, loader)
        }
        ObjectRef::Frame(id) => capture_frame(canvas, id, loader),
        ObjectRef::PromptNode(_) => Err(CaptureError::UnknownObject(target)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use canvasforge_core::FrameObject;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn loader() -> MemoryLoader {
        let mut loader = MemoryLoader::new();
        loader.insert("red", RgbaImage::from_pixel(4, 4, RED));
        loader.insert("blue", RgbaImage::from_pixel(8, 2, BLUE));
        loader
    }

    fn pixel(buf: &PixelBuffer, x: u32, y: u32) -> Rgba<u8> {
        let i = ((y * buf.width + x) * 4) as usize;
        Rgba([buf.rgba_data[i], buf.rgba_data[i + 1], buf.rgba_data[i + 2], buf.rgba_data[i + 3]])
    }

    /// Frame covering (0,0)-(100,100).
    fn frame_canvas() -> (Canvas, ObjectId) {
        let mut canvas = Canvas::new("c");
        let frame = canvas.add_frame(FrameObject::centered(Point::new(50.0, 50.0), 1.0, 100.0));
        (canvas, frame)
    }

    #[test]
    fn test_capture_image_rounds_size() {
        let img = ImageObject::new("red", Point::new(10.0, 10.0), 30.4, 19.6);
        let buf = capture_image(&img, &loader()).unwrap();
        assert_eq!((buf.width, buf.height), (30, 20));
        assert_eq!(pixel(&buf, 15, 10), RED);
    }

    #[test]
    fn test_capture_image_bakes_rotation() {
        // A 40x10 bar rotated 90 degrees inside its own 40x10 buffer only
        // covers the middle columns.
        let img = ImageObject::new("blue", Point::ZERO, 40.0, 10.0).with_rotation(90.0);
        let buf = capture_image(&img, &loader()).unwrap();
        assert_eq!(pixel(&buf, 20, 5), BLUE);
        assert_eq!(pixel(&buf, 2, 5)[3], 0);
    }

    #[test]
    fn test_zero_size_has_no_context() {
        let img = ImageObject::new("red", Point::ZERO, 0.3, 10.0);
        assert!(matches!(
            capture_image(&img, &loader()),
            Err(CaptureError::NoContext { width: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_surface_has_no_context() {
        let img = ImageObject::new("red", Point::ZERO, 4.0e9, 4.0e9);
        assert!(matches!(
            capture_image(&img, &loader()),
            Err(CaptureError::NoContext { .. })
        ));

        // Each side fits, the area does not.
        let wide = ImageObject::new("red", Point::ZERO, 20_000.0, 20_000.0);
        assert!(matches!(
            capture_image(&wide, &loader()),
            Err(CaptureError::NoContext {
                width: 20_000,
                height: 20_000
            })
        ));
    }

    #[test]
    fn test_frame_selects_overlapping_only() {
        let (mut canvas, frame) = frame_canvas();
        let a = canvas.add_image(ImageObject::new("red", Point::new(50.0, 50.0), 100.0, 100.0));
        canvas.add_image(ImageObject::new("missing", Point::new(200.0, 200.0), 50.0, 50.0));
        assert_eq!(canvas.images_overlapping(canvas.frame(frame).unwrap().bounds()).len(), 1);
        assert_eq!(canvas.images_overlapping(canvas.frame(frame).unwrap().bounds())[0].id(), a);

        // The far image would fail to load if it were selected.
        let buf = capture_frame(&canvas, frame, &loader()).unwrap();
        assert_eq!((buf.width, buf.height), (100, 100));
        assert_eq!(pixel(&buf, 10, 10), WHITE);
        assert_eq!(pixel(&buf, 75, 75), RED);
    }

    #[test]
    fn test_frame_draws_in_ascending_z() {
        let (mut canvas, frame) = frame_canvas();
        let low = canvas.add_image(ImageObject::new("blue", Point::new(0.0, 0.0), 100.0, 100.0));
        canvas.add_image(ImageObject::new("red", Point::new(0.0, 0.0), 100.0, 100.0));
        assert_eq!(pixel(&capture_frame(&canvas, frame, &loader()).unwrap(), 50, 50), RED);

        canvas.bring_to_front(ObjectRef::Image(low));
        assert_eq!(pixel(&capture_frame(&canvas, frame, &loader()).unwrap(), 50, 50), BLUE);
    }

    #[test]
    fn test_frame_touching_edge_is_excluded() {
        let (mut canvas, frame) = frame_canvas();
        canvas.add_image(ImageObject::new("missing", Point::new(100.0, 0.0), 50.0, 50.0));
        assert!(capture_frame(&canvas, frame, &loader()).is_ok());
    }

    #[test]
    fn test_frame_overlap_ignores_rotation() {
        let (mut canvas, frame) = frame_canvas();
        // Unrotated box overlaps the frame; the rotated footprint does not.
        let bar = ImageObject::new("missing", Point::new(90.0, 40.0), 200.0, 20.0).with_rotation(90.0);
        assert!(!bar.hit_test(Point::new(95.0, 50.0)));
        canvas.add_image(bar);
        assert!(matches!(
            capture_frame(&canvas, frame, &loader()),
            Err(CaptureError::Load { .. })
        ));
    }

    #[test]
    fn test_frame_aborts_on_any_load_failure() {
        let (mut canvas, frame) = frame_canvas();
        canvas.add_image(ImageObject::new("red", Point::new(0.0, 0.0), 50.0, 50.0));
        canvas.add_image(ImageObject::new("broken", Point::new(40.0, 40.0), 50.0, 50.0));
        let err = capture_frame(&canvas, frame, &loader()).unwrap_err();
        assert_eq!(
            err,
            CaptureError::Load {
                src: "broken".into(),
                reason: "not found".into()
            }
        );
    }

    #[test]
    fn test_capture_dispatch() {
        let (mut canvas, frame) = frame_canvas();
        let img = canvas.add_image(ImageObject::new("red", Point::ZERO, 10.0, 10.0));
        let node = canvas.attach_prompt_node(ObjectRef::Image(img), 250.0).unwrap();
        assert!(capture(&canvas, ObjectRef::Image(img), &loader()).is_ok());
        assert!(capture(&canvas, ObjectRef::Frame(frame), &loader()).is_ok());
        assert!(matches!(
            capture(&canvas, ObjectRef::PromptNode(node), &loader()),
            Err(CaptureError::UnknownObject(_))
        ));
    }
}

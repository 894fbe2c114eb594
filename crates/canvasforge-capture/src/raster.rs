//! CPU rasterization: solid fills and affine image drawing with
//! source-over blending.

use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Fill the whole target with a solid color.
pub fn fill(target: &mut RgbaImage, color: Color) {
    let rgba = color.to_rgba8();
    let pixel = Rgba([rgba.r, rgba.g, rgba.b, rgba.a]);
    for p in target.pixels_mut() {
        *p = pixel;
    }
}

/// Draw `src` onto `target`. `transform` maps source pixel space
/// (`0..width, 0..height`) to target pixel space.
///
/// Each target pixel whose center falls inside the transformed source is
/// sampled bilinearly through the inverse transform and composited with
/// source-over. Singular transforms draw nothing.
pub fn draw_image(target: &mut RgbaImage, src: &RgbaImage, transform: Affine) {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || transform.determinant().abs() < 1e-12 {
        return;
    }
    let inverse = transform.inverse();

    let src_rect = Rect::new(0.0, 0.0, src_w as f64, src_h as f64);
    let bounds = transform.transform_rect_bbox(src_rect);
    let x_start = bounds.x0.floor().max(0.0) as u32;
    let y_start = bounds.y0.floor().max(0.0) as u32;
    let x_end = (bounds.x1.ceil().max(0.0) as u32).min(target.width());
    let y_end = (bounds.y1.ceil().max(0.0) as u32).min(target.height());

    for y in y_start..y_end {
        for x in x_start..x_end {
            let local = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            if local.x < 0.0 || local.y < 0.0 || local.x >= src_rect.x1 || local.y >= src_rect.y1 {
                continue;
            }
            let sample = bilinear_sample(src, local.x - 0.5, local.y - 0.5);
            let dst = target.get_pixel_mut(x, y);
            *dst = blend_over(*dst, sample);
        }
    }
}

/// Bilinear interpolation with edge clamping.
fn bilinear_sample(img: &RgbaImage, x: f64, y: f64) -> [f64; 4] {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let sample = |sx: i64, sy: i64| -> [f64; 4] {
        let p = img.get_pixel(sx.clamp(0, max_x) as u32, sy.clamp(0, max_y) as u32);
        [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
    let mut out = [0.0; 4];
    for c in 0..4 {
        out[c] = lerp(lerp(tl[c], tr[c], fx), lerp(bl[c], br[c], fx), fy);
    }
    out
}

/// Source-over compositing of straight-alpha colors.
fn blend_over(dst: Rgba<u8>, src: [f64; 4]) -> Rgba<u8> {
    let sa = src[3] / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

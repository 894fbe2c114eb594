//! Image source resolution and decoding.

use crate::{CaptureError, CaptureResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbaImage;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

/// Resolves an image `src` reference to decoded RGBA pixels.
pub trait ImageLoader {
    fn load(&self, src: &str) -> CaptureResult<RgbaImage>;
}

fn load_error(src: &str, reason: impl ToString) -> CaptureError {
    CaptureError::Load {
        src: truncate_src(src),
        reason: reason.to_string(),
    }
}

// Data URLs can be megabytes long; keep error messages readable.
fn truncate_src(src: &str) -> String {
    const MAX: usize = 64;
    match src.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &src[..idx]),
        None => src.to_string(),
    }
}

/// Decode encoded image bytes (PNG, JPEG or WebP) into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> CaptureResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| load_error("<bytes>", e))
}

/// Read only the pixel dimensions of encoded image bytes.
pub fn decode_dimensions(bytes: &[u8]) -> CaptureResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| load_error("<bytes>", e))?
        .into_dimensions()
        .map_err(|e| load_error("<bytes>", e))
}

/// Loader for `data:` URLs with a base64 payload and local file paths.
///
/// Relative paths resolve against the optional base directory. Any other
/// reference (for example a remote URL) is a load error.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    base_dir: Option<PathBuf>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn read_bytes(&self, src: &str) -> CaptureResult<Vec<u8>> {
        if let Some(rest) = src.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| load_error(src, "malformed data URL"))?;
            if !meta.ends_with(";base64") {
                return Err(load_error(src, "only base64 data URLs are supported"));
            }
            return STANDARD.decode(payload.trim()).map_err(|e| load_error(src, e));
        }

        if src.contains("://") && !src.starts_with("file://") {
            return Err(load_error(src, "unsupported scheme"));
        }
        let path = PathBuf::from(src.strip_prefix("file://").unwrap_or(src));
        let path = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };
        std::fs::read(&path).map_err(|e| load_error(src, e))
    }
}

impl ImageLoader for SourceLoader {
    fn load(&self, src: &str) -> CaptureResult<RgbaImage> {
        let bytes = self.read_bytes(src)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| load_error(src, e))?
            .to_rgba8();
        log::debug!("Decoded {}x{} image from {}", image.width(), image.height(), truncate_src(src));
        Ok(image)
    }
}

/// Loader over pre-decoded images keyed by `src`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    images: HashMap<String, RgbaImage>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, image: RgbaImage) {
        self.images.insert(src.into(), image);
    }
}

impl ImageLoader for MemoryLoader {
    fn load(&self, src: &str) -> CaptureResult<RgbaImage> {
        self.images
            .get(src)
            .cloned()
            .ok_or_else(|| load_error(src, "not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_png, png_data_url};
    use crate::PixelBuffer;
    use image::Rgba;

    fn red_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        encode_png(&PixelBuffer::from_image(img)).unwrap()
    }

    #[test]
    fn test_data_url() {
        let url = png_data_url(&red_png());
        let img = SourceLoader::new().load(&url).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_file_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("red.png"), red_png()).unwrap();
        let loader = SourceLoader::with_base_dir(dir.path());
        assert_eq!(loader.load("red.png").unwrap().dimensions(), (3, 2));
        assert!(matches!(loader.load("missing.png"), Err(CaptureError::Load { .. })));
    }

    #[test]
    fn test_rejects_unsupported_sources() {
        let loader = SourceLoader::new();
        assert!(matches!(loader.load("https://example.com/a.png"), Err(CaptureError::Load { .. })));
        assert!(matches!(loader.load("data:text/plain,hello"), Err(CaptureError::Load { .. })));
        assert!(matches!(loader.load("data:image/png;base64,!!!"), Err(CaptureError::Load { .. })));
    }

    #[test]
    fn test_corrupt_bytes() {
        assert!(decode_image(b"not an image").is_err());
        assert_eq!(decode_dimensions(&red_png()).unwrap(), (3, 2));
    }

    #[test]
    fn test_long_sources_are_truncated_in_errors() {
        let src = format!("data:image/png;base64,{}", "A".repeat(500));
        let Err(CaptureError::Load { src: shown, .. }) = SourceLoader::new().load(&src) else {
            panic!("expected load error");
        };
        assert!(shown.len() < 80);
    }
}

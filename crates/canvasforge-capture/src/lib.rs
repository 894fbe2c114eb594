//! Canvasforge Capture
//!
//! Turns canvas objects into pixel buffers: decodes image sources, composites
//! single images or whole frames on the CPU and encodes the result as PNG.

mod capture;
mod encode;
mod loader;
mod raster;

pub use capture::{FRAME_BACKGROUND, MAX_SURFACE_PIXELS, PixelBuffer, capture, capture_frame, capture_image};
pub use encode::{encode_png, image_data_url, png_data_url};
pub use loader::{ImageLoader, MemoryLoader, SourceLoader, decode_dimensions, decode_image};
pub use raster::{draw_image, fill};

use canvasforge_core::ObjectRef;
use thiserror::Error;

/// Capture errors. Any of them aborts the capture; no partial result is
/// returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("Could not create a {width}x{height} drawing surface")]
    NoContext { width: u32, height: u32 },
    #[error("Failed to load image '{src}': {reason}")]
    Load { src: String, reason: String },
    #[error("Nothing to capture for {0:?}")]
    UnknownObject(ObjectRef),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

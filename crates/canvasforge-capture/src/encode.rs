//! PNG encoding of captured pixels.

use crate::capture::PixelBuffer;
use crate::{CaptureError, CaptureResult};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(buffer: &PixelBuffer) -> CaptureResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, buffer.width, buffer.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| CaptureError::Encode(format!("header: {}", e)))?;
        writer
            .write_image_data(&buffer.rgba_data)
            .map_err(|e| CaptureError::Encode(format!("data: {}", e)))?;
    }
    Ok(png_data)
}

/// Wrap PNG bytes in a `data:image/png;base64,` URL.
pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes))
}

/// Wrap encoded image bytes of any supported format in a data URL.
pub fn image_data_url(bytes: &[u8]) -> CaptureResult<String> {
    let format = image::guess_format(bytes).map_err(|e| CaptureError::Load {
        src: "<bytes>".to_string(),
        reason: e.to_string(),
    })?;
    Ok(format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(bytes)))
}

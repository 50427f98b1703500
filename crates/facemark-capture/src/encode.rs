use base64::{engine::general_purpose::STANDARD, Engine as _};
use facemark_types::{
    capture::{CaptureFrame, Resolution},
    Result,
};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage, GenericImageView,
};

use crate::capture_error;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Draws `image` onto a surface of the given size and encodes it as a JPEG
/// data URL.
pub fn encode_frame(image: &DynamicImage, surface: Resolution, quality: u8) -> Result<CaptureFrame> {
    let drawn = if image.width() == surface.width && image.height() == surface.height {
        image.to_rgb8()
    } else {
        image
            .resize_exact(surface.width, surface.height, FilterType::Triangle)
            .to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(drawn.as_raw(), surface.width, surface.height, ColorType::Rgb8)
        .map_err(|err| capture_error(format!("jpeg encoding failed: {err}")))?;

    let mut encoded = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    encoded.push_str(DATA_URL_PREFIX);
    STANDARD.encode_string(&jpeg, &mut encoded);
    Ok(CaptureFrame::new(surface, encoded))
}

/// Decodes whatever still-image format the device emitted.
pub fn decode_still(raw: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(raw).map_err(|err| capture_error(format!("frame decoding failed: {err}")))
}

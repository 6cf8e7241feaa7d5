//! Page image → base64 PNG attachment for the extraction request.
//!
//! PNG is lossless, so small print (rates, voucher numbers) stays crisp.
//! pdfium renders RGBA, but a scanned page has no meaningful transparency;
//! dropping the alpha channel shrinks the payload by about a quarter.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// Encode a rendered page as a base64 PNG attachment.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, PNG_MIME).with_detail("high"))
}

use crate::error::{OmnitextError, Result};
use image::{DynamicImage, ImageFormat, ImageReader};

/// Decode image bytes and re-encode them as a PNG Tesseract can always read.
///
/// The format is guessed from the content, so a `.jpg` holding PNG data still
/// decodes. Alpha channels are composited over white.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| OmnitextError::Ocr(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| OmnitextError::Ocr(format!("Failed to decode image: {e}")))?;

    let img = remove_alpha(img);

    let mut output = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| OmnitextError::Ocr(format!("Failed to encode image: {e}")))?;

    Ok(output)
}

/// Composite any alpha channel over white.
fn remove_alpha(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img;
    }

    let rgba = img.to_rgba8();
    DynamicImage::ImageRgb8(image::RgbImage::from_fn(
        rgba.width(),
        rgba.height(),
        |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let alpha = a as u16;
            let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
            image::Rgb([blend(r), blend(g), blend(b)])
        },
    ))
}

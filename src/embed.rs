// Image embedding: decode a payload, fit it into a box, place it on the canvas.

use ::image::{DynamicImage, ImageFormat};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::document::{Canvas, PlacedImage};
use crate::record::ImagePayload;

/// Brand logo box, anchored at the top-left of the page
pub const LOGO_X_MM: f32 = 15.0;
pub const LOGO_Y_MM: f32 = 10.0;
pub const LOGO_BOX: Size = Size { width: 40.0, height: 25.0 };

/// Drawn operator signature box
pub const SIGNATURE_BOX: Size = Size { width: 60.0, height: 30.0 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }

    fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("empty image payload")]
    Empty,
    #[error("unsupported data URL encoding (expected base64)")]
    UnsupportedEncoding,
    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] ::image::ImageError),
    #[error("invalid image dimensions {width}x{height}")]
    Dimensions { width: f32, height: f32 },
}

/// JPEG when the payload says so, PNG otherwise.
pub fn detect_format(payload: &ImagePayload) -> ImageFormat {
    let head = payload.as_str().trim_start();
    if head.starts_with("data:image/jpeg") || head.starts_with("data:image/jpg") {
        ImageFormat::Jpeg
    } else {
        ImageFormat::Png
    }
}

/// Largest uniform scale that fits `original` inside `bounds`.
pub fn fit_scale(original: Size, bounds: Size) -> Option<f32> {
    if !original.is_positive() || !bounds.is_positive() {
        return None;
    }
    Some((bounds.width / original.width).min(bounds.height / original.height))
}

/// `original` scaled to fit inside `bounds`, aspect ratio preserved.
pub fn fit_within(original: Size, bounds: Size) -> Option<Size> {
    fit_scale(original, bounds).map(|scale| Size::new(original.width * scale, original.height * scale))
}

/// Raw bytes behind a `data:` URL or a bare base64 string.
pub fn payload_bytes(payload: &ImagePayload) -> Result<Vec<u8>, EmbedError> {
    let raw = payload.as_str().trim();
    if raw.is_empty() {
        return Err(EmbedError::Empty);
    }

    let encoded = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or(EmbedError::UnsupportedEncoding)?;
            if !header.split(';').any(|part| part.trim().eq_ignore_ascii_case("base64")) {
                return Err(EmbedError::UnsupportedEncoding);
            }
            data
        }
        None => raw,
    };

    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

/// Decode a payload in the format its prefix announces.
pub fn decode_payload(payload: &ImagePayload) -> Result<(ImageFormat, DynamicImage), EmbedError> {
    let format = detect_format(payload);
    let bytes = payload_bytes(payload)?;
    let image = ::image::load_from_memory_with_format(&bytes, format)?;
    Ok((format, image))
}

/// Decode, fit and place an image with its top-left corner at (`x`, `y`).
///
/// `original` is the declared source size; when absent the decoded pixel
/// size is used.
pub fn place_image(
    canvas: &mut Canvas,
    payload: &ImagePayload,
    original: Option<Size>,
    bounds: Size,
    x: f32,
    y: f32,
) -> Result<Size, EmbedError> {
    let (format, image) = decode_payload(payload)?;
    let original = original.unwrap_or_else(|| Size::new(image.width() as f32, image.height() as f32));
    let size = fit_within(original, bounds).ok_or(EmbedError::Dimensions {
        width: original.width,
        height: original.height,
    })?;

    canvas.image(PlacedImage {
        image,
        format,
        x,
        y,
        width: size.width,
        height: size.height,
    });
    Ok(size)
}

/// Like `place_image`, but a failure is logged and the page carries on.
pub fn embed(
    canvas: &mut Canvas,
    what: &str,
    payload: &ImagePayload,
    original: Option<Size>,
    bounds: Size,
    x: f32,
    y: f32,
) -> Option<Size> {
    match place_image(canvas, payload, original, bounds, x, y) {
        Ok(size) => Some(size),
        Err(e) => {
            log::warn!("Skipping {}: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_payload(width: u32, height: u32) -> ImagePayload {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        ImagePayload::new(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    #[test]
    fn format_follows_prefix() {
        assert_eq!(detect_format(&ImagePayload::new("data:image/jpeg;base64,AAAA")), ImageFormat::Jpeg);
        assert_eq!(detect_format(&ImagePayload::new("data:image/png;base64,AAAA")), ImageFormat::Png);
        assert_eq!(detect_format(&ImagePayload::new("iVBORw0KGgo=")), ImageFormat::Png);
    }

    #[test]
    fn fit_preserves_aspect_ratio_and_bounds() {
        let cases = [
            (200.0, 100.0, 40.0, 25.0),
            (100.0, 400.0, 40.0, 25.0),
            (640.0, 480.0, 60.0, 30.0),
            (1.0, 1.0, 60.0, 30.0),
            (3000.0, 7.0, 40.0, 25.0),
        ];
        for (w, h, bw, bh) in cases {
            let size = fit_within(Size::new(w, h), Size::new(bw, bh)).unwrap();
            assert!(size.width <= bw + 1e-4 && size.height <= bh + 1e-4);
            assert!((size.width / size.height - w / h).abs() / (w / h) < 1e-4);
            // One side always touches the box
            assert!((size.width - bw).abs() < 1e-4 || (size.height - bh).abs() < 1e-4);
        }
    }

    #[test]
    fn fit_rejects_degenerate_sizes() {
        assert!(fit_scale(Size::new(0.0, 10.0), LOGO_BOX).is_none());
        assert!(fit_scale(Size::new(10.0, 10.0), Size::new(-1.0, 5.0)).is_none());
    }

    #[test]
    fn places_a_valid_png() {
        let mut canvas = Canvas::new();
        canvas.start_page(0);
        let size = place_image(&mut canvas, &png_payload(200, 100), None, SIGNATURE_BOX, 20.0, 100.0).unwrap();
        assert!((size.width - 60.0).abs() < 1e-3 && (size.height - 30.0).abs() < 1e-3);
        let pages = canvas.into_pages();
        let placed = pages[0].images().next().unwrap();
        assert_eq!((placed.x, placed.y), (20.0, 100.0));
        assert_eq!(placed.format, ImageFormat::Png);
    }

    #[test]
    fn declared_dimensions_drive_the_scale() {
        let mut canvas = Canvas::new();
        canvas.start_page(0);
        let size = place_image(
            &mut canvas,
            &png_payload(10, 10),
            Some(Size::new(400.0, 100.0)),
            LOGO_BOX,
            LOGO_X_MM,
            LOGO_Y_MM,
        )
        .unwrap();
        assert!((size.width - 40.0).abs() < 1e-3 && (size.height - 10.0).abs() < 1e-3);
    }

    #[test]
    fn broken_payloads_are_skipped() {
        let mut canvas = Canvas::new();
        canvas.start_page(0);
        let bad = [
            ImagePayload::new(""),
            ImagePayload::new("data:image/png;base64,@@@"),
            ImagePayload::new("data:image/png,rawbytes"),
            ImagePayload::new(format!("data:image/png;base64,{}", STANDARD.encode(b"not an image"))),
        ];
        for payload in &bad {
            assert!(embed(&mut canvas, "test image", payload, None, LOGO_BOX, 0.0, 0.0).is_none());
        }
        // A PNG announced as JPEG fails to decode as JPEG
        let png = png_payload(4, 4);
        let mislabeled = ImagePayload::new(png.as_str().replacen("image/png", "image/jpeg", 1));
        assert!(embed(&mut canvas, "test image", &mislabeled, None, LOGO_BOX, 0.0, 0.0).is_none());

        assert_eq!(canvas.into_pages()[0].images().count(), 0);
    }
}

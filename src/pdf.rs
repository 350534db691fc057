// PDF output: replays the logical pages onto printpdf layers.

use ::image::{DynamicImage, Rgba, RgbImage};
use printpdf::*;
use std::path::Path;

use crate::document::{Document, Element, PlacedImage, Rule, TextRun, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::AppError;
use crate::metrics::FontStyle;

/// Resolution images are embedded at before scaling
const IMAGE_DPI: f32 = 300.0;

/// Stroke width of heading rules, in points
const RULE_THICKNESS: f32 = 0.57;

const LAYER_NAME: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, AppError> {
        let builtin = |font| doc.add_builtin_font(font).map_err(|e| AppError::PdfError(e.to_string()));
        Ok(Fonts {
            regular: builtin(BuiltinFont::Helvetica)?,
            bold: builtin(BuiltinFont::HelveticaBold)?,
            italic: builtin(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

impl Document {
    /// Serialize to PDF bytes.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, AppError> {
        let (doc, page1, layer1) = PdfDocument::new(&self.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let fonts = Fonts::load(&doc)?;

        for (index, page) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(page1).get_layer(layer1)
            } else {
                let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                doc.get_page(page_idx).get_layer(layer_idx)
            };

            for element in &page.elements {
                match element {
                    Element::Text(run) => draw_text(&layer, &fonts, run),
                    Element::Rule(rule) => draw_rule(&layer, rule),
                    Element::Image(image) => draw_image(&layer, image),
                }
            }
        }

        doc.save_to_bytes().map_err(|e| AppError::PdfError(e.to_string()))
    }

    /// Write the PDF to `path`.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let bytes = self.to_pdf_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Page coordinates grow downwards; PDF coordinates grow upwards.
fn flip_y(y: f32) -> f32 {
    PAGE_HEIGHT_MM - y
}

fn gray_color(level: u8) -> Color {
    let v = f32::from(level) / 255.0;
    Color::Rgb(Rgb::new(v, v, v, None))
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, run: &TextRun) {
    if run.text.is_empty() {
        return;
    }
    layer.set_fill_color(gray_color(run.gray));
    layer.use_text(
        run.text.as_str(),
        run.font_size,
        Mm(run.x),
        Mm(flip_y(run.y)),
        fonts.get(run.style),
    );
}

fn draw_rule(layer: &PdfLayerReference, rule: &Rule) {
    layer.set_outline_color(gray_color(0));
    layer.set_outline_thickness(RULE_THICKNESS);

    let points = vec![
        (Point::new(Mm(rule.x1), Mm(flip_y(rule.y1))), false),
        (Point::new(Mm(rule.x2), Mm(flip_y(rule.y2))), false),
    ];
    layer.add_line(Line {
        points,
        is_closed: false,
    });
}

/// Flatten an image onto white paper.
///
/// Each pixel is blended with white by its alpha; images are embedded as
/// 8-bit RGB with no soft mask.
fn composite_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let blend = |channel: u8, alpha: f32| (f32::from(channel) * alpha + 255.0 * (1.0 - alpha)) as u8;

    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = f32::from(a) / 255.0;
        ::image::Rgb([blend(r, alpha), blend(g, alpha), blend(b, alpha)])
    })
}

fn draw_image(layer: &PdfLayerReference, placed: &PlacedImage) {
    let rgb_image = composite_on_white(&placed.image);
    let (width_px, height_px) = rgb_image.dimensions();
    if width_px == 0 || height_px == 0 {
        return;
    }

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // Size at IMAGE_DPI, then stretch each axis to the laid-out box
    let natural_width_mm = width_px as f32 / IMAGE_DPI * 25.4;
    let natural_height_mm = height_px as f32 / IMAGE_DPI * 25.4;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placed.x)),
            translate_y: Some(Mm(flip_y(placed.y + placed.height))),
            scale_x: Some(placed.width / natural_width_mm),
            scale_y: Some(placed.height / natural_height_mm),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

// Logical page model: positioned text, rules and images on fixed A4 pages.
//
// Coordinates are millimetres measured from the top-left corner of the page;
// text `y` is the baseline, image `y` is the top edge.

use ::image::{DynamicImage, ImageFormat};

use crate::metrics::{text_width_mm, FontStyle};
use crate::sections::SectionKind;

/// A4 dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Default text size in points
pub const BODY_FONT_SIZE: f32 = 11.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub style: FontStyle,
    /// 0 = black, 255 = white
    pub gray: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextRun),
    Rule(Rule),
    Image(PlacedImage),
}

impl Element {
    /// Baseline for text, top edge for rules and images
    pub fn y(&self) -> f32 {
        match self {
            Element::Text(run) => run.y,
            Element::Rule(rule) => rule.y1,
            Element::Image(image) => image.y,
        }
    }

    /// The same element moved `dy` down the page
    pub fn shifted(mut self, dy: f32) -> Element {
        match &mut self {
            Element::Text(run) => run.y += dy,
            Element::Rule(rule) => {
                rule.y1 += dy;
                rule.y2 += dy;
            }
            Element::Image(image) => image.y += dy,
        }
        self
    }
}

/// Elements drawn relative to y = 0, not yet placed on a page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub elements: Vec<Element>,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Index of the record this page belongs to
    pub record_index: usize,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|element| match element {
            Element::Text(run) => Some(run),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &PlacedImage> {
        self.elements.iter().filter_map(|element| match element {
            Element::Image(image) => Some(image),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|run| run.text.contains(needle))
    }
}

/// Where one section of one record was drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPlacement {
    pub record_index: usize,
    pub section: SectionKind,
    pub page_index: usize,
    pub y: f32,
    pub height: f32,
    /// Page the section ends on; later than `page_index` when it was carried over
    pub last_page_index: usize,
}

/// A finished multi-page document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub file_name: String,
    pub pages: Vec<Page>,
    pub placements: Vec<SectionPlacement>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of records drawn
    pub fn record_count(&self) -> usize {
        self.pages.last().map_or(0, |page| page.record_index + 1)
    }

    /// Index of the first page of every record, in record order
    pub fn record_start_pages(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index == 0 || self.pages[index - 1].record_index != page.record_index {
                starts.push(index);
            }
        }
        starts
    }

    pub fn placements_for(&self, record_index: usize) -> impl Iterator<Item = &SectionPlacement> {
        self.placements
            .iter()
            .filter(move |placement| placement.record_index == record_index)
    }

    pub fn placement(&self, record_index: usize, section: SectionKind) -> Option<&SectionPlacement> {
        self.placements_for(record_index)
            .find(|placement| placement.section == section)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|page| page.contains_text(needle))
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Drawing context: the pages drawn so far plus the current text style.
///
/// Drawing always targets the selected page, which is the newest one unless
/// `select_page` moved it back (the footer pass does).
#[derive(Debug, Default)]
pub struct Canvas {
    pages: Vec<Page>,
    current: usize,
    font_size: f32,
    style: FontStyle,
    gray: u8,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            font_size: BODY_FONT_SIZE,
            ..Default::default()
        }
    }

    /// Append a page for `record_index` and make it current.
    pub fn start_page(&mut self, record_index: usize) -> usize {
        self.pages.push(Page {
            record_index,
            elements: Vec::new(),
        });
        self.current = self.pages.len() - 1;
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_record(&self) -> usize {
        self.pages.get(self.current).map_or(0, |page| page.record_index)
    }

    pub fn select_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.current = index;
        }
    }

    pub fn set_font(&mut self, style: FontStyle, font_size: f32) {
        self.style = style;
        self.font_size = font_size;
    }

    pub fn set_style(&mut self, style: FontStyle) {
        self.style = style;
    }

    pub fn set_gray(&mut self, gray: u8) {
        self.gray = gray;
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Back to normal black body text
    pub fn reset_style(&mut self) {
        self.font_size = BODY_FONT_SIZE;
        self.style = FontStyle::Normal;
        self.gray = 0;
    }

    pub fn text(&mut self, text: &str, x: f32, y: f32) {
        let run = TextRun {
            text: text.to_string(),
            x,
            y,
            font_size: self.font_size,
            style: self.style,
            gray: self.gray,
        };
        self.push(Element::Text(run));
    }

    /// Draw `text` horizontally centered on `center_x`
    pub fn text_centered(&mut self, text: &str, center_x: f32, y: f32) {
        let width = text_width_mm(text, self.style, self.font_size);
        self.text(text, center_x - width / 2.0, y);
    }

    /// Draw consecutive lines, `line_height` apart, the first at `y`
    pub fn lines(&mut self, lines: &[String], x: f32, y: f32, line_height: f32) {
        for (i, line) in lines.iter().enumerate() {
            self.text(line, x, y + i as f32 * line_height);
        }
    }

    pub fn lines_centered(&mut self, lines: &[String], center_x: f32, y: f32, line_height: f32) {
        for (i, line) in lines.iter().enumerate() {
            self.text_centered(line, center_x, y + i as f32 * line_height);
        }
    }

    pub fn rule(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.push(Element::Rule(Rule { x1, y1, x2, y2 }));
    }

    pub fn image(&mut self, image: PlacedImage) {
        self.push(Element::Image(image));
    }

    /// Add an already positioned element to page `index`.
    pub fn place(&mut self, index: usize, element: Element) {
        self.select_page(index);
        self.push(element);
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    fn push(&mut self, element: Element) {
        if self.pages.is_empty() {
            self.start_page(0);
        }
        self.pages[self.current].elements.push(element);
    }
}

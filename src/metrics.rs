// Fixed Helvetica metrics and greedy word wrapping.
//
// Layout has to be deterministic, so widths come from the standard Type 1
// Helvetica tables rather than from whatever font a viewer substitutes.

/// Points to millimetres
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Line spacing factor for multi-line text blocks
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
}

/// Helvetica advance widths (1000 units/em) for ASCII 32..=126.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths (1000 units/em) for ASCII 32..=126.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // '{'..'~'
];

/// Width of one character in 1000-units.
fn char_width_1000(ch: char, style: FontStyle) -> f32 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD,
        // Oblique shares the upright widths
        FontStyle::Normal | FontStyle::Italic => &HELVETICA,
    };
    let bold = style == FontStyle::Bold;
    match ch as u32 {
        code @ 32..=126 => f32::from(table[(code - 32) as usize]),
        // Typographic quotes and apostrophes
        0x2018 | 0x2019 => {
            if bold {
                278.0
            } else {
                222.0
            }
        }
        _ if ch.is_uppercase() => {
            if bold {
                722.0
            } else {
                667.0
            }
        }
        _ if ch.is_alphabetic() => {
            if bold {
                611.0
            } else {
                556.0
            }
        }
        _ => 556.0,
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, style: FontStyle, font_size: f32) -> f32 {
    let units: f32 = text.chars().map(|ch| char_width_1000(ch, style)).sum();
    units * font_size / 1000.0 * PT_TO_MM
}

/// Baseline-to-baseline distance of a multi-line block, in millimetres.
pub fn line_height_mm(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_FACTOR * PT_TO_MM
}

/// Split `text` into lines no wider than `max_width_mm`.
///
/// Explicit newlines always break. Words are packed greedily; a word that is
/// wider than the line on its own is broken between characters. Always
/// returns at least one line.
pub fn split_text_to_size(text: &str, style: FontStyle, font_size: f32, max_width_mm: f32) -> Vec<String> {
    const EPSILON: f32 = 1e-3;
    let width = |s: &str| text_width_mm(s, style, font_size);
    let space = width(" ");

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let mut current = String::new();
        let mut current_width = 0.0;
        let mut started = false;

        for word in paragraph.split(' ') {
            let word_width = width(word);
            if started && current_width + space + word_width <= max_width_mm + EPSILON {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }
            if started {
                lines.push(std::mem::take(&mut current));
            }
            started = true;

            if word_width <= max_width_mm + EPSILON {
                current = word.to_string();
                current_width = word_width;
                continue;
            }

            // Hard-break an overlong word
            current_width = 0.0;
            for ch in word.chars() {
                let ch_width = width(ch.encode_utf8(&mut [0u8; 4]));
                if !current.is_empty() && current_width + ch_width > max_width_mm + EPSILON {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(ch);
                current_width += ch_width;
            }
        }
        lines.push(current);
    }
    lines
}

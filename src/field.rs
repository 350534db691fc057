use crate::document::Canvas;
use crate::metrics::{split_text_to_size, FontStyle};

/// Column anchors for two-column rows
pub const LEFT_COLUMN_X: f32 = 20.0;
pub const RIGHT_COLUMN_X: f32 = 110.0;

/// Values wrap at this width
pub const FIELD_WIDTH_MM: f32 = 80.0;

/// Each wrapped value line consumes this much height
pub const FIELD_LINE_HEIGHT_MM: f32 = 5.0;

/// Value lines start this far below the label
const VALUE_OFFSET_MM: f32 = 5.0;

/// Blank placeholders sit lower, leaving room to write by hand
const PLACEHOLDER_OFFSET_MM: f32 = 10.0;

/// Drawn in place of an empty value
pub const PLACEHOLDER: &str = "_________________________";

/// Lines `value` wraps to at the current font size.
pub fn wrap_value(canvas: &Canvas, value: &str) -> Vec<String> {
    split_text_to_size(value, FontStyle::Normal, canvas.font_size(), FIELD_WIDTH_MM)
}

/// Draw `"{label}:"` and its value (or the blank placeholder) at (`x`, `y`).
///
/// Returns the height used by the value lines; the caller advances the
/// cursor.
pub fn draw_field(canvas: &mut Canvas, label: &str, value: &str, x: f32, y: f32) -> f32 {
    canvas.set_style(FontStyle::Bold);
    canvas.text(&format!("{}:", label), x, y);
    canvas.set_style(FontStyle::Normal);

    let (text, offset) = if value.is_empty() {
        (PLACEHOLDER, PLACEHOLDER_OFFSET_MM)
    } else {
        (value, VALUE_OFFSET_MM)
    };

    let lines = wrap_value(canvas, text);
    canvas.lines(&lines, x, y + offset, FIELD_LINE_HEIGHT_MM);
    lines.len() as f32 * FIELD_LINE_HEIGHT_MM
}

/// Draw a left and a right field on the same baseline.
///
/// The row is as tall as its taller field.
pub fn draw_field_row(canvas: &mut Canvas, left: (&str, &str), right: (&str, &str), y: f32) -> f32 {
    let left_height = draw_field(canvas, left.0, left.1, LEFT_COLUMN_X, y);
    let right_height = draw_field(canvas, right.0, right.1, RIGHT_COLUMN_X, y);
    left_height.max(right_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.start_page(0);
        canvas
    }

    #[test]
    fn filled_value_sits_five_below_label() {
        let mut canvas = canvas();
        let height = draw_field(&mut canvas, "Comune", "Milano", 20.0, 100.0);
        assert_eq!(height, 5.0);

        let pages = canvas.into_pages();
        let runs: Vec<_> = pages[0].texts().collect();
        assert_eq!(runs[0].text, "Comune:");
        assert_eq!(runs[0].style, FontStyle::Bold);
        assert_eq!((runs[1].text.as_str(), runs[1].y), ("Milano", 105.0));
        assert_eq!(runs[1].style, FontStyle::Normal);
    }

    #[test]
    fn empty_value_draws_placeholder_lower() {
        let mut canvas = canvas();
        let height = draw_field(&mut canvas, "Email", "", 110.0, 100.0);
        assert_eq!(height, 5.0);

        let pages = canvas.into_pages();
        let placeholder = pages[0].texts().nth(1).unwrap();
        assert_eq!(placeholder.text, PLACEHOLDER);
        assert_eq!(placeholder.y, 110.0);
    }

    #[test]
    fn long_values_report_every_line() {
        let mut canvas = canvas();
        let value = "richiesta ".repeat(30);
        let lines = wrap_value(&canvas, value.trim_end()).len();
        assert!(lines > 1);
        let height = draw_field(&mut canvas, "Note", value.trim_end(), 20.0, 60.0);
        assert_eq!(height, lines as f32 * FIELD_LINE_HEIGHT_MM);
    }

    #[test]
    fn row_height_is_the_max_not_the_sum() {
        let mut canvas = canvas();
        let long = "parola ".repeat(40);
        let height = draw_field_row(&mut canvas, ("Richieste", long.trim_end()), ("Note", "breve"), 60.0);
        let expected = wrap_value(&canvas, long.trim_end()).len() as f32 * FIELD_LINE_HEIGHT_MM;
        assert_eq!(height, expected);
    }
}

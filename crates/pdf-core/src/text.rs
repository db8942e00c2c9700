//! Text rendering utilities

use crate::document::Color;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Distance between baselines of consecutive lines, in points
    pub line_height: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Split text into the lines drawn one below the other
///
/// Accepts `\n`, `\r\n` and lone `\r` as line breaks. A trailing break does
/// not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
        .collect();

    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }

    lines
}

/// Generate PDF operators for text insertion
///
/// Creates the text object (BT, rg, Tf, TL, Td, Tj, T*, ET) that draws each
/// encoded line starting at the baseline `(x, y)`, moving down one
/// `line_height` per line.
///
/// # Arguments
/// * `encoded_lines` - Lines already encoded as PDF strings (e.g., "<00410042>")
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    encoded_lines: &[String],
    x: f64,
    y: f64,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{} TL\n", ctx.line_height));
    ops.push_str(&format!("{x} {y} Td\n"));

    for (index, line) in encoded_lines.iter().enumerate() {
        if index > 0 {
            ops.push_str("T*\n");
        }
        ops.push_str(&format!("{line} Tj\n"));
    }

    ops.push_str("ET\n");

    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context(font_name: &str, font_size: f32) -> TextRenderContext {
        TextRenderContext {
            font_name: font_name.to_string(),
            font_size,
            line_height: 24.0,
            color: Color::black(),
        }
    }

    #[test]
    fn test_split_lines_single() {
        assert_eq!(split_lines("Ana"), vec!["Ana"]);
    }

    #[test]
    fn test_split_lines_mixed_breaks() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_split_lines_keeps_blank_lines() {
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_lines_trailing_break() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_generate_text_operators_single_line() {
        let ctx = context("F1", 48.0);
        let ops = generate_text_operators(&["<0041>".to_string()], 99.0, 180.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert_eq!(
            ops_str,
            "BT\n0 0 0 rg\n/F1 48 Tf\n24 TL\n99 180 Td\n<0041> Tj\nET\n"
        );
    }

    #[test]
    fn test_generate_text_operators_multi_line() {
        let ctx = context("F2", 16.0);
        let lines = vec!["<0041>".to_string(), "<0042>".to_string(), "<0043>".to_string()];
        let ops = generate_text_operators(&lines, 99.0, 340.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("/F2 16 Tf"));
        assert!(ops_str.contains("99 340 Td"));
        assert_eq!(ops_str.matches("T*").count(), 2);
        assert_eq!(ops_str.matches(" Tj").count(), 3);
        assert!(ops_str.find("<0041> Tj").unwrap() < ops_str.find("<0043> Tj").unwrap());
    }

    #[test]
    fn test_generate_text_operators_literal_string() {
        let ctx = context("F3", 21.0);
        let ops = generate_text_operators(&["(07/11/2023)".to_string()], 99.0, 82.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("/F3 21 Tf"));
        assert!(ops_str.contains("(07/11/2023) Tj"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let ctx = TextRenderContext {
            font_name: "F1".to_string(),
            font_size: 12.0,
            line_height: 24.0,
            color: Color::rgb(1.0, 0.0, 0.0),
        };

        let ops = generate_text_operators(&["<0041>".to_string()], 100.0, 700.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
    }
}

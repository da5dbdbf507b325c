//! SVG word cloud from tag counts.

use super::TagCount;
use std::fmt::Write;

const WIDTH: f32 = 800.0;
const MIN_FONT: f32 = 12.0;
const MAX_FONT: f32 = 56.0;
const PADDING: f32 = 8.0;
const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

fn font_size(count: usize, min: usize, max: usize) -> f32 {
    if max == min {
        return (MIN_FONT + MAX_FONT) / 2.0;
    }
    let t = (count - min) as f32 / (max - min) as f32;
    MIN_FONT + t * (MAX_FONT - MIN_FONT)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render tags as words laid out in rows, sized by frequency.
pub fn render_svg(counts: &[TagCount]) -> String {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    let min = counts.iter().map(|c| c.count).min().unwrap_or(0);

    let mut body = String::new();
    let (mut x, mut y) = (PADDING, PADDING);
    let mut row_height = 0.0f32;

    for (i, c) in counts.iter().enumerate() {
        let size = font_size(c.count, min, max);
        // Rough glyph width estimate
        let width = c.tag.chars().count() as f32 * size * 0.6;
        if x + width > WIDTH - PADDING && x > PADDING {
            x = PADDING;
            y += row_height + PADDING;
            row_height = 0.0;
        }
        row_height = row_height.max(size);
        let _ = writeln!(
            body,
            "  <text x=\"{x:.1}\" y=\"{:.1}\" font-size=\"{size:.1}\" fill=\"{}\">{}</text>",
            y + size,
            PALETTE[i % PALETTE.len()],
            escape_xml(&c.tag)
        );
        x += width + PADDING;
    }

    let height = y + row_height + PADDING;
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{height:.0}\" font-family=\"sans-serif\">\n{body}</svg>\n"
    )
}

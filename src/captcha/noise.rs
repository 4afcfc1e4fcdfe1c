//! Bezier noise lines drawn across the finished image.

use crate::color::calculate_font_color;
use crate::config::Result;
use crate::svg::num;
use rand::Rng;

/// Noise stroke width used when the caller does not set one.
#[must_use]
pub fn default_stroke_width(height: f64) -> f64 {
    (height * 0.03).floor().max(1.0)
}

fn between(rng: &mut impl Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}

/// Emits `count` cubic Bezier strokes spanning a `width` x `height` canvas.
///
/// Each line starts in the leftmost tenth, ends in the rightmost tenth and
/// bends through one control point in each half.
///
/// # Errors
///
/// Fails if `background` is not a supported color string.
pub fn noise_lines(
    width: f64,
    height: f64,
    count: usize,
    stroke_width: Option<f64>,
    background: &str,
    rng: &mut impl Rng,
) -> Result<Vec<String>> {
    let stroke_width = stroke_width
        .filter(|w| *w > 0.0)
        .unwrap_or_else(|| default_stroke_width(height));
    let gap = width * 0.1;
    let half = width / 2.0;

    (0..count)
        .map(|_| {
            let color = calculate_font_color(background, rng)?;
            let start = (between(rng, 1.0, gap), between(rng, 1.0, height));
            let end = (between(rng, width - gap, width), between(rng, 1.0, height));
            let cp1 = (between(rng, gap, half), between(rng, 1.0, height));
            let cp2 = (between(rng, half, width - gap), between(rng, 1.0, height));

            Ok(format!(
                r#"<path d="M{},{} C{},{} {},{} {},{}" stroke="{color}" stroke-width="{}" fill="none"/>"#,
                num(start.0),
                num(start.1),
                num(cp1.0),
                num(cp1.1),
                num(cp2.0),
                num(cp2.1),
                num(end.0),
                num(end.1),
                num(stroke_width),
            ))
        })
        .collect()
}

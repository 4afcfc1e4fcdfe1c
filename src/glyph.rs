//! Glyph rendering.
//!
//! Turns laid-out text into jittered, individually colored and transformed
//! SVG path fragments, and measures the natural (unscaled) text block.

use crate::color::{Rgb, calculate_font_color};
use crate::config::Result;
use crate::font::{PathCommand, layout};
use crate::svg::num;
use ab_glyph::Font;
use rand::Rng;
use std::fmt::Write as _;

/// Blank space before the first glyph and after the last one, in font units.
pub const TEXT_MARGIN: f64 = 20.0;

/// Maximum displacement applied to every outline coordinate.
const OUTLINE_JITTER: f64 = 0.1;
/// Maximum deviation of each glyph's scale from 1.
const SCALE_JITTER: f64 = 0.02;
/// Maximum rotation of a glyph, in degrees.
const MAX_ROTATION: i32 = 20;
/// Horizontal placement jitter as a fraction of the advance width.
const PLACEMENT_JITTER: f64 = 1.0 / 6.0;

/// Per-glyph affine transform, applied as `scale translate rotate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphTransform {
    pub scale_x: f64,
    /// Negative to flip font space (Y up) into SVG space (Y down).
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    /// Degrees.
    pub rotate: i32,
}

impl GlyphTransform {
    #[must_use]
    pub fn to_attr(&self) -> String {
        format!(
            "scale({},{}) translate({},{}) rotate({})",
            num(self.scale_x),
            num(self.scale_y),
            num(self.translate_x),
            num(self.translate_y),
            self.rotate
        )
    }
}

/// One rendered character.
#[derive(Debug, Clone)]
pub struct GlyphFragment {
    pub ch: char,
    /// SVG path data of the perturbed outline.
    pub path: String,
    pub fill: Rgb,
    pub transform: GlyphTransform,
}

impl GlyphFragment {
    #[must_use]
    pub fn to_svg(&self) -> String {
        format!(
            r#"<path d="{}" fill="{}" transform="{}"/>"#,
            self.path,
            self.fill,
            self.transform.to_attr()
        )
    }
}

/// Glyph fragments plus the natural size of the text block.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub fragments: Vec<GlyphFragment>,
    pub width: f64,
    pub height: f64,
}

impl RenderedText {
    /// Markup of every fragment, in drawing order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.fragments.iter().map(GlyphFragment::to_svg).collect()
    }
}

/// Adds independent uniform noise in `[-0.1, 0.1]` to every command argument.
pub fn perturb_commands(commands: &mut [PathCommand], rng: &mut impl Rng) {
    for arg in commands.iter_mut().flat_map(PathCommand::args_mut) {
        *arg += rng.random_range(-OUTLINE_JITTER..=OUTLINE_JITTER);
    }
}

/// Serializes commands as SVG path data.
#[must_use]
pub fn path_data(commands: &[PathCommand]) -> String {
    let mut out = String::new();
    for cmd in commands {
        out.push(cmd.verb());
        for (i, arg) in cmd.args().iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}", num(*arg));
        }
    }
    out
}

fn symmetric(rng: &mut impl Rng, amount: f64) -> f64 {
    if amount > 0.0 {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Renders `text` on top of `background`.
///
/// Glyphs are placed left to right on an unjittered cursor so their order is
/// preserved whatever the jitter. Glyphs without an outline (spaces) only
/// advance the cursor.
///
/// # Errors
///
/// Fails if `background` is not a supported color string.
pub fn render_text<F: Font>(
    font: &F,
    text: &str,
    background: &str,
    rng: &mut impl Rng,
) -> Result<RenderedText> {
    let laid_out = layout(font, text);
    let mut cursor = TEXT_MARGIN;
    let mut fragments = Vec::with_capacity(laid_out.glyphs.len());

    for mut glyph in laid_out.glyphs {
        let advance = glyph.advance_width;

        if !glyph.commands.is_empty() {
            perturb_commands(&mut glyph.commands, rng);
            let transform = GlyphTransform {
                scale_x: 1.0 + symmetric(rng, SCALE_JITTER),
                scale_y: -1.0 + symmetric(rng, SCALE_JITTER),
                translate_x: cursor + symmetric(rng, advance * PLACEMENT_JITTER),
                translate_y: -laid_out.ascent,
                rotate: rng.random_range(-MAX_ROTATION..=MAX_ROTATION),
            };
            fragments.push(GlyphFragment {
                ch: glyph.ch,
                path: path_data(&glyph.commands),
                fill: calculate_font_color(background, rng)?,
                transform,
            });
        }

        cursor += advance;
    }

    Ok(RenderedText {
        fragments,
        width: cursor + TEXT_MARGIN,
        height: laid_out.ascent - laid_out.descent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptchaError;
    use crate::test_utils::bundled_font;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_perturbation_is_bounded() {
        let mut rng = StdRng::seed_from_u64(1);
        let original = vec![
            PathCommand::MoveTo([0.0, 0.0]),
            PathCommand::QuadTo([10.0, 20.0, 30.0, 40.0]),
            PathCommand::CubicTo([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            PathCommand::Close,
        ];
        let mut jittered = original.clone();
        perturb_commands(&mut jittered, &mut rng);

        let mut moved = 0;
        for (before, after) in original.iter().zip(&jittered) {
            assert_eq!(before.verb(), after.verb());
            for (a, b) in before.args().iter().zip(after.args()) {
                assert!((a - b).abs() <= OUTLINE_JITTER + f64::EPSILON);
                if a != b {
                    moved += 1;
                }
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_path_data_format() {
        let commands = [
            PathCommand::MoveTo([1.0, 2.5]),
            PathCommand::LineTo([3.0, -4.0]),
            PathCommand::QuadTo([1.0, 1.0, 2.0, 2.0]),
            PathCommand::Close,
        ];
        assert_eq!(path_data(&commands), "M1 2.5L3 -4Q1 1 2 2Z");
    }

    #[test]
    fn test_natural_size_is_jitter_free() {
        let font = bundled_font();
        let laid_out = layout(&font, "2024");
        let advances: f64 = laid_out.glyphs.iter().map(|g| g.advance_width).sum();

        let mut rng = StdRng::seed_from_u64(4);
        let first = render_text(&font, "2024", "#ffffff", &mut rng).unwrap();
        let second = render_text(&font, "2024", "#000000", &mut rng).unwrap();

        assert!((first.width - (advances + 2.0 * TEXT_MARGIN)).abs() < 1e-9);
        assert!((first.width - second.width).abs() < 1e-9);
        assert!((first.height - laid_out.line_height()).abs() < 1e-9);
        assert_eq!(first.fragments.len(), 4);
    }

    #[test]
    fn test_transform_ranges() {
        let font = bundled_font();
        let ascent = f64::from(font.ascent_unscaled());
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..20 {
            let rendered = render_text(&font, "abcXYZ19", "rgb(200, 200, 200)", &mut rng).unwrap();
            let mut cursor = TEXT_MARGIN;
            for (fragment, glyph) in rendered
                .fragments
                .iter()
                .zip(layout(&font, "abcXYZ19").glyphs)
            {
                let t = fragment.transform;
                assert!((0.98..=1.02).contains(&t.scale_x));
                assert!((-1.02..=-0.98).contains(&t.scale_y));
                assert!((-20..=20).contains(&t.rotate));
                assert!((t.translate_y + ascent).abs() < 1e-9);
                let slack = glyph.advance_width / 6.0 + 1e-9;
                assert!((t.translate_x - cursor).abs() <= slack);
                cursor += glyph.advance_width;
            }
        }
    }

    #[test]
    fn test_spaces_advance_without_fragment() {
        let font = bundled_font();
        let mut rng = StdRng::seed_from_u64(2);
        let spaced = render_text(&font, "1 2", "#808080", &mut rng).unwrap();
        let tight = render_text(&font, "12", "#808080", &mut rng).unwrap();

        assert_eq!(spaced.fragments.len(), 2);
        assert!(spaced.width > tight.width);
    }

    #[test]
    fn test_fragment_markup() {
        let font = bundled_font();
        let mut rng = StdRng::seed_from_u64(6);
        let rendered = render_text(&font, "7", "#336699", &mut rng).unwrap();
        let paths = rendered.paths();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("<path d=\"M"));
        assert!(paths[0].contains("fill=\"rgb("));
        assert!(paths[0].contains("transform=\"scale("));
        assert!(paths[0].contains("rotate("));
    }

    #[test]
    fn test_bad_background_is_rejected() {
        let font = bundled_font();
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(
            render_text(&font, "7", "teal", &mut rng),
            Err(CaptchaError::UnsupportedFormat(_))
        ));
    }
}

//! Font loading and outline extraction.
//!
//! Resolves a [`FontSource`] exactly once per generator and turns `ab_glyph`
//! outlines into the path commands the glyph renderer perturbs.

use crate::config::{CaptchaError, Result};
use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, Point};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Where glyph outlines are read from.
#[derive(Clone, Default)]
pub enum FontSource {
    /// DejaVu Sans, embedded in the binary.
    #[default]
    Bundled,
    /// A TrueType/OpenType file read asynchronously on first use.
    Path(PathBuf),
    /// Raw font bytes already in memory.
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("Bundled"),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Parses the embedded DejaVu Sans.
///
/// # Errors
///
/// Returns [`CaptchaError::FontLoad`] if the embedded data is not a valid font.
pub fn bundled_font() -> Result<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT)
        .map_err(|e| CaptchaError::FontLoad(format!("bundled font: {e}")))
}

/// Parses the font behind `source`.
///
/// # Errors
///
/// Returns [`CaptchaError::FontLoad`] if the file cannot be read or is not a
/// valid font.
pub async fn load_font(source: &FontSource) -> Result<FontArc> {
    let font = match source {
        FontSource::Bundled => bundled_font()?,
        FontSource::Path(path) => {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| CaptchaError::FontLoad(format!("{}: {e}", path.display())))?;
            FontArc::try_from_vec(data)
                .map_err(|e| CaptchaError::FontLoad(format!("{}: {e}", path.display())))?
        }
        FontSource::Bytes(bytes) => FontArc::try_from_vec(bytes.to_vec())
            .map_err(|e| CaptchaError::FontLoad(format!("in-memory font: {e}")))?,
    };
    Ok(font)
}

/// A font that is loaded at most once and shared by every clone.
///
/// Concurrent callers of [`FontHandle::ready`] wait on the same load; a
/// failure is cached and handed to every later caller.
#[derive(Clone)]
pub struct FontHandle {
    source: Arc<FontSource>,
    cell: Arc<OnceCell<Result<FontArc>>>,
}

impl FontHandle {
    #[must_use]
    pub fn new(source: FontSource) -> Self {
        Self {
            source: Arc::new(source),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Waits for the font, loading it if no one has started yet.
    ///
    /// # Errors
    ///
    /// Returns the cached [`CaptchaError::FontLoad`] if loading failed.
    pub async fn ready(&self) -> Result<FontArc> {
        self.cell
            .get_or_init(|| async {
                let loaded = load_font(&self.source).await;
                match &loaded {
                    Ok(font) => info!(
                        source = ?self.source,
                        glyphs = font.glyph_count(),
                        "Font loaded"
                    ),
                    Err(e) => error!(source = ?self.source, error = %e, "Font load failed"),
                }
                loaded
            })
            .await
            .clone()
    }

    /// Returns the font without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::NotReady`] while the load is still pending, or
    /// the cached load error.
    pub fn get(&self) -> Result<FontArc> {
        self.cell.get().cloned().unwrap_or(Err(CaptchaError::NotReady))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("source", &self.source)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// One outline drawing command in font units, Y axis pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo([f64; 2]),
    LineTo([f64; 2]),
    /// Control point, then end point.
    QuadTo([f64; 4]),
    /// Two control points, then end point.
    CubicTo([f64; 6]),
    Close,
}

impl PathCommand {
    /// SVG path verb.
    #[must_use]
    pub const fn verb(&self) -> char {
        match self {
            Self::MoveTo(_) => 'M',
            Self::LineTo(_) => 'L',
            Self::QuadTo(_) => 'Q',
            Self::CubicTo(_) => 'C',
            Self::Close => 'Z',
        }
    }

    #[must_use]
    pub fn args(&self) -> &[f64] {
        match self {
            Self::MoveTo(a) | Self::LineTo(a) => a,
            Self::QuadTo(a) => a,
            Self::CubicTo(a) => a,
            Self::Close => &[],
        }
    }

    pub fn args_mut(&mut self) -> &mut [f64] {
        match self {
            Self::MoveTo(a) | Self::LineTo(a) => a,
            Self::QuadTo(a) => a,
            Self::CubicTo(a) => a,
            Self::Close => &mut [],
        }
    }
}

/// One glyph of a laid-out string.
#[derive(Debug, Clone)]
pub struct GlyphOutline {
    pub ch: char,
    pub commands: Vec<PathCommand>,
    pub advance_width: f64,
}

/// A string laid out with one font, in unscaled font units.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub glyphs: Vec<GlyphOutline>,
    pub ascent: f64,
    /// Negative below the baseline.
    pub descent: f64,
}

impl TextLayout {
    /// Ascent minus descent.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.ascent - self.descent
    }
}

/// Lays out `text` glyph by glyph, left to right.
///
/// Each advance width includes the kerning against the following glyph.
pub fn layout<F: Font>(font: &F, text: &str) -> TextLayout {
    let ids: Vec<(char, GlyphId)> = text.chars().map(|ch| (ch, font.glyph_id(ch))).collect();

    let glyphs = ids
        .iter()
        .enumerate()
        .map(|(i, &(ch, id))| {
            let commands = font
                .outline(id)
                .map(|outline| outline_commands(&outline.curves))
                .unwrap_or_default();
            let kern = ids
                .get(i + 1)
                .map_or(0.0, |&(_, next)| font.kern_unscaled(id, next));
            GlyphOutline {
                ch,
                commands,
                advance_width: f64::from(font.h_advance_unscaled(id) + kern),
            }
        })
        .collect();

    TextLayout {
        glyphs,
        ascent: f64::from(font.ascent_unscaled()),
        descent: f64::from(font.descent_unscaled()),
    }
}

/// Rebuilds closed contours from a flat list of curve segments.
///
/// A segment that does not start where the previous one ended opens a new
/// contour.
#[must_use]
pub fn outline_commands(curves: &[OutlineCurve]) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(curves.len() + 2);
    let mut pen: Option<Point> = None;

    for curve in curves {
        let (start, end) = match curve {
            OutlineCurve::Line(p0, p1) | OutlineCurve::Quad(p0, _, p1) => (*p0, *p1),
            OutlineCurve::Cubic(p0, _, _, p1) => (*p0, *p1),
        };

        if pen != Some(start) {
            if pen.is_some() {
                commands.push(PathCommand::Close);
            }
            commands.push(PathCommand::MoveTo(xy(start)));
        }

        commands.push(match curve {
            OutlineCurve::Line(_, p1) => PathCommand::LineTo(xy(*p1)),
            OutlineCurve::Quad(_, c, p1) => {
                let [cx, cy] = xy(*c);
                let [x, y] = xy(*p1);
                PathCommand::QuadTo([cx, cy, x, y])
            }
            OutlineCurve::Cubic(_, c1, c2, p1) => {
                let [c1x, c1y] = xy(*c1);
                let [c2x, c2y] = xy(*c2);
                let [x, y] = xy(*p1);
                PathCommand::CubicTo([c1x, c1y, c2x, c2y, x, y])
            }
        });
        pen = Some(end);
    }

    if pen.is_some() {
        commands.push(PathCommand::Close);
    }
    commands
}

fn xy(p: Point) -> [f64; 2] {
    [f64::from(p.x), f64::from(p.y)]
}

//! Test utilities and shared fixtures.
//!
//! Common helpers for unit and integration tests.

#[cfg(any(test, feature = "testing"))]
use crate::config::CaptchaOptions;
#[cfg(any(test, feature = "testing"))]
use ab_glyph::FontArc;

/// Parses the embedded font, panicking if it is unusable.
///
/// # Panics
///
/// Panics if the bundled font data is corrupt.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn bundled_font() -> FontArc {
    crate::font::bundled_font().expect("bundled font must parse")
}

/// Options for a four digit numeric challenge with a single noise line and
/// the bundled font.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_options() -> CaptchaOptions {
    CaptchaOptions::default()
}

/// Number of noise strokes in a document.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn count_noise_paths(svg: &str) -> usize {
    svg.matches(r#"fill="none""#).count()
}

/// Number of glyph paths in a document.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn count_glyph_paths(svg: &str) -> usize {
    svg.matches("rotate(").count()
}

//! Output size resolution.
//!
//! Maps the natural text size and the caller's requested dimensions to the
//! final document size and per-axis scale factors.

use crate::config::{CaptchaError, Result};
use serde::Serialize;

/// Per-axis scale applied to the natural glyph geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

/// Final document size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputSize {
    pub width: f64,
    pub height: f64,
    pub scale: Scale,
}

/// Resolves the output size.
///
/// With both sides requested the text is stretched to fit. With one side
/// requested the other follows the natural aspect ratio, rounded to whole
/// pixels. With neither the natural size is kept.
///
/// # Errors
///
/// Returns [`CaptchaError::Config`] if the requested or derived size or scale
/// is not finite.
pub fn resolve(
    natural_width: f64,
    natural_height: f64,
    requested_width: Option<f64>,
    requested_height: Option<f64>,
) -> Result<OutputSize> {
    let size = match (
        requested_width.filter(|w| *w > 0.0),
        requested_height.filter(|h| *h > 0.0),
    ) {
        (Some(width), Some(height)) => OutputSize {
            width,
            height,
            scale: Scale {
                x: width / natural_width,
                y: height / natural_height,
            },
        },
        (Some(width), None) => {
            let factor = width / natural_width;
            OutputSize {
                width,
                height: (natural_height * width / natural_width).round(),
                scale: Scale {
                    x: factor,
                    y: factor,
                },
            }
        }
        (None, Some(height)) => {
            let factor = height / natural_height;
            OutputSize {
                width: (natural_width * height / natural_height).round(),
                height,
                scale: Scale {
                    x: factor,
                    y: factor,
                },
            }
        }
        (None, None) => OutputSize {
            width: natural_width,
            height: natural_height,
            scale: Scale { x: 1.0, y: 1.0 },
        },
    };

    let finite = [size.width, size.height, size.scale.x, size.scale.y]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(CaptchaError::Config(format!(
            "output size {}x{} is out of range",
            size.width, size.height
        )));
    }
    Ok(size)
}

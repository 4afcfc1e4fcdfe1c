//! Library definitions.
//!
//! Exports the generator, its options, and the building blocks it is made of.

pub mod captcha;
pub mod color;
pub mod config;
pub mod content;
pub mod font;
pub mod glyph;
pub mod svg;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use captcha::{Captcha, CaptchaResult, Scale};
pub use color::{Rgb, calculate_font_color, parse_color, random_background_color};
pub use config::{
    CaptchaError, CaptchaKind, CaptchaOptions, Config, LETTER_SET, MIX_SET, NUMBER_SET, Result,
};
pub use content::{Challenge, evaluate_formula};
pub use font::FontSource;

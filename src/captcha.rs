//! SVG CAPTCHA generation.
//!
//! Combines content, glyph rendering, sizing and noise into one document.

pub mod generator;
pub mod noise;
pub mod size;

pub use generator::{Captcha, CaptchaResult};
pub use size::{OutputSize, Scale};

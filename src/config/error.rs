//! Error types and result aliases.
//!
//! Defines the core `CaptchaError` enumeration and common `Result` type.

use thiserror::Error;

/// CAPTCHA rendering errors.
///
/// Errors are `Clone` so a cached font-load failure can be handed to every
/// caller awaiting the same generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptchaError {
    /// Invalid request options (empty character set, zero length, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed hex or rgb color string.
    #[error("invalid color format: {0}")]
    InvalidFormat(String),

    /// Color string is neither hex nor rgb.
    #[error("unsupported color format: {0}")]
    UnsupportedFormat(String),

    /// Glyph rendering attempted before the font finished loading.
    #[error("font is not loaded yet")]
    NotReady,

    /// Font source unreadable or malformed.
    #[error("font load failed: {0}")]
    FontLoad(String),

    /// Formula text could not be evaluated.
    #[error("invalid formula: {0}")]
    Formula(String),

    /// Content or geometry generation failed.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Result type alias for `CaptchaError`.
pub type Result<T> = std::result::Result<T, CaptchaError>;

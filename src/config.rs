//! Configuration management.
//!
//! Render options, challenge kinds and environment loading, plus the crate
//! error type.

mod error;
mod settings;

pub use error::{CaptchaError, Result};
pub use settings::{CaptchaKind, CaptchaOptions, Config, LETTER_SET, MIX_SET, NUMBER_SET};

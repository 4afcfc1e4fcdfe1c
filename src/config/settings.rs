//! Configuration settings.
//!
//! Defines the render options, the challenge kind and environment variable
//! loading logic.

use crate::config::error::CaptchaError;
use crate::font::FontSource;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Digits used by [`CaptchaKind::Number`].
pub const NUMBER_SET: &str = "0123456789";

/// Latin letters used by [`CaptchaKind::Letter`].
pub const LETTER_SET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Digits followed by letters, used by [`CaptchaKind::Mix`].
pub const MIX_SET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Challenge type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaKind {
    /// Random digits.
    #[default]
    Number,
    /// Random latin letters.
    Letter,
    /// Random digits and letters.
    Mix,
    /// Arithmetic formula over single digits; the answer is its result.
    Formula,
}

impl FromStr for CaptchaKind {
    type Err = CaptchaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "letter" => Ok(Self::Letter),
            "mix" => Ok(Self::Mix),
            "formula" => Ok(Self::Formula),
            other => Err(CaptchaError::Config(format!("unknown captcha type: {other}"))),
        }
    }
}

impl CaptchaKind {
    /// Character set used when the caller supplies none.
    ///
    /// Formulas draw their own operands, so their set is empty.
    #[must_use]
    pub const fn default_chars(self) -> &'static str {
        match self {
            Self::Number => NUMBER_SET,
            Self::Letter => LETTER_SET,
            Self::Mix => MIX_SET,
            Self::Formula => "",
        }
    }

    /// Text length (operand count for formulas) used when the caller supplies none.
    #[must_use]
    pub const fn default_length(self) -> usize {
        match self {
            Self::Formula => 2,
            _ => 4,
        }
    }
}

/// Options for a [`Captcha`](crate::Captcha) generator.
///
/// Every field is optional in spirit; `Default` gives a four digit numeric
/// challenge with one noise line, a random background and the bundled font.
#[derive(Debug, Clone)]
pub struct CaptchaOptions {
    /// Where the glyph outlines come from.
    pub font: FontSource,
    /// Challenge type.
    pub kind: CaptchaKind,
    /// Character count, or operand count for formulas.
    pub length: Option<usize>,
    /// Output width in pixels; `None` or zero derives it from the text.
    pub width: Option<f64>,
    /// Output height in pixels; `None` or zero derives it from the text.
    pub height: Option<f64>,
    /// Number of Bezier noise lines.
    pub noise: usize,
    /// Noise stroke width; `None` or zero derives it from the height.
    pub noise_width: Option<f64>,
    /// Allow-list of characters; defaults to the kind's set.
    pub chars: Option<String>,
    /// Characters removed from the allow-list.
    pub ignore_chars: String,
    /// Fixed background color (`#rgb`, `#rrggbb` or `rgb(r, g, b)`).
    pub background_color: Option<String>,
    /// Resample formulas until their result is non-negative.
    pub non_negative: bool,
}

impl Default for CaptchaOptions {
    fn default() -> Self {
        Self {
            font: FontSource::Bundled,
            kind: CaptchaKind::Number,
            length: None,
            width: None,
            height: None,
            noise: 1,
            noise_width: None,
            chars: None,
            ignore_chars: String::new(),
            background_color: None,
            non_negative: false,
        }
    }
}

impl CaptchaOptions {
    /// Length after applying the kind's default.
    #[must_use]
    pub fn effective_length(&self) -> usize {
        self.length.unwrap_or_else(|| self.kind.default_length())
    }

    /// Allow-list minus ignore-list, in allow-list order.
    ///
    /// An empty allow-list falls back to the kind's set.
    #[must_use]
    pub fn effective_chars(&self) -> Vec<char> {
        self.chars
            .as_deref()
            .filter(|chars| !chars.is_empty())
            .unwrap_or_else(|| self.kind.default_chars())
            .chars()
            .filter(|c| !self.ignore_chars.contains(*c))
            .collect()
    }

    /// Requested width, if the caller asked for a positive one.
    #[must_use]
    pub fn requested_width(&self) -> Option<f64> {
        self.width.filter(|w| *w > 0.0)
    }

    /// Requested height, if the caller asked for a positive one.
    #[must_use]
    pub fn requested_height(&self) -> Option<f64> {
        self.height.filter(|h| *h > 0.0)
    }
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

fn get_env_usize_or(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env_usize_opt(key: &str) -> Option<usize> {
    get_env_opt(key).and_then(|s| s.parse().ok())
}

fn get_env_f64_opt(key: &str) -> Option<f64> {
    get_env_opt(key)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Generator options.
    pub captcha: CaptchaOptions,
    /// How many challenges the binary renders.
    pub count: usize,
    /// Directory receiving `captcha-{n}.svg` files.
    pub output_dir: Option<PathBuf>,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Unknown or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let kind = get_env_opt("CAPTCHA_TYPE").map_or(CaptchaKind::Number, |raw| {
            raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to number captcha");
                CaptchaKind::Number
            })
        });
        let font = get_env_opt("CAPTCHA_FONT_PATH")
            .map_or(FontSource::Bundled, |path| FontSource::Path(PathBuf::from(path)));

        let captcha = CaptchaOptions {
            font,
            kind,
            length: get_env_usize_opt("CAPTCHA_LENGTH"),
            width: get_env_f64_opt("CAPTCHA_WIDTH"),
            height: get_env_f64_opt("CAPTCHA_HEIGHT"),
            noise: get_env_usize_or("CAPTCHA_NOISE", 1),
            noise_width: get_env_f64_opt("CAPTCHA_NOISE_WIDTH"),
            chars: get_env_opt("CAPTCHA_CHARS"),
            ignore_chars: get_env_or("CAPTCHA_IGNORE_CHARS", ""),
            background_color: get_env_opt("CAPTCHA_BACKGROUND"),
            non_negative: get_env_bool("CAPTCHA_NON_NEGATIVE"),
        };

        Arc::new(Self {
            captcha,
            count: get_env_usize_or("CAPTCHA_COUNT", 1).max(1),
            output_dir: get_env_opt("CAPTCHA_OUTPUT_DIR").map(PathBuf::from),
            log_format: get_env_or("LOG_FORMAT", "json"),
        })
    }
}

//! Color conversion and contrast selection.
//!
//! Converts between RGB, HSL and hex notations and picks foreground colors
//! whose lightness is guaranteed to stand apart from a background.

use crate::config::{CaptchaError, Result};
use rand::Rng;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Minimum lightness distance between a background and text drawn on it.
const MIN_CONTRAST: u8 = 30;
/// Maximum lightness distance between a background and text drawn on it.
const MAX_CONTRAST: u8 = 60;

static RGB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgb\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*\)")
        .expect("rgb pattern is a valid regex")
});

/// An sRGB color with 8-bit channels.
///
/// Displays (and serializes) as `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// An HSL color: hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self.r, self.g, self.b)
    }
}

impl Hsl {
    #[must_use]
    pub const fn new(h: u16, s: u8, l: u8) -> Self {
        Self { h, s, l }
    }

    #[must_use]
    pub fn to_rgb(self) -> Rgb {
        hsl_to_rgb(u32::from(self.h), u32::from(self.s), u32::from(self.l))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Rgb {
    type Err = CaptchaError;

    fn from_str(s: &str) -> Result<Self> {
        parse_color(s)
    }
}

/// Rounds a unit-interval value to a channel in `[0, 255]`.
fn to_channel(value: f64) -> u8 {
    let scaled = (value * 255.0).round().clamp(0.0, 255.0);
    format!("{scaled:.0}").parse().unwrap_or(0)
}

/// Rounds a non-negative value to the nearest integer.
fn round_to_u16(value: f64) -> u16 {
    let rounded = value.round().clamp(0.0, f64::from(u16::MAX));
    format!("{rounded:.0}").parse().unwrap_or(0)
}

/// Converts HSL to RGB.
///
/// Hue is wrapped modulo 360; saturation and lightness above 100 are capped.
#[must_use]
pub fn hsl_to_rgb(h: u32, s: u32, l: u32) -> Rgb {
    let h = f64::from(h % 360);
    let s = f64::from(s.min(100)) / 100.0;
    let l = f64::from(l.min(100)) / 100.0;

    let c = (1.0 - 2.0f64.mul_add(l, -1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb::new(to_channel(r + m), to_channel(g + m), to_channel(b + m))
}

/// Converts RGB to HSL, rounding every component to an integer.
#[must_use]
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let max_channel = r.max(g).max(b);
    let min_channel = r.min(g).min(b);

    let (rf, gf, bf) = (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );
    let max = f64::from(max_channel) / 255.0;
    let min = f64::from(min_channel) / 255.0;
    let delta = max - min;
    let l = (max + min) / 2.0;

    if max_channel == min_channel {
        return Hsl::new(0, 0, to_percent(l));
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let sector = if max_channel == r {
        ((gf - bf) / delta) % 6.0
    } else if max_channel == g {
        (bf - rf) / delta + 2.0
    } else {
        (rf - gf) / delta + 4.0
    };

    let mut hue = (sector * 60.0).round();
    if hue < 0.0 {
        hue += 360.0;
    }

    Hsl::new(round_to_u16(hue) % 360, to_percent(s), to_percent(l))
}

fn to_percent(value: f64) -> u8 {
    u8::try_from(round_to_u16(value * 100.0).min(100)).unwrap_or(100)
}

/// Parses `#rgb`, `#rrggbb`, `rgb` or `rrggbb`.
///
/// # Errors
///
/// Returns [`CaptchaError::InvalidFormat`] for any other length or for
/// non-hex digits.
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CaptchaError::InvalidFormat(format!("non-hex digit in {hex:?}")));
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        n => {
            return Err(CaptchaError::InvalidFormat(format!(
                "expected 3 or 6 hex digits, got {n}"
            )));
        }
    };

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&expanded[range], 16)
            .map_err(|e| CaptchaError::InvalidFormat(format!("{hex:?}: {e}")))
    };

    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Parses `rgb(r, g, b)`, clamping every channel into `[0, 255]`.
///
/// # Errors
///
/// Returns [`CaptchaError::InvalidFormat`] if the string does not contain an
/// `rgb(...)` triple.
pub fn parse_rgb_string(value: &str) -> Result<Rgb> {
    let caps = RGB_PATTERN
        .captures(value)
        .ok_or_else(|| CaptchaError::InvalidFormat(format!("not an rgb() color: {value:?}")))?;

    Ok(Rgb::new(
        clamp_channel(&caps[1]),
        clamp_channel(&caps[2]),
        clamp_channel(&caps[3]),
    ))
}

fn clamp_channel(digits: &str) -> u8 {
    digits.parse::<i64>().map_or_else(
        |_| if digits.starts_with('-') { 0 } else { u8::MAX },
        |v| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX),
    )
}

/// Parses a background color in hex or rgb notation.
///
/// # Errors
///
/// Returns [`CaptchaError::UnsupportedFormat`] when the string is neither,
/// or [`CaptchaError::InvalidFormat`] when it is malformed.
pub fn parse_color(value: &str) -> Result<Rgb> {
    let trimmed = value.trim();
    if trimmed.starts_with('#') {
        hex_to_rgb(trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_string(trimmed)
    } else {
        Err(CaptchaError::UnsupportedFormat(format!(
            "{value:?}, use HEX or RGB"
        )))
    }
}

/// Picks a random foreground color readable on `background`.
///
/// The foreground lightness lies 30 to 60 points away from the background,
/// towards white on dark backgrounds and towards black on light ones. Hue is
/// random and saturation stays in `[70, 100]`.
///
/// # Errors
///
/// Fails if `background` cannot be parsed, see [`parse_color`].
pub fn calculate_font_color(background: &str, rng: &mut impl Rng) -> Result<Rgb> {
    let bg = parse_color(background)?.to_hsl();

    let (min_lightness, max_lightness) = if bg.l < 50 {
        (bg.l + MIN_CONTRAST, (bg.l + MAX_CONTRAST).min(100))
    } else {
        (bg.l.saturating_sub(MAX_CONTRAST), bg.l - MIN_CONTRAST)
    };

    let lightness = rng.random_range(min_lightness..=max_lightness);
    let hue = rng.random_range(0..=360_u16);
    let saturation = rng.random_range(70..=100_u8);

    Ok(Hsl::new(hue, saturation, lightness).to_rgb())
}

/// Random pastel-to-mid background: saturation `[30, 80]`, lightness `[50, 80]`.
#[must_use]
pub fn random_background_color(rng: &mut impl Rng) -> Rgb {
    let hue = rng.random_range(0..=360_u16);
    let saturation = rng.random_range(30..=80_u8);
    let lightness = rng.random_range(50..=80_u8);
    Hsl::new(hue, saturation, lightness).to_rgb()
}

//! CAPTCHA composition.
//!
//! Resolves background and content, renders glyphs, scales them to the
//! requested size and assembles the final SVG document.

use crate::captcha::noise::noise_lines;
use crate::captcha::size::{Scale, resolve};
use crate::color::{parse_color, random_background_color};
use crate::config::{CaptchaError, CaptchaOptions, Result};
use crate::font::FontHandle;
use crate::glyph::render_text;
use crate::svg::{escape_attr, num};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// A rendered challenge.
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaResult {
    /// Expected answer.
    pub value: String,
    /// SVG document.
    pub svg: String,
    /// Background color as used in the document.
    pub background_color: String,
    pub width: f64,
    pub height: f64,
    /// Scale applied to the natural glyph geometry.
    pub scale: Scale,
}

impl CaptchaResult {
    /// The document as a `data:` URI, ready for an `<img src>`.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(&self.svg))
    }
}

/// Generates SVG CAPTCHAs with one shared font.
///
/// The font is loaded at most once per generator; every clone of the inner
/// handle and every concurrent [`Captcha::generate`] call reuses it.
#[derive(Debug)]
pub struct Captcha {
    options: Arc<CaptchaOptions>,
    font: FontHandle,
}

impl Captcha {
    /// Creates a generator.
    ///
    /// Inside a Tokio runtime the font starts loading in the background right
    /// away; otherwise it loads on the first [`Captcha::generate`].
    #[must_use]
    pub fn new(options: CaptchaOptions) -> Self {
        let font = FontHandle::new(options.font.clone());
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let preload = font.clone();
            runtime.spawn(async move {
                let _ = preload.ready().await;
            });
        }
        Self {
            options: Arc::new(options),
            font,
        }
    }

    #[must_use]
    pub fn options(&self) -> &CaptchaOptions {
        &self.options
    }

    /// Waits until the font is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::FontLoad`] if the font cannot be loaded; the
    /// same error is returned by every later call.
    pub async fn ready(&self) -> Result<()> {
        self.font.ready().await.map(|_| ())
    }

    /// Generates a challenge, waiting for the font first.
    ///
    /// `content` replaces the random text when given; formula generators
    /// still evaluate it to compute the answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the font fails to load, the options are invalid,
    /// the background color cannot be parsed or a formula cannot be evaluated.
    pub async fn generate(&self, content: Option<&str>) -> Result<CaptchaResult> {
        self.font.ready().await?;
        let mut rng = rand::rng();
        self.render(content, &mut rng)
    }

    /// Renders a challenge synchronously with the given random source.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::NotReady`] if the font has not finished
    /// loading, plus every error of [`Captcha::generate`].
    pub fn render(&self, content: Option<&str>, rng: &mut impl Rng) -> Result<CaptchaResult> {
        let font = self.font.get()?;
        let options = &*self.options;

        let background = match &options.background_color {
            Some(color) => {
                parse_color(color)?;
                color.clone()
            }
            None => random_background_color(rng).to_string(),
        };

        let challenge = match content.filter(|c| !c.is_empty()) {
            Some(text) => options.kind.challenge_for_text(text)?,
            None => options.challenge(rng)?,
        };

        let rendered = render_text(&font, &challenge.text, &background, rng)?;
        if rendered.width <= 0.0 || rendered.height <= 0.0 {
            return Err(CaptchaError::Generation(format!(
                "degenerate text block {}x{}",
                rendered.width, rendered.height
            )));
        }

        let requested_width = options.requested_width();
        let requested_height = options.requested_height();
        let size = resolve(
            rendered.width,
            rendered.height,
            requested_width,
            requested_height,
        )?;

        let mut svg = format!(r#"<svg xmlns="{SVG_NS}""#);
        if requested_width.is_some() || requested_height.is_some() {
            svg.push_str(&format!(
                r#" width="{}" height="{}""#,
                num(size.width),
                num(size.height)
            ));
        }
        svg.push_str(&format!(
            r#" viewBox="0 0 {} {}">"#,
            num(size.width),
            num(size.height)
        ));

        svg.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            num(size.width),
            num(size.height),
            escape_attr(&background)
        ));

        svg.push_str(&format!(
            r#"<g transform="scale({},{})">"#,
            size.scale.x, size.scale.y
        ));
        svg.push_str(&rendered.paths().join("\n"));
        svg.push_str("</g>");

        let lines = noise_lines(
            size.width,
            size.height,
            options.noise,
            options.noise_width,
            &background,
            rng,
        )?;
        svg.push_str(&lines.join("\n"));
        svg.push_str("</svg>");

        debug!(
            kind = ?options.kind,
            glyphs = rendered.fragments.len(),
            natural_width = rendered.width,
            natural_height = rendered.height,
            width = size.width,
            height = size.height,
            noise = lines.len(),
            "Captcha rendered"
        );

        Ok(CaptchaResult {
            value: challenge.answer,
            svg,
            background_color: background,
            width: size.width,
            height: size.height,
            scale: size.scale,
        })
    }
}

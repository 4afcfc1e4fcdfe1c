use regex::Regex;
use std::sync::LazyLock;
use svgcap::{Captcha, CaptchaOptions};

static VIEW_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox="0 0 ([\d.]+) ([\d.]+)""#).unwrap());

/// A generator whose font has already finished loading.
pub async fn ready_captcha(options: CaptchaOptions) -> Captcha {
    let captcha = Captcha::new(options);
    captcha.ready().await.unwrap();
    captcha
}

/// Width and height from the document's `viewBox`.
pub fn view_box(svg: &str) -> (f64, f64) {
    let caps = VIEW_BOX.captures(svg).unwrap();
    (caps[1].parse().unwrap(), caps[2].parse().unwrap())
}

pub fn noise_count(svg: &str) -> usize {
    svg.matches(r#"fill="none""#).count()
}

pub fn glyph_count(svg: &str) -> usize {
    svg.matches("rotate(").count()
}

//! SVG text helpers shared by the glyph and composition emitters.

/// Formats a coordinate with at most three decimals, trimming trailing zeros.
#[must_use]
pub fn num(value: f64) -> String {
    let mut out = format!("{value:.3}");
    if out.contains('.') {
        let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
        out.truncate(trimmed);
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}

/// Escapes a value for use inside a double-quoted attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

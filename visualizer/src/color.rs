//! Hex color parsing and linear RGB interpolation on top of plotters' `RGBColor`.

use plotters::style::RGBColor;

use crate::error::{RenderError, Result};

/// Parse `#rrggbb` or the short `#rgb` form.
pub fn parse_hex(input: &str) -> Result<RGBColor> {
    let invalid = || RenderError::InvalidColor(input.to_string());
    let digits = input.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match digits.len() {
        6 => Ok(RGBColor(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        // "#e72" == "#ee7722"
        3 => Ok(RGBColor(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}

/// Lower-case `#rrggbb`, the form written into SVG attributes.
pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// Linear interpolation in RGB space. `t` is clamped to [0, 1] and every
/// channel is rounded to the nearest integer.
pub fn interpolate(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
    let mix = |a: u8, b: u8| -> u8 {
        let v = a as f64 + (b as f64 - a as f64) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

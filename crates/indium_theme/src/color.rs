//! Color reference resolution
//!
//! A color reference is `REF[/ALPHA]`:
//!
//! | Reference        | Result                    |
//! |------------------|---------------------------|
//! | `#ffffff`        | `#ffffff`                 |
//! | `#000000/0.5`    | `rgba(0,0,0,0.5)`         |
//! | `gray.500`       | `#6b7280`                 |
//! | `gray.500/0.5`   | `rgba(107,114,128,0.5)`   |
//! | `blue.700/25`    | `rgba(29,78,216,0.25)`    |
//!
//! Alpha values with a decimal separator are fractions; anything else is a
//! 0-100 percentage. Note that `/5` therefore means 5% (`0.05`), not 50%.
//!
//! Resolution never fails: a reference that cannot be resolved is returned
//! unchanged and a diagnostic is recorded, so generated CSS stays complete.

use indexmap::IndexMap;
use tracing::trace;

use crate::diagnostics::Diagnostics;
use crate::schema::Palette;

/// Where a color reference points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSource<'a> {
    /// Literal hex color, including the `#`
    Hex(&'a str),
    /// Palette lookup (`palette.shade`)
    Palette { palette: &'a str, shade: &'a str },
}

/// A parsed color reference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRef<'a> {
    pub source: ColorSource<'a>,
    pub alpha: Option<&'a str>,
}

impl<'a> ColorRef<'a> {
    pub fn parse(reference: &'a str) -> Self {
        let (color, alpha) = match reference.split_once('/') {
            Some((color, alpha)) => (color, Some(alpha)),
            None => (reference, None),
        };

        let source = if color.starts_with('#') {
            ColorSource::Hex(color)
        } else {
            let (palette, shade) = color.split_once('.').unwrap_or((color, ""));
            ColorSource::Palette { palette, shade }
        };

        Self { source, alpha }
    }
}

/// Convert a hex color to an RGB triplet
///
/// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (alpha byte ignored).
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.is_ascii() {
        return None;
    }

    let expanded;
    let digits = match digits.len() {
        3 => {
            expanded = digits.chars().flat_map(|c| [c, c]).collect::<String>();
            expanded.as_str()
        }
        6 | 8 => &digits[..6],
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Normalize an alpha suffix to the 0-1 range
///
/// `"0.5"`, `".5"` and `"0,5"` are fractions; `"50"` and `"50%"` are
/// percentages.
pub fn normalize_alpha(alpha: &str) -> Option<f64> {
    let alpha = alpha.trim();
    if let Some(percent) = alpha.strip_suffix('%') {
        return percent
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .map(|percent| percent / 100.0);
    }
    if alpha.contains('.') || alpha.contains(',') {
        alpha.replace(',', ".").parse().ok()
    } else {
        alpha.parse::<f64>().ok().map(|percent| percent / 100.0)
    }
}

fn rgba(reference: &str, hex: &str, alpha: &str, diagnostics: &mut Diagnostics) -> String {
    let Some((r, g, b)) = hex_to_rgb(hex) else {
        diagnostics.warn(format!("Invalid hex color: {hex}"), reference);
        return reference.to_string();
    };
    let Some(a) = normalize_alpha(alpha) else {
        diagnostics.warn(
            format!("Invalid alpha value '{alpha}' in color reference {reference}"),
            reference,
        );
        return reference.to_string();
    };
    format!("rgba({r},{g},{b},{a})")
}

/// Look up a palette shade
///
/// Numeric shades are normalized (`"050"` finds key `"50"`); other keys are
/// matched verbatim.
pub fn lookup_shade<'p>(
    palettes: &'p IndexMap<String, Palette>,
    palette: &str,
    shade: &str,
) -> Option<&'p str> {
    let shades = palettes.get(palette)?;
    let value = match shade.parse::<u64>() {
        Ok(n) => shades.get(&n.to_string()).or_else(|| shades.get(shade)),
        Err(_) => shades.get(shade),
    }?;
    value.as_str().filter(|value| !value.is_empty())
}

/// Resolve a color reference to a CSS color string
pub fn resolve_color(
    reference: &str,
    palettes: &IndexMap<String, Palette>,
    diagnostics: &mut Diagnostics,
) -> String {
    let parsed = ColorRef::parse(reference);

    let resolved = match parsed.source {
        ColorSource::Hex(hex) => match parsed.alpha {
            Some(alpha) => rgba(reference, hex, alpha, diagnostics),
            None => reference.to_string(),
        },
        ColorSource::Palette { palette, shade } => {
            let Some(hex) = lookup_shade(palettes, palette, shade) else {
                let path = reference.split('/').next().unwrap_or(reference);
                diagnostics.warn(format!("Color not found: {path}"), reference);
                return reference.to_string();
            };
            match parsed.alpha {
                Some(alpha) => rgba(reference, hex, alpha, diagnostics),
                None => hex.to_string(),
            }
        }
    };

    trace!(reference, resolved = %resolved, "resolved color");
    resolved
}

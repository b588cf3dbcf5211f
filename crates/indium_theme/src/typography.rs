//! Typography reference resolution and heading scale derivation

use indexmap::IndexMap;

use crate::color::resolve_color;
use crate::diagnostics::Diagnostics;
use crate::emit::CssVars;
use crate::schema::{
    DefaultTypography, FontSpec, HeadingTypography, Primitives, SemanticTheme, TypographyScale,
};

/// Size multipliers for h1..h6, relative to the h1 base size
pub const HEADING_SIZE_MULTIPLIERS: [f64; 6] = [1.0, 0.875, 0.75, 0.6875, 0.625, 0.5625];

/// Base heading size when neither a scale key nor a literal size is given
pub const DEFAULT_HEADING_SIZE: &str = "1rem";

/// Base heading line-height when neither a scale key nor a literal is given
pub const DEFAULT_HEADING_LINE_HEIGHT: f64 = 1.2;

/// Typography group that heading references resolve against
pub const HEADING_GROUP: &str = "heading";

/// Typography group that body text references resolve against
pub const DEFAULT_GROUP: &str = "default";

/// A font property that can be referenced from a [`FontSpec`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontProperty {
    Family,
    Size,
    Weight,
    LineHeight,
    LetterSpacing,
    Transform,
}

impl FontProperty {
    /// Key used in configuration documents
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Size => "size",
            Self::Weight => "weight",
            Self::LineHeight => "lineHeight",
            Self::LetterSpacing => "letterSpacing",
            Self::Transform => "transform",
        }
    }

    /// CSS property the resolved value is emitted as
    pub fn css_property(self) -> &'static str {
        match self {
            Self::Family => "font-family",
            Self::Size => "font-size",
            Self::Weight => "font-weight",
            Self::LineHeight => "line-height",
            Self::LetterSpacing => "letter-spacing",
            Self::Transform => "text-transform",
        }
    }

    fn lookup(self, scale: &TypographyScale, key: &str) -> Option<String> {
        let value = match self {
            Self::Family => scale.family.get(key),
            Self::Size => scale.size.get(key),
            Self::Weight => scale.weight.get(key),
            Self::LineHeight => scale.line_height.get(key),
            Self::LetterSpacing => scale.letter_spacing.get(key),
            Self::Transform => scale.transform.get(key),
        }?
        .to_string();
        (!value.is_empty()).then_some(value)
    }
}

impl FontSpec {
    /// Referenced properties, in emission order
    pub fn entries(&self) -> impl Iterator<Item = (FontProperty, String)> + '_ {
        [
            (FontProperty::Family, &self.family),
            (FontProperty::Size, &self.size),
            (FontProperty::Weight, &self.weight),
            (FontProperty::LineHeight, &self.line_height),
            (FontProperty::LetterSpacing, &self.letter_spacing),
            (FontProperty::Transform, &self.transform),
        ]
        .into_iter()
        .filter_map(|(property, key)| key.as_ref().map(|key| (property, key.to_string())))
    }
}

/// Resolve a font reference bundle against one typography group
///
/// Returns CSS property names (`font-size`, `font-weight`, ...) mapped to
/// literal values. Unresolvable keys are diagnosed and left out.
pub fn resolve_typography_refs(
    font: &FontSpec,
    primitives: &Primitives,
    group: &str,
    diagnostics: &mut Diagnostics,
) -> IndexMap<String, String> {
    let scale = primitives.typography_group(group);
    let mut resolved = IndexMap::new();

    for (property, key) in font.entries() {
        match scale.and_then(|scale| property.lookup(scale, &key)) {
            Some(value) => {
                resolved.insert(property.css_property().to_string(), value);
            }
            None => {
                let path = format!("typography.{group}.{}.{key}", property.config_key());
                diagnostics.warn(format!("Typography reference not found: {path}"), path);
            }
        }
    }

    resolved
}

/// Resolve a semantic color path (`text.primary`) within a theme
///
/// Paths that name a color in the same theme become `var(--color-...)`
/// references; anything else is treated as a color reference.
pub fn resolve_theme_color(
    reference: &str,
    theme: &SemanticTheme,
    primitives: &Primitives,
    diagnostics: &mut Diagnostics,
) -> String {
    if theme.color_at(reference).is_some() {
        format!("var(--color-{})", reference.replace('.', "-"))
    } else {
        resolve_color(reference, &primitives.colors, diagnostics)
    }
}

/// Body text typography as `--typography-default-*` variables
pub fn resolve_default_typography(
    default: &DefaultTypography,
    theme: &SemanticTheme,
    primitives: &Primitives,
    diagnostics: &mut Diagnostics,
) -> CssVars {
    let mut vars = CssVars::new();

    if let Some(font) = &default.font {
        for (property, value) in resolve_typography_refs(font, primitives, DEFAULT_GROUP, diagnostics)
        {
            vars.insert(format!("--typography-default-{property}"), value);
        }
    }

    if let Some(color) = &default.color {
        vars.insert(
            "--typography-default-color".to_string(),
            resolve_theme_color(color, theme, primitives, diagnostics),
        );
    }

    vars
}

/// Derive h1..h6 variables from one heading descriptor
///
/// Sizes stay symbolic as `calc(<base> * <multiplier> * <scaling>)` since
/// the base may carry any unit. Line-height is unitless, so it is folded
/// to `baseLineHeight * scaling` (two decimals) and shared by all levels.
pub fn calculate_heading_scale(
    heading: &HeadingTypography,
    primitives: &Primitives,
    diagnostics: &mut Diagnostics,
) -> CssVars {
    let scaling = heading.scaling.unwrap_or(1.0);

    let font_resolved = heading
        .font
        .as_ref()
        .map(|font| resolve_typography_refs(font, primitives, HEADING_GROUP, diagnostics))
        .unwrap_or_default();

    let base_size = font_resolved
        .get(FontProperty::Size.css_property())
        .cloned()
        .or_else(|| heading.size.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_HEADING_SIZE.to_string());

    let base_line_height = match font_resolved.get(FontProperty::LineHeight.css_property()) {
        Some(value) => value.parse::<f64>().ok(),
        None => heading.line_height.as_ref().and_then(|lh| lh.as_f64()),
    };
    let base_line_height = match base_line_height {
        Some(value) => value,
        None => {
            if heading.line_height.is_some() || font_resolved.contains_key("line-height") {
                diagnostics.warn(
                    "Heading line-height is not numeric, using default",
                    "typography.heading.lineHeight",
                );
            }
            DEFAULT_HEADING_LINE_HEIGHT
        }
    };
    let scaled_line_height = format!("{:.2}", base_line_height * scaling);

    let mut vars = CssVars::new();
    for (index, multiplier) in HEADING_SIZE_MULTIPLIERS.iter().enumerate() {
        let level = format!("h{}", index + 1);

        vars.insert(
            format!("--heading-{level}-size"),
            format!("calc({base_size} * {multiplier} * {scaling})"),
        );
        vars.insert(
            format!("--heading-{level}-line-height"),
            scaled_line_height.clone(),
        );

        for (property, value) in &font_resolved {
            if property != "font-size" && property != "line-height" {
                vars.insert(format!("--heading-{level}-{property}"), value.clone());
            }
        }
    }

    vars
}

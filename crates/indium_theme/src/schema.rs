//! Typed view of a merged token configuration
//!
//! Two layers:
//! - [`Primitives`]: raw, theme-independent values (palettes, scales)
//! - [`Semantic`]: per-theme tokens defined by reference to primitives
//!
//! Every map is ordered so that generated CSS follows the authoring order
//! of the configuration document. Leaves are [`Scalar`]s, so a number where
//! a string is usual (`spacing.0 = 0`) is emitted as written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::tree::{Scalar, TokenTree};

/// Shade key to hex color (`"500" -> "#3b82f6"`)
pub type Palette = IndexMap<String, Scalar>;

/// Complete token configuration (defaults merged with user overrides)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub primitives: Primitives,
    pub semantic: Semantic,
}

impl TokenConfig {
    /// Map a merged token tree onto the typed schema
    pub fn from_tree(tree: &TokenTree) -> Result<Self> {
        let value = serde_json::to_value(tree).map_err(|e| ConfigError::Schema(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ConfigError::Schema(e.to_string()))
    }
}

// ==========================================
// Primitives
// ==========================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Primitives {
    pub colors: IndexMap<String, Palette>,
    /// Typography groups (`default`, `heading`, `mono`, custom)
    pub typography: IndexMap<String, TypographyScale>,
    pub spacing: IndexMap<String, Scalar>,
    pub sizing: IndexMap<String, Scalar>,
    pub border: Border,
    pub shadow: IndexMap<String, Scalar>,
    pub z_index: IndexMap<String, Scalar>,
    pub transition: IndexMap<String, Scalar>,
    pub breakpoint: IndexMap<String, Scalar>,
}

impl Primitives {
    /// Typography scale for a group, if configured
    pub fn typography_group(&self, group: &str) -> Option<&TypographyScale> {
        self.typography.get(group)
    }
}

/// Scale tables for one typography group
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypographyScale {
    pub family: IndexMap<String, Scalar>,
    pub size: IndexMap<String, Scalar>,
    pub weight: IndexMap<String, Scalar>,
    pub line_height: IndexMap<String, Scalar>,
    pub letter_spacing: IndexMap<String, Scalar>,
    pub transform: IndexMap<String, Scalar>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub radius: IndexMap<String, Scalar>,
}

// ==========================================
// Semantic
// ==========================================

/// Theme mode name to theme tokens
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Semantic(pub IndexMap<String, SemanticTheme>);

impl Semantic {
    pub const LIGHT: &'static str = "light";
    pub const DARK: &'static str = "dark";

    pub fn theme(&self, mode: &str) -> Option<&SemanticTheme> {
        self.0.get(mode)
    }

    pub fn light(&self) -> Option<&SemanticTheme> {
        self.theme(Self::LIGHT)
    }

    pub fn dark(&self) -> Option<&SemanticTheme> {
        self.theme(Self::DARK)
    }

    /// Modes other than `light` and `dark`, in document order
    pub fn custom_modes(&self) -> impl Iterator<Item = (&str, &SemanticTheme)> {
        self.0
            .iter()
            .filter(|(name, _)| *name != Self::LIGHT && *name != Self::DARK)
            .map(|(name, theme)| (name.as_str(), theme))
    }
}

/// Tokens for one theme mode
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticTheme {
    /// Color groups (`text`, `background`, `action`, ...), leaves are color references
    pub colors: IndexMap<String, ColorNode>,
    pub typography: SemanticTypography,
    pub sizing: SemanticSizing,
}

impl SemanticTheme {
    /// Look up a color leaf by dotted semantic path (`"text.primary"`)
    pub fn color_at(&self, path: &str) -> Option<&str> {
        let mut segments = path.split('.');
        let mut node = self.colors.get(segments.next()?)?;
        for segment in segments {
            match node {
                ColorNode::Group(children) => node = children.get(segment)?,
                _ => return None,
            }
        }
        match node {
            ColorNode::Ref(reference) => Some(reference),
            _ => None,
        }
    }
}

/// A semantic color entry: either a reference or a nested group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorNode {
    Ref(String),
    Group(IndexMap<String, ColorNode>),
    /// Anything else (numbers, lists); skipped on emission
    Other(TokenTree),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticTypography {
    pub default: Option<DefaultTypography>,
    pub heading: Option<HeadingTypography>,
}

/// References into a typography group's scale tables
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSpec {
    pub family: Option<Scalar>,
    pub size: Option<Scalar>,
    pub weight: Option<Scalar>,
    pub line_height: Option<Scalar>,
    pub letter_spacing: Option<Scalar>,
    pub transform: Option<Scalar>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTypography {
    pub font: Option<FontSpec>,
    /// Semantic color path (`"text.primary"`) or color reference
    pub color: Option<String>,
}

/// Heading scale descriptor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingTypography {
    pub font: Option<FontSpec>,
    /// Literal h1 base size, used when `font.size` is absent
    pub size: Option<Scalar>,
    /// Literal base line-height, used when `font.lineHeight` is absent
    pub line_height: Option<Scalar>,
    /// Multiplier applied to both size and line-height
    pub scaling: Option<f64>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticSizing {
    /// Global component size multiplier (1 = no scaling)
    pub scaling: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_color_paths() {
        let theme: SemanticTheme = serde_json::from_str(
            r#"{"colors": {"text": {"primary": "gray.900"}, "action": {"primary": {"normal": "blue.700"}}}}"#,
        )
        .unwrap();
        assert_eq!(theme.color_at("text.primary"), Some("gray.900"));
        assert_eq!(theme.color_at("action.primary.normal"), Some("blue.700"));
        assert_eq!(theme.color_at("action.primary"), None);
        assert_eq!(theme.color_at("text.primary.deeper"), None);
        assert_eq!(theme.color_at("missing"), None);
    }

    #[test]
    fn custom_modes_skip_light_and_dark() {
        let semantic: Semantic =
            serde_json::from_str(r#"{"light": {}, "high-contrast": {}, "dark": {}, "sepia": {}}"#)
                .unwrap();
        let modes: Vec<&str> = semantic.custom_modes().map(|(name, _)| name).collect();
        assert_eq!(modes, vec!["high-contrast", "sepia"]);
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let tree: TokenTree =
            serde_json::from_str(r#"{"primitives": {"colors": {"gray": "not-a-palette"}}}"#)
                .unwrap();
        assert!(matches!(
            TokenConfig::from_tree(&tree),
            Err(ConfigError::Schema(_))
        ));
    }
}

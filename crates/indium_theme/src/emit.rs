//! CSS custom property emission
//!
//! Produces the theme stylesheet from a merged [`TokenConfig`]:
//!
//! ```css
//! :root { /* primitives */ }
//!
//! :where(:root),
//! [data-theme="light"] { color-scheme: light; /* light semantic tokens */ }
//!
//! [data-theme="dark"] { color-scheme: dark; /* dark semantic tokens */ }
//!
//! @media (prefers-color-scheme: dark) {
//!   :root:not([data-theme="light"]) { color-scheme: dark; /* dark again */ }
//! }
//!
//! [data-theme="high-contrast"] { /* one block per additional mode */ }
//! ```
//!
//! The light block uses `:where()` so its specificity stays below the media
//! query block.

use indexmap::IndexMap;
use tracing::debug;

use crate::color::resolve_color;
use crate::diagnostics::Diagnostics;
use crate::schema::{ColorNode, Palette, Primitives, SemanticTheme, TokenConfig};
use crate::tree::Scalar;
use crate::typography::{calculate_heading_scale, resolve_default_typography, DEFAULT_GROUP};

/// Ordered CSS custom property name to value
pub type CssVars = IndexMap<String, String>;

fn extend_prefixed<'a, V>(
    vars: &mut CssVars,
    prefix: &str,
    entries: impl IntoIterator<Item = (&'a String, V)>,
) where
    V: ToString,
{
    for (key, value) in entries {
        vars.insert(format!("--{prefix}-{key}"), value.to_string());
    }
}

/// `--breakpoint-*` variables, values copied verbatim
///
/// Empty values are skipped.
pub fn breakpoint_variables(breakpoints: &IndexMap<String, Scalar>) -> CssVars {
    breakpoints
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (format!("--breakpoint-{name}"), value.to_string()))
        .collect()
}

/// All primitive tokens as `:root` variables
pub fn primitive_variables(primitives: &Primitives) -> CssVars {
    let mut vars = CssVars::new();

    for (palette, shades) in &primitives.colors {
        extend_prefixed(&mut vars, &format!("color-{palette}"), shades);
    }

    if let Some(scale) = primitives.typography_group(DEFAULT_GROUP) {
        extend_prefixed(&mut vars, "font", &scale.family);
        extend_prefixed(&mut vars, "text", &scale.size);
        extend_prefixed(&mut vars, "font", &scale.weight);
        extend_prefixed(&mut vars, "leading", &scale.line_height);
        extend_prefixed(&mut vars, "tracking", &scale.letter_spacing);
    }

    extend_prefixed(&mut vars, "space", &primitives.spacing);
    extend_prefixed(&mut vars, "size", &primitives.sizing);
    extend_prefixed(&mut vars, "radius", &primitives.border.radius);
    extend_prefixed(&mut vars, "shadow", &primitives.shadow);
    extend_prefixed(&mut vars, "z", &primitives.z_index);
    extend_prefixed(&mut vars, "transition", &primitives.transition);
    vars.extend(breakpoint_variables(&primitives.breakpoint));

    vars
}

/// Flatten a theme's color groups into `--color-<path>` variables
///
/// Leaves are resolved as color references, except `shadow` leaves which are
/// box-shadow values and pass through untouched. `breakpoints`, `font` and
/// `typography` groups are not colors and are skipped.
pub fn flatten_semantic_colors(
    colors: &IndexMap<String, ColorNode>,
    palettes: &IndexMap<String, Palette>,
    diagnostics: &mut Diagnostics,
) -> CssVars {
    fn walk(
        nodes: &IndexMap<String, ColorNode>,
        path: &mut Vec<String>,
        palettes: &IndexMap<String, Palette>,
        diagnostics: &mut Diagnostics,
        vars: &mut CssVars,
    ) {
        for (key, node) in nodes {
            if key == "breakpoints" {
                continue;
            }
            path.push(key.clone());
            match node {
                ColorNode::Ref(value) => {
                    let name = format!("--color-{}", path.join("-"));
                    let value = if key == "shadow" {
                        value.clone()
                    } else {
                        resolve_color(value, palettes, diagnostics)
                    };
                    vars.insert(name, value);
                }
                ColorNode::Group(children) if key != "font" && key != "typography" => {
                    walk(children, path, palettes, diagnostics, vars);
                }
                ColorNode::Group(_) => {}
                ColorNode::Other(_) => {
                    let dotted = path.join(".");
                    diagnostics.warn(format!("Color token is not a string: {dotted}"), dotted);
                }
            }
            path.pop();
        }
    }

    let mut vars = CssVars::new();
    walk(colors, &mut Vec::new(), palettes, diagnostics, &mut vars);
    vars
}

/// Every variable of one theme block, in emission order
///
/// Colors, then default typography, heading scale and `--sizing-scaling`.
pub fn theme_variables(
    theme: &SemanticTheme,
    primitives: &Primitives,
    diagnostics: &mut Diagnostics,
) -> CssVars {
    let mut vars = flatten_semantic_colors(&theme.colors, &primitives.colors, diagnostics);

    if let Some(default) = &theme.typography.default {
        vars.extend(resolve_default_typography(default, theme, primitives, diagnostics));
    }
    if let Some(heading) = &theme.typography.heading {
        vars.extend(calculate_heading_scale(heading, primitives, diagnostics));
    }
    if let Some(scaling) = theme.sizing.scaling {
        vars.insert("--sizing-scaling".to_string(), scaling.to_string());
    }

    vars
}

fn declarations(vars: &CssVars, indent: &str) -> String {
    vars.iter()
        .map(|(name, value)| format!("{indent}{name}: {value};"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn block(selector: &str, preamble: Option<&str>, vars: &CssVars) -> String {
    let mut body = String::new();
    if let Some(line) = preamble {
        body.push_str("  ");
        body.push_str(line);
        body.push('\n');
    }
    body.push_str(&declarations(vars, "  "));
    format!("{selector} {{\n{body}\n}}")
}

/// Generate the complete theme stylesheet
///
/// Never fails: unresolvable references are passed through and recorded in
/// `diagnostics`.
pub fn generate_theme_css(config: &TokenConfig, diagnostics: &mut Diagnostics) -> String {
    let primitives = &config.primitives;
    let mut blocks = Vec::new();

    let root_vars = primitive_variables(primitives);
    blocks.push(block(":root", None, &root_vars));

    if let Some(light) = config.semantic.light() {
        let vars = theme_variables(light, primitives, diagnostics);
        blocks.push(block(
            ":where(:root),\n[data-theme=\"light\"]",
            Some("color-scheme: light;"),
            &vars,
        ));
    }

    if let Some(dark) = config.semantic.dark() {
        let vars = theme_variables(dark, primitives, diagnostics);
        blocks.push(block(
            "[data-theme=\"dark\"]",
            Some("color-scheme: dark;"),
            &vars,
        ));
        blocks.push(format!(
            "@media (prefers-color-scheme: dark) {{\n  :root:not([data-theme=\"light\"]) {{\n    color-scheme: dark;\n{}\n  }}\n}}",
            declarations(&vars, "    ")
        ));
    }

    for (mode, theme) in config.semantic.custom_modes() {
        let vars = theme_variables(theme, primitives, diagnostics);
        blocks.push(block(&format!("[data-theme=\"{mode}\"]"), None, &vars));
    }

    debug!(
        blocks = blocks.len(),
        primitives = root_vars.len(),
        modes = config.semantic.0.len(),
        "generated theme css"
    );
    blocks.join("\n\n")
}

/// Render a property map as inline declarations (`--name: value;` per line)
///
/// Keys without a leading `--` get one.
pub fn inline_theme<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    properties
        .into_iter()
        .map(|(key, value)| {
            let key = key.as_ref();
            let value = value.as_ref();
            if key.starts_with("--") {
                format!("{key}: {value};")
            } else {
                format!("--{key}: {value};")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

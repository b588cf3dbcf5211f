//! `indium init` configuration templates

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indium_theme::loader::parse_config_str;
use indium_theme::ConfigFormat;

/// Example configuration: overrides merged onto the built-in tokens
const TEMPLATE: &str = r##"# Indium UI design tokens
#
# Everything here is merged onto the built-in defaults.
# Only list the values you want to change.

[primitives.colors.brand]
50 = "#fff7ed"
100 = "#ffedd5"
500 = "#f97316"
700 = "#c2410c"
900 = "#7c2d12"

[primitives.breakpoint]
sm = "640px"
md = "768px"
lg = "1024px"

# Semantic tokens refer to primitives as "palette.shade" or
# "palette.shade/opacity".

[semantic.light.colors.action.primary]
normal = "brand.500"
hover = "brand.700"

[semantic.light.colors.border]
focus = "brand.500/50"

[semantic.light.typography.heading]
size = "2rem"
scaling = 1

[semantic.dark.colors.action.primary]
normal = "brand.500"
hover = "brand.100"
"##;

/// Render the example configuration in `format`
pub fn config_template(format: ConfigFormat) -> Result<String> {
    let tree = || parse_config_str(TEMPLATE, ConfigFormat::Toml, Path::new("template.toml"));
    Ok(match format {
        ConfigFormat::Toml => TEMPLATE.to_string(),
        ConfigFormat::Json => serde_json::to_string_pretty(&tree()?)? + "\n",
        ConfigFormat::Yaml => serde_yaml::to_string(&tree()?)?,
    })
}

/// Write `indium.config.<ext>` into `dir`
pub fn create_config(dir: &Path, format: ConfigFormat, force: bool) -> Result<PathBuf> {
    let path = dir.join(format.file_name());
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, config_template(format)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indium_theme::{generate_theme_css, load_config, Diagnostics};

    fn assert_loads(dir: &Path) {
        let loaded = load_config(dir);
        assert!(!loaded.is_fallback(), "{:?}", loaded.fallback_reason);
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);

        let mut diagnostics = Diagnostics::new();
        let css = generate_theme_css(&loaded.config, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(css.contains("--color-brand-500: #f97316;"));
        assert!(css.contains("--color-border-focus: rgba(249,115,22,0.5);"));
        assert!(css.contains("  --breakpoint-sm: 640px;"));
        assert!(css.contains("  --breakpoint-lg: 1024px;"));
    }

    #[test]
    fn every_format_loads_cleanly() {
        for format in [ConfigFormat::Toml, ConfigFormat::Json, ConfigFormat::Yaml] {
            let dir = tempfile::tempdir().unwrap();
            let path = create_config(dir.path(), format, false).unwrap();
            assert_eq!(path, dir.path().join(format.file_name()));
            assert_loads(dir.path());
        }
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("indium.config.toml"), "# mine\n").unwrap();

        let err = create_config(dir.path(), ConfigFormat::Toml, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("indium.config.toml")).unwrap(),
            "# mine\n"
        );

        create_config(dir.path(), ConfigFormat::Toml, true).unwrap();
        assert!(std::fs::read_to_string(dir.path().join("indium.config.toml"))
            .unwrap()
            .contains("[primitives.colors.brand]"));
    }
}

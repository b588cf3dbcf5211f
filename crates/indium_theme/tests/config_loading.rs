use std::path::Path;

use indium_theme::{
    default_config, find_config_file, generate_theme_css, load_config, read_config_file,
    ConfigError, Diagnostics, Scalar,
};
use pretty_assertions::assert_eq;

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn discovery_follows_extension_priority() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(find_config_file(dir.path()), None);

    write(dir.path(), "indium.config.yml", "primitives: {}\n");
    assert_eq!(
        find_config_file(dir.path()),
        Some(dir.path().join("indium.config.yml"))
    );

    write(dir.path(), "indium.config.json", "{}");
    assert_eq!(
        find_config_file(dir.path()),
        Some(dir.path().join("indium.config.json"))
    );

    write(dir.path(), "indium.config.toml", "");
    assert_eq!(
        find_config_file(dir.path()),
        Some(dir.path().join("indium.config.toml"))
    );
}

#[test]
fn missing_config_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_config(dir.path());

    assert_eq!(loaded.path, None);
    assert_eq!(&loaded.config, default_config());
    assert!(loaded.warnings.is_empty());
}

#[test]
fn json_export_wrapper_is_unwrapped() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.json",
        r##"{"default": {"primitives": {"colors": {"brand": {"500": "#f97316"}}}}}"##,
    );

    let loaded = load_config(dir.path());
    assert!(!loaded.is_fallback());
    assert_eq!(loaded.config.primitives.colors["brand"]["500"], "#f97316");
    assert_eq!(loaded.config.primitives.colors["blue"]["500"], "#3b82f6");
}

#[test]
fn yaml_numeric_shade_keys() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.yaml",
        "primitives:\n  colors:\n    gray:\n      500: \"#777777\"\n",
    );

    let loaded = load_config(dir.path());
    assert_eq!(loaded.config.primitives.colors["gray"]["500"], "#777777");
    assert_eq!(loaded.config.primitives.colors["gray"]["900"], "#111827");
}

#[test]
fn null_values_do_not_erase_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.json",
        r#"{"primitives": {"spacing": {"4": null, "128": "32rem"}}}"#,
    );

    let loaded = load_config(dir.path());
    assert_eq!(loaded.config.primitives.spacing["4"], "1rem");
    assert_eq!(loaded.config.primitives.spacing["128"], "32rem");
}

#[test]
fn non_string_leaves_keep_the_rest_of_the_config() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.yaml",
        r##"
primitives:
  colors:
    brand:
      500: "#ff0000"
  spacing:
    0: 0
  border:
    radius:
      none: 0
semantic:
  light:
    colors:
      text:
        muted: 42
"##,
    );

    let loaded = load_config(dir.path());
    assert!(!loaded.is_fallback(), "{:?}", loaded.fallback_reason);
    assert_eq!(loaded.config.primitives.colors["brand"]["500"], "#ff0000");
    assert_eq!(loaded.config.primitives.spacing["0"], Scalar::Int(0));

    let mut diagnostics = Diagnostics::new();
    let css = generate_theme_css(&loaded.config, &mut diagnostics);
    assert!(css.contains("  --color-brand-500: #ff0000;"));
    assert!(css.contains("  --space-0: 0;"));
    assert!(css.contains("  --radius-none: 0;"));
    assert!(!css.contains("--color-text-muted"));
    assert_eq!(
        diagnostics.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(),
        vec!["Color token is not a string: text.muted"]
    );
}

#[test]
fn broken_config_falls_back_to_defaults_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "indium.config.toml", "[primitives\n");

    let loaded = load_config(dir.path());
    assert!(loaded.is_fallback());
    assert_eq!(loaded.path, Some(dir.path().join("indium.config.toml")));
    assert_eq!(&loaded.config, default_config());
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].message.starts_with("Failed to load config, using defaults"));
}

#[test]
fn schema_mismatch_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.json",
        r#"{"primitives": {"colors": {"gray": "nope"}}}"#,
    );

    let loaded = load_config(dir.path());
    assert!(loaded.is_fallback());
    assert_eq!(&loaded.config, default_config());
}

#[test]
fn unknown_top_level_keys_warn_but_load() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "indium.config.toml",
        "content = [\"src/**/*.svelte\"]\n\n[primitives.spacing]\n128 = \"32rem\"\n",
    );

    let loaded = load_config(dir.path());
    assert!(!loaded.is_fallback());
    assert_eq!(loaded.warnings.len(), 1);
    assert_eq!(loaded.warnings[0].message, "Unknown config key: content");
    assert_eq!(loaded.config.primitives.spacing["128"], "32rem");
}

#[test]
fn strict_reader_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "theme.ini", "x=1");

    assert!(matches!(
        read_config_file(&dir.path().join("theme.ini")),
        Err(ConfigError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        read_config_file(&dir.path().join("missing.toml")),
        Err(ConfigError::Io { .. })
    ));
}

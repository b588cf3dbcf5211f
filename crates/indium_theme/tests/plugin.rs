use std::path::Path;
use std::sync::Arc;

use indium_theme::{
    CacheStatus, ConfigCache, FileSource, Message, PluginOptions, ThemePlugin,
};
use pretty_assertions::assert_eq;

fn plugin_in(dir: &Path) -> ThemePlugin {
    ThemePlugin::new(PluginOptions {
        cwd: Some(dir.to_path_buf()),
        config_path: None,
    })
}

#[tokio::test]
async fn directive_is_replaced_and_surroundings_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = plugin_in(dir.path());

    let css = "@import \"reset.css\";\n\n@indium-theme;\n\nbody {\n  color: var(--color-text-primary);\n}\n";
    let result = plugin.process(css, None).await;

    assert!(result.css.starts_with("@import \"reset.css\";\n\n:root {\n"));
    assert!(result
        .css
        .ends_with("}\n}\n\nbody {\n  color: var(--color-text-primary);\n}\n"));
    assert!(!result.css.contains("@indium-theme"));
    assert!(result.css.contains("[data-theme=\"dark\"] {"));
}

#[tokio::test]
async fn comments_in_host_css_do_not_block_replacement() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = plugin_in(dir.path());

    let css = "b /* it's */ {\n  color: blue /* a;b */;\n}\n\n@indium-theme;\n";
    let result = plugin.process(css, None).await;

    assert_eq!(result.warnings().count(), 0);
    assert!(!result.css.contains("@indium-theme"));
    assert!(result
        .css
        .starts_with("b /* it's */ {\n  color: blue /* a;b */;\n}\n\n:root {\n"));
}

#[tokio::test]
async fn config_file_is_reported_as_dependency() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("indium.config.toml");
    std::fs::write(&config, "[primitives.colors.blue]\n500 = \"#0000ff\"\n").unwrap();
    let plugin = plugin_in(dir.path());
    let from = dir.path().join("app.css");

    let result = plugin.process("@indium-theme;", Some(&from)).await;

    assert_eq!(
        result.messages,
        vec![Message::Dependency {
            plugin: "indium-ui/theme",
            file: config,
            parent: Some(from),
        }]
    );
    assert!(result.css.contains("--color-blue-500: #0000ff;"));
}

#[tokio::test]
async fn nested_directive_is_replaced_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = plugin_in(dir.path());

    let css = "@layer theme {\n  @indium-theme;\n}\n";
    let result = plugin.process(css, None).await;

    assert!(result.css.starts_with("@layer theme {\n  :root {\n"));
    assert!(result.css.ends_with("}\n}\n"));
}

#[tokio::test]
async fn config_change_invalidates_and_regenerates() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("indium.config.toml");
    std::fs::write(&config, "[primitives.colors.blue]\n500 = \"#0000ff\"\n").unwrap();
    let plugin = plugin_in(dir.path());

    let first = plugin.process("@indium-theme;", None).await;
    assert!(first.css.contains("--color-blue-500: #0000ff;"));
    assert_eq!(plugin.cache().status(), CacheStatus::Ready);

    std::fs::write(&config, "[primitives.colors.blue]\n500 = \"#00ff00\"\n").unwrap();

    // Without invalidation the cached configuration is served
    let stale = plugin.process("@indium-theme;", None).await;
    assert!(stale.css.contains("--color-blue-500: #0000ff;"));

    assert!(plugin.handle_file_change(&config));
    assert_eq!(plugin.cache().status(), CacheStatus::Empty);

    let fresh = plugin.process("@indium-theme;", None).await;
    assert!(fresh.css.contains("--color-blue-500: #00ff00;"));
}

#[tokio::test]
async fn unresolvable_reference_becomes_warning() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("indium.config.json"),
        r#"{"semantic": {"light": {"colors": {"text": {"primary": "brand.500"}}}}}"#,
    )
    .unwrap();
    let plugin = plugin_in(dir.path());

    let result = plugin.process("@indium-theme;", None).await;

    assert!(result.css.contains("  --color-text-primary: brand.500;"));
    assert_eq!(
        result.warnings().collect::<Vec<_>>(),
        vec!["Color not found: brand.500"]
    );
}

#[tokio::test]
async fn broken_config_still_generates_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("indium.config.json"), "{ oops").unwrap();
    let plugin = plugin_in(dir.path());

    let result = plugin.process("@indium-theme;", None).await;

    assert!(result.css.contains("--color-blue-500: #3b82f6;"));
    assert_eq!(result.dependencies().count(), 1);
    assert_eq!(result.warnings().count(), 1);
}

#[tokio::test]
async fn plugins_can_share_a_host_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(ConfigCache::new(FileSource));
    let options = PluginOptions {
        cwd: Some(dir.path().to_path_buf()),
        config_path: None,
    };
    let a = ThemePlugin::with_cache(options.clone(), Arc::clone(&cache));
    let b = ThemePlugin::with_cache(options, Arc::clone(&cache));

    let (first, second) = tokio::join!(
        a.process("@indium-theme;", None),
        b.process("@indium-theme;", None)
    );
    assert_eq!(first.css, second.css);
    assert_eq!(cache.generation(), 0);
    assert_eq!(cache.status(), CacheStatus::Ready);
}

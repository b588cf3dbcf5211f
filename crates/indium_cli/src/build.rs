//! One-shot stylesheet build

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indium_theme::{ConfigSource, PluginOptions, ThemePlugin};
use tracing::{info, warn};

pub fn plugin_options(cwd: &Path, config: Option<PathBuf>) -> PluginOptions {
    PluginOptions {
        config_path: config,
        cwd: Some(cwd.to_path_buf()),
    }
}

/// Process `input` once and write the result to `output` (stdout if `None`)
pub async fn build_once<S: ConfigSource>(
    plugin: &ThemePlugin<S>,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let css = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let result = plugin.process(&css, Some(input)).await;
    for text in result.warnings() {
        warn!("{text}");
    }

    match output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(output, &result.css)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Built {} -> {}", input.display(), output.display());
        }
        None => print!("{}", result.css),
    }
    Ok(())
}

pub async fn run(
    input: &Path,
    output: Option<&Path>,
    cwd: &Path,
    config: Option<PathBuf>,
) -> Result<()> {
    let plugin = ThemePlugin::new(plugin_options(cwd, config));
    build_once(&plugin, input, output).await
}

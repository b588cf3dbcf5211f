//! Rebuild on change
//!
//! Watches the stylesheet directory and the project directory. Changes to a
//! configuration file go through the plugin's hot-reload hook, which
//! invalidates the cached configuration before the rebuild.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indium_theme::{ConfigSource, ThemePlugin};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::build::{build_once, plugin_options};

const DEBOUNCE: Duration = Duration::from_millis(200);

/// What a batch of file events means for the build
#[derive(Debug, Default, PartialEq, Eq)]
struct Change {
    config: bool,
    input: bool,
}

impl Change {
    fn needs_rebuild(&self) -> bool {
        self.config || self.input
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a == b || std::fs::canonicalize(a).is_ok_and(|a| a == b)
}

/// Sort event paths into config and input changes
///
/// Config changes are forwarded to the plugin so its cache is invalidated.
fn classify<S: ConfigSource>(
    plugin: &ThemePlugin<S>,
    paths: &[PathBuf],
    input: &Path,
    output: &Path,
) -> Change {
    let mut change = Change::default();
    for path in paths {
        if same_path(path, output) {
            continue;
        }
        if plugin.handle_file_change(path) {
            change.config = true;
        } else if same_path(path, input) {
            change.input = true;
        }
    }
    change
}

fn watch_roots(input: &Path, cwd: &Path, config: Option<&Path>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    let candidates = [
        input.parent().map(Path::to_path_buf),
        Some(cwd.to_path_buf()),
        config.and_then(Path::parent).map(Path::to_path_buf),
    ];
    for root in candidates.into_iter().flatten() {
        let root = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

pub async fn run(input: &Path, output: &Path, cwd: &Path, config: Option<PathBuf>) -> Result<()> {
    let input = std::fs::canonicalize(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let roots = watch_roots(&input, cwd, config.as_deref());
    let plugin = ThemePlugin::new(plugin_options(cwd, config));

    if let Err(err) = build_once(&plugin, &input, Some(output)).await {
        error!("build failed: {err:#}");
    }
    // Resolve after the first build so the output file exists
    let output = std::fs::canonicalize(output).unwrap_or_else(|_| output.to_path_buf());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .context("Failed to start file watcher")?;

    for root in &roots {
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
        debug!("watching {}", root.display());
    }
    info!("Watching for changes (press Ctrl+C to stop)...");

    while let Some(first) = rx.recv().await {
        let mut paths = Vec::new();
        let mut pending = Some(first);

        // Collect the burst of events an editor save produces
        while let Some(res) = pending.take() {
            match res {
                Ok(event) if is_relevant(&event) => paths.extend(event.paths),
                Ok(_) => {}
                Err(err) => warn!("watch error: {err}"),
            }
            pending = tokio::time::timeout(DEBOUNCE, rx.recv())
                .await
                .ok()
                .flatten();
        }

        let change = classify(&plugin, &paths, &input, &output);
        if !change.needs_rebuild() {
            continue;
        }
        if change.config {
            info!("Config changed, rebuilding...");
        } else {
            info!("Change detected, rebuilding...");
        }
        if let Err(err) = build_once(&plugin, &input, Some(&output)).await {
            error!("build failed: {err:#}");
        }
    }

    Ok(())
}

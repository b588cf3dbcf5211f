//! Stylesheet plugin: replaces `@indium-theme;` with the generated theme
//!
//! ```css
//! @import "reset.css";
//! @indium-theme;
//! body { color: var(--color-text-primary); }
//! ```
//!
//! The plugin runs once per stylesheet build. It reports the configuration
//! file back to the host as a dependency so the host can watch it, and the
//! host calls [`ThemePlugin::handle_file_change`] when a watched file
//! changes. Everything outside the directive is passed through byte for
//! byte.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{ConfigCache, ConfigSource, FileSource};
use crate::diagnostics::Diagnostics;
use crate::emit::generate_theme_css;
use crate::error::GenerateError;
use crate::loader::{find_config_file, CONFIG_EXTENSIONS, CONFIG_STEM};
use crate::schema::TokenConfig;
use crate::stylesheet::Stylesheet;

/// Name messages are attributed to
pub const PLUGIN_NAME: &str = "indium-ui/theme";

/// At-rule replaced by the generated theme
pub const DIRECTIVE: &str = "indium-theme";

/// Plugin configuration
#[derive(Clone, Debug, Default)]
pub struct PluginOptions {
    /// Explicit configuration file; otherwise `indium.config.*` is searched
    /// in `cwd`
    pub config_path: Option<PathBuf>,
    /// Project directory; defaults to the process working directory
    pub cwd: Option<PathBuf>,
}

impl PluginOptions {
    /// The effective project directory
    pub fn cwd(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Out-of-band information for the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Rebuild the stylesheet `parent` when `file` changes
    Dependency {
        plugin: &'static str,
        file: PathBuf,
        parent: Option<PathBuf>,
    },
    /// A non-fatal problem
    Warning { plugin: &'static str, text: String },
}

impl Message {
    fn warning(text: impl Into<String>) -> Self {
        Message::Warning {
            plugin: PLUGIN_NAME,
            text: text.into(),
        }
    }
}

/// Output of one stylesheet pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub css: String,
    pub messages: Vec<Message>,
}

impl ProcessResult {
    fn unchanged(css: &str) -> Self {
        Self {
            css: css.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().filter_map(|message| match message {
            Message::Warning { text, .. } => Some(text.as_str()),
            Message::Dependency { .. } => None,
        })
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Path> {
        self.messages.iter().filter_map(|message| match message {
            Message::Dependency { file, .. } => Some(file.as_path()),
            Message::Warning { .. } => None,
        })
    }
}

/// Generate the theme and check that it parses as a stylesheet
///
/// Returns the serialized stylesheet nodes, ready to be spliced.
pub fn render_theme(
    config: &TokenConfig,
    diagnostics: &mut Diagnostics,
) -> Result<String, GenerateError> {
    let css = generate_theme_css(config, diagnostics);
    let sheet = Stylesheet::parse(&css)?;
    Ok(sheet.to_css())
}

/// The `@indium-theme` stylesheet plugin
pub struct ThemePlugin<S = FileSource> {
    options: PluginOptions,
    cache: Arc<ConfigCache<S>>,
}

impl ThemePlugin<FileSource> {
    /// Create a plugin with its own file-backed cache
    pub fn new(options: PluginOptions) -> Self {
        let cache = match &options.config_path {
            Some(path) => ConfigCache::with_path(FileSource, path.clone()),
            None => ConfigCache::default(),
        };
        Self::with_cache(options, Arc::new(cache))
    }
}

impl<S: ConfigSource> ThemePlugin<S> {
    /// Create a plugin sharing a cache owned by the host
    pub fn with_cache(options: PluginOptions, cache: Arc<ConfigCache<S>>) -> Self {
        Self { options, cache }
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ConfigCache<S>> {
        &self.cache
    }

    /// The configuration file currently in effect, if any
    pub fn config_file(&self) -> Option<PathBuf> {
        self.options
            .config_path
            .clone()
            .or_else(|| find_config_file(&self.options.cwd()))
    }

    /// Replace every `@indium-theme` directive in `css`
    ///
    /// `from` is the path of the stylesheet, reported as the parent of the
    /// configuration dependency. Failures leave the directive in place and
    /// add a warning.
    pub async fn process(&self, css: &str, from: Option<&Path>) -> ProcessResult {
        if !css.contains(DIRECTIVE) {
            return ProcessResult::unchanged(css);
        }

        let sheet = match Stylesheet::parse(css) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!(error = %err, "failed to parse stylesheet");
                let mut result = ProcessResult::unchanged(css);
                result
                    .messages
                    .push(Message::warning(format!("Failed to parse stylesheet: {err}")));
                return result;
            }
        };

        let spans: Vec<_> = sheet
            .find_at_rules(DIRECTIVE)
            .into_iter()
            .map(|node| node.span.clone())
            .collect();
        if spans.is_empty() {
            return ProcessResult::unchanged(css);
        }

        let mut result = ProcessResult::unchanged(css);
        if let Some(file) = self.config_file() {
            result.messages.push(Message::Dependency {
                plugin: PLUGIN_NAME,
                file,
                parent: from.map(Path::to_path_buf),
            });
        }

        let loaded = match self.cache.get_config(&self.options.cwd()).await {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(error = %err, "failed to generate theme");
                result
                    .messages
                    .push(Message::warning(format!("Failed to generate theme: {err}")));
                return result;
            }
        };
        result.messages.extend(
            loaded
                .warnings
                .iter()
                .map(|diagnostic| Message::warning(diagnostic.message.clone())),
        );

        let mut diagnostics = Diagnostics::new();
        let generated = match render_theme(&loaded.config, &mut diagnostics) {
            Ok(generated) => generated,
            Err(err) => {
                warn!(error = %err, "failed to generate theme");
                result
                    .messages
                    .push(Message::warning(format!("Failed to generate theme: {err}")));
                return result;
            }
        };
        result.messages.extend(
            diagnostics
                .into_iter()
                .map(|diagnostic| Message::warning(diagnostic.message)),
        );

        let mut out = String::with_capacity(css.len() + generated.len() * spans.len());
        let mut cursor = 0;
        for span in &spans {
            out.push_str(&css[cursor..span.start]);
            out.push_str(&generated);
            cursor = span.end;
        }
        out.push_str(&css[cursor..]);
        result.css = out;

        debug!(
            directives = spans.len(),
            from = ?from,
            "replaced theme directive"
        );
        result
    }

    /// Hot-reload hook for the host's file watcher
    ///
    /// Invalidates the cache and returns `true` when `path` is the
    /// configuration file (or a file that would be discovered as one).
    pub fn handle_file_change(&self, path: &Path) -> bool {
        if let Some(configured) = &self.options.config_path {
            if !same_file(path, configured) {
                return false;
            }
            debug!(path = %path.display(), "config changed");
            self.cache.invalidate();
            return true;
        }

        let is_candidate = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                CONFIG_EXTENSIONS
                    .iter()
                    .any(|ext| name == format!("{CONFIG_STEM}.{ext}"))
            });
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !is_candidate || !same_file(parent, &self.options.cwd()) {
            return false;
        }

        debug!(path = %path.display(), "config changed");
        self.cache.reset();
        true
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStatus;
    use crate::defaults::default_config;
    use pretty_assertions::assert_eq;

    fn plugin_in(dir: &Path) -> ThemePlugin {
        ThemePlugin::new(PluginOptions {
            cwd: Some(dir.to_path_buf()),
            config_path: None,
        })
    }

    #[tokio::test]
    async fn stylesheet_without_directive_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin_in(dir.path());
        let css = "a { color: red; }\n";

        let result = plugin.process(css, None).await;
        assert_eq!(result, ProcessResult::unchanged(css));
        assert_eq!(plugin.cache().status(), CacheStatus::Empty);
    }

    #[tokio::test]
    async fn unparsable_stylesheet_keeps_directive_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin_in(dir.path());
        let css = "@indium-theme;\na { color: red;";

        let result = plugin.process(css, None).await;
        assert_eq!(result.css, css);
        assert_eq!(result.warnings().count(), 1);
    }

    #[tokio::test]
    async fn directive_is_replaced_without_dependency_when_no_config() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin_in(dir.path());

        let result = plugin.process("@indium-theme;", None).await;
        assert!(result.css.starts_with(":root {\n  --color-gray-50: #f9fafb;"));
        assert!(!result.css.contains("@indium-theme"));
        assert_eq!(result.messages, Vec::new());
    }

    #[test]
    fn rendered_theme_matches_generated_css() {
        let mut diagnostics = Diagnostics::new();
        let rendered = render_theme(default_config(), &mut diagnostics).unwrap();
        assert_eq!(rendered, generate_theme_css(default_config(), &mut Diagnostics::new()));
    }

    #[test]
    fn file_changes_outside_the_config_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin_in(dir.path());

        assert!(!plugin.handle_file_change(&dir.path().join("styles.css")));
        assert!(!plugin.handle_file_change(Path::new("/elsewhere/indium.config.toml")));
        assert!(plugin.handle_file_change(&dir.path().join("indium.config.yaml")));
        assert_eq!(plugin.cache().generation(), 1);
    }

    #[test]
    fn explicit_config_path_is_the_only_match() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("theme.toml");
        let plugin = ThemePlugin::new(PluginOptions {
            cwd: Some(dir.path().to_path_buf()),
            config_path: Some(config.clone()),
        });

        assert_eq!(plugin.config_file(), Some(config.clone()));
        assert!(!plugin.handle_file_change(&dir.path().join("indium.config.toml")));
        assert!(plugin.handle_file_change(&config));
    }
}

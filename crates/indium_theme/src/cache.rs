//! Single-flight configuration cache
//!
//! The host creates one [`ConfigCache`] per development session and shares it
//! (as `Arc<ConfigCache>`) between the stylesheet plugin and its file watcher:
//!
//! ```text
//! Empty --get_config--> Loading --ok--> Ready
//!   ^                      |               |
//!   +-------- err ---------+               |
//!   +------------- invalidate -------------+
//! ```
//!
//! Concurrent `get_config` calls during `Loading` await the same load.
//! `invalidate` is synchronous and takes effect immediately: it swaps in a
//! fresh slot, so a load that was already in flight can only fill the slot
//! of its own (stale) generation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::{ConfigError, Result};
use crate::loader::{
    finish_load, parse_config_str, ConfigFormat, LoadedConfig, CONFIG_EXTENSIONS, CONFIG_STEM,
};

/// Where the cache gets configurations from
pub trait ConfigSource: Send + Sync + 'static {
    /// Load the configuration for `cwd`
    ///
    /// `path` is the configuration file already known to the cache, if any.
    /// Otherwise the source discovers one itself.
    fn load(
        &self,
        cwd: &Path,
        path: Option<&Path>,
    ) -> impl Future<Output = Result<LoadedConfig>> + Send;
}

/// Reads `indium.config.*` from disk and merges it onto the defaults
///
/// Broken files never produce an error here: they load as the defaults with
/// a warning attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSource;

impl FileSource {
    async fn discover(cwd: &Path) -> Option<PathBuf> {
        for ext in CONFIG_EXTENSIONS {
            let candidate = cwd.join(format!("{CONFIG_STEM}.{ext}"));
            if let Ok(metadata) = tokio::fs::metadata(&candidate).await {
                if metadata.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl ConfigSource for FileSource {
    async fn load(&self, cwd: &Path, path: Option<&Path>) -> Result<LoadedConfig> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(cwd).await,
        };
        let Some(path) = path else {
            debug!(cwd = %cwd.display(), "no config file, using defaults");
            return Ok(LoadedConfig::defaults());
        };

        let parsed = match ConfigFormat::from_path(&path) {
            Some(format) => match tokio::fs::read_to_string(&path).await {
                Ok(source) => parse_config_str(&source, format, &path),
                Err(source) => Err(ConfigError::Io {
                    path: path.clone(),
                    source,
                }),
            },
            None => Err(ConfigError::UnsupportedFormat(path.clone())),
        };

        Ok(finish_load(path, parsed))
    }
}

/// Observable state of the current cache generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Loading,
    Ready,
}

/// One generation's single-flight slot
///
/// The first caller holds the lock for the duration of the load; waiters
/// find the value in place once they acquire it.
#[derive(Default)]
struct Slot {
    value: tokio::sync::Mutex<Option<Arc<LoadedConfig>>>,
    /// A load is running for this generation
    loading: AtomicBool,
    /// `value` has been filled
    ready: AtomicBool,
}

/// Clears [`Slot::loading`] when the load finishes, fails or is dropped
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct State {
    generation: u64,
    path: Option<PathBuf>,
    slot: Arc<Slot>,
}

/// Memoized configuration with explicit invalidation
pub struct ConfigCache<S = FileSource> {
    source: S,
    state: Mutex<State>,
}

impl Default for ConfigCache<FileSource> {
    fn default() -> Self {
        Self::new(FileSource)
    }
}

impl<S: ConfigSource> ConfigCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(State {
                generation: 0,
                path: None,
                slot: Arc::default(),
            }),
        }
    }

    /// Create a cache that always loads `path` instead of discovering one
    pub fn with_path(source: S, path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(source);
        cache.lock().path = Some(path.into());
        cache
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached configuration, loading it if needed
    ///
    /// At most one load runs per generation. A failed load is not cached.
    pub async fn get_config(&self, cwd: &Path) -> Result<Arc<LoadedConfig>> {
        let (generation, path, slot) = {
            let state = self.lock();
            (state.generation, state.path.clone(), Arc::clone(&state.slot))
        };

        let mut value = slot.value.lock().await;
        if let Some(config) = value.as_ref() {
            trace!(generation, "config cache hit");
            return Ok(Arc::clone(config));
        }

        debug!(generation, cwd = %cwd.display(), "loading config");
        let loading = LoadingGuard::start(&slot.loading);
        let loaded = Arc::new(self.source.load(cwd, path.as_deref()).await?);
        *value = Some(Arc::clone(&loaded));
        slot.ready.store(true, Ordering::Release);
        drop(loading);
        drop(value);

        let mut state = self.lock();
        if state.generation == generation && state.path.is_none() {
            state.path.clone_from(&loaded.path);
        }

        Ok(loaded)
    }

    /// Drop the cached configuration
    ///
    /// The next [`get_config`](Self::get_config) starts a fresh load, even if
    /// an older load is still running.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.slot = Arc::default();
        debug!(generation = state.generation, "config cache invalidated");
    }

    /// Invalidate and forget a discovered path
    ///
    /// Used when a configuration file appears or disappears, so the next load
    /// searches the project directory again.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.slot = Arc::default();
        state.path = None;
        debug!(generation = state.generation, "config cache reset");
    }

    /// Invalidate and load again
    pub async fn reload(&self, cwd: &Path) -> Result<Arc<LoadedConfig>> {
        self.invalidate();
        self.get_config(cwd).await
    }

    /// The configuration file path, once known
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Pin the configuration file path
    ///
    /// Changing the path invalidates the cache.
    pub fn set_path(&self, path: Option<PathBuf>) {
        let changed = {
            let mut state = self.lock();
            let changed = state.path != path;
            state.path = path;
            changed
        };
        if changed {
            self.invalidate();
        }
    }

    /// State of the current generation
    ///
    /// Does not wait on the slot, so callers reading a cached value never
    /// make it look like a load is running.
    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        if state.slot.ready.load(Ordering::Acquire) {
            CacheStatus::Ready
        } else if state.slot.loading.load(Ordering::Acquire) {
            CacheStatus::Loading
        } else {
            CacheStatus::Empty
        }
    }

    /// Number of invalidations so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

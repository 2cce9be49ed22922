//! Runtime configuration
//!
//! Defaults follow the usual GIR install layout. `from_env` lets the CLI
//! and tests point the library at other directories.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Path list of directories scanned for `.gir` files
pub const GIR_DIRS_VAR: &str = "RUSTYGIR_GIR_DIRS";
/// Directory holding persisted index blobs
pub const CACHE_DIR_VAR: &str = "RUSTYGIR_CACHE_DIR";

const DEFAULT_GIR_DIR: &str = "/usr/share/gir-1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gir_dirs: Vec<PathBuf>,
    pub cache_dir: PathBuf,
    /// Match keys exactly instead of lowercasing keys and queries
    pub case_sensitive: bool,
    /// Result limit for searches; 0 means unlimited
    pub max_matches: usize,
    /// Loaded indexes kept in memory
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gir_dirs: vec![PathBuf::from(DEFAULT_GIR_DIR)],
            cache_dir: default_cache_dir(),
            case_sensitive: false,
            max_matches: 100,
            cache_capacity: 32,
        }
    }
}

/// `$XDG_CACHE_HOME/rtfm/gobject-introspection` or the platform equivalent
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("rtfm")
        .join("gobject-introspection")
}

impl Config {
    /// Defaults overlaid with `RUSTYGIR_GIR_DIRS` and `RUSTYGIR_CACHE_DIR`
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var_os(name))
    }

    fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Config::default();
        if let Some(dirs) = var(GIR_DIRS_VAR) {
            let dirs: Vec<PathBuf> = env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !dirs.is_empty() {
                config.gir_dirs = dirs;
            }
        }
        if let Some(dir) = var(CACHE_DIR_VAR).filter(|d| !d.is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_gir_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.gir_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

//! GIR file discovery and cross-file search
//!
//! `GirProvider` owns the configuration and one `IndexCache`. Files are
//! discovered by `reload()`; searches fan out over every discovered file
//! on the Rayon pool and merge the per-file matches.

use crate::config::Config;
use crate::index::{FuzzyMatch, IndexCache, IndexDocument};
use crate::strategy::CancellationToken;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One match of a cross-file search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub file: PathBuf,
    pub namespace: Option<String>,
    pub key: String,
    pub document: IndexDocument,
    pub score: f32,
}

impl SearchHit {
    fn new(file: &Path, namespace: Option<&str>, m: FuzzyMatch) -> Self {
        SearchHit {
            file: file.to_path_buf(),
            namespace: namespace.map(str::to_string),
            key: m.key,
            document: m.document,
            score: m.score,
        }
    }
}

pub struct GirProvider {
    config: Config,
    cache: IndexCache,
    files: RwLock<Vec<PathBuf>>,
}

impl GirProvider {
    /// Provider with no files discovered yet; call `reload()` to scan
    pub fn new(config: Config) -> Self {
        let cache = IndexCache::new(&config);
        GirProvider {
            config,
            cache,
            files: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Rescan the configured directories; returns the number of files found
    pub fn reload(&self) -> usize {
        let mut found = Vec::new();
        for dir in &self.config.gir_dirs {
            scan_dir(dir, &mut found);
        }
        found.sort();
        found.dedup();

        info!(files = found.len(), "discovered GIR files");
        let count = found.len();
        *self.files.write() = found;
        count
    }

    /// Files found by the last `reload()`
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.read().clone()
    }

    /// Where the index blob of `file` lives
    pub fn index_path(&self, file: &Path) -> PathBuf {
        self.cache.store().path_for(file)
    }

    /// Fuzzy search across every discovered file
    ///
    /// Files whose index cannot be produced are logged and skipped. Files
    /// not yet started when `cancel` fires contribute nothing.
    pub fn search(&self, query: &str, cancel: &CancellationToken) -> Vec<SearchHit> {
        let files = self.files();
        self.search_files(&files, query, cancel)
    }

    /// Fuzzy search restricted to `files`
    pub fn search_files(
        &self,
        files: &[PathBuf],
        query: &str,
        cancel: &CancellationToken,
    ) -> Vec<SearchHit> {
        let max_matches = self.config.max_matches;

        let mut hits: Vec<SearchHit> = files
            .par_iter()
            .flat_map_iter(|file| self.search_one(file, query, max_matches, cancel))
            .collect();

        if cancel.is_cancelled() {
            debug!(query, "search cancelled");
        }

        sort_hits(&mut hits);
        if max_matches > 0 {
            hits.truncate(max_matches);
        }
        hits
    }

    fn search_one(
        &self,
        file: &Path,
        query: &str,
        max_matches: usize,
        cancel: &CancellationToken,
    ) -> Vec<SearchHit> {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match self.cache.get(file) {
            Ok(index) => index
                .search(query, max_matches)
                .into_iter()
                .map(|m| SearchHit::new(file, index.namespace.as_deref(), m))
                .collect(),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping file");
                Vec::new()
            }
        }
    }
}

fn scan_dir(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "GIR directory not readable");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_gir = path.extension().is_some_and(|ext| ext == "gir");
        if is_gir && path.is_file() {
            found.push(path);
        }
    }
}

/// Best score first, then key, then file
fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.file.cmp(&b.file))
    });
}

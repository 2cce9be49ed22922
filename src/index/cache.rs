//! Loaded index cache
//!
//! `IndexCache::get` hands out a shared, up-to-date index for a GIR file:
//! - LRU hit whose mtime still matches the source: served directly
//! - otherwise the persisted blob is loaded, or rebuilt when missing,
//!   stale or undecodable
//!
//! Loads and rebuilds for the same file are single-flight: concurrent
//! callers share one rebuild and receive the same `Arc`.

use super::flight::SingleFlight;
use super::fuzzy::{FuzzyIndex, FuzzyMatch};
use super::indexer::{build_index, NAMESPACE_KEY};
use super::store::{source_mtime, IndexBlob, IndexStore};
use crate::config::Config;
use crate::error::{GirError, Result};
use crate::gir::Parser;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index of one GIR file, as served to searchers
#[derive(Debug)]
pub struct SearchIndex {
    pub source: PathBuf,
    pub namespace: Option<String>,
    /// Source mtime the index was built from
    pub mtime: u64,
    pub index: FuzzyIndex,
}

impl SearchIndex {
    fn from_blob(source: &Path, blob: IndexBlob) -> Self {
        SearchIndex {
            source: source.to_path_buf(),
            namespace: blob.namespace,
            mtime: blob.mtime,
            index: blob.index,
        }
    }

    pub fn search(&self, query: &str, max_matches: usize) -> Vec<FuzzyMatch> {
        self.index.query(query, max_matches)
    }
}

/// Outcome shared by every caller of one flight
pub type SharedIndex = std::result::Result<Arc<SearchIndex>, Arc<GirError>>;

pub struct IndexCache {
    store: IndexStore,
    parser: Parser,
    case_sensitive: bool,
    loaded: Mutex<LruCache<PathBuf, Arc<SearchIndex>>>,
    flights: SingleFlight<PathBuf, SharedIndex>,
    rebuilds: AtomicUsize,
}

impl IndexCache {
    pub fn new(config: &Config) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        IndexCache {
            store: IndexStore::new(&config.cache_dir),
            parser: Parser::new(),
            case_sensitive: config.case_sensitive,
            loaded: Mutex::new(LruCache::new(capacity)),
            flights: SingleFlight::new(),
            rebuilds: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Current index for `source`, loading or rebuilding as needed
    pub fn get(&self, source: &Path) -> SharedIndex {
        let mtime = source_mtime(source).map_err(Arc::new)?;

        if let Some(hit) = self.cached(source, mtime) {
            return Ok(hit);
        }

        self.flights
            .run(source.to_path_buf(), || self.load_or_rebuild(source))
    }

    /// Drop the in-memory copy; the blob on disk is kept
    pub fn invalidate(&self, source: &Path) {
        self.loaded.lock().pop(source);
    }

    /// Number of rebuilds performed by this cache
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    fn cached(&self, source: &Path, mtime: u64) -> Option<Arc<SearchIndex>> {
        let mut loaded = self.loaded.lock();
        let hit = loaded.get(source)?;
        if hit.mtime == mtime {
            return Some(Arc::clone(hit));
        }
        debug!(source = %source.display(), "cached index outdated");
        loaded.pop(source);
        None
    }

    fn load_or_rebuild(&self, source: &Path) -> SharedIndex {
        let mtime = source_mtime(source).map_err(Arc::new)?;

        // A caller that lost the race may find the winner's result here
        if let Some(hit) = self.cached(source, mtime) {
            return Ok(hit);
        }

        let index = match self.store.load(source, mtime) {
            Ok(Some(blob)) if blob.index.case_sensitive() == self.case_sensitive => {
                debug!(source = %source.display(), "loaded index");
                SearchIndex::from_blob(source, blob)
            }
            Ok(Some(_)) => {
                info!(source = %source.display(), "index built with other case folding, rebuilding");
                self.rebuild(source, mtime).map_err(Arc::new)?
            }
            Ok(None) => {
                debug!(source = %source.display(), "no index, building");
                self.rebuild(source, mtime).map_err(Arc::new)?
            }
            Err(GirError::IndexStale { reason, .. }) => {
                info!(source = %source.display(), %reason, "stale index, rebuilding");
                self.rebuild(source, mtime).map_err(Arc::new)?
            }
            Err(e) => return Err(Arc::new(e)),
        };

        let index = Arc::new(index);
        self.loaded
            .lock()
            .put(source.to_path_buf(), Arc::clone(&index));
        Ok(index)
    }

    /// Parse, index and persist `source`
    fn rebuild(&self, source: &Path, mtime: u64) -> Result<SearchIndex> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);

        let repository = self.parser.parse_file(source)?;
        let builder = build_index(&repository, self.case_sensitive);
        let namespace = builder.metadata_string(NAMESPACE_KEY).map(str::to_string);
        let blob = IndexBlob::new(mtime, namespace, builder.build());

        if let Err(e) = self.store.save(source, &blob) {
            warn!(source = %source.display(), error = %e, "could not persist index");
        }
        Ok(SearchIndex::from_blob(source, blob))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const GIR: &str = r#"<repository version="1.2"><namespace name="Gtk" version="4.0">
        <class name="Widget" c:type="GtkWidget" c:symbol-prefix="widget">
          <method name="show" c:identifier="gtk_widget_show"/>
        </class>
      </namespace></repository>"#;

    fn setup() -> (TempDir, PathBuf, Config) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Gtk-4.0.gir");
        fs::write(&source, GIR).unwrap();
        let config = Config::default()
            .with_gir_dirs([dir.path()])
            .with_cache_dir(dir.path().join("cache"));
        (dir, source, config)
    }

    fn touch(path: &Path, offset: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + offset).unwrap();
    }

    #[test]
    fn test_build_then_hit() {
        let (_dir, source, config) = setup();
        let cache = IndexCache::new(&config);

        let first = cache.get(&source).unwrap();
        assert_eq!(cache.rebuild_count(), 1);
        assert_eq!(first.namespace.as_deref(), Some("Gtk"));
        assert_eq!(first.search("gws", 0)[0].document.word, "gtk_widget_show");
        assert!(cache.store().path_for(&source).exists());

        let second = cache.get(&source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_blob_reused_across_caches() {
        let (_dir, source, config) = setup();
        IndexCache::new(&config).get(&source).unwrap();

        let fresh = IndexCache::new(&config);
        let index = fresh.get(&source).unwrap();
        assert_eq!(fresh.rebuild_count(), 0);
        assert_eq!(index.search("widget", 0).len(), 3);
    }

    #[test]
    fn test_touched_source_forces_rebuild() {
        let (_dir, source, config) = setup();
        let cache = IndexCache::new(&config);
        let before = cache.get(&source).unwrap();

        touch(&source, Duration::from_secs(60));

        // A second cache sees the stale blob on disk
        let fresh = IndexCache::new(&config);
        let rebuilt = fresh.get(&source).unwrap();
        assert_eq!(fresh.rebuild_count(), 1);
        assert_ne!(rebuilt.mtime, before.mtime);

        // The first cache notices its in-memory copy is outdated
        touch(&source, Duration::from_secs(120));
        let again = cache.get(&source).unwrap();
        assert_eq!(cache.rebuild_count(), 2);
        assert!(!Arc::ptr_eq(&before, &again));
    }

    #[test]
    fn test_corrupt_blob_rebuilt() {
        let (_dir, source, config) = setup();
        let cache = IndexCache::new(&config);
        let blob_path = cache.store().path_for(&source);
        fs::create_dir_all(blob_path.parent().unwrap()).unwrap();
        fs::write(&blob_path, b"garbage").unwrap();

        cache.get(&source).unwrap();
        assert_eq!(cache.rebuild_count(), 1);
        assert!(IndexCache::new(&config).get(&source).is_ok());
    }

    #[test]
    fn test_invalidate_reloads_from_disk() {
        let (_dir, source, config) = setup();
        let cache = IndexCache::new(&config);
        let first = cache.get(&source).unwrap();
        cache.invalidate(&source);
        let second = cache.get(&source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_concurrent_gets_share_one_rebuild() {
        let (_dir, source, config) = setup();
        let cache = IndexCache::new(&config);
        let (cache_ref, source_ref) = (&cache, &source);

        let results: Vec<SharedIndex> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || cache_ref.get(source_ref)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.rebuild_count(), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let (dir, _source, config) = setup();
        let broken = dir.path().join("Broken-1.0.gir");
        fs::write(&broken, "<repository><namespace/></repository>").unwrap();

        let cache = IndexCache::new(&config);
        let err = cache.get(&broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingAttribute);
        assert!(!cache.store().path_for(&broken).exists());

        let missing = cache.get(&dir.path().join("Missing.gir")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Io);
    }
}

//! Persisted index blobs
//!
//! One file per source document, named after the SHA-1 of the source path.
//! Each blob records the format version and the source mtime it was built
//! from; a blob that disagrees with either is stale and never served.

use super::fuzzy::FuzzyIndex;
use crate::error::{GirError, Result, StaleReason};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tempfile::NamedTempFile;
use tracing::debug;

/// Bumped whenever the blob layout or indexing rules change
pub const INDEX_VERSION: u32 = 1;

const EXTENSION: &str = "index";

/// On-disk form of one document's index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBlob {
    pub version: u32,
    /// Source mtime in nanoseconds since the epoch
    pub mtime: u64,
    pub namespace: Option<String>,
    pub index: FuzzyIndex,
}

impl IndexBlob {
    pub fn new(mtime: u64, namespace: Option<String>, index: FuzzyIndex) -> Self {
        IndexBlob {
            version: INDEX_VERSION,
            mtime,
            namespace,
            index,
        }
    }
}

/// Modification time of a file in nanoseconds since the epoch
pub fn source_mtime(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| GirError::io(path, e))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0))
}

/// `<sha1-hex(source)>.index`
///
/// Hashes the file-system path exactly as given, not a `file://` URI, so
/// callers should pass the same spelling of a path every time.
pub fn index_file_name(source: &Path) -> String {
    let mut hasher = Sha1::new();
    hasher.update(source.to_string_lossy().as_bytes());
    format!("{:x}.{}", hasher.finalize(), EXTENSION)
}

/// Directory of index blobs
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        IndexStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Blob location for a source document
    pub fn path_for(&self, source: &Path) -> PathBuf {
        self.dir.join(index_file_name(source))
    }

    /// Load the blob for `source` if it matches `mtime`
    ///
    /// `Ok(None)` when no blob exists; `IndexStale` when it exists but was
    /// built from another version, another mtime, or cannot be decoded.
    pub fn load(&self, source: &Path, mtime: u64) -> Result<Option<IndexBlob>> {
        let path = self.path_for(source);
        let blob = match read_blob(&path)? {
            Some(blob) => blob,
            None => return Ok(None),
        };
        check_blob(source, blob, mtime).map(Some)
    }

    /// Write atomically: temp file, then rename over the old blob
    pub fn save(&self, source: &Path, blob: &IndexBlob) -> Result<PathBuf> {
        let path = self.path_for(source);
        write_blob(&path, blob)?;
        debug!(source = %source.display(), blob = %path.display(), "saved index");
        Ok(path)
    }

    /// Remove the blob for `source`; missing blobs are fine
    pub fn remove(&self, source: &Path) -> Result<()> {
        let path = self.path_for(source);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GirError::io(path, e)),
        }
    }
}

/// Decode a blob file; `Ok(None)` if it does not exist
pub fn read_blob(path: &Path) -> Result<Option<IndexBlob>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GirError::io(path, e)),
    };
    match bincode::deserialize::<IndexBlob>(&bytes) {
        Ok(blob) => Ok(Some(blob)),
        Err(e) => {
            debug!(blob = %path.display(), error = %e, "undecodable index blob");
            Err(GirError::IndexStale {
                path: path.to_path_buf(),
                reason: StaleReason::Corrupt,
            })
        }
    }
}

/// Encode and write a blob to an explicit location
pub fn write_blob(path: &Path, blob: &IndexBlob) -> Result<()> {
    let bytes = bincode::serialize(blob)?;

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| GirError::io(dir, e))?;

    // Unique name per writer; the rename makes the last writer win whole
    let mut file = NamedTempFile::new_in(dir).map_err(|e| GirError::io(dir, e))?;
    file.write_all(&bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| GirError::io(file.path(), e))?;

    file.persist(path)
        .map(|_| ())
        .map_err(|e| GirError::io(path, e.error))
}

fn check_blob(source: &Path, blob: IndexBlob, mtime: u64) -> Result<IndexBlob> {
    let reason = if blob.version != INDEX_VERSION {
        StaleReason::Version {
            found: blob.version,
            expected: INDEX_VERSION,
        }
    } else if blob.mtime != mtime {
        StaleReason::Mtime {
            found: blob.mtime,
            expected: mtime,
        }
    } else {
        return Ok(blob);
    };

    Err(GirError::IndexStale {
        path: source.to_path_buf(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as GirErrorKind;
    use crate::index::fuzzy::{FuzzyIndexBuilder, IndexDocument};

    fn sample_index() -> FuzzyIndex {
        let mut builder = FuzzyIndexBuilder::new(false);
        builder.insert(
            "gtk_init",
            IndexDocument {
                id: "gir:namespace[Gtk-4.0]:function[init]".into(),
                word: "gtk_init".into(),
            },
        );
        builder.build()
    }

    #[test]
    fn test_file_name_is_sha1_of_path() {
        let name = index_file_name(Path::new("/usr/share/gir-1.0/Gtk-4.0.gir"));
        assert!(name.ends_with(".index"));
        assert_eq!(name.len(), 40 + ".index".len());
        assert!(name[..40].bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(name, index_file_name(Path::new("/usr/share/gir-1.0/Gtk-3.0.gir")));
        assert_eq!(name, index_file_name(Path::new("/usr/share/gir-1.0/Gtk-4.0.gir")));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            index_file_name(Path::new("abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d.index"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("cache"));
        let source = Path::new("/tmp/Gtk-4.0.gir");

        assert!(store.load(source, 7).unwrap().is_none());

        let path = store
            .save(source, &IndexBlob::new(7, Some("Gtk".into()), sample_index()))
            .unwrap();
        assert!(path.exists());
        assert_eq!(path, store.path_for(source));

        let blob = store.load(source, 7).unwrap().unwrap();
        assert_eq!(blob.version, INDEX_VERSION);
        assert_eq!(blob.namespace.as_deref(), Some("Gtk"));
        assert_eq!(blob.index.query("init", 0).len(), 1);

        // no temp files left behind
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_mtime_mismatch_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let source = Path::new("Gtk-4.0.gir");
        store
            .save(source, &IndexBlob::new(1, None, sample_index()))
            .unwrap();

        match store.load(source, 2) {
            Err(GirError::IndexStale { reason, .. }) => {
                assert_eq!(reason, StaleReason::Mtime { found: 1, expected: 2 });
            }
            other => panic!("Expected IndexStale, got {:?}", other.map(|b| b.map(|b| b.mtime))),
        }
    }

    #[test]
    fn test_version_mismatch_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let source = Path::new("Gtk-4.0.gir");
        let mut blob = IndexBlob::new(1, None, sample_index());
        blob.version = INDEX_VERSION + 1;
        store.save(source, &blob).unwrap();

        let err = store.load(source, 1).unwrap_err();
        assert!(matches!(
            err,
            GirError::IndexStale {
                reason: StaleReason::Version { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_blob_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let source = Path::new("Gtk-4.0.gir");
        fs::write(store.path_for(source), b"not an index").unwrap();

        let err = store.load(source, 1).unwrap_err();
        assert_eq!(err.kind(), GirErrorKind::IndexStale);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let source = Path::new("Gtk-4.0.gir");
        store.remove(source).unwrap();
        store
            .save(source, &IndexBlob::new(1, None, sample_index()))
            .unwrap();
        store.remove(source).unwrap();
        assert!(store.load(source, 1).unwrap().is_none());
    }

    #[test]
    fn test_name_hashes_path_not_uri() {
        let path = Path::new("/usr/share/gir-1.0/GLib-2.0.gir");
        let mut hasher = Sha1::new();
        hasher.update(b"/usr/share/gir-1.0/GLib-2.0.gir");
        assert_eq!(index_file_name(path), format!("{:x}.index", hasher.finalize()));
        assert_ne!(
            index_file_name(path),
            index_file_name(Path::new("file:///usr/share/gir-1.0/GLib-2.0.gir"))
        );
    }

    #[test]
    fn test_concurrent_writers_same_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let source = Path::new("Gtk-4.0.gir");
        let (store_ref, source_ref) = (&store, source);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u64)
                .map(|mtime| {
                    s.spawn(move || {
                        let blob = IndexBlob::new(mtime, Some("Gtk".into()), sample_index());
                        store_ref.save(source_ref, &blob).unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });

        // one complete blob from some writer, no temp files left behind
        let written = read_blob(&store.path_for(source)).unwrap().unwrap();
        assert!(written.mtime < 8);
        assert_eq!(written.index.query("init", 0).len(), 1);
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_source_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gir");
        assert_eq!(source_mtime(&path).unwrap_err().kind(), GirErrorKind::Io);
        fs::write(&path, b"<repository/>").unwrap();
        assert!(source_mtime(&path).unwrap() > 0);
    }
}

//! Parallel multi-document processing
//!
//! Uses Rayon to parse or index many GIR files at once. Each document gets
//! its own parse and its own tree; failures stay with their file.
//! Cancellation is checked before each document starts.

use crate::error::{GirError, Result};
use crate::gir::{Parser, Repository};
use crate::index::{IndexCache, SharedIndex};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GirError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Parse every file in parallel; results follow input order
pub fn parse_files(
    parser: &Parser,
    paths: &[PathBuf],
    cancel: &CancellationToken,
) -> Vec<(PathBuf, Result<Repository>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = cancel.check().and_then(|_| parser.parse_file(path));
            (path.clone(), result)
        })
        .collect()
}

/// Load or rebuild the index of every file in parallel
pub fn index_files(
    cache: &IndexCache,
    paths: &[PathBuf],
    cancel: &CancellationToken,
) -> Vec<(PathBuf, SharedIndex)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), index_one(cache, path, cancel)))
        .collect()
}

fn index_one(cache: &IndexCache, path: &Path, cancel: &CancellationToken) -> SharedIndex {
    if cancel.is_cancelled() {
        debug!(path = %path.display(), "cancelled before indexing");
        return Err(Arc::new(GirError::Cancelled));
    }
    cache.get(path)
}

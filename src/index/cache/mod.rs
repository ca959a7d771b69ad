//! Process-lifetime memo of loaded bundles, keyed by base path.
//!
//! Bundles are never mutated after a build, so entries are never invalidated;
//! picking up a rebuilt bundle means starting with a fresh cache.


use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use super::bundle::IndexBundle;
use crate::Result;

#[derive(Debug, Default)]
pub struct IndexCache {
    entries: RwLock<HashMap<PathBuf, Arc<IndexBundle>>>,
    strict: bool,
}

impl IndexCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inconsistent bundles at load time instead of only warning
    #[inline]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Return the bundle stored under `base`, loading it on first request
    ///
    /// Every call for the same path after the first returns the same
    /// `Arc`. Failed loads are not cached.
    #[inline]
    pub fn load<P: AsRef<Path>>(&self, base: P) -> Result<Arc<IndexBundle>> {
        let base = base.as_ref();

        if let Some(bundle) = self.get(base) {
            debug!("Index cache hit for {}", base.display());
            return Ok(bundle);
        }

        debug!("Index cache miss for {}", base.display());
        let bundle = IndexBundle::load(base)?;
        if self.strict {
            bundle.ensure_consistent()?;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let bundle = Arc::clone(
            entries
                .entry(base.to_path_buf())
                .or_insert_with(|| Arc::new(bundle)),
        );
        drop(entries);

        info!(
            "Loaded index from {} ({} chunks)",
            base.display(),
            bundle.chunks.len()
        );
        Ok(bundle)
    }

    /// Cached bundle for `base`, without touching the disk
    #[inline]
    pub fn get<P: AsRef<Path>>(&self, base: P) -> Option<Arc<IndexBundle>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(base.as_ref())
            .cloned()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

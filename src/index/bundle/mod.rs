//! The persisted pair of index and chunk list.
//!
//! A bundle lives at a caller-chosen base path as two sibling files:
//! `{base}.index` holds the bincode-encoded [`FlatIndex`] and
//! `{base}_chunks.json` holds the chunk strings as a JSON array. Entry `i` of
//! the index belongs to chunk `i`; both files are written and read together.
//!
//! Saving is not atomic across the two files. Each file is written to a
//! temporary sibling and renamed into place, index first, so a crash between
//! the renames leaves a new index next to an old (or missing) chunk list.
//! Loading reports the missing half as [`DocentError::IndexNotFound`] and a
//! length disagreement as a warning (or [`DocentError::MismatchedBundle`]
//! through [`IndexBundle::ensure_consistent`]).


use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::flat::FlatIndex;
use crate::{DocentError, Result};

const INDEX_SUFFIX: &str = ".index";
const CHUNKS_SUFFIX: &str = "_chunks.json";
const TEMP_SUFFIX: &str = ".tmp";

/// File locations of a bundle derived from its base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub base: PathBuf,
    pub index: PathBuf,
    pub chunks: PathBuf,
}

impl BundlePaths {
    #[inline]
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            base: base.to_path_buf(),
            index: with_suffix(base, INDEX_SUFFIX),
            chunks: with_suffix(base, CHUNKS_SUFFIX),
        }
    }

    /// Whether both artifacts are present on disk
    #[inline]
    pub fn exists(&self) -> bool {
        self.index.is_file() && self.chunks.is_file()
    }
}

/// A similarity index together with the chunks its entries point at
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBundle {
    pub index: FlatIndex,
    pub chunks: Vec<String>,
}

impl IndexBundle {
    #[inline]
    pub fn new(index: FlatIndex, chunks: Vec<String>) -> Self {
        Self { index, chunks }
    }

    /// Whether the index holds exactly one vector per chunk
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.chunks.len()
    }

    #[inline]
    pub fn ensure_consistent(&self) -> Result<()> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(DocentError::MismatchedBundle {
                vectors: self.index.len(),
                chunks: self.chunks.len(),
            })
        }
    }

    /// Write both artifacts under `base`, creating parent directories as needed
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, base: P) -> Result<BundlePaths> {
        let paths = BundlePaths::new(base);

        if let Some(parent) = paths.index.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let index_bytes = bincode::serde::encode_to_vec(&self.index, bincode::config::standard())
            .map_err(|e| DocentError::Serialization(format!("Failed to encode index: {}", e)))?;
        let chunks_json = serde_json::to_vec(&self.chunks)
            .map_err(|e| DocentError::Serialization(format!("Failed to encode chunks: {}", e)))?;

        write_replacing(&paths.index, &index_bytes)?;
        write_replacing(&paths.chunks, &chunks_json)?;

        info!(
            "Saved index with {} vectors to {} and {}",
            self.index.len(),
            paths.index.display(),
            paths.chunks.display()
        );

        Ok(paths)
    }

    /// Read the bundle stored under `base`
    ///
    /// Both artifacts must exist; a length disagreement between them is
    /// logged but not rejected here.
    #[inline]
    pub fn load<P: AsRef<Path>>(base: P) -> Result<Self> {
        let paths = BundlePaths::new(base);

        if !paths.exists() {
            debug!(
                "Bundle incomplete: index present = {}, chunks present = {}",
                paths.index.is_file(),
                paths.chunks.is_file()
            );
            return Err(DocentError::IndexNotFound(paths.base));
        }

        let index_bytes = fs::read(&paths.index)?;
        let (index, _): (FlatIndex, usize) =
            bincode::serde::decode_from_slice(&index_bytes, bincode::config::standard()).map_err(
                |e| {
                    DocentError::Serialization(format!(
                        "Failed to decode {}: {}",
                        paths.index.display(),
                        e
                    ))
                },
            )?;
        index.validate()?;

        let chunks_json = fs::read(&paths.chunks)?;
        let chunks: Vec<String> = serde_json::from_slice(&chunks_json).map_err(|e| {
            DocentError::Serialization(format!(
                "Failed to decode {}: {}",
                paths.chunks.display(),
                e
            ))
        })?;

        let bundle = Self { index, chunks };
        if !bundle.is_consistent() {
            warn!(
                "Index bundle at {} is inconsistent: {} vectors but {} chunks",
                paths.base.display(),
                bundle.index.len(),
                bundle.chunks.len()
            );
        }

        debug!(
            "Loaded bundle from {} ({} vectors, dimension {})",
            paths.base.display(),
            bundle.index.len(),
            bundle.index.dimension()
        );

        Ok(bundle)
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = with_suffix(path, TEMP_SUFFIX);
    fs::write(&temp, contents)?;
    fs::rename(&temp, path)?;
    Ok(())
}

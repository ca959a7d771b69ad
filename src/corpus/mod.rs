//! Artwork records and their normalization into embeddable text chunks.
//!
//! The ingestion file is newline-delimited JSON, one artwork per line. Every
//! record becomes exactly one chunk, and chunk order follows line order; the
//! index relies on that positional correspondence.


use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{DocentError, Result};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const UNKNOWN_MEDIUM: &str = "Unknown Medium";

/// One museum object as written by the scraper
///
/// Keys missing from the source line (or set to `null`) deserialize to `None`.
/// Unknown keys are ignored, so records from both scraper variants parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub date: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Chunks read from an ingestion file plus the number of lines that failed to parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedCorpus {
    pub chunks: Vec<String>,
    pub skipped: usize,
}

impl ArtworkRecord {
    /// Parse a single ingestion line, which must hold a JSON object
    #[inline]
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(line)?;
        serde_json::from_value(serde_json::Value::Object(object))
    }

    /// Render this record as its chunk text
    #[inline]
    pub fn to_chunk(&self) -> String {
        normalize(self)
    }
}

/// Render an artwork record as labelled lines in fixed field order
///
/// Absent fields are substituted rather than dropped, so every chunk has the
/// same seven-line layout.
#[inline]
pub fn normalize(record: &ArtworkRecord) -> String {
    let lines = [
        format!("Title: {}", record.title.as_deref().unwrap_or(UNKNOWN_TITLE)),
        format!("Artist: {}", record.artist.as_deref().unwrap_or(UNKNOWN_ARTIST)),
        format!("Date: {}", record.date.as_deref().unwrap_or(UNKNOWN_DATE)),
        format!("Medium: {}", record.medium.as_deref().unwrap_or(UNKNOWN_MEDIUM)),
        format!("Dimensions: {}", record.dimensions.as_deref().unwrap_or_default()),
        format!("Description: {}", record.description.as_deref().unwrap_or_default()),
        format!("Source: {}", record.url.as_deref().unwrap_or_default()),
    ];

    lines.join("\n").trim().to_string()
}

/// Normalize every parseable line of `reader`, counting the lines that fail
///
/// Blank lines are ignored and not counted.
#[inline]
pub fn read_artwork_chunks<R: BufRead>(reader: R) -> Result<LoadedCorpus> {
    let mut corpus = LoadedCorpus::default();

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let mut bytes = bytes?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let parsed = match String::from_utf8(bytes) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => ArtworkRecord::from_json_line(&line).map_err(|e| e.to_string()),
            Err(e) => Err(format!("invalid UTF-8: {}", e.utf8_error())),
        };

        match parsed {
            Ok(record) => corpus.chunks.push(normalize(&record)),
            Err(reason) => {
                let error = DocentError::MalformedRecord {
                    line: index + 1,
                    reason,
                };
                debug!("Skipping line: {}", error);
                corpus.skipped += 1;
            }
        }
    }

    Ok(corpus)
}

/// Load and normalize the artwork ingestion file at `path`
///
/// Fails with [`DocentError::CorpusNotFound`] when the file does not exist.
/// Malformed lines are skipped and reported through [`LoadedCorpus::skipped`].
#[inline]
pub fn load_artwork_chunks<P: AsRef<Path>>(path: P) -> Result<LoadedCorpus> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DocentError::CorpusNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let corpus = read_artwork_chunks(BufReader::new(file))?;

    if corpus.skipped > 0 {
        warn!(
            "Skipped {} malformed line(s) in {}",
            corpus.skipped,
            path.display()
        );
    }
    info!(
        "Loaded {} artwork chunks from {}",
        corpus.chunks.len(),
        path.display()
    );

    Ok(corpus)
}

//! Context bundling: every file in the context folder, previewed and
//! concatenated in file-name order.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::{Capabilities, SourceDocument, display_name};

/// One previewed file inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChunk {
    /// File name used in the delimiter header.
    pub file_name: String,
    /// The dispatcher's preview of the file.
    pub body: String,
}

impl ContextChunk {
    /// Header plus body, as it appears in the bundle.
    pub fn render(&self) -> String {
        format!("\n\n===== FILE: {} =====\n{}", self.file_name, self.body)
    }
}

/// Preview every regular file directly inside `dir`, sorted by file name.
///
/// Subdirectories are skipped and never descended into. A missing directory,
/// or a path that is not a directory, yields no chunks.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn collect_chunks(dir: &Path, caps: &Capabilities) -> Vec<ContextChunk> {
    if !dir.is_dir() {
        info!("no context directory");
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "context directory unreadable");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| !path.is_dir())
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let chunks: Vec<ContextChunk> = paths
        .into_iter()
        .map(|path| {
            let doc = SourceDocument::new(path);
            ContextChunk {
                file_name: display_name(doc.path()),
                body: doc.extract(caps),
            }
        })
        .collect();

    info!(files = chunks.len(), "context files previewed");
    chunks
}

/// Join rendered chunks and trim surrounding whitespace.
pub fn render_bundle(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(ContextChunk::render)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Build the context bundle for `dir`; empty when there is nothing to bundle.
pub fn build_context_bundle(dir: &Path, caps: &Capabilities) -> String {
    render_bundle(&collect_chunks(dir, caps))
}

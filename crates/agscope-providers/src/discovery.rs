use agscope_types::CandidateFile;
use chrono::{DateTime, Utc};
use std::path::Path;
use walkdir::WalkDir;

use crate::traits::LogDecoder;
use crate::{Error, Result};

/// Enumerate files under `root` that the decoder recognizes.
///
/// Unreadable entries below the root are skipped with a warning; only an
/// inaccessible root is an error. Output is sorted by path so repeated
/// scans of an unchanged tree are identical.
pub fn list_candidate_files(root: &Path, decoder: &dyn LogDecoder) -> Result<Vec<CandidateFile>> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(Error::RootNotAccessible(root.to_path_buf())),
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = ?root, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !decoder.probe(entry.path()).is_match() {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => files.push(CandidateFile {
                path: entry.path().to_path_buf(),
                size_bytes: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            }),
            Err(e) => {
                tracing::warn!(path = ?entry.path(), error = %e, "skipping file without metadata");
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(
        source = %decoder.source(),
        root = ?root,
        files = files.len(),
        "discovered candidate files"
    );
    Ok(files)
}

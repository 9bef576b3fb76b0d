use agscope_types::Source;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of indexing one source root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub source: Source,
    pub root: PathBuf,
    /// Files the decoder recognized under the root
    pub discovered: usize,
    /// Sessions added to the store
    pub indexed: usize,
    /// Files that could not be opened or read
    pub unreadable: usize,
    /// Files read but holding nothing decodable
    pub not_indexable: usize,
    /// Malformed records skipped inside indexed files
    pub corrupt_records: usize,
    /// Set when the root itself could not be enumerated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_error: Option<String>,
}

impl IndexReport {
    pub fn new(source: Source, root: &Path) -> Self {
        Self {
            source,
            root: root.to_path_buf(),
            discovered: 0,
            indexed: 0,
            unreadable: 0,
            not_indexable: 0,
            corrupt_records: 0,
            root_error: None,
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.root_error.is_none()
    }

    /// Files skipped for any reason
    pub fn skipped(&self) -> usize {
        self.unreadable + self.not_indexable
    }
}

/// Index reports across every enabled source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusReport {
    pub sources: Vec<IndexReport>,
}

impl CorpusReport {
    pub fn indexed(&self) -> usize {
        self.sources.iter().map(|r| r.indexed).sum()
    }

    pub fn unreadable(&self) -> usize {
        self.sources.iter().map(|r| r.unreadable).sum()
    }

    pub fn not_indexable(&self) -> usize {
        self.sources.iter().map(|r| r.not_indexable).sum()
    }

    pub fn corrupt_records(&self) -> usize {
        self.sources.iter().map(|r| r.corrupt_records).sum()
    }

    pub fn inaccessible(&self) -> impl Iterator<Item = &IndexReport> {
        self.sources.iter().filter(|r| !r.is_accessible())
    }

    pub fn for_source(&self, source: Source) -> Option<&IndexReport> {
        self.sources.iter().find(|r| r.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_totals() {
        let mut codex = IndexReport::new(Source::Codex, Path::new("/c"));
        codex.indexed = 2;
        codex.not_indexable = 1;
        codex.corrupt_records = 3;
        let mut gemini = IndexReport::new(Source::Gemini, Path::new("/g"));
        gemini.root_error = Some("missing".to_string());

        let corpus = CorpusReport {
            sources: vec![codex, gemini],
        };
        assert_eq!(corpus.indexed(), 2);
        assert_eq!(corpus.not_indexable(), 1);
        assert_eq!(corpus.corrupt_records(), 3);
        assert_eq!(corpus.inaccessible().count(), 1);
        assert_eq!(corpus.for_source(Source::Codex).map(|r| r.skipped()), Some(1));
    }
}

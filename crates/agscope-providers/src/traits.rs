use agscope_core::ProjectResolver;
use agscope_types::{Session, SessionEvent, Source};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::Result;
use crate::builder::EventBuilder;
use crate::normalization::MetadataScan;

/// Source decoding capability
///
/// Responsibilities:
/// - Recognize files written by one agent tool
/// - Produce a lightweight session (metadata only) cheaply
/// - Produce a fully parsed session (every record as an event)
///
/// Decoders are stateless; per-call state lives in [`DecodeContext`].
pub trait LogDecoder: Send + Sync {
    fn source(&self) -> Source;

    /// Check if a file belongs to this source
    fn probe(&self, path: &Path) -> ProbeResult;

    /// Read metadata without materializing events.
    ///
    /// Cost is bounded by the header records and a fixed-size tail read, not
    /// by the file size.
    fn parse_lightweight(&self, path: &Path, ctx: &DecodeContext) -> Result<Session>;

    /// Decode every record. The returned session has a non-empty event list.
    fn parse_full(&self, path: &Path, ctx: &DecodeContext) -> Result<Session>;
}

// --- Helper types ---

/// Probe result with confidence score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeResult {
    /// Decoder can handle this file with given confidence (0.0 - 1.0)
    Confidence(f32),
    /// Decoder cannot handle this file
    NoMatch,
}

impl ProbeResult {
    /// Create high confidence match (1.0)
    pub fn match_high() -> Self {
        ProbeResult::Confidence(1.0)
    }

    /// Create medium confidence match (0.5)
    pub fn match_medium() -> Self {
        ProbeResult::Confidence(0.5)
    }

    /// Check if this is a match (confidence > 0)
    pub fn is_match(&self) -> bool {
        matches!(self, ProbeResult::Confidence(c) if *c > 0.0)
    }

    /// Get confidence score (0.0 if NoMatch)
    pub fn confidence(&self) -> f32 {
        match self {
            ProbeResult::Confidence(c) => *c,
            ProbeResult::NoMatch => 0.0,
        }
    }
}

/// Size limits applied while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Records above this size are replaced by a stub event
    pub max_record_bytes: u64,
    /// Leading records inspected by a lightweight parse
    pub header_records: usize,
    /// Trailing bytes read by a lightweight parse to find the end time
    pub tail_bytes: u64,
    /// Files up to this size are scanned completely by a lightweight parse
    /// (exact record count); larger ones are estimated or stat-only
    pub full_scan_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_record_bytes: 8 * 1024 * 1024,
            header_records: 20,
            tail_bytes: 64 * 1024,
            full_scan_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Per-source record interpretation used by the shared pipelines
///
/// `scan_record` feeds metadata and runs for lightweight and full parses
/// alike; `map_record` only runs for full parses.
pub(crate) trait RecordMapper: Send + Sync {
    /// Project hash or encoded project name implied by the file location
    fn project_key(&self, _path: &Path) -> Option<String> {
        None
    }

    /// Top-level fields of a document source (ignored for line sources)
    fn scan_document(&self, _document: &Value, _scan: &mut MetadataScan) {}

    fn scan_record(&self, record: &Value, scan: &mut MetadataScan);

    fn map_record(
        &self,
        row: usize,
        record: &Value,
        raw: &str,
        builder: &mut EventBuilder,
        events: &mut Vec<SessionEvent>,
    );
}

/// Shared inputs for one decode call
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    pub resolver: Arc<ProjectResolver>,
    pub limits: DecodeLimits,
}

impl DecodeContext {
    pub fn new(resolver: Arc<ProjectResolver>, limits: DecodeLimits) -> Self {
        Self { resolver, limits }
    }

    pub fn with_resolver(resolver: Arc<ProjectResolver>) -> Self {
        Self {
            resolver,
            limits: DecodeLimits::default(),
        }
    }
}

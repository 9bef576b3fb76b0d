// Error types
pub mod error;

// Decoder capability (public API)
pub mod traits;

// Source implementations
pub mod claude;
pub mod codex;
pub mod gemini;

// Event builder
pub mod builder;

// Shared decoding policy (timestamps, kinds, content, cwd, titles)
pub mod normalization;

// Bounded record reading
pub mod reader;

// Shared pipelines for line-delimited and document sources
mod pipeline;

// Candidate file enumeration
pub mod discovery;

// Source registry
pub mod registry;

// Decoders
pub use claude::ClaudeDecoder;
pub use codex::CodexDecoder;
pub use gemini::GeminiDecoder;

// Traits
pub use traits::{DecodeContext, DecodeLimits, LogDecoder, ProbeResult};

// Discovery
pub use discovery::list_candidate_files;

// Registry
pub use registry::{
    SourceMetadata, all_decoders, decoder_for, default_root, detect_source_from_path, get_all_sources,
    get_source_metadata,
};

// Error types
pub use error::{Error, Result};

use agscope_core::expand_tilde;
use agscope_types::Source;
use std::path::{Path, PathBuf};

use crate::claude::ClaudeDecoder;
use crate::codex::CodexDecoder;
use crate::gemini::GeminiDecoder;
use crate::traits::LogDecoder;

#[derive(Debug, Clone)]
pub struct SourceMetadata {
    pub source: Source,
    pub description: &'static str,
    pub default_log_path: &'static str,
}

const SOURCES: &[SourceMetadata] = &[
    SourceMetadata {
        source: Source::Codex,
        description: "Codex CLI",
        default_log_path: "~/.codex/sessions",
    },
    SourceMetadata {
        source: Source::Claude,
        description: "Claude Code",
        default_log_path: "~/.claude/projects",
    },
    SourceMetadata {
        source: Source::Gemini,
        description: "Gemini CLI",
        default_log_path: "~/.gemini/tmp",
    },
];

pub fn get_all_sources() -> &'static [SourceMetadata] {
    SOURCES
}

pub fn get_source_metadata(source: Source) -> Option<&'static SourceMetadata> {
    SOURCES.iter().find(|m| m.source == source)
}

/// Decoder for a source tag
pub fn decoder_for(source: Source) -> Box<dyn LogDecoder> {
    match source {
        Source::Codex => Box::new(CodexDecoder),
        Source::Claude => Box::new(ClaudeDecoder),
        Source::Gemini => Box::new(GeminiDecoder),
    }
}

pub fn all_decoders() -> Vec<Box<dyn LogDecoder>> {
    Source::ALL.iter().map(|s| decoder_for(*s)).collect()
}

/// Default log root for a source; `CODEX_HOME` relocates Codex sessions
pub fn default_root(source: Source) -> Option<PathBuf> {
    if source == Source::Codex
        && let Ok(home) = std::env::var("CODEX_HOME")
        && !home.trim().is_empty()
    {
        return Some(expand_tilde(&home).join("sessions"));
    }

    let meta = get_source_metadata(source)?;
    let expanded = expand_tilde(meta.default_log_path);
    expanded.is_absolute().then_some(expanded)
}

/// Pick the decoder with the highest probe confidence for a file
pub fn detect_source_from_path(path: &Path) -> Option<Source> {
    all_decoders()
        .into_iter()
        .map(|d| (d.source(), d.probe(path)))
        .filter(|(_, probe)| probe.is_match())
        .max_by(|a, b| a.1.confidence().total_cmp(&b.1.confidence()))
        .map(|(source, _)| source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_source_has_metadata_and_decoder() {
        for source in Source::ALL {
            assert!(get_source_metadata(source).is_some());
            assert_eq!(decoder_for(source).source(), source);
        }
        assert_eq!(all_decoders().len(), 3);
    }

    #[test]
    fn test_detect_source_from_path() {
        assert_eq!(
            detect_source_from_path(Path::new("/h/.codex/sessions/2025/01/01/rollout-x.jsonl")),
            Some(Source::Codex)
        );
        assert_eq!(
            detect_source_from_path(Path::new("/h/.claude/projects/-a/s.jsonl")),
            Some(Source::Claude)
        );
        let gemini = format!("/h/.gemini/tmp/{}/chats/session-1.json", "f".repeat(64));
        assert_eq!(detect_source_from_path(Path::new(&gemini)), Some(Source::Gemini));
        assert_eq!(detect_source_from_path(Path::new("/tmp/readme.md")), None);
    }
}

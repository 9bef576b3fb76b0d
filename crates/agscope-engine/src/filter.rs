//! Match evaluation.
//!
//! Content matching follows a fixed priority, first applicable rule wins:
//! 1. a rendered transcript (cached, or built on demand) is searched;
//! 2. a lightweight session with no transcript is [`MatchOutcome::NotSearchable`];
//! 3. otherwise the coalesced event blocks are scanned, so text split
//!    across streaming deltas matches the same way it does in a transcript.
//!
//! Non-text filters are checked first and ANDed with the text match. The
//! kind filter selects sessions containing an event of that kind; it never
//! narrows which text is searched.

use agscope_types::{Filters, Session, SessionId};
use std::sync::Arc;

use crate::transcript::{RenderOptions, coalesce, render};

/// Rendered transcript storage consulted by [`evaluate`]
pub trait TranscriptLookup: Send + Sync {
    fn get(&self, id: &SessionId, options: &RenderOptions) -> Option<Arc<str>>;
    fn put(&self, id: &SessionId, options: &RenderOptions, text: Arc<str>);
}

/// Whether a cache miss may render a fresh transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptPolicy {
    /// Use the cache if it has an entry; never render
    CachedOnly,
    /// Render parsed sessions on a miss and store the result
    BuildOnMiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NoMatch,
    /// Lightweight session with no transcript; content cannot be judged yet
    NotSearchable,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched)
    }
}

impl From<bool> for MatchOutcome {
    fn from(matched: bool) -> Self {
        if matched {
            MatchOutcome::Matched
        } else {
            MatchOutcome::NoMatch
        }
    }
}

fn transcript_for(
    session: &Session,
    cache: Option<&dyn TranscriptLookup>,
    policy: TranscriptPolicy,
) -> Option<Arc<str>> {
    let options = RenderOptions::search();
    if let Some(text) = cache.and_then(|c| c.get(&session.id, &options)) {
        return Some(text);
    }
    if policy == TranscriptPolicy::BuildOnMiss && session.is_fully_parsed() {
        let text: Arc<str> = Arc::from(render(session, &options));
        if let Some(cache) = cache {
            cache.put(&session.id, &options, Arc::clone(&text));
        }
        return Some(text);
    }
    None
}

pub fn evaluate(
    session: &Session,
    filters: &Filters,
    cache: Option<&dyn TranscriptLookup>,
    policy: TranscriptPolicy,
) -> MatchOutcome {
    if !filters.matches_metadata(session) {
        return MatchOutcome::NoMatch;
    }
    if !filters.has_query() {
        return MatchOutcome::Matched;
    }

    let needle = filters.query.trim().to_lowercase();

    if let Some(transcript) = transcript_for(session, cache, policy) {
        return transcript.to_lowercase().contains(&needle).into();
    }

    if session.is_lightweight() {
        return MatchOutcome::NotSearchable;
    }

    coalesce(&session.events)
        .iter()
        .filter(|block| !block.kind.is_meta())
        .flat_map(|block| [Some(block.text.as_str()), block.tool_input, block.tool_output])
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
        .into()
}

/// Boolean form of [`evaluate`]; not-searchable counts as no match
pub fn matches(
    session: &Session,
    filters: &Filters,
    cache: Option<&dyn TranscriptLookup>,
) -> bool {
    evaluate(session, filters, cache, TranscriptPolicy::CachedOnly).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agscope_types::{EventKind, SessionEvent, Source};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<(SessionId, RenderOptions), Arc<str>>>,
    }

    impl TranscriptLookup for MapCache {
        fn get(&self, id: &SessionId, options: &RenderOptions) -> Option<Arc<str>> {
            let entries = self.entries.lock().unwrap();
            entries.get(&(id.clone(), *options)).cloned()
        }

        fn put(&self, id: &SessionId, options: &RenderOptions, text: Arc<str>) {
            let mut entries = self.entries.lock().unwrap();
            entries.insert((id.clone(), *options), text);
        }
    }

    fn parsed_session() -> Session {
        let mut session = Session::for_file(Source::Codex, Path::new("/tmp/r.jsonl"), 10);
        let mut user = SessionEvent::new("1", EventKind::User, "{}");
        user.text = Some("Fix the parser".to_string());
        let mut result = SessionEvent::new("2", EventKind::ToolResult, "{}");
        result.tool_output = Some("needle in tool output".to_string());
        session.replace_events(vec![user, result]);
        session
    }

    #[test]
    fn test_cached_transcript_takes_precedence_over_raw_fields() {
        let session = parsed_session();
        let cache = MapCache::default();
        cache.put(&session.id, &RenderOptions::search(), Arc::from("User: Fix the parser\n"));

        let filters = Filters::new().query("needle");
        assert!(!matches(&session, &filters, Some(&cache)));
        assert_eq!(
            evaluate(&session, &filters, Some(&cache), TranscriptPolicy::BuildOnMiss),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_raw_scan_without_transcript() {
        let session = parsed_session();
        assert!(matches(&session, &Filters::new().query("NEEDLE"), None));
        assert!(!matches(&session, &Filters::new().query("absent"), None));
    }

    #[test]
    fn test_raw_scan_joins_delta_chunks() {
        let mut session = Session::for_file(Source::Codex, Path::new("/tmp/d.jsonl"), 10);
        let chunks = ["zeb", "ra crossing"].iter().enumerate().map(|(i, text)| {
            let mut event = SessionEvent::new(i.to_string(), EventKind::Assistant, "{}");
            event.text = Some(text.to_string());
            event.message_id = Some("m1".to_string());
            event.is_delta = true;
            event
        });
        session.replace_events(chunks.collect());

        let filters = Filters::new().query("zebra");
        assert!(matches(&session, &filters, None));
        assert_eq!(
            evaluate(&session, &filters, None, TranscriptPolicy::BuildOnMiss),
            MatchOutcome::Matched
        );
    }

    #[test]
    fn test_kind_filter_selects_sessions_on_both_paths() {
        // needle sits in the tool output, the kind asks for a user event
        let session = parsed_session();
        let filters = Filters::new().query("needle").kind(EventKind::User);
        assert!(matches(&session, &filters, None));

        let cache = MapCache::default();
        assert_eq!(
            evaluate(&session, &filters, Some(&cache), TranscriptPolicy::BuildOnMiss),
            MatchOutcome::Matched
        );
        assert!(matches(&session, &filters, Some(&cache)));

        let absent = Filters::new().query("needle").kind(EventKind::ToolCall);
        assert!(!matches(&session, &absent, None));
        assert!(!matches(&session, &absent, Some(&cache)));
    }

    #[test]
    fn test_lightweight_session_is_not_searchable() {
        let session = Session::for_file(Source::Gemini, Path::new("/tmp/s.json"), 10);
        let filters = Filters::new().query("anything");
        assert_eq!(
            evaluate(&session, &filters, None, TranscriptPolicy::BuildOnMiss),
            MatchOutcome::NotSearchable
        );
        assert!(!matches(&session, &filters, None));
        assert!(matches(&session, &Filters::new(), None));
    }

    #[test]
    fn test_lightweight_session_matches_cached_transcript() {
        let session = Session::for_file(Source::Gemini, Path::new("/tmp/s.json"), 10);
        let cache = MapCache::default();
        cache.put(&session.id, &RenderOptions::search(), Arc::from("User: hello world\n"));
        assert!(matches(&session, &Filters::new().query("world"), Some(&cache)));
    }

    #[test]
    fn test_build_on_miss_stores_transcript() {
        let session = parsed_session();
        let cache = MapCache::default();
        let outcome = evaluate(
            &session,
            &Filters::new().query("parser"),
            Some(&cache),
            TranscriptPolicy::BuildOnMiss,
        );
        assert!(outcome.is_match());
        assert!(cache.get(&session.id, &RenderOptions::search()).is_some());
    }

    #[test]
    fn test_metadata_filters_are_anded() {
        let session = parsed_session();
        let filters = Filters::new().query("parser").source(Source::Claude);
        assert!(!matches(&session, &filters, None));
    }
}

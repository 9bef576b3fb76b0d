use agscope_providers::{
    DecodeContext, DecodeLimits, Error, LogDecoder, all_decoders, decoder_for,
    list_candidate_files,
};
use agscope_types::{EventKind, Source};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Files every decoder must survive: truncated JSON, empty, binary, unicode
fn hostile_corpus(dir: &Path) -> Vec<PathBuf> {
    vec![
        write(dir, "rollout-truncated.jsonl", br#"{"type":"response_item","payload":{"type":"mess"#),
        write(dir, "rollout-empty.jsonl", b""),
        write(dir, "rollout-binary.jsonl", &[0xff, 0xfe, 0x00, 0x9c, 0x12, b'\n', 0x80, 0x81]),
        write(
            dir,
            "rollout-unicode.jsonl",
            "{\"type\":\"response_item\",\"payload\":{\"type\":\"message\",\"role\":\"user\",\"content\":\"日本語のテキスト 🚀\"}}\n"
                .as_bytes(),
        ),
        write(dir, "session-truncated.json", br#"{"messages": [{"type": "user", "cont"#),
        write(dir, "session-scalar.json", b"42"),
    ]
}

#[test]
fn test_decoders_never_panic_on_hostile_input() {
    let dir = TempDir::new().unwrap();
    let ctx = DecodeContext::default();

    for path in hostile_corpus(dir.path()) {
        for decoder in all_decoders() {
            let light = decoder.parse_lightweight(&path, &ctx);
            let full = decoder.parse_full(&path, &ctx);
            if let Ok(session) = &full {
                assert!(session.is_fully_parsed(), "{:?} {:?}", decoder.source(), path);
            }
            if let Ok(session) = &light {
                assert!(session.is_lightweight());
            }
        }
    }
}

#[test]
fn test_unicode_record_decodes() {
    let dir = TempDir::new().unwrap();
    let corpus = hostile_corpus(dir.path());
    let session = decoder_for(Source::Codex)
        .parse_full(&corpus[3], &DecodeContext::default())
        .unwrap();
    assert_eq!(session.events.len(), 1);
    assert_eq!(session.title(), "日本語のテキスト 🚀");
}

#[test]
fn test_empty_and_garbage_files_are_not_indexable() {
    let dir = TempDir::new().unwrap();
    let corpus = hostile_corpus(dir.path());
    let codex = decoder_for(Source::Codex);
    let ctx = DecodeContext::default();

    for path in [&corpus[0], &corpus[1], &corpus[2]] {
        let err = codex.parse_lightweight(path, &ctx).unwrap_err();
        assert!(err.is_corrupt(), "{:?}: {}", path, err);
    }
}

#[test]
fn test_missing_file_is_unreadable() {
    let err = decoder_for(Source::Codex)
        .parse_full(Path::new("/no/such/rollout-x.jsonl"), &DecodeContext::default())
        .unwrap_err();
    assert!(matches!(err, Error::Unreadable { .. }));
}

#[test]
fn test_oversized_record_becomes_stub_event() {
    let dir = TempDir::new().unwrap();
    let big_text = "x".repeat(4096);
    let body = format!(
        "{}\n{}\n{}\n",
        r#"{"type":"response_item","payload":{"type":"message","role":"user","content":"before"}}"#,
        format!(
            r#"{{"type":"response_item","payload":{{"type":"message","role":"assistant","content":"{}"}}}}"#,
            big_text
        ),
        r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":"after"}}"#,
    );
    let path = write(dir.path(), "rollout-big.jsonl", body.as_bytes());

    let ctx = DecodeContext {
        limits: DecodeLimits {
            max_record_bytes: 1024,
            ..DecodeLimits::default()
        },
        ..DecodeContext::default()
    };
    let session = decoder_for(Source::Codex).parse_full(&path, &ctx).unwrap();

    let kinds: Vec<EventKind> = session.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::User, EventKind::Error, EventKind::Assistant]
    );
    let stub = &session.events[1];
    assert!(stub.text.as_deref().unwrap().contains("1024 byte limit"));
    assert!(!stub.raw_json.contains(&big_text));
    assert_eq!(session.events[2].text.as_deref(), Some("after"));
}

#[test]
fn test_list_candidate_files_filters_by_probe() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "2025/01/15/rollout-a.jsonl", b"{}\n");
    write(dir.path(), "2025/01/16/rollout-b.jsonl", b"{}\n{}\n");
    write(dir.path(), "2025/01/16/notes.txt", b"hello");

    let codex = decoder_for(Source::Codex);
    let files = list_candidate_files(dir.path(), codex.as_ref()).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["rollout-a.jsonl", "rollout-b.jsonl"]);
    assert_eq!(files[1].size_bytes, 6);
    assert!(files[0].modified_at.is_some());
}

#[test]
fn test_list_candidate_files_missing_root() {
    let codex = decoder_for(Source::Codex);
    let err = list_candidate_files(Path::new("/no/such/agscope/root"), codex.as_ref()).unwrap_err();
    assert!(matches!(err, Error::RootNotAccessible(_)));
}

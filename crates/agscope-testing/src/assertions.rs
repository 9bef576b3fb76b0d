//! Assertions over the CLI's JSON output.
//!
//! `list` and `search` print `{"sessions": [...]}`; each session carries at
//! least `id`, `source`, `title` and `fully_parsed`.

use anyhow::{Context, Result};
use serde_json::Value;

fn sessions(json: &Value) -> Result<&Vec<Value>> {
    json["sessions"]
        .as_array()
        .context("Expected 'sessions' array in JSON")
}

/// Assert that JSON output contains expected number of sessions.
pub fn assert_session_count(json: &Value, expected: usize) -> Result<()> {
    let sessions = sessions(json)?;
    if sessions.len() != expected {
        anyhow::bail!("Expected {} sessions, got {}", expected, sessions.len());
    }
    Ok(())
}

/// Assert that every session came from `source`.
pub fn assert_all_from_source(json: &Value, source: &str) -> Result<()> {
    for (i, session) in sessions(json)?.iter().enumerate() {
        let actual = session["source"]
            .as_str()
            .with_context(|| format!("Session {} missing source", i))?;
        if actual != source {
            anyhow::bail!("Session {} is from {} but expected {}", i, actual, source);
        }
    }
    Ok(())
}

/// Titles in output order
pub fn session_titles(json: &Value) -> Result<Vec<String>> {
    sessions(json)?
        .iter()
        .enumerate()
        .map(|(i, session)| {
            session["title"]
                .as_str()
                .map(str::to_string)
                .with_context(|| format!("Session {} missing title", i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_assertions() {
        let output = json!({"sessions": [
            {"id": "a", "source": "codex", "title": "First"},
            {"id": "b", "source": "codex", "title": "Second"},
        ]});
        assert!(assert_session_count(&output, 2).is_ok());
        assert!(assert_session_count(&output, 1).is_err());
        assert!(assert_all_from_source(&output, "codex").is_ok());
        assert!(assert_all_from_source(&output, "gemini").is_err());
        assert_eq!(session_titles(&output).unwrap(), vec!["First", "Second"]);
    }
}

use agscope_types::collapse_whitespace;

pub const TITLE_MAX_CHARS: usize = 200;

/// Scaffolding that is never a useful title (matched case-insensitively)
const SKIP_PATTERNS: &[&str] = &[
    "you are an expert",
    "you are a helpful",
    "act as a",
    "<command-name>",
    "caveat:",
    "<local-command",
    "<environment_context>",
    "<user_instructions>",
];

/// Title from a user message: whitespace collapsed, scaffolding rejected,
/// cut to [`TITLE_MAX_CHARS`] characters
pub fn derive_title(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return None;
    }

    let lower = collapsed.to_lowercase();
    if SKIP_PATTERNS.iter().any(|p| lower.contains(p)) {
        return None;
    }
    if collapsed.starts_with("[binary ") && collapsed.ends_with(" omitted]") {
        return None;
    }

    Some(collapsed.chars().take(TITLE_MAX_CHARS).collect())
}

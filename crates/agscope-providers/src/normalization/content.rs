use serde_json::Value;

/// Part types carrying binary payloads
const BINARY_PART_TYPES: &[&str] = &[
    "image",
    "input_image",
    "image_url",
    "document",
    "audio",
    "input_audio",
    "file",
];

/// Part types handled as structured events, never as text
const STRUCTURED_PART_TYPES: &[&str] = &[
    "tool_use",
    "tool_result",
    "function_call",
    "function_call_output",
    "thinking",
    "redacted_thinking",
];

/// Collect the human-readable text of a content value.
///
/// Accepts a plain string, an array of parts (strings or `{text}` objects),
/// or an object nesting text under `text`, `content`, `parts`, `message`
/// or `payload`.
/// Binary parts become a short placeholder; their payload is never copied.
pub fn extract_text(value: &Value) -> Option<String> {
    let mut pieces = Vec::new();
    collect(value, &mut pieces, 0);
    let joined = pieces.join("\n");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn collect(value: &Value, out: &mut Vec<String>, depth: usize) {
    if depth > 8 {
        return;
    }
    match value {
        Value::String(s) => {
            if !s.is_empty() {
                out.push(s.clone());
            }
        }
        Value::Array(parts) => {
            for part in parts {
                collect(part, out, depth + 1);
            }
        }
        Value::Object(obj) => {
            let part_type = obj.get("type").and_then(Value::as_str).unwrap_or("");
            if STRUCTURED_PART_TYPES.contains(&part_type)
                || obj.contains_key("functionCall")
                || obj.contains_key("functionResponse")
            {
                return;
            }
            if let Some(placeholder) = binary_placeholder(value) {
                out.push(placeholder);
                return;
            }
            for key in ["text", "content", "parts", "message", "payload"] {
                if let Some(inner) = obj.get(key) {
                    collect(inner, out, depth + 1);
                    return;
                }
            }
        }
        _ => {}
    }
}

/// `[binary <mime> omitted]` for parts that carry images, audio or files
pub fn binary_placeholder(part: &Value) -> Option<String> {
    let obj = part.as_object()?;
    let part_type = obj.get("type").and_then(Value::as_str).unwrap_or("");
    let inline = obj.get("inlineData").or_else(|| obj.get("inline_data"));

    if !BINARY_PART_TYPES.contains(&part_type) && inline.is_none() {
        return None;
    }

    let mime = inline
        .and_then(|d| d.get("mimeType").or_else(|| d.get("mime_type")))
        .or_else(|| obj.get("source").and_then(|s| s.get("media_type")))
        .or_else(|| obj.get("mimeType"))
        .or_else(|| obj.get("mime_type"))
        .or_else(|| obj.get("media_type"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match part_type {
            "" => "application/octet-stream".to_string(),
            other => other.trim_start_matches("input_").to_string(),
        });

    Some(format!("[binary {} omitted]", mime))
}

/// Render a tool argument or output value as display text.
///
/// Strings pass through; anything else is compact JSON.
pub fn value_to_display(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_and_parts() {
        assert_eq!(extract_text(&json!("hello")), Some("hello".to_string()));
        assert_eq!(
            extract_text(&json!([{"type": "input_text", "text": "a"}, "b"])),
            Some("a\nb".to_string())
        );
        assert_eq!(extract_text(&json!([])), None);
        assert_eq!(extract_text(&json!(42)), None);
    }

    #[test]
    fn test_nested_keys() {
        let record = json!({"message": {"content": [{"type": "text", "text": "nested"}]}});
        assert_eq!(extract_text(&record), Some("nested".to_string()));
        let gemini = json!({"parts": [{"text": "from parts"}]});
        assert_eq!(extract_text(&gemini), Some("from parts".to_string()));
    }

    #[test]
    fn test_structured_parts_are_skipped() {
        let content = json!([
            {"type": "text", "text": "running"},
            {"type": "tool_use", "id": "t1", "name": "Bash", "input": {"command": "ls"}}
        ]);
        assert_eq!(extract_text(&content), Some("running".to_string()));
    }

    #[test]
    fn test_binary_parts_become_placeholders() {
        let content = json!([
            {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}},
            {"inlineData": {"mimeType": "application/pdf", "data": "AAAA"}},
            {"type": "input_image", "image_url": "data:..."}
        ]);
        assert_eq!(
            extract_text(&content),
            Some(
                "[binary image/png omitted]\n[binary application/pdf omitted]\n[binary image omitted]"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_value_to_display() {
        assert_eq!(value_to_display(&json!("ls -la")), Some("ls -la".to_string()));
        assert_eq!(
            value_to_display(&json!({"path": "a.rs"})),
            Some(r#"{"path":"a.rs"}"#.to_string())
        );
        assert_eq!(value_to_display(&Value::Null), None);
    }
}

//! JSON extraction utilities for parsing LLM responses.
//!
//! Even in JSON mode some backends wrap the document in a markdown code
//! block or add a sentence before it. Extraction tries, in order:
//! 1. Direct JSON (content starts with '{' or '[')
//! 2. JSON in a fenced code block (```json or plain ```)
//! 3. The first balanced JSON object anywhere in the content
//!
//! # Example
//!
//! ```
//! use politeness_bench::utils::json_extraction::extract_json_from_response;
//!
//! let response = "Here you go:\n```json\n{\"title\": \"A Week\"}\n```";
//! assert_eq!(extract_json_from_response(response), "{\"title\": \"A Week\"}");
//! ```

use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?```").expect("Invalid regex for code blocks")
});

/// Extracts the most likely JSON payload from a response.
///
/// Falls back to the trimmed content when nothing JSON-like is found, so
/// the caller's parse error describes the original text.
pub fn extract_json_from_response(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    if let Some(block) = extract_from_code_block(trimmed) {
        return block;
    }

    if let Some(start) = trimmed.find('{') {
        let candidate = &trimmed[start..];
        if let Some(end) = find_matching_brace(candidate) {
            return candidate[..=end].to_string();
        }
    }

    trimmed.to_string()
}

/// Content of the first fenced code block that looks like JSON.
pub fn extract_from_code_block(content: &str) -> Option<String> {
    CODE_BLOCK_RE.captures_iter(content).find_map(|caps| {
        let body = caps.get(1)?.as_str().trim();
        (body.starts_with('{') || body.starts_with('[')).then(|| body.to_string())
    })
}

/// Byte index of the brace closing the object that starts `s`.
///
/// Braces inside string literals are ignored.
pub fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// First `max_chars` characters of `content`, for log and error previews.
pub fn preview(content: &str, max_chars: usize) -> String {
    content.trim().chars().take(max_chars).collect()
}

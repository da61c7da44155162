//! Tolerant JSON extraction (spec.md §4.6 step 4): the model's raw text
//! may wrap the JSON payload in prose ("Here is the compiled
//! criteria:\n```json\n[...]\n```"). This scans for the largest
//! well-balanced `[...]`/`{...}` span and attempts to parse it,
//! returning `EngineError::LlmOutputMalformed` if nothing parses.

use serde_json::Value;

use crate::error::EngineError;

/// Finds every top-level balanced bracketed span in `text` (tracking
/// string literals and escapes so brackets inside quoted strings don't
/// throw off the balance count), tries each as JSON starting with the
/// largest, and returns the first that parses.
pub fn extract_json(text: &str) -> Result<Value, EngineError> {
    let bytes: Vec<char> = text.chars().collect();
    let mut candidates: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '[' || bytes[i] == '{' {
            if let Some(end) = matching_close(&bytes, i) {
                candidates.push((i, end));
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }

    candidates.sort_by_key(|(start, end)| std::cmp::Reverse(end - start));

    for (start, end) in candidates {
        let span: String = bytes[start..=end].iter().collect();
        if let Ok(value) = serde_json::from_str::<Value>(&span) {
            return Ok(value);
        }
    }

    Err(EngineError::LlmOutputMalformed(
        "no well-balanced JSON array or object found in model output".to_string(),
    ))
}

/// Scans forward from an opening bracket at `open_idx`, tracking
/// nesting depth and string/escape state, and returns the index of the
/// matching close bracket if the span is balanced.
fn matching_close(chars: &[char], open_idx: usize) -> Option<usize> {
    let open = chars[open_idx];
    let close = match open {
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &c) in chars.iter().enumerate().skip(open_idx) {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

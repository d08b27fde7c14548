//! Command parser: at most one `{name, parameters}` call out of free text.
//!
//! "No call" is a normal outcome, never an error.

use std::collections::BTreeMap;

use neuro_types::ToolCall;
use serde_json::Value;

/// Result of scanning one engine response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutcome {
    /// First well-formed call, if any.
    pub call: Option<ToolCall>,
    /// Text around the structured blocks, code fences stripped.
    pub prose: String,
    /// Later well-formed calls that were discarded.
    pub extra_blocks: usize,
}

impl ParseOutcome {
    /// The response was exactly one call and nothing else.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.call.is_some() && self.extra_blocks == 0 && self.prose.is_empty()
    }
}

/// Scan `text` for balanced `{...}` blocks and decode the first one shaped like a call.
#[must_use]
pub fn parse_tool_call(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut prose = String::new();
    let mut cursor = 0;
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let Some(end) = balanced_end(text, start) else {
            // Unclosed brace: a stray `{` in prose or a truncated fragment.
            search_from = start + 1;
            continue;
        };
        match decode_call(&text[start..end]) {
            Some(call) => {
                prose.push_str(&text[cursor..start]);
                if outcome.call.is_none() {
                    outcome.call = Some(call);
                } else {
                    outcome.extra_blocks += 1;
                }
                cursor = end;
                search_from = end;
            }
            // Resume inside the block: a valid call may be nested in other JSON.
            None => search_from = start + 1,
        }
    }
    prose.push_str(&text[cursor..]);
    outcome.prose = strip_fences(&prose);
    outcome
}

/// Byte index one past the `}` closing the `{` at `start`; string-literal aware.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn decode_call(block: &str) -> Option<ToolCall> {
    let Value::Object(mut object) = serde_json::from_str::<Value>(block).ok()? else {
        return None;
    };
    let name = object.remove("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let parameters = match object.remove("parameters") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(_) => return None,
    };
    Some(ToolCall {
        tool_name: name,
        parameters,
    })
}

fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_inside_strings_do_not_close_the_block() {
        let text = r#"{"name": "load_data", "parameters": {"path": "/tmp/{x}.edf"}}"#;
        let outcome = parse_tool_call(text);
        let call = outcome.call.clone().expect("call");
        assert_eq!(call.param_str("path"), Some("/tmp/{x}.edf"));
        assert!(outcome.is_clean());
    }

    #[test]
    fn unbalanced_block_is_no_call() {
        let outcome = parse_tool_call(r#"{"name": "load_data", "parameters": {"#);
        assert!(outcome.call.is_none());
    }
}

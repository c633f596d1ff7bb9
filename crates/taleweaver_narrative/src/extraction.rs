//! Recovering structured data from model output.
//!
//! Model responses are frequently wrapped in markdown fences, preceded by
//! chain-of-thought inside `<think>` tags, or cut off mid-object when the
//! output ceiling is reached. [`extract_json`] undoes all three.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use taleweaver_error::{ParseError, TaleweaverResult};

static REASONING_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think(?:ing)?>.*?</think(?:ing)?>").expect("Valid reasoning span regex")
});

static REASONING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</think(?:ing)?>").expect("Valid reasoning close regex"));

static REASONING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<think(?:ing)?>").expect("Valid reasoning open regex"));

/// Remove reasoning spans from model output.
///
/// Paired `<think>...</think>` spans are removed wherever they occur. A
/// closing tag without an opening tag drops everything before it, and an
/// opening tag that is never closed drops everything after it.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::strip_reasoning;
///
/// assert_eq!(strip_reasoning("<think>hmm</think>Answer"), "Answer");
/// assert_eq!(strip_reasoning("plan quietly</think>Answer"), "Answer");
/// assert_eq!(strip_reasoning("Answer<THINK>cut off"), "Answer");
/// ```
pub fn strip_reasoning(text: &str) -> String {
    let paired = REASONING_SPAN.replace_all(text, "");
    let after_close = match REASONING_CLOSE.find_iter(&paired).last() {
        Some(m) => &paired[m.end()..],
        None => &paired[..],
    };
    let before_open = match REASONING_OPEN.find(after_close) {
        Some(m) => &after_close[..m.start()],
        None => after_close,
    };
    before_open.trim().to_string()
}

/// Extract content from a markdown code block that opens the response.
///
/// Skips an optional language tag after the opening fence. When the closing
/// fence is missing (truncated response), everything after the opening fence
/// is returned. Fences appearing later in the text are left alone.
fn extract_from_code_block(response: &str) -> Option<&str> {
    let body = response.strip_prefix("```")?;
    // Skip to next newline (in case there's a language specifier)
    let body = body.find('\n').map_or(body, |n| &body[n + 1..]);

    match body.rfind("```") {
        Some(end) => Some(body[..end].trim()),
        None => Some(body.trim()),
    }
}

/// Where a bracket scan ended.
enum Scan {
    /// The value starting at the opening delimiter closed at this byte offset.
    Closed(usize),
    /// Input ended first.
    Truncated {
        /// Closers still owed, innermost last
        pending: Vec<char>,
        in_string: bool,
        escape_pending: bool,
    },
}

/// Walk a JSON value from its opening delimiter, ignoring delimiters inside
/// string literals.
fn scan(text: &str) -> Scan {
    let mut pending = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => pending.push('}'),
            '[' => pending.push(']'),
            '}' | ']' => {
                if pending.last() == Some(&ch) {
                    pending.pop();
                    if pending.is_empty() {
                        return Scan::Closed(i);
                    }
                }
            }
            _ => {}
        }
    }

    Scan::Truncated {
        pending,
        in_string,
        escape_pending: escape_next,
    }
}

/// Close whatever a truncated value left open.
fn complete_truncated(fragment: &str, pending: &[char], in_string: bool, escape_pending: bool) -> String {
    let mut repaired = fragment.to_string();
    if escape_pending {
        repaired.pop();
    }
    if in_string {
        repaired.push('"');
    }

    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);
    if repaired.ends_with(',') {
        repaired.pop();
    } else if repaired.ends_with(':') {
        repaired.push_str("null");
    }

    repaired.extend(pending.iter().rev());
    repaired
}

/// Best-effort parse of free-text model output into a JSON value.
///
/// Applied in order, stopping at the first strict parse that succeeds:
/// 1. Strip reasoning spans ([`strip_reasoning`]).
/// 2. Strip a surrounding code fence, with or without language tag.
/// 3. Parse the remainder as-is.
/// 4. Take the first object or array; if it never closes, assume truncation.
/// 5. Close an unterminated string literal.
/// 6. Append the missing `}`/`]` in nesting order.
///
/// Brackets inside string literals are not counted.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying a short preview of the input when no
/// value can be recovered.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taleweaver_narrative::extract_json;
///
/// let raw = "<think>The user wants JSON.</think>\n```json\n{\"storyParts\": [\"It was dark\", \"and st";
/// assert_eq!(
///     extract_json(raw).unwrap(),
///     json!({"storyParts": ["It was dark", "and st"]})
/// );
/// ```
pub fn extract_json(raw: &str) -> Result<serde_json::Value, ParseError> {
    let without_reasoning = strip_reasoning(raw);
    let trimmed = without_reasoning.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let text = match extract_from_code_block(trimmed) {
        Some(inner) => {
            if let Ok(value) = serde_json::from_str(inner) {
                return Ok(value);
            }
            inner
        }
        None => trimmed,
    };

    let Some(start) = text.find(['{', '[']) else {
        tracing::error!(response_length = raw.len(), "No JSON found in model response");
        return Err(ParseError::new("no JSON object or array found", raw));
    };
    let fragment = &text[start..];

    let candidate = match scan(fragment) {
        Scan::Closed(end) => fragment[..=end].to_string(),
        Scan::Truncated {
            pending,
            in_string,
            escape_pending,
        } => {
            tracing::debug!(
                missing_closers = pending.len(),
                in_string,
                "Repairing truncated JSON"
            );
            complete_truncated(fragment, &pending, in_string, escape_pending)
        }
    };

    serde_json::from_str(&candidate).map_err(|e| {
        let preview = candidate.chars().take(100).collect::<String>();
        tracing::error!(error = %e, json_preview = %preview, "JSON repair failed");
        ParseError::new(format!("unrecoverable JSON: {}", e), raw)
    })
}

/// [`extract_json`], then deserialize into `T`.
///
/// # Errors
///
/// Returns a parse error if no value can be recovered or it does not have
/// the shape of `T`.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use taleweaver_narrative::parse_json;
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Premise {
///     story_premise: String,
/// }
///
/// let premise: Premise = parse_json("```\n{\"storyPremise\": \"A lost key\"}\n```").unwrap();
/// assert_eq!(premise.story_premise, "A lost key");
/// ```
pub fn parse_json<T>(raw: &str) -> TaleweaverResult<T>
where
    T: DeserializeOwned,
{
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, "Recovered JSON has the wrong shape");
        ParseError::new(format!("unexpected JSON shape: {}", e), raw).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_json_is_identity() {
        for raw in [
            r#"{"a": 1, "b": [true, null, "x"]}"#,
            r#"[1, 2, 3]"#,
            r#""just a string""#,
            r#"42"#,
            r#"{"nested": {"deep": [{"k": "}"}]}}"#,
        ] {
            let expected: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(extract_json(raw).unwrap(), expected, "input: {}", raw);
        }
    }

    #[test]
    fn test_backticks_inside_strings_are_payload() {
        for raw in [
            r#"{"storyParts": ["She wrote ``` on the wall", "then left"]}"#,
            r#"{"a": "use ```x``` here"}"#,
        ] {
            let expected: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(extract_json(raw).unwrap(), expected, "input: {}", raw);
        }
    }

    #[test]
    fn test_fenced_value_may_contain_backticks() {
        let raw = "```json\n{\"a\": \"use ```x``` here\"}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": "use ```x``` here"}));
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let raw = "Here you go:\n```json\n{\"storyPremise\": \"x\"}\n```\nEnjoy!";
        assert_eq!(extract_json(raw).unwrap(), json!({"storyPremise": "x"}));
    }

    #[test]
    fn test_fenced_without_language_tag() {
        let raw = "```\n[\"a\", \"b\"]\n```";
        assert_eq!(extract_json(raw).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_unclosed_fence_takes_rest() {
        let raw = "```json\n{\"a\": 1}";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_missing_closers_are_appended_in_order() {
        let cases = [
            (r#"{"a": 1"#, json!({"a": 1})),
            (r#"{"a": [1, 2"#, json!({"a": [1, 2]})),
            (r#"{"a": [{"b": 2"#, json!({"a": [{"b": 2}]})),
        ];
        for (raw, expected) in cases {
            assert_eq!(extract_json(raw).unwrap(), expected, "input: {}", raw);
        }
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let raw = r#"{"text": "a { b [ c", "more": ["}"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            json!({"text": "a { b [ c", "more": ["}"]})
        );
    }

    #[test]
    fn test_unterminated_string_is_closed() {
        let raw = r#"{"storyParts": ["The door creaked open and"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            json!({"storyParts": ["The door creaked open and"]})
        );
    }

    #[test]
    fn test_trailing_comma_and_colon() {
        assert_eq!(extract_json(r#"[1, 2,"#).unwrap(), json!([1, 2]));
        assert_eq!(extract_json(r#"{"a": 1, "b":"#).unwrap(), json!({"a": 1, "b": null}));
    }

    #[test]
    fn test_dangling_escape() {
        assert_eq!(extract_json(r#"["ab\"#).unwrap(), json!(["ab"]));
    }

    #[test]
    fn test_prose_around_value() {
        let raw = "Sure! {\"rating\": \"GOOD\"} Let me know if you need more.";
        assert_eq!(extract_json(raw).unwrap(), json!({"rating": "GOOD"}));
    }

    #[test]
    fn test_reasoning_never_leaks() {
        let raw = "<think>maybe {\"secret\": true}</think>{\"visible\": 1}";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"visible": 1}));
        assert!(!value.to_string().contains("secret"));
    }

    #[test]
    fn test_failure_carries_bounded_preview() {
        let raw = "no structure here ".repeat(20);
        let err = extract_json(&raw).unwrap_err();
        assert_eq!(err.preview.chars().count(), 100);
    }

    #[test]
    fn test_parse_json_wrong_shape() {
        let result: TaleweaverResult<Vec<String>> = parse_json(r#"{"a": 1}"#);
        assert!(result.is_err());
    }
}

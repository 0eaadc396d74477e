//! Untrusted judge text -> JSON.
//!
//! Judge output is natural language that usually contains one JSON document,
//! often wrapped in markdown fences and occasionally with sloppy punctuation.
//! Extraction runs fence stripping, then brace matching, then a strict parse,
//! and only on failure a sanitised parse. Callers name the keys they expect so
//! bracketed prose around the payload is never mistaken for it. Nothing here
//! panics on bad input.

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object found in judge output")]
    NoJson,

    #[error("unterminated JSON in judge output (opened at byte {0})")]
    Unbalanced(usize),

    #[error("invalid JSON: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("judge JSON missing '{0}'")]
    MissingField(&'static str),

    #[error("judge JSON field '{field}' is malformed: {detail}")]
    Schema { field: &'static str, detail: String },
}

impl ExtractError {
    pub fn schema(field: &'static str, detail: impl Into<String>) -> Self {
        Self::Schema {
            field,
            detail: detail.into(),
        }
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence regex is valid")
    })
}

/// Return the body of the first fenced block that looks like JSON. An opening
/// fence without a closing one (truncated output) is dropped.
pub fn strip_code_fences(text: &str) -> Cow<'_, str> {
    for caps in fence_re().captures_iter(text) {
        if let Some(body) = caps.get(1) {
            let inner = body.as_str();
            if inner.contains('{') || inner.contains('[') {
                return Cow::Owned(inner.trim().to_string());
            }
        }
    }
    if let Some(idx) = text.find("```") {
        let after = &text[idx + 3..];
        let body = after.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        return Cow::Owned(body.trim().to_string());
    }
    Cow::Borrowed(text)
}

/// Byte offset just past the bracket that closes the one opened at `start`,
/// honouring string literals so braces inside essay text do not confuse the
/// matcher.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Repair the punctuation judges commonly get wrong:
/// trailing commas before `}`/`]`, and raw control characters inside strings.
pub fn sanitize(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {}
                c => out.push(c),
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            '\u{feff}' => {}
            c => out.push(c),
        }
    }

    out
}

fn parse_document(document: &str) -> Result<Value, ExtractError> {
    match serde_json::from_str::<Value>(document) {
        Ok(value) => Ok(value),
        Err(_) => {
            let cleaned = sanitize(document);
            serde_json::from_str::<Value>(&cleaned).map_err(ExtractError::Invalid)
        }
    }
}

/// Full extraction: fences -> candidate documents -> parse (strict, then
/// sanitised) -> first candidate shaped like the expected payload.
///
/// Every `{`/`[` in the unfenced text starts a candidate, so bracketed prose
/// ahead of the payload ("Essay [3] is weakest.") is skipped. The first
/// candidate that is an object carrying one of `keys` wins. A bare array is
/// accepted only when `bare_array` is set and it spans the whole text. When
/// nothing qualifies, the first candidate's failure is reported.
pub fn extract_json_with_keys(
    text: &str,
    keys: &[&'static str],
    bare_array: bool,
) -> Result<Value, ExtractError> {
    let unfenced = strip_code_fences(text.trim());
    let body = unfenced.trim();
    let primary = keys.first().copied().unwrap_or("payload");
    let mut first_failure = None;

    for (start, _) in body.match_indices(['{', '[']) {
        let outcome = match balanced_end(body, start) {
            Some(end) => parse_document(&body[start..end]).and_then(|value| {
                let keyed = value.is_object() && field(&value, keys).is_some();
                let whole = value.is_array() && start == 0 && end == body.len();
                if keyed || (bare_array && whole) {
                    Ok(value)
                } else {
                    Err(ExtractError::MissingField(primary))
                }
            }),
            None => Err(ExtractError::Unbalanced(start)),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_failure.get_or_insert(err);
            }
        }
    }

    Err(first_failure.unwrap_or(ExtractError::NoJson))
}

/// Complete elements of the array under `key` in output that was cut off
/// before the array closed. Parsing stops at the first incomplete element.
/// Without `key` in the text, only a top-level array is salvaged.
pub fn salvage_array_items(text: &str, key: &str) -> Vec<Value> {
    let unfenced = strip_code_fences(text.trim());
    let body = unfenced.trim();
    let quoted = format!("\"{}\"", key);
    let open = match body.find(&quoted) {
        Some(at) => {
            let after = at + quoted.len();
            match body[after..].find('[') {
                Some(rel) => after + rel,
                None => return Vec::new(),
            }
        }
        None if body.starts_with('[') => 0,
        None => return Vec::new(),
    };

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut item_start = None;

    for (offset, ch) in body[open + 1..].char_indices() {
        let pos = open + 1 + offset;
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
            '{' | '[' => {
                if depth == 0 {
                    item_start = Some(pos);
                }
                depth += 1;
            }
            '}' | ']' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = item_start.take() {
                        match parse_document(&body[begin..=pos]) {
                            Ok(value) => items.push(value),
                            Err(_) => break,
                        }
                    }
                }
            }
            _ => {}
        }
    }
    items
}

/// First present field among `names` (judges drift between camelCase and snake_case).
pub fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| value.get(*name).filter(|v| !v.is_null()))
}

/// Interpret a JSON value as an integer: integers, floats (rounded) and numeric strings.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}

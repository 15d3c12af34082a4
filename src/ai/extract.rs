//! Decoding structured objects out of completion responses.
//!
//! Models are asked for "JSON only" but routinely wrap it in code fences, add a
//! friendly sentence before or after, leave trailing commas or `//` comments, or
//! switch to typographic quotes. Extraction order:
//!
//! 1. provider-parsed object, if any;
//! 2. the whole text parsed as-is;
//! 3. the first balanced `{...}` block, sanitized, then parsed.
//!
//! Brace matching and sanitization are string-aware: braces, `//` and commas
//! inside quoted values (URLs, code snippets) are left alone.

use serde_json::{Map, Value};
use tracing::debug;

use crate::ai::RawResponse;
use crate::error::MalformedAiResponse;
use crate::util::trunc_for_log;

/// Max bytes of raw/sanitized text kept on a `MalformedAiResponse`.
const DIAG_MAX: usize = 1000;

/// Flatten any response shape into a single text blob.
pub fn response_text(raw: &RawResponse) -> String {
  let mut out = String::new();
  match raw {
    RawResponse::Text(s) => out.push_str(s),
    RawResponse::Parsed(map) => out.push_str(&Value::Object(map.clone()).to_string()),
    RawResponse::Object(map) => collect_object_text(map, &mut out),
    RawResponse::Parts(parts) => {
      for p in parts { collect_text(p, &mut out); }
    }
  }
  out
}

fn collect_text(v: &Value, out: &mut String) {
  match v {
    Value::String(s) => out.push_str(s),
    Value::Array(items) => {
      for item in items { collect_text(item, out); }
    }
    Value::Object(map) => collect_object_text(map, out),
    _ => {}
  }
}

fn collect_object_text(map: &Map<String, Value>, out: &mut String) {
  // Reasoning parts (Gemini "thought": true) are not part of the answer.
  if map.get("thought").and_then(Value::as_bool) == Some(true) {
    return;
  }
  for key in ["text", "content", "parts", "message"] {
    if let Some(v) = map.get(key) {
      collect_text(v, out);
      return;
    }
  }
}

/// Locate and parse the structured object carried by a completion.
pub fn extract_object(raw: &RawResponse) -> Result<Map<String, Value>, MalformedAiResponse> {
  if let RawResponse::Parsed(map) = raw {
    return Ok(map.clone());
  }
  extract_object_from_text(&response_text(raw))
}

/// Text-only half of [`extract_object`].
pub fn extract_object_from_text(text: &str) -> Result<Map<String, Value>, MalformedAiResponse> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(malformed("empty response", text, ""));
  }

  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
    return Ok(map);
  }

  let candidate = match balanced_object(trimmed) {
    Ok(c) => c,
    Err(reason) => return Err(malformed(reason, text, "")),
  };

  let sanitized = sanitize(candidate);
  match serde_json::from_str::<Value>(&sanitized) {
    Ok(Value::Object(map)) => Ok(map),
    Ok(_) => Err(malformed("extracted value is not an object", text, &sanitized)),
    Err(e) => Err(malformed(&format!("invalid JSON after sanitization: {e}"), text, &sanitized)),
  }
}

fn malformed(reason: &str, raw: &str, sanitized: &str) -> MalformedAiResponse {
  let err = MalformedAiResponse {
    reason: reason.to_string(),
    raw: trunc_for_log(raw, DIAG_MAX),
    sanitized: trunc_for_log(sanitized, DIAG_MAX),
  };
  debug!(target: "eduai_backend", reason = %err.reason, raw = %err.raw, sanitized = %err.sanitized, "Could not extract JSON object");
  err
}

fn is_smart_double(ch: char) -> bool {
  matches!(ch, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}')
}

fn is_smart_single(ch: char) -> bool {
  matches!(ch, '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

/// How the current string literal was opened.
#[derive(Clone, Copy, PartialEq)]
enum Quote {
  Ascii,
  Smart,
}

impl Quote {
  fn closes(self, ch: char) -> bool {
    match self {
      Quote::Ascii => ch == '"',
      Quote::Smart => is_smart_double(ch),
    }
  }
}

/// Slice out the first `{` through its matching `}`.
fn balanced_object(text: &str) -> Result<&str, &'static str> {
  let start = text.find('{').ok_or("no JSON object found")?;
  let mut depth = 0usize;
  let mut quote: Option<Quote> = None;
  let mut escaped = false;

  for (i, ch) in text[start..].char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if q.closes(ch) {
        quote = None;
      }
      continue;
    }
    match ch {
      '"' => quote = Some(Quote::Ascii),
      c if is_smart_double(c) => quote = Some(Quote::Smart),
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Ok(&text[start..start + i + ch.len_utf8()]);
        }
      }
      _ => {}
    }
  }
  Err("unbalanced braces (response truncated?)")
}

/// Index just past a comment starting at `i`, or None if there is no comment there.
fn skip_comment(chars: &[char], i: usize) -> Option<usize> {
  if chars.get(i) != Some(&'/') {
    return None;
  }
  match chars.get(i + 1) {
    Some('/') => {
      let mut j = i + 2;
      while j < chars.len() && chars[j] != '\n' { j += 1; }
      Some(j)
    }
    Some('*') => {
      let mut j = i + 2;
      while j + 1 < chars.len() && !(chars[j] == '*' && chars[j + 1] == '/') { j += 1; }
      Some((j + 2).min(chars.len()))
    }
    _ => None,
  }
}

/// Next char after `i` that is neither whitespace nor inside a comment.
fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
  while i < chars.len() {
    if chars[i].is_whitespace() {
      i += 1;
    } else if let Some(j) = skip_comment(chars, i) {
      i = j;
    } else {
      return Some(chars[i]);
    }
  }
  None
}

/// Strip comments and trailing commas, drop control characters, normalize
/// typographic quotes. Valid JSON passes through unchanged.
fn sanitize(s: &str) -> String {
  let chars: Vec<char> = s.chars().collect();
  let mut out = String::with_capacity(s.len());
  let mut quote: Option<Quote> = None;
  let mut escaped = false;
  let mut i = 0;

  while i < chars.len() {
    let ch = chars[i];

    if let Some(q) = quote {
      if escaped {
        out.push(ch);
        escaped = false;
      } else if ch == '\\' {
        out.push(ch);
        escaped = true;
      } else if q.closes(ch) {
        out.push('"');
        quote = None;
      } else if q == Quote::Smart && ch == '"' {
        out.push_str("\\\"");
      } else if is_smart_single(ch) {
        out.push('\'');
      } else if ch.is_control() {
        match ch {
          '\n' => out.push_str("\\n"),
          '\t' => out.push_str("\\t"),
          _ => {}
        }
      } else {
        out.push(ch);
      }
      i += 1;
      continue;
    }

    if let Some(j) = skip_comment(&chars, i) {
      i = j;
      continue;
    }

    match ch {
      '"' => {
        out.push('"');
        quote = Some(Quote::Ascii);
      }
      c if is_smart_double(c) => {
        out.push('"');
        quote = Some(Quote::Smart);
      }
      c if is_smart_single(c) => out.push('\''),
      ',' if matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) => {}
      '\n' | '\r' | '\t' => out.push(ch),
      c if c.is_control() => {}
      c => out.push(c),
    }
    i += 1;
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn clean() -> Value {
    json!({
      "title": "Linear Algebra",
      "phases": [{ "name": "Vectors", "weeks": [1, 2] }],
      "total_xp": 0
    })
  }

  #[test]
  fn fenced_prose_with_trailing_comma_matches_clean_parse() {
    let messy = "Sure! Here's your roadmap:\n```json\n{\n  \"title\": \"Linear Algebra\",\n  \"phases\": [{ \"name\": \"Vectors\", \"weeks\": [1, 2,], },],\n  \"total_xp\": 0,\n}\n```\nLet me know if you need changes.";
    let got = extract_object(&RawResponse::Text(messy.into())).unwrap();
    assert_eq!(Value::Object(got), clean());
  }

  #[test]
  fn no_opening_brace_is_malformed() {
    let err = extract_object(&RawResponse::Text("I cannot help with that.".into())).unwrap_err();
    assert_eq!(err.reason, "no JSON object found");
    assert_eq!(err.raw, "I cannot help with that.");
  }

  #[test]
  fn whitespace_only_is_malformed() {
    let err = extract_object(&RawResponse::Text("  \n\t ".into())).unwrap_err();
    assert_eq!(err.reason, "empty response");
    let err = extract_object(&RawResponse::Parts(vec![])).unwrap_err();
    assert_eq!(err.reason, "empty response");
  }

  #[test]
  fn truncated_object_is_malformed() {
    let err = extract_object_from_text(r#"{"phases": [{"name": "A""#).unwrap_err();
    assert!(err.reason.starts_with("unbalanced braces"));
  }

  #[test]
  fn parsed_object_is_returned_directly() {
    let raw = RawResponse::from_value(json!({ "parsed": { "phases": [] }, "content": "ignored" }));
    let got = extract_object(&raw).unwrap();
    assert_eq!(Value::Object(got), json!({ "phases": [] }));
  }

  #[test]
  fn multi_part_content_is_concatenated() {
    let raw = RawResponse::Parts(vec![
      json!({ "text": "thinking...", "thought": true }),
      json!({ "text": "```json\n{\"a\": " }),
      json!({ "text": "1}\n```" }),
    ]);
    assert_eq!(Value::Object(extract_object(&raw).unwrap()), json!({ "a": 1 }));
  }

  #[test]
  fn nested_content_object_is_read() {
    let raw = RawResponse::from_value(json!({ "content": [{ "type": "text", "text": "{\"ok\": true}" }] }));
    assert_eq!(Value::Object(extract_object(&raw).unwrap()), json!({ "ok": true }));
  }

  #[test]
  fn first_of_several_objects_wins() {
    let got = extract_object_from_text("Option A: {\"pick\": 1}\nOption B: {\"pick\": 2}").unwrap();
    assert_eq!(Value::Object(got), json!({ "pick": 1 }));
  }

  #[test]
  fn braces_and_slashes_inside_strings_survive() {
    let text = "Here:\n{\n  // resource list\n  \"url\": \"https://example.com/a}b\", /* note */\n  \"code\": \"fn f() { }\",\n}";
    let got = extract_object_from_text(text).unwrap();
    assert_eq!(
      Value::Object(got),
      json!({ "url": "https://example.com/a}b", "code": "fn f() { }" })
    );
  }

  #[test]
  fn smart_quotes_and_control_chars_are_normalized() {
    let text = "Result: {\u{201C}title\u{201D}: \u{201C}It\u{2019}s \"fine\"\u{201D}, \"note\": \"line one\nline two\u{0007}\"}";
    let got = extract_object_from_text(text).unwrap();
    assert_eq!(
      Value::Object(got),
      json!({ "title": "It's \"fine\"", "note": "line one\nline two" })
    );
  }

  #[test]
  fn top_level_array_without_object_is_malformed() {
    let err = extract_object_from_text("[1, 2, 3]").unwrap_err();
    assert_eq!(err.reason, "no JSON object found");
  }
}

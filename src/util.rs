//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Braces that do not name a known key (e.g. literal JSON examples) are left untouched.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Lowercase, kebab-case slug: runs of non-alphanumerics collapse to a single '-'.
pub fn slugify(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.trim().chars().flat_map(char::to_lowercase) {
    if ch.is_alphanumeric() {
      out.push(ch);
    } else if !out.is_empty() && !out.ends_with('-') {
      out.push('-');
    }
  }
  while out.ends_with('-') { out.pop(); }
  out
}

/// Cut `s` to at most `max` bytes without splitting a UTF-8 character.
pub fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
  if s.len() <= max { return s; }
  let mut end = max;
  while end > 0 && !s.is_char_boundary(end) { end -= 1; }
  &s[..end]
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", truncate_on_char_boundary(s, max), s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_keeps_literal_json_braces() {
    let out = fill_template(r#"Topic: {topic} -> {"id": "x"}"#, &[("topic", "Rust")]);
    assert_eq!(out, r#"Topic: Rust -> {"id": "x"}"#);
  }

  #[test]
  fn slugify_collapses_separators() {
    assert_eq!(slugify("  Linear Algebra -- for ML! "), "linear-algebra-for-ml");
    assert_eq!(slugify("C++"), "c");
    assert_eq!(slugify("???"), "");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "héllo";
    assert_eq!(truncate_on_char_boundary(s, 2), "h");
    assert_eq!(trunc_for_log("abc", 10), "abc");
    assert!(trunc_for_log("abcdef", 3).starts_with("abc… (6 bytes total)"));
  }
}

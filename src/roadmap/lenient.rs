//! Forgiving field readers for model-produced JSON.
//!
//! Models mix numbers and numeric strings, send `null` for blanks and wrap
//! lists in odd shapes. These helpers read what is usable and return `None`
//! for the rest so callers can apply their defaults.

use serde_json::{Map, Value};

use crate::domain::Resource;

/// Non-blank string; numbers are accepted and rendered.
pub fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
  match map.get(key)? {
    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Non-negative integer from a number or numeric string; negatives clamp to 0,
/// fractions round.
pub fn as_u32(v: &Value) -> Option<u32> {
  let f = match v {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  if !f.is_finite() {
    return None;
  }
  Some(f.round().clamp(0.0, u32::MAX as f64) as u32)
}

pub fn u32_field(map: &Map<String, Value>, key: &str) -> Option<u32> {
  map.get(key).and_then(as_u32)
}

pub fn f32_field(map: &Map<String, Value>, key: &str) -> Option<f32> {
  let f = match map.get(key)? {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  (f.is_finite() && f >= 0.0).then_some(f as f32)
}

pub fn object_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
  map.get(key).and_then(Value::as_object)
}

/// Array elements, or nothing when the key is missing or not an array.
pub fn array_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a [Value] {
  map.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Strings from an array; objects contribute their `key` field (e.g. `question`).
pub fn string_list(map: &Map<String, Value>, key: &str, inner: &str) -> Vec<String> {
  array_field(map, key)
    .iter()
    .filter_map(|v| match v {
      Value::String(s) => Some(s.trim().to_string()),
      Value::Object(o) => str_field(o, inner),
      _ => None,
    })
    .filter(|s| !s.is_empty())
    .collect()
}

/// A string or a list of strings, joined.
pub fn text_or_list(map: &Map<String, Value>, key: &str) -> Option<String> {
  match map.get(key)? {
    Value::Array(items) => {
      let parts: Vec<&str> = items.iter().filter_map(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).collect();
      (!parts.is_empty()).then(|| parts.join(", "))
    }
    _ => str_field(map, key),
  }
}

/// Resource descriptor; needs at least a title or a url.
pub fn resource(v: &Value) -> Option<Resource> {
  let map = v.as_object()?;
  let title = str_field(map, "title");
  let url = str_field(map, "url");
  if title.is_none() && url.is_none() {
    return None;
  }
  Some(Resource {
    title: title.or_else(|| url.clone()).unwrap_or_default(),
    url: url.unwrap_or_default(),
    provider: str_field(map, "provider"),
    kind: str_field(map, "type"),
  })
}

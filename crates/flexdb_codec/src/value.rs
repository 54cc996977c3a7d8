//! Semantics of plain values.
//!
//! Records dump to a plain [`Value`] tree. Queries need a few operations
//! on those trees that `serde_json` does not define: truthiness, loose
//! numeric comparison, membership, and a string rendering used by the
//! substring predicates.

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Returns whether a value counts as "set".
///
/// Null, `false`, zero, the empty string, the empty array and the empty
/// object are falsy. Everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Numeric view of a value. Booleans count as 0 and 1.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Compares two values.
///
/// Numbers compare across integer/float representations, strings compare
/// lexicographically, arrays compare element by element. Returns `None`
/// for pairs with no meaningful order (a string against a number, for
/// instance).
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => Some(i.cmp(&j)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                match compare(l, r)? {
                    Ordering::Equal => continue,
                    ord => return Some(ord),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        (Value::Object(_), Value::Object(_)) => loose_eq(a, b).then_some(Ordering::Equal),
        (Value::Bool(_), Value::Number(_)) | (Value::Number(_), Value::Bool(_)) => {
            as_number(a)?.partial_cmp(&as_number(b)?)
        }
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| loose_eq(v, other)))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| loose_eq(l, r))
        }
        _ => compare(a, b) == Some(Ordering::Equal),
    }
}

/// Total order used for sorting.
///
/// Values of different kinds are ranked null < bool/number < string <
/// array < object; values of the same kind use [`compare`], and pairs it
/// cannot order are considered equal so the sort stays stable.
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) | Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) => 3,
            Value::Object(_) => 4,
        }
    }

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => compare(a, b).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

/// Membership test: is `needle` in `haystack`?
///
/// Arrays test their elements, strings test for a substring, objects test
/// their keys. Scalars contain nothing.
pub fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Array(items), _) => items.iter().any(|item| loose_eq(item, needle)),
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

/// Renders a value as text for the prefix/suffix/contains predicates.
///
/// Strings render as themselves, null renders empty, everything else
/// renders as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds a hashable key for a value.
///
/// Integral floats collapse onto the integer they equal, so `2.0` and `2`
/// produce the same key. Used to bucket rows by field value.
pub fn key_of(value: &Value) -> String {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            #[allow(clippy::cast_possible_truncation)]
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(key_of).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

/// Overlays `patch` onto `target`.
///
/// Keys present in `patch` replace the ones in `target`; nested objects
/// merge recursively so a partial child mapping keeps the child's other
/// fields. Keys absent from `patch` are left untouched.
pub fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(base), Value::Object(overlay)) => merge_maps(base, overlay),
        (slot, other) => *slot = other.clone(),
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, incoming) in overlay {
        let nested = incoming.is_object() && base.get(key).is_some_and(Value::is_object);
        match base.get_mut(key) {
            Some(existing) if nested => merge(existing, incoming),
            _ => {
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

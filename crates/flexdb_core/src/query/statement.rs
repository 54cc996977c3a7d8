//! Deferred predicates over a field path.

use super::row::Row;
use crate::record::{Args, Record};
use flexdb_codec::value::{compare, contains, is_truthy, key_of, loose_eq, render};
use flexdb_codec::Value;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A field path bound to the rows of a select, waiting for a predicate.
///
/// Each predicate evaluates the path on every row and returns the rows it
/// holds for. Values of kinds that cannot be compared (a string against a
/// number, a missing field against anything) never match an ordering or
/// range predicate.
pub struct Statement<'a, T: Record> {
    items: &'a [Row<T>],
    path: String,
    args: Args,
}

impl<'a, T: Record> Statement<'a, T> {
    pub(crate) fn new(items: &'a [Row<T>], path: &str) -> Self {
        Self {
            items,
            path: path.to_string(),
            args: Args::None,
        }
    }

    /// Passes `args` to the computed field at the end of the path.
    #[must_use]
    pub fn call(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Rows whose value satisfies `predicate`.
    pub fn matching<F>(&self, predicate: F) -> Vec<Row<T>>
    where
        F: Fn(&Value) -> bool,
    {
        self.items
            .iter()
            .filter(|row| predicate(&row.prop_with(&self.path, &self.args)))
            .cloned()
            .collect()
    }

    fn ordered<F>(&self, other: &Value, accept: F) -> Vec<Row<T>>
    where
        F: Fn(Ordering) -> bool,
    {
        self.matching(|v| compare(v, other).is_some_and(&accept))
    }

    /// Value equals `other`.
    pub fn eq(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        let other = other.into();
        self.matching(|v| loose_eq(v, &other))
    }

    /// Value differs from `other`.
    pub fn ne(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        let other = other.into();
        self.matching(|v| !loose_eq(v, &other))
    }

    /// Value is less than `other`.
    pub fn lt(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        self.ordered(&other.into(), Ordering::is_lt)
    }

    /// Value is less than or equal to `other`.
    pub fn le(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        self.ordered(&other.into(), Ordering::is_le)
    }

    /// Value is greater than `other`.
    pub fn gt(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        self.ordered(&other.into(), Ordering::is_gt)
    }

    /// Value is greater than or equal to `other`.
    pub fn ge(&self, other: impl Into<Value>) -> Vec<Row<T>> {
        self.ordered(&other.into(), Ordering::is_ge)
    }

    /// Value is exactly `true`.
    pub fn is_true(&self) -> Vec<Row<T>> {
        self.matching(|v| *v == Value::Bool(true))
    }

    /// Value is exactly `false`.
    pub fn is_false(&self) -> Vec<Row<T>> {
        self.matching(|v| *v == Value::Bool(false))
    }

    /// Value is null or missing.
    pub fn is_null(&self) -> Vec<Row<T>> {
        self.matching(Value::is_null)
    }

    /// Value is neither null nor missing.
    pub fn is_not_null(&self) -> Vec<Row<T>> {
        self.matching(|v| !v.is_null())
    }

    /// Value is null, missing, or the empty string.
    pub fn is_empty(&self) -> Vec<Row<T>> {
        self.matching(is_blank)
    }

    /// Value is neither null, missing, nor the empty string.
    pub fn is_not_empty(&self) -> Vec<Row<T>> {
        self.matching(|v| !is_blank(v))
    }

    /// Value is truthy.
    pub fn is_truthy(&self) -> Vec<Row<T>> {
        self.matching(is_truthy)
    }

    /// `low <= value <= high`.
    pub fn is_between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Vec<Row<T>> {
        let (low, high) = (low.into(), high.into());
        self.matching(|v| between(v, &low, &high))
    }

    /// Value is below `low` or above `high`.
    ///
    /// Values that cannot be compared to the bounds match neither this
    /// nor [`is_between`](Self::is_between).
    pub fn is_not_between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Vec<Row<T>> {
        let (low, high) = (low.into(), high.into());
        self.matching(|v| {
            compare(v, &low).is_some_and(Ordering::is_lt)
                || compare(v, &high).is_some_and(Ordering::is_gt)
        })
    }

    /// Value equals one of `candidates`.
    pub fn is_in<I, V>(&self, candidates: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let candidates = collect_values(candidates);
        self.matching(|v| candidates.iter().any(|c| loose_eq(v, c)))
    }

    /// Value equals none of `candidates`.
    pub fn is_not_in<I, V>(&self, candidates: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let candidates = collect_values(candidates);
        self.matching(|v| !candidates.iter().any(|c| loose_eq(v, c)))
    }

    /// Value contains at least one element of `pattern`.
    pub fn is_intersect<I, V>(&self, pattern: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pattern = unique_values(pattern);
        self.matching(|v| pattern.iter().any(|p| contains(v, p)))
    }

    /// Value lacks at least one element of `pattern`.
    pub fn is_not_intersect<I, V>(&self, pattern: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pattern = unique_values(pattern);
        self.matching(|v| pattern.iter().any(|p| !contains(v, p)))
    }

    /// Value contains every element of `pattern`.
    pub fn is_full_intersect<I, V>(&self, pattern: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pattern = unique_values(pattern);
        self.matching(|v| pattern.iter().all(|p| contains(v, p)))
    }

    /// Value contains no element of `pattern`.
    pub fn is_not_full_intersect<I, V>(&self, pattern: I) -> Vec<Row<T>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pattern = unique_values(pattern);
        self.matching(|v| !pattern.iter().any(|p| contains(v, p)))
    }

    /// Rendered value starts with `text`.
    pub fn prefix(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| value.starts_with(text))
    }

    /// Rendered value does not start with `text`.
    pub fn not_prefix(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| !value.starts_with(text))
    }

    /// Rendered value ends with `text`.
    pub fn suffix(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| value.ends_with(text))
    }

    /// Rendered value does not end with `text`.
    pub fn not_suffix(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| !value.ends_with(text))
    }

    /// Rendered value contains `text`.
    pub fn contains(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| value.contains(text))
    }

    /// Rendered value does not contain `text`.
    pub fn not_contains(&self, text: &str, sensitive: bool) -> Vec<Row<T>> {
        self.textual(text, sensitive, |value, text| !value.contains(text))
    }

    fn textual<F>(&self, text: &str, sensitive: bool, test: F) -> Vec<Row<T>>
    where
        F: Fn(&str, &str) -> bool,
    {
        let text = fold(text, sensitive);
        self.matching(|v| test(&fold(&render(v), sensitive), &text))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn between(value: &Value, low: &Value, high: &Value) -> bool {
    compare(value, low).is_some_and(Ordering::is_ge)
        && compare(value, high).is_some_and(Ordering::is_le)
}

fn collect_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}

/// Collects values, dropping duplicates.
fn unique_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut seen = HashSet::new();
    collect_values(values)
        .into_iter()
        .filter(|v| seen.insert(key_of(v)))
        .collect()
}

fn fold(text: &str, sensitive: bool) -> String {
    if sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

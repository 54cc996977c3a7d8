//! Dotted-path resolution.
//!
//! A path such as `profile.location.country` is walked one segment at a
//! time. Each segment is looked up on the current object: a joined row, a
//! record, or a plain mapping. The walk stops early, returning what it
//! has, as soon as a segment yields a falsy value, and yields null when a
//! segment does not exist.

use flexdb_codec::value::is_truthy;
use flexdb_codec::{Map, Value};

/// Arguments passed to a computed field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Args {
    /// No arguments.
    #[default]
    None,
    /// Positional arguments.
    Positional(Vec<Value>),
    /// Named arguments.
    Named(Map<String, Value>),
}

impl Args {
    /// Builds positional arguments.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Builds named arguments.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the positional argument at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Positional(values) => values.get(index),
            _ => None,
        }
    }

    /// Returns the named argument `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Named(map) => map.get(name),
            _ => None,
        }
    }

    /// Returns whether no arguments were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Positional(values) => values.is_empty(),
            Self::Named(map) => map.is_empty(),
        }
    }
}

/// Result of looking a single path segment up on an object.
pub enum Attr<'a> {
    /// The object has no such attribute.
    Missing,
    /// A plain value.
    Value(Value),
    /// A nested object the walk can continue into.
    Object(&'a dyn Resolve),
}

/// An object a dotted path can be resolved against.
pub trait Resolve {
    /// Looks up one attribute.
    ///
    /// `args` is non-empty only for the last segment of a path, and is
    /// passed to computed fields.
    fn attr(&self, name: &str, args: &Args) -> Attr<'_>;

    /// Returns the whole object as a plain value.
    fn to_value(&self) -> Value;
}

enum Cursor<'a> {
    Object(&'a dyn Resolve),
    Plain(Value),
}

/// Resolves `path` against `root`.
///
/// Returns null for a missing segment, and the falsy value itself when a
/// non-terminal segment is falsy. `args` reach only the terminal segment.
pub fn resolve<'a>(root: &'a dyn Resolve, path: &str, args: &Args) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    let last = segments.len() - 1;
    let mut cursor = Cursor::Object(root);

    for (index, segment) in segments.into_iter().enumerate() {
        let terminal = index == last;
        let segment_args = if terminal { args } else { &Args::None };

        let attr = match &cursor {
            Cursor::Object(object) => {
                let object: &'a dyn Resolve = *object;
                object.attr(segment, segment_args)
            }
            Cursor::Plain(value) => value
                .get(segment)
                .cloned()
                .map_or(Attr::Missing, Attr::Value),
        };

        match attr {
            Attr::Missing => return Value::Null,
            Attr::Value(value) => {
                if terminal || !is_truthy(&value) {
                    return value;
                }
                cursor = Cursor::Plain(value);
            }
            Attr::Object(object) => {
                if terminal {
                    return object.to_value();
                }
                cursor = Cursor::Object(object);
            }
        }
    }

    Value::Null
}

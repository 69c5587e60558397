//! Parameter model: scalar values, bind modes, and the ordered parameter map.

mod json;

pub use json::{params_from_json, simplified_to_json};

use std::collections::HashMap;
use std::fmt;

/// A scalar value bindable to a single SQL placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    /// Renders the literal-text form used by `BindMode::Text` substitution
    /// (strings unquoted, loose casts for the rest).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(true) => write!(f, "1"),
            Scalar::Bool(false) => Ok(()),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// How an array-shaped parameter is rendered and bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    /// Flatten a sequence into `name_i` placeholders, one per element.
    #[default]
    Bind,
    /// Substitute the scalar as literal SQL text; nothing is bound.
    Text,
    /// Flatten rows into parenthesized `(:name_i_j,...)` groups.
    Tuple,
    /// Keep the tagged fragment but bind and substitute nothing.
    NoBind,
}

/// Nested sequence payload of an array-shaped parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Leaf(Scalar),
    Seq(Vec<Payload>),
}

impl Payload {
    pub fn seq_of<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        Payload::Seq(values.into_iter().map(|v| Payload::Leaf(v.into())).collect())
    }
}

/// A template parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(Scalar),
    /// Scalar plus a driver type code, carried through uninterpreted.
    Typed(Scalar, i64),
    Array {
        mode: BindMode,
        payload: Option<Payload>,
    },
}

impl ParamValue {
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        ParamValue::Scalar(value.into())
    }

    pub fn typed(value: impl Into<Scalar>, type_code: i64) -> Self {
        ParamValue::Typed(value.into(), type_code)
    }

    /// A `Bind`-mode array: one placeholder per element.
    pub fn bind_array<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        ParamValue::Array {
            mode: BindMode::Bind,
            payload: Some(Payload::seq_of(values)),
        }
    }

    /// A `Text`-mode value substituted as literal SQL.
    pub fn text(value: impl Into<Scalar>) -> Self {
        ParamValue::Array {
            mode: BindMode::Text,
            payload: Some(Payload::Leaf(value.into())),
        }
    }

    /// A `Tuple`-mode array of rows.
    pub fn tuple<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: Into<Scalar>,
    {
        ParamValue::Array {
            mode: BindMode::Tuple,
            payload: Some(Payload::Seq(
                rows.into_iter().map(Payload::seq_of).collect(),
            )),
        }
    }

    pub fn no_bind() -> Self {
        ParamValue::Array {
            mode: BindMode::NoBind,
            payload: None,
        }
    }
}

/// A flattened, bind-ready value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Plain(Scalar),
    /// Scalar plus its uninterpreted type code, passed through to the driver.
    Typed(Scalar, i64),
}

/// Insertion-ordered mapping from placeholder name (colon-prefixed) to a
/// bind-ready value. Produced by flattening a [`ParamMap`]; keys are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplifiedParams {
    entries: Vec<(String, BoundValue)>,
}

impl SimplifiedParams {
    /// Re-inserting a key overwrites its value in place, so declarations
    /// that collide after colon normalization (`p` and `:p`) yield a single
    /// entry holding the last value.
    pub(crate) fn insert(&mut self, key: String, value: BoundValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&BoundValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Insertion-ordered parameter map with case-insensitive lookup.
///
/// Keys may carry an optional leading `:`; lookup ignores it and ignores
/// ASCII case, but the first-declared casing is preserved for generating
/// output placeholder names. When two keys collide under normalization the
/// first declaration wins — a deterministic tie-break relied on by callers.
#[derive(Debug, Clone, Default)]
pub struct ParamMap {
    entries: Vec<(String, ParamValue)>,
    /// Lowercased, colon-stripped key -> index of first declaration.
    index: HashMap<String, usize>,
}

fn normalize_key(key: &str) -> String {
    key.trim_start_matches(':').to_ascii_lowercase()
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter. Re-inserting the exact same key replaces its
    /// value; a key that only collides under normalization is appended and
    /// stays shadowed for lookup.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return;
        }
        let normalized = normalize_key(&key);
        let idx = self.entries.len();
        self.entries.push((key, value));
        self.index.entry(normalized).or_insert(idx);
    }

    /// Case-insensitive lookup, tolerant of a leading `:` on either side.
    ///
    /// Returns the first-declared key casing (without leading `:`) paired
    /// with the value.
    pub fn lookup(&self, name: &str) -> Option<(&str, &ParamValue)> {
        let idx = *self.index.get(&normalize_key(name))?;
        let (key, value) = &self.entries[idx];
        Some((key.trim_start_matches(':'), value))
    }

    /// Presence check under the same normalization as [`ParamMap::lookup`].
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order, keys exactly as declared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (K, ParamValue)>>(iter: T) -> Self {
        let mut map = ParamMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

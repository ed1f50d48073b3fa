//! crates/logtree/src/record.rs
//! Structured record values and key-sorted records.
//!
//! A [`Record`] is the unit handed to routes. It is also used for the context a
//! logger binds: [`Logger::bind`](crate::Logger::bind) layers new fields over the
//! parent's record, and every log call layers its own fields over that.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::level::Level;

/// Key under which the severity of a record is stored.
pub const LEVEL_KEY: &str = "$level";
/// Key under which the clock value of a record is stored.
pub const TIME_KEY: &str = "$time";

/// A value evaluated each time a record is built from bound context.
///
/// Lazy values let a logger bind ambient state (a request counter, the
/// current time) that must be read at log time rather than at bind time.
#[derive(Clone)]
pub struct LazyValue(Arc<dyn Fn() -> Value + Send + Sync>);

impl LazyValue {
    /// Wraps a provider closure.
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(provider))
    }

    /// Invokes the provider.
    #[must_use]
    pub fn evaluate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyValue(..)")
    }
}

/// A single field value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// A severity level.
    Level(Level),
    /// Deferred value resolved when the record is built.
    Lazy(LazyValue),
}

impl Value {
    /// Replaces a lazy value with its evaluation; other values are returned as is.
    ///
    /// Providers returning another lazy value are evaluated until a concrete
    /// value is produced.
    #[must_use]
    pub fn resolve(self) -> Self {
        let mut value = self;
        while let Self::Lazy(lazy) = value {
            value = lazy.evaluate();
        }
        value
    }

    /// Returns the text when the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Level(a), Self::Level(b)) => a == b,
            (Self::Lazy(a), Self::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Level(level) => write!(f, "{level}"),
            Self::Lazy(lazy) => write!(f, "{}", lazy.evaluate()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Uint(u64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Uint(value as u64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Level> for Value {
    fn from(value: Level) -> Self {
        Self::Level(value)
    }
}

impl From<LazyValue> for Value {
    fn from(value: LazyValue) -> Self {
        Self::Lazy(value)
    }
}

/// Key-sorted mapping of field names to values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any previous value under the same key.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the severity stored under [`LEVEL_KEY`], if any.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        match self.fields.get(LEVEL_KEY) {
            Some(Value::Level(level)) => Some(*level),
            _ => None,
        }
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reports whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Copies every field of `overrides` into `self`; keys in `overrides` win.
    pub fn extend_from(&mut self, overrides: &Self) {
        for (key, value) in &overrides.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns a new record holding `self` with `overrides` layered on top.
    #[must_use]
    pub fn layered(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged.extend_from(overrides);
        merged
    }

    /// Evaluates every lazy value in place.
    pub fn resolve_lazy(&mut self) {
        for value in self.fields.values_mut() {
            if matches!(value, Value::Lazy(_)) {
                let lazy = std::mem::replace(value, Value::Bool(false));
                *value = lazy.resolve();
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

//! The language-agnostic values produced from table literals.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::stack::ensure_sufficient_stack;

/// A value evaluated from a literal expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Table(Table),
    /// The source text of an expression outside the literal subset, such as
    /// a function call or a variable reference.
    Opaque(String),
}

/// A table key. Names and string keys are both `Key::String`.
#[derive(Clone, Debug)]
pub enum Key {
    String(String),
    Number(f64),
}

/// A mapping from keys to values which remembers insertion order.
///
/// Order only makes output deterministic; two tables with the same entries
/// in a different order are equal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    entries: IndexMap<Key, Value>,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }

    /// Looks up a string key, if this value is a table.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_table()?.get_str(key)
    }

    /// Returns the name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Opaque(_) => "opaque",
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds `value` to `key`, returning the previous value. A replaced key
    /// keeps its original position.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.get(&Key::from(key))
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Table {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        mem::take(&mut self.entries).into_iter()
    }
}

impl FromIterator<(Key, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Table {
            entries: iter.into_iter().collect(),
        }
    }
}

// Nested tables are torn down with an explicit stack, so that dropping a
// deeply nested value cannot overflow the call stack.
impl Drop for Table {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        let mut entries = mem::take(&mut self.entries);
        loop {
            for (_, value) in entries.drain(..) {
                if let Value::Table(mut table) = value {
                    pending.push(mem::take(&mut table.entries));
                }
            }
            match pending.pop() {
                Some(next) => entries = next,
                None => break,
            }
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        match (self, other) {
            (Key::String(a), Key::String(b)) => a == b,
            (Key::Number(a), Key::Number(b)) => a == b,
            _ => false,
        }
    }
}

/// Number keys come from literals, which are never NaN.
impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        match self {
            Key::String(s) => s.hash(hasher),
            Key::Number(n) => {
                debug_assert!(!n.is_nan(), "Can't hash NaN");
                let mut bits = n.to_bits();
                // -0.0 == 0.0
                if bits == 1 << 63 {
                    bits = 0;
                }
                bits.hash(hasher);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(s) => f.write_str(s),
            Key::Number(n) => fmt::Display::fmt(n, f),
        }
    }
}

/// Strings print bare at the top level and quoted inside tables.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => fmt::Display::fmt(n, f),
            Value::String(s) | Value::Opaque(s) => f.write_str(s),
            Value::Table(t) => fmt::Display::fmt(t, f),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| {
            f.write_str("{")?;
            for (i, (key, value)) in self.entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match key {
                    Key::String(s) => write!(f, "{:?} = ", s)?,
                    Key::Number(n) => write!(f, "[{}] = ", n)?,
                }
                match value {
                    Value::String(s) => write!(f, "{:?}", s)?,
                    _ => fmt::Display::fmt(value, f)?,
                }
            }
            f.write_str("}")
        })
    }
}

/// Integral numbers up to this magnitude are written as integers.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !n.is_finite() {
        // JSON has no infinity, so it is written as text (`inf` or `-inf`).
        serializer.collect_str(&n)
    } else if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

/// Values serialize to JSON-like data: tables become maps whose keys are the
/// displayed form of each key, and opaque expressions become their text.
/// Integral numbers are written without a fractional part.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serialize_number(*n, serializer),
            Value::String(s) | Value::Opaque(s) => serializer.serialize_str(s),
            Value::Table(t) => t.serialize(serializer),
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ensure_sufficient_stack(|| {
            let mut map = serializer.serialize_map(Some(self.entries.len()))?;
            for (key, value) in &self.entries {
                map.serialize_entry(key, value)?;
            }
            map.end()
        })
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::String(s) => serializer.serialize_str(s),
            Key::Number(n) => serializer.collect_str(n),
        }
    }
}

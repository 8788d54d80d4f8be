//! Cache Key Module
//!
//! Derives deterministic cache keys from a logical name plus call arguments.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

// == Argument Values ==
/// One call argument in canonical form.
///
/// Every variant encodes distinctly: floats are written with their full
/// representation (`NaN`, `inf`), and map keys of any argument type are kept
/// as sorted key/value pairs.
#[derive(Debug, Clone, Serialize)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`
    UInt(u64),
    Float(#[serde(serialize_with = "float_repr")] f64),
    Str(String),
    Date(NaiveDate),
    List(Vec<ArgValue>),
    /// Entries sorted by key
    Map(Vec<(ArgValue, ArgValue)>),
}

impl ArgValue {
    fn rank(&self) -> u8 {
        match self {
            ArgValue::Null => 0,
            ArgValue::Bool(_) => 1,
            ArgValue::Int(_) => 2,
            ArgValue::UInt(_) => 3,
            ArgValue::Float(_) => 4,
            ArgValue::Str(_) => 5,
            ArgValue::Date(_) => 6,
            ArgValue::List(_) => 7,
            ArgValue::Map(_) => 8,
        }
    }

    fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ArgValue>,
        V: Into<ArgValue>,
    {
        let mut pairs: Vec<(ArgValue, ArgValue)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        ArgValue::Map(pairs)
    }
}

fn float_repr<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:?}", value))
}

impl Ord for ArgValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a.cmp(b),
            (ArgValue::Int(a), ArgValue::Int(b)) => a.cmp(b),
            (ArgValue::UInt(a), ArgValue::UInt(b)) => a.cmp(b),
            (ArgValue::Float(a), ArgValue::Float(b)) => a.total_cmp(b),
            (ArgValue::Str(a), ArgValue::Str(b)) => a.cmp(b),
            (ArgValue::Date(a), ArgValue::Date(b)) => a.cmp(b),
            (ArgValue::List(a), ArgValue::List(b)) => a.cmp(b),
            (ArgValue::Map(a), ArgValue::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ArgValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArgValue {}

// == Conversions ==
impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(ArgValue::Int)
            .unwrap_or(ArgValue::UInt(value))
    }
}

impl From<usize> for ArgValue {
    fn from(value: usize) -> Self {
        ArgValue::from(value as u64)
    }
}

impl From<f32> for ArgValue {
    fn from(value: f32) -> Self {
        ArgValue::Float(f64::from(value))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Str(value)
    }
}

impl From<&String> for ArgValue {
    fn from(value: &String) -> Self {
        ArgValue::Str(value.clone())
    }
}

impl From<NaiveDate> for ArgValue {
    fn from(value: NaiveDate) -> Self {
        ArgValue::Date(value)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Null, Into::into)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(values: Vec<T>) -> Self {
        ArgValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<ArgValue>, B: Into<ArgValue>> From<(A, B)> for ArgValue {
    fn from((a, b): (A, B)) -> Self {
        ArgValue::List(vec![a.into(), b.into()])
    }
}

impl<K: Into<ArgValue>, V: Into<ArgValue>> From<BTreeMap<K, V>> for ArgValue {
    fn from(entries: BTreeMap<K, V>) -> Self {
        ArgValue::from_entries(entries)
    }
}

impl<K: Into<ArgValue>, V: Into<ArgValue>, S> From<HashMap<K, V, S>> for ArgValue {
    fn from(entries: HashMap<K, V, S>) -> Self {
        ArgValue::from_entries(entries)
    }
}

// == Call Arguments ==
/// Positional and keyword arguments of a cached call.
///
/// Keyword arguments are kept sorted by name, so the order in which they
/// are supplied never changes the derived key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallArgs {
    args: Vec<ArgValue>,
    kwargs: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier value under the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Canonical JSON rendering hashed into the key.
    pub fn canonical(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CacheError::Internal(format!("Failed to encode call arguments: {}", e)))
    }
}

// == Key Derivation ==
/// Builds `"{name}:{sha256 of canonical args}"`.
pub fn cache_key(name: &str, args: &CallArgs) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(args.canonical()?.as_bytes());
    Ok(format!("{}:{:x}", name, hasher.finalize()))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, args: &CallArgs) -> String {
        cache_key(name, args).unwrap()
    }

    #[test]
    fn test_kwarg_order_does_not_matter() {
        let a = CallArgs::new()
            .kwarg("start", "2024-01-01")
            .kwarg("end", "2024-01-31");
        let b = CallArgs::new()
            .kwarg("end", "2024-01-31")
            .kwarg("start", "2024-01-01");

        assert_eq!(key("timeline", &a), key("timeline", &b));
    }

    #[test]
    fn test_positional_order_matters() {
        let a = CallArgs::new().arg(1).arg(2);
        let b = CallArgs::new().arg(2).arg(1);

        assert_ne!(key("f", &a), key("f", &b));
    }

    #[test]
    fn test_name_is_visible_prefix() {
        let key = key("revenue_timeline", &CallArgs::new());
        assert!(key.starts_with("revenue_timeline:"));
        // sha256 hex digest
        assert_eq!(key.len(), "revenue_timeline:".len() + 64);
    }

    #[test]
    fn test_distinct_arguments_yield_distinct_keys() {
        let a = CallArgs::new().kwarg("property_id", 1);
        let b = CallArgs::new().kwarg("property_id", 10);
        let c = CallArgs::new().arg(1);

        assert_ne!(key("f", &a), key("f", &b));
        assert_ne!(key("f", &a), key("f", &c));
        assert_ne!(key("f", &a), key("g", &a));
    }

    #[test]
    fn test_nested_map_values_are_canonical() {
        let mut first = HashMap::new();
        first.insert("b", 2);
        first.insert("a", 1);
        let second: BTreeMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();

        assert_eq!(
            CallArgs::new().arg(first).canonical().unwrap(),
            CallArgs::new().arg(second).canonical().unwrap()
        );
    }

    #[test]
    fn test_none_and_absent_kwarg_differ() {
        let with_none = CallArgs::new().kwarg("start_date", Option::<String>::None);
        let without = CallArgs::new();

        assert_ne!(key("f", &with_none), key("f", &without));
    }

    #[test]
    fn test_tuple_keyed_maps_yield_distinct_keys() {
        let first: BTreeMap<(i32, i32), i32> = [((1, 1), 10)].into_iter().collect();
        let second: BTreeMap<(i32, i32), i32> = [((2, 2), 99)].into_iter().collect();

        assert_ne!(
            key("f", &CallArgs::new().arg(first.clone())),
            key("f", &CallArgs::new().arg(second))
        );
        assert_eq!(
            key("f", &CallArgs::new().arg(first.clone())),
            key("f", &CallArgs::new().arg(first))
        );
    }

    #[test]
    fn test_non_finite_floats_are_distinct() {
        let nan = CallArgs::new().kwarg("x", f64::NAN);
        let none = CallArgs::new().kwarg("x", Option::<f64>::None);
        let inf = CallArgs::new().kwarg("x", f64::INFINITY);
        let neg_inf = CallArgs::new().kwarg("x", f64::NEG_INFINITY);

        assert_ne!(key("f", &nan), key("f", &none));
        assert_ne!(key("f", &inf), key("f", &neg_inf));
        assert_ne!(key("f", &inf), key("f", &none));
        // Same argument, same key
        assert_eq!(key("f", &nan), key("f", &CallArgs::new().kwarg("x", f64::NAN)));
    }

    #[test]
    fn test_float_and_string_spellings_differ() {
        let float = CallArgs::new().arg(f64::NAN);
        let text = CallArgs::new().arg("NaN");

        assert_ne!(key("f", &float), key("f", &text));
    }

    #[test]
    fn test_large_unsigned_values_encode() {
        let big = CallArgs::new().arg(u64::MAX);
        let small = CallArgs::new().arg(1u64);

        assert_ne!(key("f", &big), key("f", &small));
        assert_eq!(key("f", &small), key("f", &CallArgs::new().arg(1i64)));
    }
}

//! Host-level value model.
//!
//! Inputs arrive as an untyped [`Value`]. The validator never inspects host
//! identity; it asks [`Value::value_type`] for a closed tag and dispatches on
//! that.
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::error::Error;

pub type Object = IndexMap<String, Value>;

// ------------------------------- Values ----------------------------------- //

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    /// `None` is an invalid date (a date object whose time is not a number).
    Date(Option<DateTime<Utc>>),
    Array(Vec<Value>),
    Object(Object),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    Function(FunctionValue),
    Promise(PromiseValue),
}

/// Runtime tag produced by [`Value::value_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Nan,
    Number,
    Integer,
    Float,
    Boolean,
    Date,
    BigInt,
    Function,
    Undefined,
    Null,
    Array,
    Object,
    Unknown,
    Promise,
    Void,
    Never,
    Map,
    Set,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Nan => "nan",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::BigInt => "bigint",
            ValueType::Function => "function",
            ValueType::Undefined => "undefined",
            ValueType::Null => "null",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Unknown => "unknown",
            ValueType::Promise => "promise",
            ValueType::Void => "void",
            ValueType::Never => "never",
            ValueType::Map => "map",
            ValueType::Set => "set",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Classify a value into its runtime tag. NaN is reported apart from
    /// numbers.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) if n.is_nan() => ValueType::Nan,
            Value::Number(_) => ValueType::Number,
            Value::BigInt(_) => ValueType::BigInt,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Map(_) => ValueType::Map,
            Value::Set(_) => ValueType::Set,
            Value::Function(_) => ValueType::Function,
            Value::Promise(_) => ValueType::Promise,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Member lookup on objects; anything else yields `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn date(at: DateTime<Utc>) -> Value {
        Value::Date(Some(at))
    }

    /// JSON view of the value. Undefined object members are dropped, undefined
    /// array slots and non-finite numbers become `null`, dates render as
    /// RFC 3339 strings, maps as `[key, value]` pairs.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Undefined | Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Number(n) => json_number(*n),
            Value::BigInt(i) => match i64::try_from(*i) {
                Ok(small) => J::from(small),
                Err(_) => J::String(i.to_string()),
            },
            Value::String(s) => J::String(s.clone()),
            Value::Date(Some(d)) => J::String(d.to_rfc3339()),
            Value::Date(None) => J::Null,
            Value::Array(xs) | Value::Set(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(m) => {
                let mut out = serde_json::Map::new();
                for (k, v) in m {
                    if !v.is_undefined() {
                        out.insert(k.clone(), v.to_json());
                    }
                }
                J::Object(out)
            }
            Value::Map(entries) => J::Array(
                entries
                    .iter()
                    .map(|(k, v)| J::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Value::Function(_) | Value::Promise(_) => J::Null,
        }
    }
}

fn json_number(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Strict equality: numbers compare by IEEE rules (NaN is never equal),
/// functions and promises by identity, containers structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a.is_some() && a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.call, &b.call),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce_to_string())
    }
}

// ----------------------------- Conversions -------------------------------- //

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::Array(xs)
    }
}

impl From<Object> for Value {
    fn from(m: Object) -> Self {
        Value::Object(m)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(Some(d))
    }
}

impl From<FunctionValue> for Value {
    fn from(f: FunctionValue) -> Self {
        Value::Function(f)
    }
}

impl From<PromiseValue> for Value {
    fn from(p: PromiseValue) -> Self {
        Value::Promise(p)
    }
}

impl From<Literal> for Value {
    fn from(l: Literal) -> Self {
        l.to_value()
    }
}

// ------------------------------- Coercion --------------------------------- //

impl Value {
    pub fn coerce_to_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::BigInt(i) => i.to_string(),
            Value::String(s) => s.clone(),
            Value::Date(Some(d)) => d.to_rfc3339(),
            Value::Date(None) => "Invalid Date".into(),
            Value::Array(xs) => xs
                .iter()
                .map(|x| match x {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.coerce_to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".into(),
            Value::Map(_) => "[object Map]".into(),
            Value::Set(_) => "[object Set]".into(),
            Value::Function(_) => "function".into(),
            Value::Promise(_) => "[object Promise]".into(),
        }
    }

    pub fn coerce_to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::BigInt(i) => *i as f64,
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Date(Some(d)) => d.timestamp_millis() as f64,
            Value::Date(None) => f64::NAN,
            Value::Array(xs) => match xs.as_slice() {
                [] => 0.0,
                [only] => only.coerce_to_number(),
                _ => f64::NAN,
            },
            _ => f64::NAN,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(i) => *i != 0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `None` when the value has no integral reading.
    pub fn coerce_to_bigint(&self) -> Option<i128> {
        match self {
            Value::Bool(b) => Some(i128::from(*b)),
            Value::BigInt(i) => Some(*i),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i128),
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() { Some(0) } else { t.parse::<i128>().ok() }
            }
            _ => None,
        }
    }

    pub fn coerce_to_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => *d,
            Value::Null => Utc.timestamp_millis_opt(0).single(),
            Value::Number(n) if n.is_finite() => Utc.timestamp_millis_opt(*n as i64).single(),
            Value::String(s) => parse_date_str(s.trim()),
            _ => None,
        }
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Shortest decimal rendering with integral values printed without a
/// fractional part (`5`, not `5.0`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        "0".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

// ------------------------------- Literals --------------------------------- //

/// Hashable primitive used by literal, enum and discriminator tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    BigInt(i128),
    String(String),
}

impl Literal {
    pub fn from_value(v: &Value) -> Option<Literal> {
        match v {
            Value::Undefined => Some(Literal::Undefined),
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => Some(Literal::Number(OrderedFloat(*n))),
            Value::BigInt(i) => Some(Literal::BigInt(*i)),
            Value::String(s) => Some(Literal::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(n.0),
            Literal::BigInt(i) => Value::BigInt(*i),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    pub fn value_type(&self) -> ValueType {
        self.to_value().value_type()
    }
}

/// Strings are quoted with single quotes, everything else printed bare.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Number(n) => f.write_str(&format_number(n.0)),
            other => f.write_str(&other.to_value().coerce_to_string()),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(OrderedFloat(n))
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(OrderedFloat(n as f64))
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(OrderedFloat(n as f64))
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

// --------------------------- Host callables ------------------------------- //

type HostFn = dyn Fn(Vec<Value>) -> Result<Value, Error> + Send + Sync;

/// A host function. Calls are fallible so wrapped functions can report
/// argument and return-value validation failures.
#[derive(Clone)]
pub struct FunctionValue {
    call: Arc<HostFn>,
}

impl FunctionValue {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self { call: Arc::new(f) }
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        (self.call)(args)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Function]")
    }
}

type SharedResult = Shared<BoxFuture<'static, Result<Value, Error>>>;

/// A pending computation. Cloning shares the same underlying computation.
#[derive(Clone)]
pub struct PromiseValue {
    inner: SharedResult,
}

impl PromiseValue {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        Self { inner: fut.boxed().shared() }
    }

    pub fn resolved(value: Value) -> Self {
        Self::new(futures::future::ready(Ok(value)))
    }

    pub fn rejected(error: Error) -> Self {
        Self::new(futures::future::ready(Err(error)))
    }

    pub fn resolve(&self) -> impl Future<Output = Result<Value, Error>> + Send + use<> {
        self.inner.clone()
    }
}

impl fmt::Debug for PromiseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Promise]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_nan_apart_from_numbers() {
        assert_eq!(Value::Number(f64::NAN).value_type(), ValueType::Nan);
        assert_eq!(Value::Number(1.5).value_type(), ValueType::Number);
        assert_eq!(Value::Date(None).value_type(), ValueType::Date);
        assert_eq!(Value::Map(vec![]).value_type(), ValueType::Map);
    }

    #[test]
    fn json_round_trip_drops_undefined_members() {
        let v = Value::object([("a", Value::from(1)), ("b", Value::Undefined)]);
        assert_eq!(v.to_json(), json!({"a": 1}));
        let back = Value::from(json!({"x": [1, "y", null]}));
        assert_eq!(back.get("x").and_then(Value::as_array).map(Vec::len), Some(3));
    }

    #[test]
    fn nan_is_never_equal() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::from(json!({"a": [1]})), Value::from(json!({"a": [1]})));
    }

    #[test]
    fn number_formatting_drops_integral_fraction() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn coercions_follow_host_conventions() {
        assert_eq!(Value::from(" 42 ").coerce_to_number(), 42.0);
        assert_eq!(Value::from("").coerce_to_number(), 0.0);
        assert!(Value::from("abc").coerce_to_number().is_nan());
        assert!(!Value::from("").is_truthy());
        assert_eq!(Value::from("12").coerce_to_bigint(), Some(12));
        assert_eq!(Value::from(1.5).coerce_to_bigint(), None);
        assert!(Value::from("2024-01-02").coerce_to_date().is_some());
        assert!(Value::from("nope").coerce_to_date().is_none());
        assert_eq!(Value::from(vec![Value::from(1), Value::Null]).coerce_to_string(), "1,");
    }

    #[test]
    fn literal_display_quotes_strings() {
        assert_eq!(Literal::from("a").to_string(), "'a'");
        assert_eq!(Literal::from(2).to_string(), "2");
        assert_eq!(Literal::Null.to_string(), "null");
    }
}

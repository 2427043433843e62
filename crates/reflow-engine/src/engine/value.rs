//! Cell values.
//!
//! A [`Value`] is what a cell holds once it is defined. "Undefined" is not a
//! variant: cells store `Option<Value>` and computations only fire when every
//! input is `Some`.

use rhai::{Array, Dynamic};
use serde::{Deserialize, Serialize};

/// A typed scalar or structured cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Numeric view of the value. Booleans coerce to 0/1, text and lists don't.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) | Value::List(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }

    /// Returns the first non-finite number found in this value, if any.
    pub fn non_finite(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_finite() => Some(*n),
            Value::List(items) => items.iter().find_map(Value::non_finite),
            _ => None,
        }
    }

    /// Convert to a Rhai value for script evaluation.
    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Number(n) => Dynamic::from_float(*n),
            Value::Bool(b) => Dynamic::from_bool(*b),
            Value::Text(s) => Dynamic::from(s.clone()),
            Value::List(items) => {
                let arr: Array = items.iter().map(Value::to_dynamic).collect();
                Dynamic::from_array(arr)
            }
        }
    }

    /// Convert a Rhai result back into a cell value.
    /// Integers widen to `f64`; unit and unsupported types yield `None`.
    pub fn from_dynamic(value: &Dynamic) -> Option<Value> {
        if let Ok(n) = value.as_float() {
            return Some(Value::Number(n));
        }
        if let Ok(n) = value.as_int() {
            return Some(Value::Number(n as f64));
        }
        if let Ok(b) = value.as_bool() {
            return Some(Value::Bool(b));
        }
        if value.is_string() {
            return value.clone().into_string().ok().map(Value::Text);
        }
        if value.is_array() {
            let arr = value.clone().into_array().ok()?;
            return arr
                .iter()
                .map(Value::from_dynamic)
                .collect::<Option<Vec<_>>>()
                .map(Value::List);
        }
        None
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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

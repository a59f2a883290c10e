use crate::error::DocumentError;
use serde_json::Value;
use std::fmt;
use strata_domain::constants::{BOOLEAN_VALUES, NULL_VALUE};

/// A decoded leaf value.
///
/// Stored values carry their type at the string level: a leading quote marks a string
/// (JSON escaped), `true`/`false` a boolean, `null` a null, anything else a number.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Null,
}

impl ScalarValue {
    /// Classifies a stored value. The check order is fixed: quote, boolean, null, number.
    ///
    /// # Errors
    /// Returns [`DocumentError::InvalidValue`] when an unquoted value is no finite number.
    pub fn decode(raw: &str) -> Result<Self, DocumentError> {
        if raw.starts_with('"') {
            return Ok(Self::String(decode_string(raw)));
        }
        if raw == BOOLEAN_VALUES[0] {
            return Ok(Self::Bool(true));
        }
        if raw == BOOLEAN_VALUES[1] {
            return Ok(Self::Bool(false));
        }
        if raw == NULL_VALUE {
            return Ok(Self::Null);
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Ok(Self::Integer(n));
        }
        if let Ok(n) = raw.parse::<u64>() {
            return Ok(Self::Unsigned(n));
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Self::Float(n)),
            _ => Err(DocumentError::InvalidValue {
                message: format!("{raw:?} is not a quoted string, boolean, null or number").into(),
                context: None,
            }),
        }
    }

    /// The stored form of this value; [`ScalarValue::decode`] reverses it.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::String(s) => quote(s),
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Float(n) => float_literal(*n),
            Self::Null => NULL_VALUE.to_owned(),
        }
    }

    /// Converts a JSON scalar; composites yield `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_u64().map(Self::Unsigned))
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Unsigned(n) => Value::from(*n),
            Self::Float(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Null => Value::Null,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// JSON string literal of `s`, e.g. `"say \"hi\""`.
pub(crate) fn quote(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

/// Number literal that keeps a fractional part, so `1.0` never reads back as an integer.
pub(crate) fn float_literal(n: f64) -> String {
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) || !n.is_finite() { text } else { format!("{text}.0") }
}

fn decode_string(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| {
        // Not a valid JSON literal: strip the outer quotes only.
        let inner = &raw[1..];
        inner.strip_suffix('"').unwrap_or(inner).to_owned()
    })
}

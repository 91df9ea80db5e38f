//! Conversion of a controller's scalar value into a plug's parameter type

use serde::Deserialize;

/// Parameter or field type a plug target can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Text,
}

/// A value passed to, or read from, a host member
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
        }
    }
}

/// Convert a controller value into `kind`.
///
/// Returns `None` when no argument of that kind can be produced from a number.
pub fn coerce(value: f32, kind: ValueKind) -> Option<Value> {
    match kind {
        ValueKind::Float => Some(Value::Float(value)),
        ValueKind::Int => Some(Value::Int(value as i32)),
        ValueKind::Bool => Some(Value::Bool(value > 0.5)),
        ValueKind::Text => None,
    }
}

/// Rust types usable as a host member's parameter or field type
pub trait Arg: Sized + 'static {
    const KIND: ValueKind;

    fn from_value(value: Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

impl Arg for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl Arg for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl Arg for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl Arg for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_float_is_identity() {
        assert_eq!(coerce(0.73, ValueKind::Float), Some(Value::Float(0.73)));
    }

    #[test]
    fn test_coerce_int_truncates_toward_zero() {
        assert_eq!(coerce(2.9, ValueKind::Int), Some(Value::Int(2)));
        assert_eq!(coerce(-2.9, ValueKind::Int), Some(Value::Int(-2)));
    }

    #[test]
    fn test_coerce_bool_threshold() {
        assert_eq!(coerce(0.5, ValueKind::Bool), Some(Value::Bool(false)));
        assert_eq!(coerce(0.51, ValueKind::Bool), Some(Value::Bool(true)));
        assert_eq!(coerce(0.0, ValueKind::Bool), Some(Value::Bool(false)));
    }

    #[test]
    fn test_coerce_text_is_unsupported() {
        assert_eq!(coerce(1.0, ValueKind::Text), None);
    }
}

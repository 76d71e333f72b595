//! Helpers for interpreting stored JSON values.
//!
//! The key-value facade treats a stored value as *absent* when it is falsy:
//! `null`, `false`, numeric zero (or NaN) and the empty string. Arrays and
//! objects are always truthy, even when empty.

use serde_json::{Number, Value};
use std::fmt;

use crate::error::{KvError, KvResult};

/// Runtime type of a stored value.
///
/// Arrays and objects both report [`ValueType::Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
}

impl ValueType {
    /// Returns the type of a value, or `None` for `null`.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ValueType::Boolean),
            Value::Number(_) => Some(ValueType::Number),
            Value::String(_) => Some(ValueType::String),
            Value::Array(_) | Value::Object(_) => Some(ValueType::Object),
        }
    }

    /// Returns the lowercase type name, e.g. `"number"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` unless the value is `null`, `false`, zero, NaN or `""`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric accumulation applied by `add`/`sub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulate {
    Add,
    Sub,
}

impl Accumulate {
    /// Computes `current ± delta`.
    ///
    /// Integers stay integers unless the result overflows `i64`, in which case
    /// the computation falls back to floating point.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Type`] when the result is not a finite number.
    pub fn apply(self, current: &Number, delta: &Number) -> KvResult<Number> {
        if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
            let exact = match self {
                Accumulate::Add => a.checked_add(b),
                Accumulate::Sub => a.checked_sub(b),
            };

            if let Some(result) = exact {
                return Ok(result.into());
            }
        }

        let (a, b) = match (current.as_f64(), delta.as_f64()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(KvError::mismatch("value must be a number")),
        };

        let result = match self {
            Accumulate::Add => a + b,
            Accumulate::Sub => a - b,
        };

        Number::from_f64(result).ok_or_else(|| KvError::mismatch("result is not a finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&value), "{value} should be falsy");
        }
        for value in [json!(true), json!(-1), json!(0.5), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn type_names() {
        assert_eq!(ValueType::of(&json!("a")).unwrap().to_string(), "string");
        assert_eq!(ValueType::of(&json!(1.5)).unwrap().to_string(), "number");
        assert_eq!(ValueType::of(&json!(true)).unwrap().to_string(), "boolean");
        assert_eq!(ValueType::of(&json!([1])), Some(ValueType::Object));
        assert_eq!(ValueType::of(&json!({ "a": 1 })), Some(ValueType::Object));
        assert_eq!(ValueType::of(&Value::Null), None);
    }

    #[test]
    fn integer_accumulation_stays_integral() {
        let result = Accumulate::Add.apply(&10.into(), &5.into()).unwrap();
        assert_eq!(result, Number::from(15));
        assert!(result.is_i64() || result.is_u64());

        assert_eq!(Accumulate::Sub.apply(&3.into(), &5.into()).unwrap(), Number::from(-2));
    }

    #[test]
    fn mixed_accumulation_uses_floats() {
        let half = Number::from_f64(0.5).unwrap();

        assert_eq!(Accumulate::Add.apply(&1.into(), &half).unwrap().as_f64(), Some(1.5));
        assert_eq!(
            Accumulate::Add.apply(&i64::MAX.into(), &1.into()).unwrap().as_f64(),
            Some(i64::MAX as f64 + 1.0),
        );
    }
}

//! # Type Handlers
//!
//! A [`FieldType`] is the per-type capability a field descriptor consults:
//! it converts loosely-typed raw input into canonical form, checks the
//! canonical value against the type's own rules, and produces the map-safe
//! representation for encoding.
//!
//! Nested forms and collections are not type handlers; the schema engine
//! dispatches those itself and only reaches a handler for scalar leaves.
//!
//! Handlers never see `null`: the engine treats null as "no value" and
//! resolves it against the descriptor's required flag before any handler is
//! consulted.

use std::fmt;

use serde_json::{Number, Value};

use crate::error::CoercionError;

/// Coercion, validity and encoding rules for one scalar type.
pub trait FieldType: fmt::Debug + Send + Sync {
    /// Short type name used in error detail (`"int"`, `"str"`).
    fn name(&self) -> &'static str;

    /// Convert a raw value into this type's canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] if the value cannot represent this type.
    fn coerce(&self, raw: &Value) -> Result<Value, CoercionError>;

    /// Check a canonical value against this type's own rules.
    ///
    /// Returns the failure message on rejection.
    fn check(&self, _value: &Value) -> Result<(), String> {
        Ok(())
    }

    /// Produce the map-safe representation of a value.
    ///
    /// Values built without coercion (construction, object binding) are
    /// coerced here, so the output is always canonical.
    fn encode(&self, value: &Value) -> Result<Value, CoercionError> {
        self.coerce(value)
    }
}

// ─── Integer ─────────────────────────────────────────────────────────

/// Signed 64-bit integers with optional inclusive bounds.
///
/// Accepts integer numbers, integral floats (`3.0`) and numeric strings
/// (`"3"`). Booleans are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntType {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntType {
    /// An unbounded integer type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require values `>= min`.
    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Require values `<= max`.
    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

impl FieldType for IntType {
    fn name(&self) -> &'static str {
        "int"
    }

    fn coerce(&self, raw: &Value) -> Result<Value, CoercionError> {
        let parsed = match raw {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Value::from)
            .ok_or_else(|| CoercionError::new(self.name(), raw))
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(n) = value.as_i64() else {
            return Err("must be an integer".to_string());
        };
        if let Some(min) = self.min {
            if n < min {
                return Err(format!("must be at least {min}"));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("must be at most {max}"));
            }
        }
        Ok(())
    }
}

// ─── String ──────────────────────────────────────────────────────────

/// Unicode strings with optional length bounds (counted in characters).
///
/// Numbers and booleans are stringified; arrays and objects are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrType {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StrType {
    /// An unbounded string type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least `len` characters.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Allow at most `len` characters.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }
}

impl FieldType for StrType {
    fn name(&self) -> &'static str {
        "str"
    }

    fn coerce(&self, raw: &Value) -> Result<Value, CoercionError> {
        match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(CoercionError::new(self.name(), raw)),
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(s) = value.as_str() else {
            return Err("must be a string".to_string());
        };
        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("must be at least {min} characters"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("must be at most {max} characters"));
            }
        }
        Ok(())
    }
}

// ─── Boolean ─────────────────────────────────────────────────────────

/// Booleans, also accepting `0`/`1` and the usual textual spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolType;

impl BoolType {
    /// The boolean type.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for BoolType {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn coerce(&self, raw: &Value) -> Result<Value, CoercionError> {
        let parsed = match raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| CoercionError::new(self.name(), raw))
    }
}

// ─── Float ───────────────────────────────────────────────────────────

/// Finite 64-bit floats with optional inclusive bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatType {
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatType {
    /// An unbounded float type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require values `>= min`.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Require values `<= max`.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl FieldType for FloatType {
    fn name(&self) -> &'static str {
        "float"
    }

    fn coerce(&self, raw: &Value) -> Result<Value, CoercionError> {
        let parsed = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        // JSON has no representation for NaN or infinities.
        parsed
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CoercionError::new(self.name(), raw))
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(n) = value.as_f64() else {
            return Err("must be a number".to_string());
        };
        if let Some(min) = self.min {
            if n < min {
                return Err(format!("must be at least {min}"));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("must be at most {max}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_coerces_numeric_input() {
        let t = IntType::new();
        assert_eq!(t.coerce(&json!(7)).unwrap(), json!(7));
        assert_eq!(t.coerce(&json!("1")).unwrap(), json!(1));
        assert_eq!(t.coerce(&json!(" -12 ")).unwrap(), json!(-12));
        assert_eq!(t.coerce(&json!(3.0)).unwrap(), json!(3));
    }

    #[test]
    fn test_int_rejects_non_numeric_input() {
        let t = IntType::new();
        for raw in [json!("one"), json!(1.5), json!(true), json!([1]), json!({"a": 1})] {
            let err = t.coerce(&raw).unwrap_err();
            assert_eq!(err.expected, "int", "{raw} should not coerce");
        }
    }

    #[test]
    fn test_int_rejects_floats_beyond_range() {
        let t = IntType::new();
        assert!(t.coerce(&json!(9_223_372_036_854_775_808.0)).is_err());
        assert!(t.coerce(&json!(-1e19)).is_err());
        assert_eq!(t.coerce(&json!(-9_223_372_036_854_775_808.0)).unwrap(), json!(i64::MIN));
    }

    #[test]
    fn test_int_bounds() {
        let t = IntType::new().min(0).max(10);
        assert!(t.check(&json!(0)).is_ok());
        assert!(t.check(&json!(10)).is_ok());
        assert_eq!(t.check(&json!(-3)).unwrap_err(), "must be at least 0");
        assert_eq!(t.check(&json!(11)).unwrap_err(), "must be at most 10");
    }

    #[test]
    fn test_int_encode_coerces_raw_values() {
        assert_eq!(IntType::new().encode(&json!("3")).unwrap(), json!(3));
    }

    #[test]
    fn test_str_coercion_and_bounds() {
        let t = StrType::new().min_length(2).max_length(4);
        assert_eq!(t.coerce(&json!("ab")).unwrap(), json!("ab"));
        assert_eq!(t.coerce(&json!(12)).unwrap(), json!("12"));
        assert_eq!(t.coerce(&json!(false)).unwrap(), json!("false"));
        assert!(t.coerce(&json!({"a": 1})).is_err());

        assert!(t.check(&json!("héé")).is_ok());
        assert!(t.check(&json!("a")).is_err());
        assert!(t.check(&json!("abcde")).is_err());
    }

    #[test]
    fn test_bool_coercion() {
        let t = BoolType::new();
        assert_eq!(t.coerce(&json!(true)).unwrap(), json!(true));
        assert_eq!(t.coerce(&json!("Yes")).unwrap(), json!(true));
        assert_eq!(t.coerce(&json!("0")).unwrap(), json!(false));
        assert_eq!(t.coerce(&json!(1)).unwrap(), json!(true));
        assert!(t.coerce(&json!(2)).is_err());
        assert!(t.coerce(&json!("maybe")).is_err());
    }

    #[test]
    fn test_float_coercion_and_bounds() {
        let t = FloatType::new().min(0.0).max(1.0);
        assert_eq!(t.coerce(&json!("0.25")).unwrap(), json!(0.25));
        assert_eq!(t.coerce(&json!(1)).unwrap(), json!(1.0));
        assert!(t.coerce(&json!("NaN")).is_err());
        assert!(t.coerce(&json!("inf")).is_err());
        assert!(t.check(&json!(0.5)).is_ok());
        assert!(t.check(&json!(1.5)).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        /// Numeric strings coerce to the integer they spell.
        #[test]
        fn int_string_coercion_matches_parse(n in any::<i64>()) {
            let t = IntType::new();
            prop_assert_eq!(t.coerce(&json!(n.to_string())).unwrap(), json!(n));
            prop_assert_eq!(t.coerce(&json!(n)).unwrap(), json!(n));
        }

        /// Integral floats inside the i64 range coerce without loss.
        #[test]
        fn int_integral_float_coercion_is_exact(n in -(1i64 << 53)..(1i64 << 53)) {
            let t = IntType::new();
            prop_assert_eq!(t.coerce(&json!(n as f64)).unwrap(), json!(n));
        }
    }
}

//! # Field Values
//!
//! The storage type for one field of a form instance. Scalars and any data
//! stored without conversion stay as plain JSON; decoding and object
//! binding lift nested forms and collections of them into their structured
//! variants.
//!
//! A construction-time value is stored exactly as given, so a nested-form
//! field may legitimately hold a raw JSON object until it is decoded,
//! encoded or bound.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::form::Form;

/// The current value of one form field (or extra attribute).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON. `Value::Null` means "no value".
    Value(Value),
    /// A nested form instance.
    Form(Form),
    /// A sequence of values.
    List(Vec<FieldValue>),
    /// A keyed map of values.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// The "no value" sentinel.
    pub const NULL: FieldValue = FieldValue::Value(Value::Null);

    /// Whether this is the "no value" sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// The plain JSON value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The nested form, if this is one.
    pub fn as_form(&self) -> Option<&Form> {
        match self {
            Self::Form(form) => Some(form),
            _ => None,
        }
    }

    /// Mutable access to the nested form, if this is one.
    pub fn as_form_mut(&mut self) -> Option<&mut Form> {
        match self {
            Self::Form(form) => Some(form),
            _ => None,
        }
    }

    /// The sequence elements, if this is a sequence.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The map entries, if this is a keyed map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Integer view of a plain value.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Float view of a plain value.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// String view of a plain value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Boolean view of a plain value.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Snapshot as plain JSON without any coercion.
    ///
    /// Nested forms contribute every declared field (see [`Form::to_dict`]).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Form(form) => Value::Object(form.to_dict()),
            Self::List(items) => Value::Array(items.iter().map(FieldValue::to_value).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Form> for FieldValue {
    fn from(form: Form) -> Self {
        Self::Form(form)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Value(Value::from(b))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NULL, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<BTreeMap<String, T>> for FieldValue {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

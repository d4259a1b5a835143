//! # Field Descriptors
//!
//! A [`Field`] is the static metadata for one named attribute of a form:
//! its [`FieldKind`], default, required flag and custom validators.
//!
//! ## Field kinds
//!
//! Kinds form a closed tree: a scalar leaf backed by a
//! [`FieldType`] handler, a nested form, or a sequence / keyed map of any
//! other kind. Every conversion dispatches on the kind by pattern match and
//! recurses element-wise into collections; nested forms delegate to the
//! nested schema's own decode, validate and encode.
//!
//! ## Null
//!
//! `null` is "no value" at every level. It is never handed to a type
//! handler: the descriptor resolves it against its required flag, and
//! collections treat a null element as a missing element.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use formwork_core::{CoercionError, FieldError, FieldErrors, FieldType};
use serde_json::Value;

use crate::form::{DecodeOptions, EncodeOptions, Form, FormType};
use crate::schema::SchemaRef;
use crate::value::FieldValue;

/// A custom check run after the type handler's own checks.
///
/// Receives the canonical (coerced) value and returns the failure message
/// on rejection.
pub type Validator = Arc<dyn Fn(&FieldValue) -> Result<(), String> + Send + Sync>;

/// How a descriptor produces its default.
#[derive(Clone)]
pub enum DefaultValue {
    /// A plain value, cloned on every resolution.
    Value(Value),
    /// A factory invoked on every resolution.
    Factory(Arc<dyn Fn() -> FieldValue + Send + Sync>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// ─── Field Kind ──────────────────────────────────────────────────────

/// The semantic type of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A scalar handled by a pluggable type handler.
    Scalar(Arc<dyn FieldType>),
    /// A nested form.
    Form(SchemaRef),
    /// An ordered sequence of the inner kind.
    List(Box<FieldKind>),
    /// A string-keyed map of the inner kind.
    Map(Box<FieldKind>),
}

impl FieldKind {
    /// A scalar kind backed by `handler`.
    pub fn scalar(handler: impl FieldType + 'static) -> Self {
        Self::Scalar(Arc::new(handler))
    }

    /// A nested form of type `T`.
    pub fn form<T: FormType>() -> Self {
        Self::Form(SchemaRef::of::<T>())
    }

    /// A sequence of `element`.
    pub fn list(element: FieldKind) -> Self {
        Self::List(Box::new(element))
    }

    /// A keyed map of `element`.
    pub fn map(element: FieldKind) -> Self {
        Self::Map(Box::new(element))
    }

    /// Human-readable type name (`int`, `Sub`, `list<Sub>`, `map<int>`).
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(handler) => handler.name().to_string(),
            Self::Form(schema) => schema.get().name().to_string(),
            Self::List(element) => format!("list<{}>", element.describe()),
            Self::Map(element) => format!("map<{}>", element.describe()),
        }
    }

    fn mismatch(&self, path: &str, found: &FieldValue, errors: &mut FieldErrors) {
        let detail = match found {
            FieldValue::Value(raw) => CoercionError::new(self.describe(), raw).to_string(),
            FieldValue::Form(form) => format!("expected {}, found form {}", self.describe(), form.name()),
            FieldValue::List(items) => {
                format!("expected {}, found list of {} items", self.describe(), items.len())
            }
            FieldValue::Map(entries) => {
                format!("expected {}, found map of {} entries", self.describe(), entries.len())
            }
        };
        errors.push(FieldError::invalid_type(path, detail));
    }

    /// Structural decode of untrusted input.
    ///
    /// Coercion failures are recorded against `path`; the raw value is kept
    /// in that case, but the caller discards the whole form anyway.
    pub(crate) fn decode(
        &self,
        path: &str,
        raw: &Value,
        options: &DecodeOptions,
        errors: &mut FieldErrors,
    ) -> FieldValue {
        if raw.is_null() {
            return FieldValue::NULL;
        }
        match (self, raw) {
            (Self::Scalar(handler), _) => match handler.coerce(raw) {
                Ok(value) => FieldValue::Value(value),
                Err(e) => {
                    errors.push(FieldError::invalid_type(path, e.to_string()));
                    FieldValue::Value(raw.clone())
                }
            },
            (Self::Form(schema), Value::Object(data)) => {
                let mut nested = FieldErrors::new();
                let form = Form::decode_fields(schema.get(), data, &options.nested(), &mut nested);
                errors.extend_nested(path, nested);
                FieldValue::Form(form)
            }
            (Self::List(element), Value::Array(items)) => FieldValue::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.decode_element(&format!("{path}[{i}]"), item, options, errors))
                    .collect(),
            ),
            (Self::Map(element), Value::Object(entries)) => FieldValue::Map(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let value = element.decode_element(&format!("{path}.{key}"), item, options, errors);
                        (key.clone(), value)
                    })
                    .collect(),
            ),
            _ => {
                let raw = FieldValue::Value(raw.clone());
                self.mismatch(path, &raw, errors);
                raw
            }
        }
    }

    /// A null collection element is missing whether or not decode validates.
    fn decode_element(
        &self,
        path: &str,
        raw: &Value,
        options: &DecodeOptions,
        errors: &mut FieldErrors,
    ) -> FieldValue {
        if raw.is_null() {
            errors.push(FieldError::missing(path));
            return FieldValue::NULL;
        }
        self.decode(path, raw, options, errors)
    }

    /// Type-level check of a non-null value.
    ///
    /// Returns the canonical value on success. With `recurse` unset,
    /// nested form instances are trusted as already validated (they were
    /// produced by a validating decode).
    pub(crate) fn check<'v>(
        &self,
        path: &str,
        value: &'v FieldValue,
        recurse: bool,
        errors: &mut FieldErrors,
    ) -> Option<Cow<'v, FieldValue>> {
        match (self, value) {
            (Self::Scalar(handler), FieldValue::Value(raw)) => {
                let coerced = match handler.coerce(raw) {
                    Ok(coerced) => coerced,
                    Err(e) => {
                        errors.push(FieldError::invalid_type(path, e.to_string()));
                        return None;
                    }
                };
                if let Err(message) = handler.check(&coerced) {
                    errors.push(FieldError::invalid(path, message));
                    return None;
                }
                Some(Cow::Owned(FieldValue::Value(coerced)))
            }
            (Self::Form(schema), FieldValue::Form(form)) => {
                let expected = schema.get();
                if !std::ptr::eq(form.schema(), expected) {
                    self.mismatch(path, value, errors);
                    return None;
                }
                if recurse {
                    let mut nested = FieldErrors::new();
                    form.collect_errors(&mut nested);
                    if !nested.is_empty() {
                        errors.extend_nested(path, nested);
                        return None;
                    }
                }
                Some(Cow::Borrowed(value))
            }
            (Self::Form(schema), FieldValue::Value(Value::Object(data))) => {
                let form = Form::from_map(schema.get(), data);
                let mut nested = FieldErrors::new();
                form.collect_errors(&mut nested);
                if !nested.is_empty() {
                    errors.extend_nested(path, nested);
                    return None;
                }
                Some(Cow::Owned(FieldValue::Form(form)))
            }
            (Self::List(element), FieldValue::List(items)) => {
                let before = errors.len();
                let checked: Vec<Option<Cow<'v, FieldValue>>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.check_element(&format!("{path}[{i}]"), item, recurse, errors))
                    .collect();
                if errors.len() > before {
                    return None;
                }
                if checked.iter().all(|c| matches!(c, Some(Cow::Borrowed(_)))) {
                    return Some(Cow::Borrowed(value));
                }
                Some(Cow::Owned(FieldValue::List(
                    checked.into_iter().flatten().map(Cow::into_owned).collect(),
                )))
            }
            (Self::List(element), FieldValue::Value(Value::Array(items))) => {
                let before = errors.len();
                let checked: Vec<FieldValue> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        let item = FieldValue::Value(item.clone());
                        let checked =
                            element.check_element(&format!("{path}[{i}]"), &item, recurse, errors);
                        checked.map(Cow::into_owned)
                    })
                    .collect();
                (errors.len() == before).then(|| Cow::Owned(FieldValue::List(checked)))
            }
            (Self::Map(element), FieldValue::Map(entries)) => {
                let before = errors.len();
                let checked: Vec<(String, Option<Cow<'v, FieldValue>>)> = entries
                    .iter()
                    .map(|(key, item)| {
                        let c = element.check_element(&format!("{path}.{key}"), item, recurse, errors);
                        (key.clone(), c)
                    })
                    .collect();
                if errors.len() > before {
                    return None;
                }
                if checked.iter().all(|(_, c)| matches!(c, Some(Cow::Borrowed(_)))) {
                    return Some(Cow::Borrowed(value));
                }
                Some(Cow::Owned(FieldValue::Map(
                    checked
                        .into_iter()
                        .filter_map(|(key, c)| c.map(|c| (key, c.into_owned())))
                        .collect(),
                )))
            }
            (Self::Map(element), FieldValue::Value(Value::Object(entries))) => {
                let before = errors.len();
                let checked: BTreeMap<String, FieldValue> = entries
                    .iter()
                    .filter_map(|(key, item)| {
                        let item = FieldValue::Value(item.clone());
                        let checked =
                            element.check_element(&format!("{path}.{key}"), &item, recurse, errors);
                        checked.map(|c| (key.clone(), c.into_owned()))
                    })
                    .collect();
                (errors.len() == before).then(|| Cow::Owned(FieldValue::Map(checked)))
            }
            _ => {
                self.mismatch(path, value, errors);
                None
            }
        }
    }

    fn check_element<'v>(
        &self,
        path: &str,
        value: &'v FieldValue,
        recurse: bool,
        errors: &mut FieldErrors,
    ) -> Option<Cow<'v, FieldValue>> {
        if value.is_null() {
            errors.push(FieldError::missing(path));
            return None;
        }
        self.check(path, value, recurse, errors)
    }

    /// Map-safe representation of a value. Null stays null.
    pub(crate) fn encode(
        &self,
        path: &str,
        value: &FieldValue,
        options: &EncodeOptions,
        errors: &mut FieldErrors,
    ) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match (self, value) {
            (Self::Scalar(handler), FieldValue::Value(raw)) => {
                handler.encode(raw).unwrap_or_else(|e| {
                    errors.push(FieldError::invalid_type(path, e.to_string()));
                    Value::Null
                })
            }
            (Self::Form(_), FieldValue::Form(form)) => {
                let mut nested = FieldErrors::new();
                let encoded = form.encode_fields(options, &mut nested);
                errors.extend_nested(path, nested);
                Value::Object(encoded)
            }
            (Self::Form(schema), FieldValue::Value(Value::Object(data))) => {
                let form = Form::from_map(schema.get(), data);
                let mut nested = FieldErrors::new();
                let encoded = form.encode_fields(options, &mut nested);
                errors.extend_nested(path, nested);
                Value::Object(encoded)
            }
            (Self::List(element), FieldValue::List(items)) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.encode(&format!("{path}[{i}]"), item, options, errors))
                    .collect(),
            ),
            (Self::List(element), FieldValue::Value(Value::Array(items))) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item = FieldValue::Value(item.clone());
                        element.encode(&format!("{path}[{i}]"), &item, options, errors)
                    })
                    .collect(),
            ),
            (Self::Map(element), FieldValue::Map(entries)) => Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let encoded = element.encode(&format!("{path}.{key}"), item, options, errors);
                        (key.clone(), encoded)
                    })
                    .collect(),
            ),
            (Self::Map(element), FieldValue::Value(Value::Object(entries))) => Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| {
                        let item = FieldValue::Value(item.clone());
                        let encoded = element.encode(&format!("{path}.{key}"), &item, options, errors);
                        (key.clone(), encoded)
                    })
                    .collect(),
            ),
            _ => {
                self.mismatch(path, value, errors);
                Value::Null
            }
        }
    }
}

// ─── Field ───────────────────────────────────────────────────────────

/// Static metadata for one named attribute of a form.
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    default: Option<DefaultValue>,
    required: bool,
    validators: Vec<Validator>,
}

impl Field {
    /// An optional field with no default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            validators: Vec::new(),
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default to a plain value.
    ///
    /// `Value::Null` declares an explicit "no default", which also disables
    /// the fresh-instance default of nested form fields.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Default to whatever `factory` produces, evaluated per use.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Append a custom validator.
    pub fn validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(check));
        self
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether the field is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether an absent value resolves to something other than null.
    pub fn has_default(&self) -> bool {
        match &self.default {
            Some(DefaultValue::Value(v)) => !v.is_null(),
            Some(DefaultValue::Factory(_)) => true,
            None => matches!(self.kind, FieldKind::Form(_)),
        }
    }

    /// The value an absent field takes.
    ///
    /// Nested form fields without an explicit default get a fresh empty
    /// instance of the nested form on every call.
    pub fn resolve_default(&self) -> FieldValue {
        match &self.default {
            Some(DefaultValue::Value(v)) => FieldValue::Value(v.clone()),
            Some(DefaultValue::Factory(make)) => make(),
            None => match &self.kind {
                FieldKind::Form(schema) => FieldValue::Form(Form::new(schema.get())),
                _ => FieldValue::NULL,
            },
        }
    }

    /// Convert a raw value into canonical form without business checks.
    ///
    /// # Errors
    ///
    /// Returns the structural failures (`invalid_type`, `missing` for null
    /// collection elements, and those of nested forms) keyed by this
    /// field's name.
    pub fn coerce(&self, raw: &Value) -> Result<FieldValue, FieldErrors> {
        let mut errors = FieldErrors::new();
        let options = DecodeOptions::default().with_validation(false);
        let value = self.kind.decode(&self.name, raw, &options, &mut errors);
        if errors.is_empty() {
            Ok(value)
        } else {
            Err(errors)
        }
    }

    /// Run the type checks, then each validator until the first failure.
    ///
    /// # Errors
    ///
    /// Returns every failure found, keyed by this field's name.
    pub fn check(&self, value: &FieldValue) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check_into(&self.name, value, true, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Map-safe representation of `value`.
    ///
    /// # Errors
    ///
    /// Returns the coercion failures encountered while encoding.
    pub fn encode(&self, value: &FieldValue) -> Result<Value, FieldErrors> {
        let mut errors = FieldErrors::new();
        let encoded = self
            .kind
            .encode(&self.name, value, &EncodeOptions::default(), &mut errors);
        if errors.is_empty() {
            Ok(encoded)
        } else {
            Err(errors)
        }
    }

    pub(crate) fn check_into(
        &self,
        path: &str,
        value: &FieldValue,
        recurse: bool,
        errors: &mut FieldErrors,
    ) {
        if value.is_null() {
            if self.required {
                errors.push(FieldError::missing(path));
            }
            return;
        }
        let Some(canonical) = self.kind.check(path, value, recurse, errors) else {
            return;
        };
        for validator in &self.validators {
            if let Err(message) = validator(&*canonical) {
                errors.push(FieldError::invalid(path, message));
                break;
            }
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use formwork_core::{IntType, Reason, StrType};
    use serde_json::json;
    use std::sync::OnceLock;

    struct Point;

    impl FormType for Point {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder("Point")
                    .field(Field::new("x", FieldKind::scalar(IntType::new())).required())
                    .build()
            })
        }
    }

    #[test]
    fn test_describe_kinds() {
        assert_eq!(FieldKind::scalar(IntType::new()).describe(), "int");
        assert_eq!(FieldKind::form::<Point>().describe(), "Point");
        assert_eq!(
            FieldKind::map(FieldKind::list(FieldKind::form::<Point>())).describe(),
            "map<list<Point>>"
        );
    }

    #[test]
    fn test_nested_default_is_fresh_per_resolution() {
        let field = Field::new("at", FieldKind::form::<Point>());
        assert!(field.has_default());

        let mut first = field.resolve_default();
        let second = field.resolve_default();
        first.as_form_mut().unwrap().set("x", 5);

        assert_eq!(first.as_form().unwrap().get("x"), Some(&FieldValue::from(5)));
        assert!(second.as_form().unwrap().get("x").unwrap().is_null());
    }

    #[test]
    fn test_explicit_null_default_disables_nested_default() {
        let field = Field::new("at", FieldKind::form::<Point>()).default_value(Value::Null);
        assert!(!field.has_default());
        assert!(field.resolve_default().is_null());
    }

    #[test]
    fn test_factory_default_invoked_per_use() {
        let field = Field::new("tags", FieldKind::list(FieldKind::scalar(StrType::new())))
            .default_with(|| FieldValue::List(Vec::new()));
        assert!(field.has_default());
        assert_eq!(field.resolve_default(), FieldValue::List(Vec::new()));
    }

    #[test]
    fn test_coerce_reports_invalid_type() {
        let field = Field::new("index", FieldKind::scalar(IntType::new()));
        assert_eq!(field.coerce(&json!("12")).unwrap(), FieldValue::from(12));
        let errors = field.coerce(&json!("twelve")).unwrap_err();
        assert_eq!(errors.reasons("index"), vec![&Reason::InvalidType]);
    }

    #[test]
    fn test_check_stops_at_first_failing_validator() {
        let field = Field::new("name", FieldKind::scalar(StrType::new()))
            .validator(|v| match v.as_str() {
                Some(s) if s.starts_with('a') => Ok(()),
                _ => Err("must start with a".to_string()),
            })
            .validator(|_| Err("second check".to_string()));

        let errors = field.check(&FieldValue::from("bob")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.reasons("name"), vec![&Reason::Invalid("must start with a".into())]);

        let errors = field.check(&FieldValue::from("abe")).unwrap_err();
        assert_eq!(errors.reasons("name"), vec![&Reason::Invalid("second check".into())]);
    }

    #[test]
    fn test_validators_see_coerced_value() {
        let field = Field::new("count", FieldKind::scalar(IntType::new())).validator(|v| {
            if v.as_i64().is_some() {
                Ok(())
            } else {
                Err("not coerced".to_string())
            }
        });
        assert!(field.check(&FieldValue::from("7")).is_ok());
    }

    #[test]
    fn test_check_required_null_is_missing() {
        let field = Field::new("x", FieldKind::scalar(IntType::new())).required();
        let errors = field.check(&FieldValue::NULL).unwrap_err();
        assert_eq!(errors.reasons("x"), vec![&Reason::Missing]);

        let optional = Field::new("y", FieldKind::scalar(IntType::new()));
        assert!(optional.check(&FieldValue::NULL).is_ok());
    }

    #[test]
    fn test_collection_element_paths() {
        let field = Field::new("points", FieldKind::list(FieldKind::form::<Point>()));
        let errors = field
            .coerce(&json!([{"x": 1}, {"x": "bad"}, {"y": 2}]))
            .unwrap_err();
        assert_eq!(errors.reasons("points[1].x"), vec![&Reason::InvalidType]);
        assert!(errors.contains("points[2].y"));
        assert!(errors.contains("points[2].x"));
    }

    #[test]
    fn test_coerce_reports_null_elements_missing() {
        let field = Field::new("counts", FieldKind::list(FieldKind::scalar(IntType::new())));
        let errors = field.coerce(&json!([1, null, "3"])).unwrap_err();
        assert_eq!(errors.reasons("counts[1]"), vec![&Reason::Missing]);
        assert_eq!(errors.len(), 1);

        let field = Field::new("counts", FieldKind::map(FieldKind::scalar(IntType::new())));
        let errors = field.coerce(&json!({"a": null})).unwrap_err();
        assert_eq!(errors.reasons("counts.a"), vec![&Reason::Missing]);
    }

    #[test]
    fn test_encode_coerces_raw_collection_values() {
        let field = Field::new("counts", FieldKind::map(FieldKind::scalar(IntType::new())));
        let encoded = field.encode(&FieldValue::from(json!({"a": "1", "b": 2}))).unwrap();
        assert_eq!(encoded, json!({"a": 1, "b": 2}));
    }
}

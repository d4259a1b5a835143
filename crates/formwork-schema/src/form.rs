//! # Form Instances
//!
//! A [`Form`] is one value of a form type: the current value of every
//! declared field, in declared order, plus a side map of extra attributes
//! the schema does not understand.
//!
//! ## Lifecycle
//!
//! - **Construction** ([`Form::new`], [`Form::with_values`]) is permissive:
//!   values are stored as given, never coerced or validated.
//! - **Decode** ([`Form::decode`]) coerces untrusted input and, unless
//!   disabled, validates it. It is atomic: any failure rejects the whole
//!   input with one aggregated [`ValidationError`].
//! - **Validate** ([`Form::validate`]) re-checks the current values.
//! - **Encode** ([`Form::encode`]) produces the map-safe output of declared
//!   fields; [`Form::to_dict`] snapshots the full current state.
//!
//! Object binding lives in [`crate::bind`].

use std::collections::BTreeMap;
use std::fmt;

use formwork_core::{AttrObject, FieldError, FieldErrors, ValidationError};
use serde_json::{Map, Value};

use crate::field::Field;
use crate::schema::{ExtraFields, Schema};
use crate::value::FieldValue;

/// A statically registered form type.
///
/// Implementors only provide [`schema`](FormType::schema), typically backed
/// by a `OnceLock<Schema>`; every conversion is provided.
pub trait FormType {
    /// The form type's descriptor table.
    fn schema() -> &'static Schema;

    /// An instance with every field at its default.
    fn new() -> Form {
        Form::new(Self::schema())
    }

    /// Construct from keyword values (see [`Form::with_values`]).
    fn with_values<I, K, V>(values: I) -> Form
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Form::with_values(Self::schema(), values)
    }

    /// Decode untrusted input with default options.
    ///
    /// An absent form-typed field defaults to a fresh instance of its form,
    /// and that instance is validated like input: its required fields
    /// report as `missing` under the field's path. Declare the field with
    /// `.default_value(Value::Null)` when an absent sub-form should pass.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`ValidationError`] naming every failing field.
    fn decode(data: &Map<String, Value>) -> Result<Form, ValidationError> {
        Form::decode(Self::schema(), data, &DecodeOptions::default())
    }

    /// Decode untrusted input with explicit options.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`ValidationError`] naming every failing field.
    fn decode_with(data: &Map<String, Value>, options: &DecodeOptions) -> Result<Form, ValidationError> {
        Form::decode(Self::schema(), data, options)
    }

    /// Copy declared attributes off a plain object (see [`Form::from_obj`]).
    fn from_obj(obj: &dyn AttrObject) -> Form {
        Form::from_obj(Self::schema(), obj)
    }
}

// ─── Options ─────────────────────────────────────────────────────────

/// Per-call decode configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Run business-rule checks. Structural checks always run.
    pub validate: bool,
    /// Unknown-field policy for this call; `None` uses the schema's option.
    pub extra: Option<ExtraFields>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            extra: None,
        }
    }
}

impl DecodeOptions {
    /// Enable or disable business-rule checks.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Override the unknown-field policy for this call.
    pub fn with_extra(mut self, policy: impl Into<ExtraFields>) -> Self {
        self.extra = Some(policy.into());
        self
    }

    /// Options for decoding a nested form: the validation flag carries
    /// over, the unknown-field policy reverts to the nested schema's own.
    pub(crate) fn nested(&self) -> Self {
        Self {
            validate: self.validate,
            extra: None,
        }
    }
}

/// Per-call encode configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit null-valued fields instead of omitting them.
    pub include_none: bool,
    /// Validate before encoding.
    pub validate: bool,
}

impl EncodeOptions {
    /// Emit or omit null-valued fields.
    pub fn with_include_none(mut self, include_none: bool) -> Self {
        self.include_none = include_none;
        self
    }

    /// Validate before encoding.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

// ─── Form ────────────────────────────────────────────────────────────

/// One instance of a form type.
#[derive(Clone)]
pub struct Form {
    pub(crate) schema: &'static Schema,
    pub(crate) attrs: Vec<FieldValue>,
    pub(crate) extras: BTreeMap<String, FieldValue>,
}

impl Form {
    /// An instance with every field at its resolved default.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            attrs: schema.fields().iter().map(Field::resolve_default).collect(),
            extras: BTreeMap::new(),
        }
    }

    /// Construct from keyword values.
    ///
    /// Declared names are stored as given (no coercion, no validation);
    /// undeclared names become extra attributes. Fields not named keep
    /// their defaults.
    pub fn with_values<I, K, V>(schema: &'static Schema, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut form = Self::new(schema);
        for (name, value) in values {
            form.set(name, value);
        }
        form
    }

    /// Construct from a raw map with the same permissive rules as
    /// [`with_values`](Self::with_values).
    pub fn from_map(schema: &'static Schema, data: &Map<String, Value>) -> Self {
        Self::with_values(schema, data.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    pub(crate) fn from_parts(schema: &'static Schema, attrs: Vec<FieldValue>) -> Self {
        Self {
            schema,
            attrs,
            extras: BTreeMap::new(),
        }
    }

    /// The form type's schema.
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// The form type's name.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Read a declared field or, failing that, an extra attribute.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        match self.schema.position(name) {
            Some(i) => self.attrs.get(i),
            None => self.extras.get(name),
        }
    }

    /// Mutable access to a declared field or extra attribute.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        match self.schema.position(name) {
            Some(i) => self.attrs.get_mut(i),
            None => self.extras.get_mut(name),
        }
    }

    /// Assign a field (or, for undeclared names, an extra attribute) as-is.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.schema.position(&name) {
            Some(i) => {
                if let Some(slot) = self.attrs.get_mut(i) {
                    *slot = value;
                }
            }
            None => {
                self.extras.insert(name, value);
            }
        }
    }

    /// Read an extra attribute.
    pub fn extra(&self, name: &str) -> Option<&FieldValue> {
        self.extras.get(name)
    }

    /// All extra attributes.
    pub fn extras(&self) -> &BTreeMap<String, FieldValue> {
        &self.extras
    }

    /// Declared fields and their current values, in declared order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.schema
            .fields()
            .iter()
            .map(Field::name)
            .zip(self.attrs.iter())
    }

    fn fields(&self) -> impl Iterator<Item = (&'static Field, &FieldValue)> {
        self.schema.fields().iter().zip(self.attrs.iter())
    }

    /// Decode untrusted input.
    ///
    /// Every declared field is coerced from `data` or resolved to its
    /// default; a required field that ends up null is `missing`. Business
    /// checks run when `options.validate` is set. Unknown keys follow the
    /// call's or the schema's [`ExtraFields`] policy.
    ///
    /// Defaults are validated too, including the fresh instance an absent
    /// form-typed field receives. A null element inside a list or map is
    /// `missing` even with validation off.
    ///
    /// # Errors
    ///
    /// Returns one [`ValidationError`] listing every failing field; no
    /// partially decoded instance is returned.
    pub fn decode(
        schema: &'static Schema,
        data: &Map<String, Value>,
        options: &DecodeOptions,
    ) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::new();
        let form = Self::decode_fields(schema, data, options, &mut errors);
        if errors.is_empty() {
            tracing::trace!(form = schema.name(), "form decoded");
            return Ok(form);
        }
        tracing::debug!(
            form = schema.name(),
            failures = errors.len(),
            validate = options.validate,
            "form decode rejected"
        );
        Err(ValidationError {
            form: schema.name().to_string(),
            errors,
        })
    }

    pub(crate) fn decode_fields(
        schema: &'static Schema,
        data: &Map<String, Value>,
        options: &DecodeOptions,
        errors: &mut FieldErrors,
    ) -> Self {
        let mut attrs = Vec::with_capacity(schema.len());
        for field in schema.fields() {
            let name = field.name();
            let before = errors.len();
            let (value, from_input) = match data.get(name) {
                Some(raw) => (field.kind().decode(name, raw, options, errors), true),
                None => (field.resolve_default(), false),
            };
            if value.is_null() {
                if field.is_required() {
                    errors.push(FieldError::missing(name));
                }
            } else if options.validate && errors.len() == before {
                // Input-decoded nested forms were validated while decoding.
                field.check_into(name, &value, !from_input, errors);
            }
            attrs.push(value);
        }

        let policy = options.extra.as_ref().unwrap_or(&schema.options().extra);
        let mut extras = BTreeMap::new();
        for (key, raw) in data {
            if schema.declares(key) {
                continue;
            }
            if policy.accepts(key) {
                extras.insert(key.clone(), FieldValue::Value(raw.clone()));
            } else {
                errors.push(FieldError::unexpected(key.as_str()));
            }
        }

        Self {
            schema,
            attrs,
            extras,
        }
    }

    /// Check every declared field against its descriptor.
    ///
    /// Never mutates the instance.
    ///
    /// # Errors
    ///
    /// Returns one [`ValidationError`] listing every failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        self.collect_errors(&mut errors);
        errors.into_result(self.schema.name())
    }

    pub(crate) fn collect_errors(&self, errors: &mut FieldErrors) {
        for (field, value) in self.fields() {
            field.check_into(field.name(), value, true, errors);
        }
    }

    /// Encode declared fields, omitting null-valued ones.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a stored value cannot be coerced to
    /// its declared type.
    pub fn encode(&self) -> Result<Map<String, Value>, ValidationError> {
        self.encode_with(&EncodeOptions::default())
    }

    /// Encode declared fields in declared order.
    ///
    /// Extra attributes are never emitted. With `include_none` unset,
    /// null-valued fields are omitted at every nesting level.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `options.validate` is set and the
    /// instance is invalid, or if a stored value cannot be coerced.
    pub fn encode_with(&self, options: &EncodeOptions) -> Result<Map<String, Value>, ValidationError> {
        if options.validate {
            self.validate()?;
        }
        let mut errors = FieldErrors::new();
        let encoded = self.encode_fields(options, &mut errors);
        errors.into_result(self.schema.name())?;
        Ok(encoded)
    }

    pub(crate) fn encode_fields(&self, options: &EncodeOptions, errors: &mut FieldErrors) -> Map<String, Value> {
        let mut out = Map::new();
        for (field, value) in self.fields() {
            if value.is_null() && !options.include_none {
                continue;
            }
            let encoded = field.kind().encode(field.name(), value, options, errors);
            out.insert(field.name().to_string(), encoded);
        }
        out
    }

    /// Snapshot every declared field as plain JSON.
    ///
    /// Unlike [`encode`](Self::encode) nothing is omitted or coerced: the
    /// output is the instance's current state, with nested forms expanded
    /// the same way.
    pub fn to_dict(&self) -> Map<String, Value> {
        self.attrs()
            .map(|(name, value)| (name.to_string(), value.to_value()))
            .collect()
    }
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.attrs == other.attrs && self.extras == other.extras
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.attrs() {
            s.field(name, value);
        }
        if !self.extras.is_empty() {
            s.field("extras", &self.extras);
        }
        s.finish()
    }
}

//! # Error Types: Aggregated Validation Failures
//!
//! Every failure formwork reports is a [`FieldError`]: the path of the
//! offending field plus a machine-readable [`Reason`]. Failures are
//! collected into [`FieldErrors`] across every field of a form (and every
//! nested form) and surfaced once as a single [`ValidationError`].
//!
//! ## Paths
//!
//! Nested failures carry dotted paths built by the schema engine:
//! `sub.name` for a nested form, `subs[1].name` for a sequence element,
//! `subs.one.name` for a keyed-map entry.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Why a field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// A required field is absent (or explicitly null).
    Missing,
    /// The raw value cannot be coerced to the declared type.
    InvalidType,
    /// The input carries a key the form does not declare.
    UnexpectedField,
    /// A type predicate or custom validator rejected the value.
    Invalid(String),
}

impl Reason {
    /// The short machine-readable tag for this reason.
    ///
    /// Validator failures use the validator's own message as the tag.
    pub fn tag(&self) -> &str {
        match self {
            Self::Missing => "missing",
            Self::InvalidType => "invalid_type",
            Self::UnexpectedField => "unexpected_field",
            Self::Invalid(message) => message,
        }
    }

    /// Whether this is a shape problem rather than a business-rule failure.
    ///
    /// Structural failures are reported even when validation is disabled.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single field failure with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path to the failing field, relative to the form that reported it.
    pub field: String,
    /// Machine-readable reason.
    pub reason: Reason,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

impl FieldError {
    /// Create a failure without detail.
    pub fn new(field: impl Into<String>, reason: Reason) -> Self {
        Self {
            field: field.into(),
            reason,
            detail: None,
        }
    }

    /// A required field is absent.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, Reason::Missing)
    }

    /// A value could not be coerced.
    pub fn invalid_type(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(field, Reason::InvalidType).with_detail(detail)
    }

    /// An undeclared key was present in the input.
    pub fn unexpected(field: impl Into<String>) -> Self {
        Self::new(field, Reason::UnexpectedField)
    }

    /// A predicate or validator rejected the value.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, Reason::Invalid(message.into()))
    }

    /// Attach human-readable detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() {
            "(root)"
        } else {
            self.field.as_str()
        };
        write!(f, "  {field}: {}", self.reason)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Ordered collection of field failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Absorb failures reported by a nested form, prefixing each path.
    pub fn extend_nested(&mut self, prefix: &str, nested: FieldErrors) {
        self.errors.extend(nested.errors.into_iter().map(|mut e| {
            e.field = if e.field.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{}", e.field)
            };
            e
        }));
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no failures.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the failures in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Returns a slice of all failures.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether any failure names `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// The reasons recorded against `field`.
    pub fn reasons(&self, field: &str) -> Vec<&Reason> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| &e.reason)
            .collect()
    }

    /// The distinct failing field paths, in first-seen order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for e in &self.errors {
            if !fields.contains(&e.field.as_str()) {
                fields.push(&e.field);
            }
        }
        fields
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<FieldError> {
        self.errors
    }

    /// `Ok(())` when empty, otherwise the aggregated error for `form`.
    pub fn into_result(self, form: &str) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                form: form.to_string(),
                errors: self,
            })
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// The single aggregated error raised by decode, validate and encode.
///
/// Lists every failing field of the form, never just the first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed for form '{form}':\n{errors}")]
pub struct ValidationError {
    /// Name of the form that was checked.
    pub form: String,
    /// Every failure, in declared-field order.
    pub errors: FieldErrors,
}

impl ValidationError {
    /// The recorded failures.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether any failure names `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    /// Consumes self and returns the failures.
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

/// A raw value could not be converted by a type handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct CoercionError {
    /// Name of the type that was expected.
    pub expected: String,
    /// Short description of the value that was found.
    pub found: String,
}

impl CoercionError {
    /// Describe why `raw` is not a valid `expected`.
    pub fn new(expected: impl Into<String>, raw: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: describe(raw),
        }
    }
}

fn describe(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(map) => format!("object with {} keys", map.len()),
    }
}

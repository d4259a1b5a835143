//! # Schema Documents
//!
//! Declares form schemas in YAML or JSON instead of Rust code and loads
//! them into a [`SchemaRegistry`].
//!
//! ```yaml
//! forms:
//!   - name: Sub
//!     fields:
//!       - { name: name, type: str, required: true }
//!   - name: Top
//!     options: { extra: allow }
//!     fields:
//!       - { name: sub, type: Sub }
//!       - { name: subs, type: { list: Sub } }
//!       - { name: index, type: int, required: true, min: 0 }
//! ```
//!
//! Scalar type names are `int`/`integer`, `str`/`string`, `bool`/`boolean`
//! and `float`/`number`; any other name refers to a form declared in the
//! same document. Forms may appear in any order.
//!
//! A form may refer to itself or to forms that refer back to it, as long
//! as every loop passes through a field whose default is null: a list or
//! map element, or a nested form declared with `default: null`. Loops
//! through parents or through nested forms that default to a fresh
//! instance are rejected as [`SchemaLoadError::Cycle`].
//!
//! Loaded schemas live for the rest of the process, like statically
//! registered ones.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use formwork_core::{BoolType, FloatType, IntType, StrType};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::field::{Field, FieldKind};
use crate::schema::{OptionOverrides, Schema, SchemaRef};

/// Error loading a schema document.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The document file could not be read.
    #[error("cannot read schema document '{path}': {source}")]
    Io {
        /// Path of the document.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The document is not valid YAML/JSON or does not have the expected shape.
    #[error("invalid {format} schema document: {reason}")]
    Parse {
        /// `"YAML"` or `"JSON"`.
        format: &'static str,
        /// Parser message.
        reason: String,
    },

    /// Two forms share a name.
    #[error("form '{0}' is declared more than once")]
    DuplicateForm(String),

    /// A field names a type that is neither a scalar nor a declared form.
    #[error("field '{form}.{field}' has unknown type '{type_name}'")]
    UnknownType {
        /// Declaring form.
        form: String,
        /// Field name.
        field: String,
        /// The unresolved type name.
        type_name: String,
    },

    /// A form extends a form that is not declared.
    #[error("form '{form}' extends unknown form '{parent}'")]
    UnknownParent {
        /// Declaring form.
        form: String,
        /// The unresolved parent name.
        parent: String,
    },

    /// Forms inherit from, or default-construct, each other in a cycle.
    #[error("cyclic form definitions: {}", chain.join(" -> "))]
    Cycle {
        /// The forms on the cycle, first one repeated at the end.
        chain: Vec<String>,
    },

    /// A constraint does not fit the field's type.
    #[error("field '{form}.{field}': {reason}")]
    InvalidConstraint {
        /// Declaring form.
        form: String,
        /// Field name.
        field: String,
        /// What is wrong with the constraint.
        reason: String,
    },
}

// ─── Document Model ──────────────────────────────────────────────────

/// A document declaring any number of forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Form declarations.
    #[serde(default)]
    pub forms: Vec<FormDocument>,
}

/// One form declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDocument {
    /// Form type name.
    pub name: String,
    /// Parent form name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Local option overrides.
    #[serde(default)]
    pub options: OptionOverrides,
    /// Field declarations in order.
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

/// One field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    /// Field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub kind: KindDocument,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Default value. An explicit `null` disables nested-form defaults.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Lower bound for `int` and `float`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    /// Upper bound for `int` and `float`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    /// Minimum length for `str`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length for `str`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// A field type: a scalar or form name, or a collection of another type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindDocument {
    /// A scalar type name or a form name.
    Named(String),
    /// `{ list: <type> }`
    List {
        /// Element type.
        list: Box<KindDocument>,
    },
    /// `{ map: <type> }`
    Map {
        /// Value type.
        map: Box<KindDocument>,
    },
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SchemaDocument {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::Parse`] for malformed input.
    pub fn from_yaml_str(source: &str) -> Result<Self, SchemaLoadError> {
        serde_yaml::from_str(source).map_err(|e| SchemaLoadError::Parse {
            format: "YAML",
            reason: e.to_string(),
        })
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::Parse`] for malformed input.
    pub fn from_json_str(source: &str) -> Result<Self, SchemaLoadError> {
        serde_json::from_str(source).map_err(|e| SchemaLoadError::Parse {
            format: "JSON",
            reason: e.to_string(),
        })
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Schemas loaded from a document, by form name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<&'static Schema>,
}

impl SchemaRegistry {
    /// Load a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaLoadError`] if the document cannot be parsed or
    /// its forms cannot be resolved.
    pub fn from_yaml_str(source: &str) -> Result<Self, SchemaLoadError> {
        Self::from_document(&SchemaDocument::from_yaml_str(source)?)
    }

    /// Load a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaLoadError`] if the document cannot be parsed or
    /// its forms cannot be resolved.
    pub fn from_json_str(source: &str) -> Result<Self, SchemaLoadError> {
        Self::from_document(&SchemaDocument::from_json_str(source)?)
    }

    /// Load a document file; `.yaml`/`.yml` is read as YAML, anything else
    /// as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaLoadError`] if the file cannot be read or loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let registry = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&source)?,
            _ => Self::from_json_str(&source)?,
        };
        tracing::debug!(path = %path.display(), forms = registry.len(), "schema document loaded");
        Ok(registry)
    }

    /// Build every form declared in `document`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaLoadError`] for duplicate names, unknown types or
    /// parents, cycles, and constraints that do not fit their type.
    pub fn from_document(document: &SchemaDocument) -> Result<Self, SchemaLoadError> {
        let mut declared = HashMap::new();
        for form in &document.forms {
            let slot: &'static OnceLock<Schema> = Box::leak(Box::new(OnceLock::new()));
            if declared.insert(form.name.as_str(), (form, slot)).is_some() {
                return Err(SchemaLoadError::DuplicateForm(form.name.clone()));
            }
        }

        let mut resolver = Resolver {
            declared,
            stack: Vec::new(),
        };
        let schemas = document
            .forms
            .iter()
            .map(|form| resolver.resolve(&form.name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { schemas })
    }

    /// Look up a form by name.
    pub fn get(&self, name: &str) -> Option<&'static Schema> {
        self.schemas.iter().copied().find(|s| s.name() == name)
    }

    /// Form names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.schemas.iter().map(|s| s.name()).collect()
    }

    /// Schemas in declaration order.
    pub fn schemas(&self) -> &[&'static Schema] {
        &self.schemas
    }

    /// Returns the number of forms.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if no forms were declared.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Builds declared forms depth-first. Each form owns a leaked slot up
/// front so null-defaulted references can point at it before it is built.
struct Resolver<'d> {
    declared: HashMap<&'d str, (&'d FormDocument, &'static OnceLock<Schema>)>,
    stack: Vec<String>,
}

impl<'d> Resolver<'d> {
    fn resolve(&mut self, name: &str) -> Result<&'static Schema, SchemaLoadError> {
        let Some((doc, slot)) = self.declared.get(name).copied() else {
            return Err(SchemaLoadError::UnknownParent {
                form: self.stack.last().cloned().unwrap_or_default(),
                parent: name.to_string(),
            });
        };
        if let Some(schema) = slot.get() {
            return Ok(schema);
        }
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(name.to_string());
            return Err(SchemaLoadError::Cycle { chain });
        }

        self.stack.push(name.to_string());
        let mut builder = Schema::builder(&doc.name);
        if let Some(parent) = &doc.extends {
            if !self.declared.contains_key(parent.as_str()) {
                return Err(SchemaLoadError::UnknownParent {
                    form: doc.name.clone(),
                    parent: parent.clone(),
                });
            }
            builder = builder.extends(self.resolve(parent)?);
        }
        for field in &doc.fields {
            let kind = self.kind(doc, field, &field.kind, true)?;
            builder = builder.field(build_field(field, kind));
        }
        let schema = builder.overrides(doc.options.clone()).build();
        self.stack.pop();
        Ok(slot.get_or_init(|| schema))
    }

    /// Resolve a field type. `direct` is set for the field's own type and
    /// cleared for collection elements.
    fn kind(
        &mut self,
        form: &FormDocument,
        field: &FieldDocument,
        kind: &KindDocument,
        direct: bool,
    ) -> Result<FieldKind, SchemaLoadError> {
        match kind {
            KindDocument::List { list } => Ok(FieldKind::list(self.kind(form, field, list, false)?)),
            KindDocument::Map { map } => Ok(FieldKind::map(self.kind(form, field, map, false)?)),
            KindDocument::Named(name) => {
                if let Some(scalar) = scalar_kind(form, field, name)? {
                    return Ok(scalar);
                }
                let Some((_, slot)) = self.declared.get(name.as_str()).copied() else {
                    return Err(SchemaLoadError::UnknownType {
                        form: form.name.clone(),
                        field: field.name.clone(),
                        type_name: name.clone(),
                    });
                };
                // A non-null default builds the nested form whenever the
                // field is absent, so the reference must not loop back.
                let builds_default = match &field.default {
                    Some(default) => !default.is_null(),
                    None => direct,
                };
                if builds_default {
                    Ok(FieldKind::Form(SchemaRef::fixed(self.resolve(name)?)))
                } else {
                    Ok(FieldKind::Form(SchemaRef::slot(slot)))
                }
            }
        }
    }
}

fn build_field(doc: &FieldDocument, kind: FieldKind) -> Field {
    let mut field = Field::new(&doc.name, kind);
    if doc.required {
        field = field.required();
    }
    if let Some(default) = &doc.default {
        field = field.default_value(default.clone());
    }
    field
}

fn scalar_kind(
    form: &FormDocument,
    field: &FieldDocument,
    name: &str,
) -> Result<Option<FieldKind>, SchemaLoadError> {
    let constraint = |reason: String| SchemaLoadError::InvalidConstraint {
        form: form.name.clone(),
        field: field.name.clone(),
        reason,
    };
    let int_bound = |bound: &Option<Number>, which: &str| -> Result<Option<i64>, SchemaLoadError> {
        match bound {
            None => Ok(None),
            Some(n) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| constraint(format!("{which} must be an integer, got {n}"))),
        }
    };
    let has_bounds = field.min.is_some() || field.max.is_some();
    let has_lengths = field.min_length.is_some() || field.max_length.is_some();

    let kind = match name {
        "int" | "integer" => {
            if has_lengths {
                return Err(constraint("length bounds apply to strings only".to_string()));
            }
            let mut handler = IntType::new();
            if let Some(min) = int_bound(&field.min, "min")? {
                handler = handler.min(min);
            }
            if let Some(max) = int_bound(&field.max, "max")? {
                handler = handler.max(max);
            }
            FieldKind::scalar(handler)
        }
        "float" | "number" => {
            if has_lengths {
                return Err(constraint("length bounds apply to strings only".to_string()));
            }
            let mut handler = FloatType::new();
            if let Some(min) = field.min.as_ref().and_then(Number::as_f64) {
                handler = handler.min(min);
            }
            if let Some(max) = field.max.as_ref().and_then(Number::as_f64) {
                handler = handler.max(max);
            }
            FieldKind::scalar(handler)
        }
        "str" | "string" => {
            if has_bounds {
                return Err(constraint("min/max apply to numbers only".to_string()));
            }
            let mut handler = StrType::new();
            if let Some(len) = field.min_length {
                handler = handler.min_length(len);
            }
            if let Some(len) = field.max_length {
                handler = handler.max_length(len);
            }
            FieldKind::scalar(handler)
        }
        "bool" | "boolean" => {
            if has_bounds || has_lengths {
                return Err(constraint("booleans take no bounds".to_string()));
            }
            FieldKind::scalar(BoolType::new())
        }
        _ => return Ok(None),
    };
    Ok(Some(kind))
}

//! # Schema Definitions
//!
//! A [`Schema`] is the immutable, process-wide metadata of one form type:
//! its ordered field descriptors and its resolved [`SchemaOptions`]. It is
//! built once with [`SchemaBuilder`] and read-only afterwards, so a
//! `&'static Schema` can be shared freely across threads.
//!
//! ## Inheritance
//!
//! A builder may extend a parent schema. The child starts from the
//! parent's descriptors (in the parent's order) and its own declarations
//! replace same-named parent fields in place; new names are appended.
//! Options merge the same way: the parent's resolved options with the
//! child's overrides on top.
//!
//! ## Static registration
//!
//! ```
//! use std::sync::OnceLock;
//! use formwork_core::IntType;
//! use formwork_schema::{Field, FieldKind, FormType, Schema};
//!
//! struct Counter;
//!
//! impl FormType for Counter {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("Counter")
//!                 .field(Field::new("count", FieldKind::scalar(IntType::new())).required())
//!                 .build()
//!         })
//!     }
//! }
//!
//! assert_eq!(Counter::schema().len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::Field;
use crate::form::FormType;

// ─── Options ─────────────────────────────────────────────────────────

/// Policy for input keys that match no declared field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraFields {
    /// Every unknown key is an `unexpected_field` error.
    #[default]
    Reject,
    /// Unknown keys are accepted and kept as extra attributes.
    Allow,
    /// Only the listed keys are accepted as extras; others are errors.
    Only(BTreeSet<String>),
}

impl ExtraFields {
    /// Whitelist policy from any collection of names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Whether an unknown key may be kept as an extra attribute.
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            Self::Reject => false,
            Self::Allow => true,
            Self::Only(names) => names.contains(key),
        }
    }
}

impl From<bool> for ExtraFields {
    fn from(allow: bool) -> Self {
        if allow {
            Self::Allow
        } else {
            Self::Reject
        }
    }
}

/// Resolved, immutable configuration of a schema type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaOptions {
    /// Unknown-field policy used by decode unless the call overrides it.
    pub extra: ExtraFields,
    /// Free-form named options.
    #[serde(flatten)]
    pub custom: BTreeMap<String, Value>,
}

impl SchemaOptions {
    /// Look up a free-form option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// These options with `overrides` applied on top.
    pub fn merged(&self, overrides: &OptionOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(extra) = &overrides.extra {
            merged.extra = extra.clone();
        }
        merged
            .custom
            .extend(overrides.custom.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Option values declared locally by one schema type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionOverrides {
    /// Local unknown-field policy, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<ExtraFields>,
    /// Local free-form options.
    #[serde(flatten)]
    pub custom: BTreeMap<String, Value>,
}

// ─── Schema ──────────────────────────────────────────────────────────

/// The descriptor table and options of one form type.
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    options: SchemaOptions,
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The form type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptors in declared order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a descriptor by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Declared position of a field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Whether `name` is a declared field.
    pub fn declares(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(Field::name).collect()
    }

    /// Returns the number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The resolved options.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("options", &self.options)
            .finish()
    }
}

/// A reference from a field to the schema of a nested form.
///
/// Lazy references resolve through the form type's registration function,
/// which lets schemas refer to each other (or themselves) regardless of
/// initialization order. Slot references do the same for schemas loaded
/// from documents; the registry fills every slot before handing out any
/// schema.
#[derive(Clone, Copy)]
pub struct SchemaRef(Source);

#[derive(Clone, Copy)]
enum Source {
    Lazy(fn() -> &'static Schema),
    Fixed(&'static Schema),
    Slot(&'static OnceLock<Schema>),
}

impl SchemaRef {
    /// Refer to a statically registered form type.
    pub fn of<T: FormType>() -> Self {
        Self(Source::Lazy(T::schema))
    }

    /// Refer to an already-built schema.
    pub fn fixed(schema: &'static Schema) -> Self {
        Self(Source::Fixed(schema))
    }

    /// Refer to a schema that is filled in once its declaration is built.
    pub(crate) fn slot(slot: &'static OnceLock<Schema>) -> Self {
        Self(Source::Slot(slot))
    }

    /// Resolve the referenced schema.
    pub fn get(&self) -> &'static Schema {
        match self.0 {
            Source::Lazy(f) => f(),
            Source::Fixed(schema) => schema,
            // Registries fill every slot before handing out a schema.
            Source::Slot(slot) => slot.get_or_init(|| Schema::builder("unresolved").build()),
        }
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Name only: nested schemas may be recursive.
        match self.0 {
            Source::Slot(slot) if slot.get().is_none() => f.write_str("SchemaRef(<pending>)"),
            _ => write!(f, "SchemaRef({})", self.get().name()),
        }
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Declares a [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    parent: Option<&'static Schema>,
    fields: Vec<Field>,
    overrides: OptionOverrides,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            overrides: OptionOverrides::default(),
        }
    }

    /// Inherit descriptors and options from `parent`.
    pub fn extends(mut self, parent: &'static Schema) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Declare a field. Redeclaring a name replaces the earlier descriptor.
    pub fn field(mut self, field: Field) -> Self {
        upsert(&mut self.fields, field);
        self
    }

    /// Local unknown-field policy.
    pub fn extra(mut self, policy: impl Into<ExtraFields>) -> Self {
        self.overrides.extra = Some(policy.into());
        self
    }

    /// Local free-form option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.custom.insert(key.into(), value.into());
        self
    }

    /// Apply a whole set of local overrides (later values win).
    pub fn overrides(mut self, overrides: OptionOverrides) -> Self {
        if overrides.extra.is_some() {
            self.overrides.extra = overrides.extra;
        }
        self.overrides.custom.extend(overrides.custom);
        self
    }

    /// Resolve inheritance and produce the immutable schema.
    pub fn build(self) -> Schema {
        let (mut fields, base) = match self.parent {
            Some(parent) => (parent.fields.clone(), parent.options.clone()),
            None => (Vec::new(), SchemaOptions::default()),
        };
        for field in self.fields {
            upsert(&mut fields, field);
        }
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_string(), i))
            .collect();
        let options = base.merged(&self.overrides);

        tracing::debug!(
            form = %self.name,
            parent = self.parent.map(Schema::name),
            fields = fields.len(),
            "form schema defined"
        );

        Schema {
            name: self.name,
            fields,
            index,
            options,
        }
    }
}

fn upsert(fields: &mut Vec<Field>, field: Field) {
    match fields.iter_mut().find(|f| f.name() == field.name()) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

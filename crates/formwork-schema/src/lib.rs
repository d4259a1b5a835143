//! # formwork-schema: Declarative Form Schemas
//!
//! Declares the fields of a form type once and converts instances between
//! three representations: untrusted key/value maps, typed form instances,
//! and plain attribute-bearing objects.
//!
//! ## Modules
//!
//! - [`field`]: field descriptors and the closed [`FieldKind`] tree.
//! - [`schema`]: immutable schema definitions, inheritance and options.
//! - [`form`]: form instances: construction, decode, validate, encode.
//! - [`bind`]: copying fields to and from plain objects.
//! - [`value`]: the stored value of one field.
//! - [`document`]: schemas declared in YAML/JSON documents.
//!
//! ## Example
//!
//! ```
//! use std::sync::OnceLock;
//! use formwork_core::{IntType, StrType};
//! use formwork_schema::{Field, FieldKind, FormType, Schema};
//! use serde_json::json;
//!
//! struct Person;
//!
//! impl FormType for Person {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("Person")
//!                 .field(Field::new("age", FieldKind::scalar(IntType::new().min(0))).required())
//!                 .field(Field::new("name", FieldKind::scalar(StrType::new())).default_value("anon"))
//!                 .build()
//!         })
//!     }
//! }
//!
//! let input = json!({"age": "41"});
//! let person = Person::decode(input.as_object().unwrap()).unwrap();
//! assert_eq!(
//!     serde_json::Value::Object(person.encode().unwrap()),
//!     json!({"age": 41, "name": "anon"})
//! );
//!
//! let err = Person::decode(json!({"age": -1}).as_object().unwrap()).unwrap_err();
//! assert!(err.contains("age"));
//! ```
//!
//! ## Crate Policy
//!
//! - Schemas are immutable once built and shared as `&'static Schema`.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod bind;
pub mod document;
pub mod field;
pub mod form;
pub mod schema;
pub mod value;

pub use document::{FieldDocument, FormDocument, KindDocument, SchemaDocument, SchemaLoadError, SchemaRegistry};
pub use field::{DefaultValue, Field, FieldKind, Validator};
pub use form::{DecodeOptions, EncodeOptions, Form, FormType};
pub use schema::{ExtraFields, OptionOverrides, Schema, SchemaBuilder, SchemaOptions, SchemaRef};
pub use value::FieldValue;

//! Form types shared by the integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use formwork_core::{IntType, StrType};
use formwork_schema::{Field, FieldKind, FormType, Schema};
use serde_json::{Map, Value};

/// `index` (int >= 0, required), `name` (required), `optional` (default "missing").
pub struct TestForm;

impl FormType for TestForm {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("TestForm")
                .field(Field::new("index", FieldKind::scalar(IntType::new().min(0))).required())
                .field(Field::new("name", FieldKind::scalar(StrType::new())).required())
                .field(Field::new("optional", FieldKind::scalar(StrType::new())).default_value("missing"))
                .option("value", "value")
                .build()
        })
    }
}

pub struct SubForm;

impl FormType for SubForm {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("SubForm")
                .field(Field::new("name", FieldKind::scalar(StrType::new())).required())
                .build()
        })
    }
}

pub struct TopForm;

impl FormType for TopForm {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("TopForm")
                .field(Field::new("sub", FieldKind::form::<SubForm>()))
                .build()
        })
    }
}

pub struct ListForm;

impl FormType for ListForm {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("ListForm")
                .field(Field::new("subs", FieldKind::list(FieldKind::form::<SubForm>())))
                .build()
        })
    }
}

pub struct DictForm;

impl FormType for DictForm {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("DictForm")
                .field(Field::new("subs", FieldKind::map(FieldKind::form::<SubForm>())))
                .build()
        })
    }
}

/// Unwrap a `json!` object literal.
pub fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

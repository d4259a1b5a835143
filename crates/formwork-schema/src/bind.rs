//! # Object Binding
//!
//! Copies declared fields between a [`Form`] and any [`AttrObject`].
//!
//! - [`Form::from_obj`] reads like-named attributes and never fails: values
//!   are stored raw, nested objects under form-typed fields become nested
//!   instances, collections keep their order and keys.
//! - [`Form::to_obj_into`] writes onto an existing target. A nested form
//!   is merged into the object already present on the target, so
//!   attributes the form does not declare survive.
//! - [`Form::to_obj`] writes onto a fresh [`Object`].
//!
//! Extra attributes take no part in binding.

use std::borrow::Cow;
use std::collections::BTreeMap;

use formwork_core::{Attr, AttrObject, AttrView, Object};
use serde_json::Value;

use crate::field::FieldKind;
use crate::form::Form;
use crate::schema::Schema;
use crate::value::FieldValue;

impl Form {
    /// Copy declared attributes off a plain object.
    ///
    /// Attributes the object lacks take the field default.
    pub fn from_obj(schema: &'static Schema, obj: &dyn AttrObject) -> Self {
        let attrs = schema
            .fields()
            .iter()
            .map(|field| match obj.get_attr(field.name()) {
                Some(view) => field.kind().bind_from(&view),
                None => field.resolve_default(),
            })
            .collect();
        tracing::trace!(form = schema.name(), "form bound from object");
        Self::from_parts(schema, attrs)
    }

    /// Write declared fields onto a fresh [`Object`].
    pub fn to_obj(&self) -> Object {
        let mut obj = Object::new();
        self.to_obj_into(&mut obj);
        obj
    }

    /// Write declared fields onto `target`, merging nested forms into the
    /// target's existing nested objects.
    pub fn to_obj_into(&self, target: &mut dyn AttrObject) {
        for (field, value) in self.schema.fields().iter().zip(&self.attrs) {
            field.kind().bind_into(target, field.name(), value);
        }
    }
}

impl FieldKind {
    fn bind_from(&self, view: &AttrView<'_>) -> FieldValue {
        match (self, view) {
            (Self::Form(schema), AttrView::Object(obj)) => FieldValue::Form(Form::from_obj(schema.get(), *obj)),
            (Self::List(element), AttrView::List(items)) => {
                FieldValue::List(items.iter().map(|item| element.bind_from(item)).collect())
            }
            (Self::Map(element), AttrView::Map(entries)) => FieldValue::Map(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), element.bind_from(item)))
                    .collect(),
            ),
            (_, AttrView::Value(v)) => FieldValue::Value(v.clone()),
            _ => FieldValue::Value(view.to_value()),
        }
    }

    fn bind_into(&self, target: &mut dyn AttrObject, name: &str, value: &FieldValue) {
        if let Some(form) = self.nested_form(value) {
            match target.attr_object_mut(name) {
                Some(existing) => form.to_obj_into(existing),
                None => target.set_attr(name, Attr::Object(form.to_obj())),
            }
            return;
        }
        target.set_attr(name, self.to_attr(value));
    }

    /// The nested instance behind a form-typed value, lifting raw maps.
    fn nested_form<'v>(&self, value: &'v FieldValue) -> Option<Cow<'v, Form>> {
        match (self, value) {
            (Self::Form(_), FieldValue::Form(form)) => Some(Cow::Borrowed(form)),
            (Self::Form(schema), FieldValue::Value(Value::Object(data))) => {
                Some(Cow::Owned(Form::from_map(schema.get(), data)))
            }
            _ => None,
        }
    }

    fn to_attr(&self, value: &FieldValue) -> Attr {
        if let Some(form) = self.nested_form(value) {
            return Attr::Object(form.to_obj());
        }
        match (self, value) {
            (Self::List(element), FieldValue::List(items)) => {
                Attr::List(items.iter().map(|item| element.to_attr(item)).collect())
            }
            (Self::List(element), FieldValue::Value(Value::Array(items))) => Attr::List(
                items
                    .iter()
                    .map(|item| element.to_attr(&FieldValue::Value(item.clone())))
                    .collect(),
            ),
            (Self::Map(element), FieldValue::Map(entries)) => Attr::Map(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), element.to_attr(item)))
                    .collect::<BTreeMap<_, _>>(),
            ),
            (Self::Map(element), FieldValue::Value(Value::Object(entries))) => Attr::Map(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), element.to_attr(&FieldValue::Value(item.clone()))))
                    .collect::<BTreeMap<_, _>>(),
            ),
            _ => Attr::Value(value.to_value()),
        }
    }
}

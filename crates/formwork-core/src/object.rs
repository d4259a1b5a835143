//! # Plain-Object Binding Surface
//!
//! Forms copy their fields to and from "plain objects": anything that
//! exposes named-attribute read and write. The surface is structural: a
//! type participates by implementing [`AttrObject`], there is no required
//! base type.
//!
//! - Reads go through [`AttrView`], which borrows nested objects so a
//!   struct can expose its sub-structs without cloning them.
//! - Writes hand over owned [`Attr`] trees.
//! - [`AttrObject::attr_object_mut`] lets a writer merge into a nested
//!   object that already exists on the target instead of replacing it.
//!
//! [`Object`] is the dynamic implementation used whenever a fresh target
//! is needed.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// Named-attribute access on a plain object.
pub trait AttrObject {
    /// Names of the attributes currently present.
    fn attr_names(&self) -> Vec<String>;

    /// Read an attribute, `None` when it is not present.
    fn get_attr(&self, name: &str) -> Option<AttrView<'_>>;

    /// Write an attribute, creating or replacing it.
    fn set_attr(&mut self, name: &str, value: Attr);

    /// Mutable access to an attribute that is itself an object.
    ///
    /// Returns `None` when the attribute is absent or not an object; the
    /// writer then falls back to [`set_attr`](Self::set_attr).
    fn attr_object_mut(&mut self, _name: &str) -> Option<&mut dyn AttrObject> {
        None
    }
}

/// A borrowed view of one attribute value.
pub enum AttrView<'a> {
    /// A scalar or otherwise untyped JSON-compatible value.
    Value(Value),
    /// A nested plain object.
    Object(&'a dyn AttrObject),
    /// An ordered sequence.
    List(Vec<AttrView<'a>>),
    /// A keyed map.
    Map(BTreeMap<String, AttrView<'a>>),
}

impl AttrView<'_> {
    /// Flatten this view into plain JSON, expanding nested objects through
    /// their attribute names.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Object(obj) => Value::Object(object_to_map(*obj)),
            Self::List(items) => Value::Array(items.iter().map(AttrView::to_value).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for AttrView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Object(obj) => f
                .debug_tuple("Object")
                .field(&Value::Object(object_to_map(*obj)))
                .finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

impl From<Value> for AttrView<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

fn object_to_map(obj: &dyn AttrObject) -> Map<String, Value> {
    obj.attr_names()
        .into_iter()
        .filter_map(|name| {
            let value = obj.get_attr(&name)?.to_value();
            Some((name, value))
        })
        .collect()
}

/// An owned attribute value written onto a plain object.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// A scalar or otherwise untyped JSON-compatible value.
    Value(Value),
    /// A nested plain object.
    Object(Object),
    /// An ordered sequence.
    List(Vec<Attr>),
    /// A keyed map.
    Map(BTreeMap<String, Attr>),
}

impl Attr {
    /// Borrow as a read view.
    pub fn view(&self) -> AttrView<'_> {
        match self {
            Self::Value(v) => AttrView::Value(v.clone()),
            Self::Object(obj) => AttrView::Object(obj),
            Self::List(items) => AttrView::List(items.iter().map(Attr::view).collect()),
            Self::Map(entries) => {
                AttrView::Map(entries.iter().map(|(k, v)| (k.clone(), v.view())).collect())
            }
        }
    }

    /// The nested object, if this attribute is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The plain value, if this attribute is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten into plain JSON.
    pub fn to_value(&self) -> Value {
        self.view().to_value()
    }
}

impl From<Value> for Attr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Object> for Attr {
    fn from(obj: Object) -> Self {
        Self::Object(obj)
    }
}

/// A dynamic attribute-bearing object.
///
/// Attribute names are kept sorted; attribute identity is stable across
/// in-place updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    attrs: BTreeMap<String, Attr>,
}

impl Object {
    /// An object with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Attr>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Read an attribute.
    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }

    /// Mutably borrow an attribute.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attr> {
        self.attrs.get_mut(name)
    }

    /// Read a nested object attribute.
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.get(name).and_then(Attr::as_object)
    }

    /// Read a plain value attribute.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Attr::as_value)
    }

    /// Write an attribute, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Attr>) -> Option<Attr> {
        self.attrs.insert(name.into(), value.into())
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attr)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into a plain JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl AttrObject for Object {
    fn attr_names(&self) -> Vec<String> {
        self.attrs.keys().cloned().collect()
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        self.attrs.get(name).map(Attr::view)
    }

    fn set_attr(&mut self, name: &str, value: Attr) {
        self.attrs.insert(name.to_string(), value);
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn AttrObject> {
        match self.attrs.get_mut(name) {
            Some(Attr::Object(obj)) => Some(obj as &mut dyn AttrObject),
            _ => None,
        }
    }
}

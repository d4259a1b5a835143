//! Object binding against user-defined structs.

mod common;

use std::collections::BTreeMap;

use common::{map, DictForm, ListForm, SubForm, TestForm, TopForm};
use formwork_core::{Attr, AttrObject, AttrView};
use formwork_schema::{FieldValue, FormType};
use serde_json::{json, Value};

struct Data {
    index: Value,
    name: Value,
}

impl AttrObject for Data {
    fn attr_names(&self) -> Vec<String> {
        vec!["index".into(), "name".into()]
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        match name {
            "index" => Some(AttrView::Value(self.index.clone())),
            "name" => Some(AttrView::Value(self.name.clone())),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Attr) {
        match name {
            "index" => self.index = value.to_value(),
            "name" => self.name = value.to_value(),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SubData {
    name: String,
    marker: u32,
}

impl SubData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: 0,
        }
    }
}

impl AttrObject for SubData {
    fn attr_names(&self) -> Vec<String> {
        vec!["name".into(), "marker".into()]
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        match name {
            "name" => Some(AttrView::Value(json!(self.name))),
            "marker" => Some(AttrView::Value(json!(self.marker))),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Attr) {
        if name == "name" {
            if let Some(s) = value.to_value().as_str() {
                self.name = s.to_string();
            }
        }
    }
}

fn sub_from_attr(value: &Attr) -> Option<SubData> {
    let obj = value.as_object()?;
    let name = obj.value("name")?.as_str()?;
    Some(SubData::new(name))
}

struct TopData {
    sub: Option<SubData>,
}

impl AttrObject for TopData {
    fn attr_names(&self) -> Vec<String> {
        vec!["sub".into()]
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        match name {
            "sub" => self.sub.as_ref().map(|s| AttrView::Object(s)),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Attr) {
        if name == "sub" {
            self.sub = sub_from_attr(&value);
        }
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn AttrObject> {
        match name {
            "sub" => self.sub.as_mut().map(|s| s as &mut dyn AttrObject),
            _ => None,
        }
    }
}

struct ListData {
    subs: Vec<SubData>,
}

impl AttrObject for ListData {
    fn attr_names(&self) -> Vec<String> {
        vec!["subs".into()]
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        match name {
            "subs" => Some(AttrView::List(
                self.subs.iter().map(|s| AttrView::Object(s)).collect(),
            )),
            _ => None,
        }
    }

    fn set_attr(&mut self, name: &str, value: Attr) {
        if let ("subs", Attr::List(items)) = (name, value) {
            self.subs = items.iter().filter_map(sub_from_attr).collect();
        }
    }
}

struct KeyedData {
    subs: BTreeMap<String, SubData>,
}

impl AttrObject for KeyedData {
    fn attr_names(&self) -> Vec<String> {
        vec!["subs".into()]
    }

    fn get_attr(&self, name: &str) -> Option<AttrView<'_>> {
        match name {
            "subs" => Some(AttrView::Map(
                self.subs
                    .iter()
                    .map(|(k, s)| (k.clone(), AttrView::Object(s)))
                    .collect(),
            )),
            _ => None,
        }
    }

    fn set_attr(&mut self, _name: &str, _value: Attr) {}
}

#[test]
fn test_from_obj_flat() {
    let obj = Data {
        index: json!("1"),
        name: json!("object"),
    };
    let form = TestForm::from_obj(&obj);
    assert_eq!(form.get("index"), Some(&FieldValue::from("1")));
    assert_eq!(form.get("name"), Some(&FieldValue::from("object")));
    assert_eq!(form.get("optional"), Some(&FieldValue::from("missing")));

    assert_eq!(
        form.encode().unwrap(),
        map(json!({"index": 1, "name": "object", "optional": "missing"}))
    );
}

#[test]
fn test_from_obj_nested() {
    let obj = TopData {
        sub: Some(SubData::new("test")),
    };
    let form = TopForm::from_obj(&obj);
    let sub = form.get("sub").and_then(FieldValue::as_form).unwrap();
    assert_eq!(sub.to_dict(), map(json!({"name": "test"})));
    assert_eq!(form.encode().unwrap(), map(json!({"sub": {"name": "test"}})));
}

#[test]
fn test_from_obj_list() {
    let obj = ListData {
        subs: vec![SubData::new("test1"), SubData::new("test2")],
    };
    let form = ListForm::from_obj(&obj);
    assert_eq!(
        form.to_dict(),
        map(json!({"subs": [{"name": "test1"}, {"name": "test2"}]}))
    );
    assert_eq!(
        form.encode().unwrap(),
        map(json!({"subs": [{"name": "test1"}, {"name": "test2"}]}))
    );
}

#[test]
fn test_from_obj_keyed_map() {
    let obj = KeyedData {
        subs: BTreeMap::from([
            ("one".to_string(), SubData::new("test1")),
            ("two".to_string(), SubData::new("test2")),
        ]),
    };
    let form = DictForm::from_obj(&obj);
    let want = map(json!({"subs": {"one": {"name": "test1"}, "two": {"name": "test2"}}}));
    assert_eq!(form.to_dict(), want);
    assert_eq!(form.encode().unwrap(), want);
}

#[test]
fn test_from_obj_missing_nested_attribute_takes_default() {
    let form = TopForm::from_obj(&TopData { sub: None });
    let sub = form.get("sub").and_then(FieldValue::as_form).unwrap();
    assert!(sub.get("name").unwrap().is_null());
}

#[test]
fn test_nested_round_trip() {
    let obj = TopData {
        sub: Some(SubData::new("test")),
    };
    let form = TopForm::from_obj(&obj);
    assert_eq!(form.to_obj().to_value(), json!({"sub": {"name": "test"}}));

    let mut target = TopData { sub: None };
    form.to_obj_into(&mut target);
    assert_eq!(target.sub, Some(SubData::new("test")));

    let list = ListData {
        subs: vec![SubData::new("a"), SubData::new("b")],
    };
    let mut copy = ListData { subs: Vec::new() };
    ListForm::from_obj(&list).to_obj_into(&mut copy);
    assert_eq!(copy.subs, list.subs);
}

#[test]
fn test_to_obj_merges_nested_in_place() {
    let mut target = TopData {
        sub: Some(SubData {
            name: "old".to_string(),
            marker: 7,
        }),
    };
    let form = TopForm::with_values([("sub", SubForm::with_values([("name", "new")]))]);
    form.to_obj_into(&mut target);

    let sub = target.sub.unwrap();
    assert_eq!(sub.name, "new");
    assert_eq!(sub.marker, 7);
}

#[test]
fn test_to_obj_updates_flat_struct() {
    let form = TestForm::with_values(map(json!({"index": 6, "name": "sixth", "optional": "present"})));
    let mut target = Data {
        index: json!(12),
        name: json!("nope"),
    };
    form.to_obj_into(&mut target);
    assert_eq!(target.index, json!(6));
    assert_eq!(target.name, json!("sixth"));
}

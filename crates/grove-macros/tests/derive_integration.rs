//! Integration tests for `#[derive(Shape)]`.

#![allow(dead_code)]

use std::collections::HashMap;

use grove::core::{ParamLocation, Shape, TypeDescriptor};
use grove::docs::{Components, SchemaWalker};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, grove::Shape)]
#[serde(rename_all = "camelCase")]
struct UpdateItem {
    #[shape(path = "id")]
    #[serde(skip)]
    id: String,
    #[shape(header = "X-Request-Id")]
    #[serde(skip)]
    request_id: Option<String>,
    display_name: String,
    #[serde(rename = "qty")]
    quantity: u32,
    #[serde(skip)]
    scratch: Vec<u8>,
}

#[derive(grove::Shape)]
struct Page<T> {
    items: Vec<T>,
    total: u64,
}

#[derive(grove::Shape)]
#[shape(name = "Category", content_type = "application/yaml")]
struct CategoryNode {
    label: String,
    children: Vec<CategoryNode>,
    attributes: HashMap<String, serde_json::Value>,
}

#[derive(grove::Shape)]
#[shape(crate = "grove_core")]
struct Marker;

fn record<T: Shape>() -> grove::core::RecordDescriptor {
    match T::describe() {
        TypeDescriptor::Record(record) => record,
        other => panic!("expected a record, got {other:?}"),
    }
}

#[test]
fn test_field_order_and_locations() {
    let record = record::<UpdateItem>();
    assert_eq!(record.name, "UpdateItem");

    let idents: Vec<_> = record.fields.iter().map(|f| f.ident).collect();
    assert_eq!(
        idents,
        vec!["id", "request_id", "display_name", "quantity", "scratch"]
    );

    assert_eq!(record.fields[0].location, Some(ParamLocation::Path("id")));
    assert_eq!(
        record.fields[1].location,
        Some(ParamLocation::Header("X-Request-Id"))
    );
    assert!(!record.fields[0].skip);
    assert!(record.fields[4].skip);
}

#[test]
fn test_property_names_follow_serde() {
    let record = record::<UpdateItem>();
    let names: Vec<_> = record
        .fields
        .iter()
        .filter(|f| f.location.is_none())
        .filter_map(|f| f.property_name())
        .collect();
    assert_eq!(names, vec!["displayName", "qty"]);
}

#[test]
fn test_derived_record_decodes_with_serde() {
    let item: UpdateItem =
        serde_json::from_str(r#"{"displayName":"Lamp","qty":3}"#).unwrap();
    assert_eq!(item.display_name, "Lamp");
    assert_eq!(item.quantity, 3);
    assert!(item.id.is_empty());
}

#[test]
fn test_generic_record_name() {
    assert_eq!(record::<Page<UpdateItem>>().name, "Page_UpdateItem");
}

#[test]
fn test_container_overrides() {
    assert_eq!(record::<CategoryNode>().name, "Category");
    assert_eq!(CategoryNode::content_type(), Some("application/yaml"));
    assert_eq!(UpdateItem::content_type(), None);
    assert!(record::<Marker>().fields.is_empty());
}

#[test]
fn test_walks_into_components() {
    let mut components = Components::default();
    let mut params = Vec::new();
    let schema = SchemaWalker::new(&mut components)
        .walk(&UpdateItem::describe(), &mut params)
        .unwrap();

    assert_eq!(schema.component_name(), Some("UpdateItem"));
    assert_eq!(params.len(), 2);

    let update = &components.schemas["UpdateItem"];
    let props: Vec<_> = update.properties.keys().map(String::as_str).collect();
    assert_eq!(props, vec!["displayName", "qty"]);
    assert_eq!(update.properties["qty"].minimum, Some(0));
}

#[test]
fn test_recursive_derived_record() {
    let mut components = Components::default();
    SchemaWalker::new(&mut components).walk(&CategoryNode::describe(), &mut Vec::new());

    assert_eq!(components.schemas.len(), 1);
    let children = &components.schemas["Category"].properties["children"];
    assert_eq!(
        children.items.as_ref().unwrap().component_name(),
        Some("Category")
    );
}

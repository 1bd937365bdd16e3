//! Testing utilities for the omap workspace
//!
//! Shared catalogs, sample values and file fixtures.

#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use omap_types::{
    EnumDescriptor, EnumValue, MemberAttribute, MemberDescriptor, Object, ObjectDescriptor, Ty,
    TypeCatalog, Value,
};
use uuid::Uuid;

pub fn color() -> EnumDescriptor {
    EnumDescriptor::new("Color")
        .variant("Red", 1)
        .variant("Green", 2)
        .variant("Blue", 3)
}

pub fn colour() -> EnumDescriptor {
    EnumDescriptor::new("Colour")
        .variant("Blue", 30)
        .variant("Green", 20)
        .variant("Red", 10)
}

pub fn address() -> ObjectDescriptor {
    ObjectDescriptor::new("Address")
        .field("Street", Ty::String)
        .field("City", Ty::String)
        .field("Zip", Ty::I32)
        .field("Phone", Ty::String)
}

pub fn address_dto() -> ObjectDescriptor {
    ObjectDescriptor::new("AddressDto")
        .field("Street", Ty::String)
        .field("City", Ty::String)
        .field("Zip", Ty::I64)
}

pub fn person() -> ObjectDescriptor {
    ObjectDescriptor::new("Person")
        .field("Id", Ty::Uuid)
        .field("Name", Ty::String)
        .field("Age", Ty::I32)
        .field("Born", Ty::DateTime)
        .field("Address", Ty::object("Address"))
        .field("Tags", Ty::list(Ty::String))
        .field("Favorite", Ty::enumeration("Color"))
        .member(
            MemberDescriptor::new("Secret", Ty::String).with_attribute(MemberAttribute::ignore()),
        )
        .member(
            MemberDescriptor::new("Nickname", Ty::String)
                .with_attribute(MemberAttribute::bind("Alias")),
        )
        .static_field("Version", Ty::I32, 3_i32)
}

pub fn person_dto() -> ObjectDescriptor {
    ObjectDescriptor::new("PersonDto")
        .field("Id", Ty::Uuid)
        .field("Name", Ty::String)
        .field("Age", Ty::nullable(Ty::I64))
        .field("Born", Ty::DateTime)
        .field("Address", Ty::object("AddressDto"))
        .field("Tags", Ty::array(Ty::String))
        .field("Favorite", Ty::enumeration("Colour"))
        .field("Secret", Ty::String)
        .field("Alias", Ty::String)
        .field("Version", Ty::I32)
        .field("Street", Ty::String)
        .field("Phone", Ty::String)
        .member(MemberDescriptor::new("Keep", Ty::String).with_initial("kept"))
}

pub fn node() -> ObjectDescriptor {
    ObjectDescriptor::new("Node")
        .field("Id", Ty::I32)
        .field("Parent", Ty::object("Node"))
        .field("Children", Ty::list(Ty::object("Node")))
}

pub fn node_dto() -> ObjectDescriptor {
    ObjectDescriptor::new("NodeDto")
        .field("Id", Ty::I64)
        .field("Parent", Ty::object("NodeDto"))
        .field("Children", Ty::list(Ty::object("NodeDto")))
}

pub fn point() -> ObjectDescriptor {
    ObjectDescriptor::new("Point")
        .field("X", Ty::F64)
        .field("Y", Ty::F64)
        .without_default_constructor()
        .value_kind()
}

pub fn people_catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(color())
        .with(colour())
        .with(address())
        .with(address_dto())
        .with(person())
        .with(person_dto())
        .with(node())
        .with(node_dto())
        .with(point())
}

pub fn sample_address() -> Object {
    Object::new("Address")
        .with("Street", "1 Main St")
        .with("City", "Springfield")
        .with("Zip", 12345_i32)
        .with("Phone", "555-0100")
}

pub fn sample_person() -> Object {
    Object::new("Person")
        .with("Id", Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0))
        .with("Name", "Ada")
        .with("Age", 36_i32)
        .with("Born", Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap())
        .with("Address", sample_address())
        .with(
            "Tags",
            Value::List(vec![Value::from("math"), Value::from("engines")]),
        )
        .with("Favorite", EnumValue::new("Color", 2))
        .with("Secret", "hunter2")
        .with("Nickname", "Countess")
}

/// Linked chain `0 <- 1 <- ... <- len-1`, each node's parent the previous one
pub fn node_chain(len: usize) -> Value {
    let mut current = Value::Null;
    for id in 0..len {
        let id = i32::try_from(id).unwrap();
        current = Value::Object(
            Object::new("Node")
                .with("Id", id)
                .with("Parent", current)
                .with("Children", Value::List(Vec::new())),
        );
    }
    current
}

pub const CATALOG_YAML: &str = r"
types:
  Address:
    kind: object
    members:
      - { name: Street, type: String }
      - { name: Zip, type: i32 }
  Customer:
    kind: object
    members:
      - { name: Name, type: String }
      - { name: Address, type: Address }
      - { name: Level, type: Tier }
      - { name: Notes, type: String, ignore: [{}] }
  CustomerDto:
    kind: object
    members:
      - { name: Name, type: String }
      - { name: Street, type: String }
      - { name: Level, type: String }
      - { name: Notes, type: String }
  Tier:
    kind: enum
    variants: { Bronze: 1, Silver: 2, Gold: 3 }
";

pub const PROFILE_YAML: &str = r"
config:
  name_matching: ignore_case
bindings:
  - source: Customer
    target: CustomerDto
    bind:
      - { source: Address.Street, target: Street }
  - source: List<Customer>
    target: List<CustomerDto>
";

//! Catalog and profile files driving a mapper end to end

use omap_engine::prelude::*;
use omap_engine::ProfileError;
use omap_test_utils::{CATALOG_YAML, PROFILE_YAML};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn customer(name: &str, tier: i64) -> Value {
    Value::Object(
        Object::new("Customer")
            .with("Name", name)
            .with("Address", Object::new("Address").with("Street", "Elm").with("Zip", 9_i32))
            .with("Level", EnumValue::new("Tier", tier))
            .with("Notes", "private"),
    )
}

#[test]
fn profile_from_files_binds_and_maps() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = TypeCatalog::load(write(&dir, "catalog.yaml", CATALOG_YAML)).unwrap();
    let profile = MappingProfile::load(write(&dir, "profile.yml", PROFILE_YAML)).unwrap();
    assert_eq!(profile.config.name_matching, NameMatching::IgnoreCase);

    let (mapper, bound) = profile.build_mapper(Arc::new(catalog)).unwrap();
    assert_eq!(bound.len(), 2);
    assert_eq!(bound[0].pair().to_string(), "Customer -> CustomerDto");

    let (source, target) = (Ty::object("Customer"), Ty::object("CustomerDto"));
    let mapped = mapper.map(&source, &target, customer("Kay", 3), None).unwrap();
    assert_eq!(mapped.field("Name"), Some(&Value::String("Kay".into())));
    assert_eq!(mapped.field("Street"), Some(&Value::String("Elm".into())));
    assert_eq!(mapped.field("Level"), Some(&Value::String("Gold".into())));
    assert_eq!(mapped.field("Notes"), Some(&Value::Null));
}

#[test]
fn nested_pairs_use_profile_configuration() {
    let catalog = Arc::new(TypeCatalog::from_yaml_str(CATALOG_YAML).unwrap());
    let profile = MappingProfile::from_yaml_str(PROFILE_YAML).unwrap();
    let (mapper, _) = profile.build_mapper(catalog).unwrap();

    let (source, target) = (
        Ty::list(Ty::object("Customer")),
        Ty::list(Ty::object("CustomerDto")),
    );
    let list = Value::List(vec![customer("A", 1), customer("B", 2)]);
    let mapped = mapper.map(&source, &target, list, None).unwrap();
    let items = mapped.as_items().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].field("Street"), Some(&Value::String("Elm".into())));
    assert_eq!(items[1].field("Level"), Some(&Value::String("Silver".into())));
}

#[test]
fn json_profile_with_type_override() {
    let catalog = Arc::new(TypeCatalog::from_yaml_str(CATALOG_YAML).unwrap());
    let profile = MappingProfile::from_json_str(
        r#"{
            "bindings": [{
                "source": "Address",
                "target": "CustomerDto",
                "bind": [{ "source": "Street", "target": "Name" }],
                "types": { "Level": "String" }
            }]
        }"#,
    )
    .unwrap();
    let (mapper, bound) = profile.build_mapper(catalog).unwrap();
    assert_eq!(bound.len(), 1);

    let address = Value::Object(Object::new("Address").with("Street", "Oak"));
    let mapped = mapper
        .map(&Ty::object("Address"), &Ty::object("CustomerDto"), address, None)
        .unwrap();
    assert_eq!(mapped.field("Name"), Some(&Value::String("Oak".into())));
}

#[test]
fn unknown_type_in_profile_fails() {
    let catalog = Arc::new(TypeCatalog::from_yaml_str(CATALOG_YAML).unwrap());
    let profile = MappingProfile::from_yaml_str(
        "bindings:\n  - { source: Customer, target: Missing }\n",
    )
    .unwrap();
    let err = profile.build_mapper(catalog).unwrap_err();
    assert!(matches!(err, ProfileError::TypeParse(_)), "{err}");
}

#[test]
fn malformed_profile_path_fails() {
    let catalog = Arc::new(TypeCatalog::from_yaml_str(CATALOG_YAML).unwrap());
    let profile = MappingProfile::from_yaml_str(
        "bindings:\n  - source: Customer\n    target: CustomerDto\n    bind: [{ source: 'Address.', target: Street }]\n",
    )
    .unwrap();
    let err = profile.build_mapper(catalog).unwrap_err();
    assert!(matches!(err, ProfileError::Binding(_)), "{err}");
}

//! In-memory type catalog
//!
//! [`TypeCatalog`] is the default [`TypeIntrospector`]. It is populated
//! programmatically through [`ObjectDescriptor`]/[`EnumDescriptor`] builders
//! or loaded from a YAML/JSON schema file:
//!
//! ```yaml
//! types:
//!   Color:
//!     kind: enum
//!     variants: { Red: 1, Green: 2 }
//!   Person:
//!     kind: object
//!     members:
//!       - { name: Name, type: String }
//!       - { name: Tint, type: Color?, bind: [{ name: Colour }] }
//!       - { name: Version, type: i32, static: true, initial: 3 }
//! ```
//!
//! Static member values live behind a lock so they can be updated while
//! mappers read them.

use crate::descriptor::{
    Access, EnumDescriptor, MemberAttribute, MemberDescriptor, ObjectDescriptor, TypeDescriptor,
};
use crate::error::{CatalogError, TypeParseError};
use crate::introspect::TypeIntrospector;
use crate::parse::parse_ty;
use crate::ty::{PrimitiveKind, Ty, TypeName};
use crate::value::Value;
use crate::{defaults, json};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Registry of declared object and enum types
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: IndexMap<TypeName, TypeDescriptor>,
    statics: RwLock<HashMap<(TypeName, String), Value>>,
}

impl TypeCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a declaration, returning the previous one
    ///
    /// Static members are seeded with their initializer (or zero value).
    pub fn insert(&mut self, descriptor: impl Into<TypeDescriptor>) -> Option<TypeDescriptor> {
        let descriptor = descriptor.into();
        let name = descriptor.name().clone();
        let previous = self.types.insert(name.clone(), descriptor);
        self.seed_statics(&name);
        previous
    }

    /// Insert a declaration that must not exist yet
    ///
    /// # Errors
    /// [`CatalogError::Duplicate`] if the name is taken.
    pub fn declare(&mut self, descriptor: impl Into<TypeDescriptor>) -> Result<(), CatalogError> {
        let descriptor = descriptor.into();
        if self.types.contains_key(descriptor.name()) {
            return Err(CatalogError::Duplicate(descriptor.name().clone()));
        }
        self.insert(descriptor);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.insert(descriptor);
        self
    }

    fn seed_statics(&mut self, name: &TypeName) {
        let Some(TypeDescriptor::Object(object)) = self.types.get(name) else {
            return;
        };
        let seeded: Vec<_> = object
            .members
            .iter()
            .filter(|m| m.is_static)
            .map(|m| {
                let value = m
                    .initial
                    .clone()
                    .unwrap_or_else(|| defaults::zero_value(&m.ty, &*self));
                ((name.clone(), m.name.clone()), value)
            })
            .collect();
        self.statics.get_mut().extend(seeded);
    }

    /// Declaration by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(&TypeName::new(name))
    }

    /// Declared names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    /// Number of declarations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// [`Ty`] for a declared name
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Ty> {
        self.get(name).map(TypeDescriptor::ty)
    }

    /// Parse a type expression against this catalog
    ///
    /// # Errors
    /// See [`parse_ty`].
    pub fn parse_ty(&self, expr: &str) -> Result<Ty, TypeParseError> {
        parse_ty(expr, &|name| self.resolve(name))
    }

    /// Overwrite a static member value, returning the previous one
    ///
    /// # Errors
    /// [`CatalogError::UnknownType`] or [`CatalogError::UnknownStatic`].
    pub fn set_static(
        &self,
        owner: &str,
        member: &str,
        value: impl Into<Value>,
    ) -> Result<Value, CatalogError> {
        let owner = TypeName::new(owner);
        let Some(TypeDescriptor::Object(object)) = self.types.get(&owner) else {
            return Err(CatalogError::UnknownType(owner));
        };
        if !object.find(member).is_some_and(|m| m.is_static) {
            return Err(CatalogError::UnknownStatic {
                owner,
                member: member.to_string(),
            });
        }
        let previous = self
            .statics
            .write()
            .insert((owner, member.to_string()), value.into());
        Ok(previous.unwrap_or_default())
    }

    /// Load a catalog file, choosing the format by extension
    ///
    /// `.yaml`/`.yml` are read as YAML, `.json` as JSON.
    ///
    /// # Errors
    /// I/O, syntax, duplicate, type-expression and initializer errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(CatalogError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse a YAML catalog document
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        Self::from_file(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON catalog document
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Self::from_file(serde_json::from_str(text)?)
    }

    /// Build from a deserialized catalog file
    ///
    /// Names are collected first so members may reference types declared
    /// later in the file (or the declaring type itself). Initializers are
    /// read last, once every member type is known.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let kinds: HashMap<&str, Ty> = file
            .types
            .iter()
            .map(|(name, decl)| {
                let ty = match decl {
                    TypeDecl::Object(_) => Ty::object(name.as_str()),
                    TypeDecl::Enum(_) => Ty::enumeration(name.as_str()),
                };
                (name.as_str(), ty)
            })
            .collect();
        let resolve = |name: &str| kinds.get(name).cloned();

        let mut catalog = Self::new();
        let mut initials = Vec::new();
        for (name, decl) in &file.types {
            let type_name = TypeName::new(name);
            let descriptor: TypeDescriptor = match decl {
                TypeDecl::Enum(decl) => {
                    let mut descriptor =
                        EnumDescriptor::new(type_name.clone()).with_underlying(decl.underlying);
                    for (variant, discriminant) in &decl.variants {
                        descriptor = descriptor.variant(variant.clone(), *discriminant);
                    }
                    descriptor.into()
                }
                TypeDecl::Object(decl) => {
                    let mut descriptor = ObjectDescriptor::new(type_name.clone());
                    descriptor.default_constructor = decl.default_constructor;
                    descriptor.value_kind = decl.value_kind;
                    for member in &decl.members {
                        let ty = parse_ty(&member.ty, &resolve).map_err(|error| {
                            CatalogError::MemberType {
                                owner: type_name.clone(),
                                member: member.name.clone(),
                                error,
                            }
                        })?;
                        if let Some(initial) = &member.initial {
                            initials.push((type_name.clone(), member.name.clone(), ty.clone(), initial));
                        }
                        descriptor = descriptor.member(member.to_descriptor(ty));
                    }
                    descriptor.into()
                }
            };
            catalog.declare(descriptor)?;
        }

        let mut resolved = Vec::with_capacity(initials.len());
        for (owner, member, ty, initial) in initials {
            match json::from_json(initial, &ty, &catalog) {
                Ok(value) => resolved.push((owner, member, value)),
                Err(error) => return Err(CatalogError::Initial { owner, member, error }),
            }
        }
        for (owner, member, value) in resolved {
            if let Some(TypeDescriptor::Object(object)) = catalog.types.get_mut(&owner) {
                if let Some(slot) = object.members.iter_mut().find(|m| m.name == member) {
                    slot.initial = Some(value);
                }
            }
            catalog.seed_statics(&owner);
        }
        Ok(catalog)
    }
}

impl TypeIntrospector for TypeCatalog {
    fn object(&self, name: &TypeName) -> Option<&ObjectDescriptor> {
        match self.types.get(name) {
            Some(TypeDescriptor::Object(object)) => Some(object),
            _ => None,
        }
    }

    fn enumeration(&self, name: &TypeName) -> Option<&EnumDescriptor> {
        match self.types.get(name) {
            Some(TypeDescriptor::Enum(enumeration)) => Some(enumeration),
            _ => None,
        }
    }

    fn static_value(&self, owner: &TypeName, member: &str) -> Option<Value> {
        self.statics
            .read()
            .get(&(owner.clone(), member.to_string()))
            .cloned()
    }
}

/// Catalog file root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Declarations by name, in file order
    #[serde(default)]
    pub types: IndexMap<String, TypeDecl>,
}

/// One declaration in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDecl {
    /// Object type
    Object(ObjectDecl),
    /// Enumeration
    Enum(EnumDecl),
}

/// Object declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDecl {
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Has a parameterless constructor
    #[serde(default = "default_true")]
    pub default_constructor: bool,
    /// Value kind (zero-initializable)
    #[serde(default)]
    pub value_kind: bool,
}

fn default_true() -> bool {
    true
}

/// Enum declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    /// Underlying integer kind
    #[serde(default = "default_underlying")]
    pub underlying: PrimitiveKind,
    /// Variant name to discriminant, in declaration order
    pub variants: IndexMap<String, i64>,
}

fn default_underlying() -> PrimitiveKind {
    PrimitiveKind::I32
}

/// Member access as written in files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecl {
    /// Getter and setter
    #[default]
    ReadWrite,
    /// Getter only
    ReadOnly,
    /// Setter only
    WriteOnly,
}

impl From<AccessDecl> for Access {
    fn from(value: AccessDecl) -> Self {
        match value {
            AccessDecl::ReadWrite => Access::ReadWrite,
            AccessDecl::ReadOnly => Access::ReadOnly,
            AccessDecl::WriteOnly => Access::WriteOnly,
        }
    }
}

/// Member declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    /// Member name
    pub name: String,
    /// Type expression
    #[serde(rename = "type")]
    pub ty: String,
    /// Getter/setter availability
    #[serde(default)]
    pub access: AccessDecl,
    /// Static member
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Initializer, as JSON/YAML data matching the member type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<serde_json::Value>,
    /// `Bind` annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bind: Vec<BindDecl>,
    /// `Ignore` annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<IgnoreDecl>,
}

/// `Bind` annotation in a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindDecl {
    /// Counterpart member name
    pub name: String,
    /// Counterpart type qualifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// `Ignore` annotation in a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreDecl {
    /// Target type qualifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl MemberDecl {
    fn to_descriptor(&self, ty: Ty) -> MemberDescriptor {
        let mut member = MemberDescriptor::new(self.name.clone(), ty).with_access(self.access.into());
        member.is_static = self.is_static;
        if self.is_static {
            member.access = Access::ReadOnly;
        }
        for bind in &self.bind {
            member = member.with_attribute(MemberAttribute::Bind {
                name: bind.name.clone(),
                target: bind.target.as_deref().map(TypeName::new),
            });
        }
        for ignore in &self.ignore {
            member = member.with_attribute(MemberAttribute::Ignore {
                target: ignore.target.as_deref().map(TypeName::new),
            });
        }
        member
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PEOPLE: &str = r"
types:
  Person:
    kind: object
    members:
      - { name: Name, type: String, bind: [{ name: FullName, target: PersonDto }] }
      - { name: Tint, type: Color? }
      - { name: Boss, type: Person }
      - { name: Version, type: i32, static: true, initial: 3 }
      - { name: Secret, type: String, ignore: [{}] }
  Color:
    kind: enum
    variants: { Red: 1, Green: 2 }
";

    #[test]
    fn loads_yaml_with_forward_references() {
        let catalog = TypeCatalog::from_yaml_str(PEOPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        let person = catalog.object(&"Person".into()).unwrap();
        assert_eq!(person.find("Tint").unwrap().ty, Ty::nullable(Ty::enumeration("Color")));
        assert_eq!(person.find("Boss").unwrap().ty, Ty::object("Person"));
        assert_eq!(
            person.find("Name").unwrap().attributes,
            vec![MemberAttribute::bind_for("FullName", "PersonDto")]
        );
        assert_eq!(person.find("Secret").unwrap().attributes, vec![MemberAttribute::ignore()]);
    }

    #[test]
    fn statics_are_seeded_and_settable() {
        let catalog = TypeCatalog::from_yaml_str(PEOPLE).unwrap();
        let owner = TypeName::new("Person");
        assert_eq!(catalog.static_value(&owner, "Version"), Some(Value::Int(3)));
        let previous = catalog.set_static("Person", "Version", 4_i32).unwrap();
        assert_eq!(previous, Value::Int(3));
        assert_eq!(catalog.static_value(&owner, "Version"), Some(Value::Int(4)));
        assert!(catalog.set_static("Person", "Name", 1_i32).is_err());
    }

    #[test]
    fn readable_and_writable_members() {
        let catalog = TypeCatalog::from_yaml_str(PEOPLE).unwrap();
        let person = Ty::object("Person");
        let readable: Vec<_> = catalog.readable_members(&person).into_iter().map(|m| m.name).collect();
        let writable: Vec<_> = catalog.writable_members(&person).into_iter().map(|m| m.name).collect();
        assert_eq!(readable, ["Name", "Tint", "Boss", "Version", "Secret"]);
        assert_eq!(writable, ["Name", "Tint", "Boss", "Secret"]);
    }

    #[test]
    fn duplicate_and_bad_types_fail() {
        let mut catalog = TypeCatalog::new();
        catalog.declare(ObjectDescriptor::new("A")).unwrap();
        assert!(matches!(
            catalog.declare(ObjectDescriptor::new("A")),
            Err(CatalogError::Duplicate(_))
        ));

        let bad = "types:\n  A:\n    kind: object\n    members:\n      - { name: X, type: Nope }\n";
        assert!(matches!(
            TypeCatalog::from_yaml_str(bad),
            Err(CatalogError::MemberType { .. })
        ));
    }

    #[test]
    fn loads_json_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let doc = r#"{"types": {"Flag": {"kind": "enum", "variants": {"On": 1}}}}"#;
        file.write_all(doc.as_bytes()).unwrap();
        let catalog = TypeCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.resolve("Flag"), Some(Ty::enumeration("Flag")));
        assert_eq!(catalog.parse_ty("List<Flag>").unwrap(), Ty::list(Ty::enumeration("Flag")));
    }
}

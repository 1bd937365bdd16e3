//! Type and member descriptors
//!
//! Descriptors are what the introspection collaborator knows about a declared
//! type: its members with their access rules and annotations, whether it can
//! be default-constructed, and for enums the variant table.

use crate::ty::{PrimitiveKind, Ty, TypeName};
use crate::value::Value;

/// How a member may be accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Getter and setter
    #[default]
    ReadWrite,
    /// Getter only
    ReadOnly,
    /// Setter only
    WriteOnly,
}

impl Access {
    /// Has a getter
    #[inline]
    #[must_use]
    pub fn readable(self) -> bool {
        matches!(self, Self::ReadWrite | Self::ReadOnly)
    }

    /// Has a single-argument setter
    #[inline]
    #[must_use]
    pub fn writable(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

/// Mapping annotation attached to a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAttribute {
    /// Skip this member, for every target or only for `target`
    Ignore {
        /// Target type the ignore applies to; `None` applies to all targets
        target: Option<TypeName>,
    },
    /// Bind this member to another by name
    ///
    /// On a source member, `name` is the target member to write. On a target
    /// member, `name` is the source member to read (reverse lookup).
    Bind {
        /// Name of the counterpart member
        name: String,
        /// Counterpart type the bind applies to; `None` applies to all
        target: Option<TypeName>,
    },
}

impl MemberAttribute {
    /// Unqualified ignore
    #[inline]
    #[must_use]
    pub fn ignore() -> Self {
        Self::Ignore { target: None }
    }

    /// Ignore only when mapping into `target`
    #[inline]
    #[must_use]
    pub fn ignore_for(target: impl Into<TypeName>) -> Self {
        Self::Ignore {
            target: Some(target.into()),
        }
    }

    /// Unqualified bind
    #[inline]
    #[must_use]
    pub fn bind(name: impl Into<String>) -> Self {
        Self::Bind {
            name: name.into(),
            target: None,
        }
    }

    /// Bind only when the counterpart type is `target`
    #[inline]
    #[must_use]
    pub fn bind_for(name: impl Into<String>, target: impl Into<TypeName>) -> Self {
        Self::Bind {
            name: name.into(),
            target: Some(target.into()),
        }
    }
}

/// Declared member of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Declared value type
    pub ty: Ty,
    /// Getter/setter availability
    pub access: Access,
    /// Static (type-level) member
    pub is_static: bool,
    /// Mapping annotations
    pub attributes: Vec<MemberAttribute>,
    /// Initializer: the value a default-constructed instance starts with, or
    /// the initial value of a static member
    pub initial: Option<Value>,
}

impl MemberDescriptor {
    /// Read-write instance member
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            access: Access::ReadWrite,
            is_static: false,
            attributes: Vec::new(),
            initial: None,
        }
    }

    /// Static member holding `value`; statics are readable only
    #[must_use]
    pub fn static_member(name: impl Into<String>, ty: Ty, value: Value) -> Self {
        Self {
            access: Access::ReadOnly,
            is_static: true,
            initial: Some(value),
            ..Self::new(name, ty)
        }
    }

    /// Set access
    #[inline]
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Add an annotation
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, attribute: MemberAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Set the initializer
    #[inline]
    #[must_use]
    pub fn with_initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Readable by a mapping (getter, instance or static)
    #[inline]
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.access.readable()
    }

    /// Writable by a mapping (setter, instance only)
    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !self.is_static && self.access.writable()
    }
}

/// Object (class or struct) descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    /// Type name
    pub name: TypeName,
    /// Members in declaration order
    pub members: Vec<MemberDescriptor>,
    /// Has a public parameterless constructor
    pub default_constructor: bool,
    /// Value kind (struct): can always be zero-initialized
    pub value_kind: bool,
}

impl ObjectDescriptor {
    /// Reference-kind object with a default constructor and no members
    #[must_use]
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            default_constructor: true,
            value_kind: false,
        }
    }

    /// Add a read-write instance field
    #[inline]
    #[must_use]
    pub fn field(self, name: impl Into<String>, ty: Ty) -> Self {
        self.member(MemberDescriptor::new(name, ty))
    }

    /// Add a static field
    #[inline]
    #[must_use]
    pub fn static_field(self, name: impl Into<String>, ty: Ty, value: impl Into<Value>) -> Self {
        self.member(MemberDescriptor::static_member(name, ty, value.into()))
    }

    /// Add a member
    #[inline]
    #[must_use]
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Drop the parameterless constructor
    #[inline]
    #[must_use]
    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    /// Mark as value kind
    #[inline]
    #[must_use]
    pub fn value_kind(mut self) -> Self {
        self.value_kind = true;
        self
    }

    /// Look up a member by exact name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether an instance can be allocated without arguments
    #[inline]
    #[must_use]
    pub fn constructible(&self) -> bool {
        self.default_constructor || self.value_kind
    }
}

/// Enum variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Variant name
    pub name: String,
    /// Underlying value
    pub discriminant: i64,
}

/// Enumeration descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Type name
    pub name: TypeName,
    /// Underlying integer kind
    pub underlying: PrimitiveKind,
    /// Variants in declaration order
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    /// Empty `i32`-backed enum
    #[must_use]
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            underlying: PrimitiveKind::I32,
            variants: Vec::new(),
        }
    }

    /// Set underlying integer kind
    #[inline]
    #[must_use]
    pub fn with_underlying(mut self, underlying: PrimitiveKind) -> Self {
        self.underlying = underlying;
        self
    }

    /// Add a variant
    #[inline]
    #[must_use]
    pub fn variant(mut self, name: impl Into<String>, discriminant: i64) -> Self {
        self.variants.push(EnumVariant {
            name: name.into(),
            discriminant,
        });
        self
    }

    /// Variant name for a discriminant
    #[must_use]
    pub fn name_of(&self, discriminant: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.discriminant == discriminant)
            .map(|v| v.name.as_str())
    }

    /// Discriminant for a variant name
    #[must_use]
    pub fn discriminant_of(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.discriminant)
    }
}

/// Any declared type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Object type
    Object(ObjectDescriptor),
    /// Enumeration
    Enum(EnumDescriptor),
}

impl TypeDescriptor {
    /// Declared name
    #[must_use]
    pub fn name(&self) -> &TypeName {
        match self {
            Self::Object(object) => &object.name,
            Self::Enum(enumeration) => &enumeration.name,
        }
    }

    /// The [`Ty`] referring to this declaration
    #[must_use]
    pub fn ty(&self) -> Ty {
        match self {
            Self::Object(object) => Ty::Object(object.name.clone()),
            Self::Enum(enumeration) => Ty::Enum(enumeration.name.clone()),
        }
    }
}

impl From<ObjectDescriptor> for TypeDescriptor {
    fn from(value: ObjectDescriptor) -> Self {
        Self::Object(value)
    }
}

impl From<EnumDescriptor> for TypeDescriptor {
    fn from(value: EnumDescriptor) -> Self {
        Self::Enum(value)
    }
}

/// Member as seen by a mapping: owner plus the descriptor fields it needs
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    /// Declaring type
    pub owner: TypeName,
    /// Member name
    pub name: String,
    /// Declared value type
    pub ty: Ty,
    /// Static member
    pub is_static: bool,
    /// Mapping annotations
    pub attributes: Vec<MemberAttribute>,
}

impl MemberInfo {
    /// Build from a descriptor
    #[must_use]
    pub fn from_descriptor(owner: &TypeName, member: &MemberDescriptor) -> Self {
        Self {
            owner: owner.clone(),
            name: member.name.clone(),
            ty: member.ty.clone(),
            is_static: member.is_static,
            attributes: member.attributes.clone(),
        }
    }
}

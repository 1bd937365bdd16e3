//! Data-shape types
//!
//! Provides [`Ty`], the structural description of every shape the mapper can
//! route, and [`TypeName`], the cheap handle naming a declared object or enum.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Name of a declared object or enum type
///
/// Cloning is a reference-count bump, so names can be captured freely by
/// compiled routines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create a type name
    #[inline]
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Borrow the name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Primitive numeric, boolean and character kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `char` (Unicode scalar value)
    Char,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order
    pub const ALL: [PrimitiveKind; 12] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    /// Keyword used in type expressions
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Parse a primitive keyword
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Signed integer kinds
    #[inline]
    #[must_use]
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Unsigned integer kinds
    #[inline]
    #[must_use]
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Any integer kind
    #[inline]
    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Floating point kinds
    #[inline]
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Width in bits (bool counts as 1, char as 32)
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::Char | Self::I32 | Self::U32 | Self::F32 => 32,
            Self::I64 | Self::U64 | Self::F64 => 64,
        }
    }

    /// Inclusive signed range for integer kinds that fit in `i128`
    #[must_use]
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural description of a data shape
///
/// Equality and hashing are structural, which is what makes [`Ty`] usable as
/// half of a [`TypePair`](crate::TypePair) key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Numeric, boolean or character primitive
    Primitive(PrimitiveKind),
    /// Immutable text
    String,
    /// Fixed-point decimal
    Decimal,
    /// UTC timestamp
    DateTime,
    /// Signed time span
    Duration,
    /// 128-bit unique id
    Uuid,
    /// Optional value kind
    Nullable(Box<Ty>),
    /// Declared enumeration
    Enum(TypeName),
    /// Declared object (class or struct)
    Object(TypeName),
    /// Growable list
    List(Box<Ty>),
    /// Fixed-length array
    Array(Box<Ty>),
    /// Generic enumerable interface
    Sequence(Box<Ty>),
    /// Dictionary
    Map(Box<Ty>, Box<Ty>),
}

impl Ty {
    /// `bool`
    pub const BOOL: Ty = Ty::Primitive(PrimitiveKind::Bool);
    /// `char`
    pub const CHAR: Ty = Ty::Primitive(PrimitiveKind::Char);
    /// `i32`
    pub const I32: Ty = Ty::Primitive(PrimitiveKind::I32);
    /// `i64`
    pub const I64: Ty = Ty::Primitive(PrimitiveKind::I64);
    /// `u8`
    pub const U8: Ty = Ty::Primitive(PrimitiveKind::U8);
    /// `f64`
    pub const F64: Ty = Ty::Primitive(PrimitiveKind::F64);

    /// Object type reference
    #[inline]
    #[must_use]
    pub fn object(name: impl Into<TypeName>) -> Self {
        Self::Object(name.into())
    }

    /// Enum type reference
    #[inline]
    #[must_use]
    pub fn enumeration(name: impl Into<TypeName>) -> Self {
        Self::Enum(name.into())
    }

    /// `List<T>`
    #[inline]
    #[must_use]
    pub fn list(element: Ty) -> Self {
        Self::List(Box::new(element))
    }

    /// `Array<T>`
    #[inline]
    #[must_use]
    pub fn array(element: Ty) -> Self {
        Self::Array(Box::new(element))
    }

    /// `Seq<T>`
    #[inline]
    #[must_use]
    pub fn sequence(element: Ty) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// `Map<K, V>`
    #[inline]
    #[must_use]
    pub fn map(key: Ty, value: Ty) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Nullable wrapper
    ///
    /// Only value kinds get a wrapper. Reference shapes (strings, objects,
    /// collections) are already nullable and nested wrappers collapse.
    #[must_use]
    pub fn nullable(inner: Ty) -> Self {
        match inner {
            already @ Ty::Nullable(_) => already,
            inner if inner.is_value_kind() => Ty::Nullable(Box::new(inner)),
            reference => reference,
        }
    }

    /// Primitive kind, if any
    #[inline]
    #[must_use]
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Primitive numeric/boolean/char kind
    #[inline]
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Immutable built-in value kinds copied verbatim
    #[inline]
    #[must_use]
    pub fn is_immutable_builtin(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Decimal | Self::DateTime | Self::Duration | Self::Uuid
        )
    }

    /// Types with copy semantics that may be wrapped in [`Ty::Nullable`]
    #[inline]
    #[must_use]
    pub fn is_value_kind(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_)
                | Self::Decimal
                | Self::DateTime
                | Self::Duration
                | Self::Uuid
                | Self::Enum(_)
        )
    }

    /// Nullable wrapper check
    #[inline]
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Inner type of a nullable wrapper
    #[inline]
    #[must_use]
    pub fn nullable_inner(&self) -> Option<&Ty> {
        match self {
            Self::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Strip a nullable wrapper if present
    #[inline]
    #[must_use]
    pub fn unwrap_nullable(&self) -> &Ty {
        self.nullable_inner().unwrap_or(self)
    }

    /// Enum check (nullable enums included)
    #[inline]
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self.unwrap_nullable(), Self::Enum(_))
    }

    /// Object check
    #[inline]
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Scalar kinds the convertible builder handles
    ///
    /// Primitive, string, unique-id, enum, decimal, date/time, duration, or a
    /// nullable wrapper around one of these.
    #[must_use]
    pub fn is_convertible_kind(&self) -> bool {
        match self {
            Self::Nullable(inner) => inner.is_convertible_kind(),
            Self::Primitive(_)
            | Self::String
            | Self::Decimal
            | Self::DateTime
            | Self::Duration
            | Self::Uuid
            | Self::Enum(_) => true,
            _ => false,
        }
    }

    /// Enumerable-shaped types (lists, arrays, sequences, dictionaries)
    #[inline]
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        matches!(
            self,
            Self::List(_) | Self::Array(_) | Self::Sequence(_) | Self::Map(..)
        )
    }

    /// Dictionary check
    #[inline]
    #[must_use]
    pub fn is_dictionary(&self) -> bool {
        matches!(self, Self::Map(..))
    }

    /// Element type of a list, array or sequence
    #[must_use]
    pub fn element(&self) -> Option<&Ty> {
        match self {
            Self::List(element) | Self::Array(element) | Self::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// Key and value types of a dictionary
    #[must_use]
    pub fn entry(&self) -> Option<(&Ty, &Ty)> {
        match self {
            Self::Map(key, value) => Some((key, value)),
            _ => None,
        }
    }

    /// Declared name for objects and enums
    #[must_use]
    pub fn type_name(&self) -> Option<&TypeName> {
        match self.unwrap_nullable() {
            Self::Object(name) | Self::Enum(name) => Some(name),
            _ => None,
        }
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::String => f.write_str("String"),
            Self::Decimal => f.write_str("Decimal"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Duration => f.write_str("Duration"),
            Self::Uuid => f.write_str("Uuid"),
            Self::Nullable(inner) => write!(f, "{inner}?"),
            Self::Enum(name) | Self::Object(name) => write!(f, "{name}"),
            Self::List(element) => write!(f, "List<{element}>"),
            Self::Array(element) => write!(f, "Array<{element}>"),
            Self::Sequence(element) => write!(f, "Seq<{element}>"),
            Self::Map(key, value) => write!(f, "Map<{key}, {value}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_wraps_value_kinds_only() {
        assert_eq!(Ty::nullable(Ty::I32), Ty::Nullable(Box::new(Ty::I32)));
        assert_eq!(Ty::nullable(Ty::String), Ty::String);
        assert_eq!(Ty::nullable(Ty::object("Person")), Ty::object("Person"));
    }

    #[test]
    fn nullable_collapses() {
        let once = Ty::nullable(Ty::Uuid);
        assert_eq!(Ty::nullable(once.clone()), once);
    }

    #[test]
    fn convertible_kinds() {
        assert!(Ty::I32.is_convertible_kind());
        assert!(Ty::nullable(Ty::enumeration("Color")).is_convertible_kind());
        assert!(!Ty::list(Ty::I32).is_convertible_kind());
        assert!(!Ty::object("Person").is_convertible_kind());
    }

    #[test]
    fn display_round_trips_common_shapes() {
        assert_eq!(Ty::map(Ty::String, Ty::list(Ty::I64)).to_string(), "Map<String, List<i64>>");
        assert_eq!(Ty::nullable(Ty::F64).to_string(), "f64?");
        assert_eq!(Ty::sequence(Ty::object("Node")).to_string(), "Seq<Node>");
    }

    #[test]
    fn primitive_names() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("int"), None);
    }

    #[test]
    fn element_and_entry() {
        assert_eq!(Ty::array(Ty::U8).element(), Some(&Ty::U8));
        let map = Ty::map(Ty::String, Ty::I32);
        assert_eq!(map.entry(), Some((&Ty::String, &Ty::I32)));
        assert!(map.element().is_none());
    }
}

//! Dynamic values
//!
//! [`Value`] is the runtime representation of an instance of any [`Ty`].
//! Values carry just enough shape to be mapped; the declared type that
//! governs a conversion always comes from the bound [`TypePair`], never from
//! the value itself.
//!
//! [`Ty`]: crate::Ty
//! [`TypePair`]: crate::TypePair

use crate::decimal::Decimal;
use crate::ty::TypeName;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

/// Instance of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Declaring enum
    pub type_name: TypeName,
    /// Underlying integral value
    pub discriminant: i64,
}

impl EnumValue {
    /// Create enum value
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<TypeName>, discriminant: i64) -> Self {
        Self {
            type_name: type_name.into(),
            discriminant,
        }
    }
}

/// Instance of a declared object type
///
/// Fields keep insertion order. A field absent from the map reads as
/// [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    type_name: TypeName,
    fields: IndexMap<String, Value>,
}

impl Object {
    /// Create empty object of the given type
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Declared type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Field value
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Mutable field value
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Set a field, returning the previous value
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Take a field out, leaving `Null` in its place
    #[inline]
    pub fn take(&mut self, name: &str) -> Value {
        self.fields
            .get_mut(name)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields present
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Dynamic value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// Any signed integer kind
    Int(i64),
    /// Any unsigned integer kind
    UInt(u64),
    /// Any floating point kind
    Float(f64),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Text
    String(String),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Time span
    Duration(TimeDelta),
    /// Unique id
    Uuid(Uuid),
    /// Enumeration member
    Enum(EnumValue),
    /// Growable list (also used for generic sequences)
    List(Vec<Value>),
    /// Fixed-length array
    Array(Vec<Value>),
    /// Dictionary entries in insertion order
    Map(Vec<(Value, Value)>),
    /// Object instance
    Object(Object),
}

impl Value {
    /// Null check
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short shape name used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Uuid(_) => "uuid",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Borrow as object
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Mutably borrow as object
    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list or array
    #[inline]
    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Read a field of an object value
    ///
    /// Reading through `Null` yields `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(name))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Self::Int(i64::from(value))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Self::UInt(u64::from(value))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_builder_and_access() {
        let person = Object::new("Person").with("Name", "Ada").with("Age", 36_i32);
        assert_eq!(person.type_name().as_str(), "Person");
        assert_eq!(person.get("Name"), Some(&Value::from("Ada")));
        assert_eq!(person.get("Age"), Some(&Value::Int(36)));
        assert_eq!(person.len(), 2);
    }

    #[test]
    fn take_leaves_null() {
        let mut obj = Object::new("T").with("A", 1_u8);
        assert_eq!(obj.take("A"), Value::UInt(1));
        assert_eq!(obj.get("A"), Some(&Value::Null));
        assert_eq!(obj.take("Missing"), Value::Null);
    }

    #[test]
    fn option_and_vec_conversions() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1_i32, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn field_through_null_is_none() {
        assert!(Value::Null.field("X").is_none());
        let v = Value::Object(Object::new("T").with("X", true));
        assert_eq!(v.field("X"), Some(&Value::Bool(true)));
    }
}

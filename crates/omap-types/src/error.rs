//! Error types for omap-types
//!
//! Provides error handling for:
//! - Type-expression parsing
//! - Built-in scalar conversion
//! - Catalog loading and static member access
//! - Runtime mapping failures surfaced by compiled routines

use crate::ty::{Ty, TypeName};

/// Type-expression parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    /// Character not valid at this position
    #[error("unexpected {found:?} at offset {at} in type expression {input:?}")]
    Unexpected {
        /// Full expression
        input: String,
        /// Byte offset
        at: usize,
        /// Offending character
        found: char,
    },

    /// Expression ended early
    #[error("unexpected end of type expression {input:?}")]
    UnexpectedEnd {
        /// Full expression
        input: String,
    },

    /// Wrong number of generic arguments
    #[error("{name} takes {expected} type argument(s), found {found}")]
    Arity {
        /// Generic name
        name: String,
        /// Required count
        expected: usize,
        /// Supplied count
        found: usize,
    },

    /// Name is neither built in nor declared
    #[error("unknown type {name:?}")]
    UnknownType {
        /// Unresolved name
        name: String,
    },
}

/// Scalar conversion failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// No built-in conversion exists between the shapes
    #[error("no conversion from {from} to {to}")]
    Unsupported {
        /// Source type
        from: Ty,
        /// Target type
        to: Ty,
    },

    /// Value does not fit the target range
    #[error("value {value} overflows {to}")]
    Overflow {
        /// Rendered value
        value: String,
        /// Target type
        to: Ty,
    },

    /// Text could not be parsed as the target type
    #[error("cannot parse {value:?} as {to}")]
    Parse {
        /// Input text
        value: String,
        /// Target type
        to: Ty,
    },

    /// Enum has no variant with this name
    #[error("enum {enum_name} has no variant {variant:?}")]
    UnknownVariant {
        /// Enum type
        enum_name: TypeName,
        /// Requested variant
        variant: String,
    },

    /// Enum type is not declared
    #[error("enum {0} is not declared")]
    UnknownEnum(TypeName),

    /// Runtime value shape does not match the declared type
    #[error("expected a value of type {expected}, found {found}")]
    ValueMismatch {
        /// Declared type
        expected: Ty,
        /// Shape of the runtime value
        found: &'static str,
    },
}

/// Catalog construction or lookup failure
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// File read failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension not recognized
    #[error("unsupported catalog format: {path}")]
    UnsupportedFormat {
        /// Offending path
        path: String,
    },

    /// Same name declared twice
    #[error("type {0} is declared more than once")]
    Duplicate(TypeName),

    /// Member type expression failed to parse
    #[error("member {owner}.{member}: {error}")]
    MemberType {
        /// Declaring type
        owner: TypeName,
        /// Member name
        member: String,
        /// Parse failure
        #[source]
        error: TypeParseError,
    },

    /// Initial value does not fit the member type
    #[error("member {owner}.{member}: {error}")]
    Initial {
        /// Declaring type
        owner: TypeName,
        /// Member name
        member: String,
        /// Conversion failure
        #[source]
        error: ConvertError,
    },

    /// Type not declared
    #[error("type {0} is not declared")]
    UnknownType(TypeName),

    /// Static member not declared on the type
    #[error("type {owner} has no static member {member}")]
    UnknownStatic {
        /// Declaring type
        owner: TypeName,
        /// Member name
        member: String,
    },
}

/// Runtime mapping failure
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// No mapper registered for the pair
    #[error("no mapper is bound for {source_type} -> {target_type}; call bind({source_type}, {target_type}) first")]
    Unbound {
        /// Source type
        source_type: Ty,
        /// Target type
        target_type: Ty,
    },

    /// Value shape does not match what the routine expects
    #[error("expected {expected}, found {found}")]
    ShapeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        found: &'static str,
    },

    /// Null encountered where an object was required
    #[error("null reference while writing {member}")]
    NullReference {
        /// Member being written
        member: String,
    },

    /// Built-in conversion failed
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    /// User converter failed
    #[error(transparent)]
    Converter(#[from] anyhow::Error),

    /// Routine referenced a sibling that does not exist
    #[error("mapper {0} is not part of this graph")]
    UnresolvedMapper(usize),

    /// Value carries no type name to infer the source type from
    #[error("cannot infer a source type from a {0} value")]
    CannotInfer(&'static str),
}

impl MapError {
    /// Shape mismatch helper
    #[inline]
    #[must_use]
    pub fn shape(expected: impl Into<String>, found: &crate::Value) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            found: found.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_names_both_types() {
        let err = MapError::Unbound {
            source_type: Ty::object("Person"),
            target_type: Ty::object("PersonDto"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Person"));
        assert!(msg.contains("PersonDto"));
        assert!(msg.contains("bind"));
    }

    #[test]
    fn converter_errors_are_transparent() {
        let err = MapError::from(anyhow::anyhow!("bad zip code"));
        assert_eq!(err.to_string(), "bad zip code");
    }
}

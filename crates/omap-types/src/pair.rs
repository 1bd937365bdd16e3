//! Source/target type pairs
//!
//! [`TypePair`] is the key every mapper is cached and registered under, and
//! the unit the builders classify to pick a strategy.

use crate::ty::Ty;
use std::fmt::{self, Display, Formatter};

/// Ordered (source, target) pair of types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
    /// Type being read
    pub source: Ty,
    /// Type being produced
    pub target: Ty,
}

impl TypePair {
    /// Create pair
    #[inline]
    #[must_use]
    pub fn new(source: Ty, target: Ty) -> Self {
        Self { source, target }
    }

    /// Both sides are lists, arrays, sequences or dictionaries
    #[inline]
    #[must_use]
    pub fn is_enumerable_types(&self) -> bool {
        self.source.is_enumerable() && self.target.is_enumerable()
    }

    /// Both sides are enums, looking through nullable wrappers
    #[inline]
    #[must_use]
    pub fn is_enum_types(&self) -> bool {
        self.source.is_enum() && self.target.is_enum()
    }

    /// Source is nullable and target is not
    #[inline]
    #[must_use]
    pub fn is_nullable_to_not_nullable(&self) -> bool {
        self.source.is_nullable() && !self.target.is_nullable()
    }

    /// Values of the source can be copied verbatim into the target
    ///
    /// Holds only for identical sides that are primitives, immutable
    /// built-ins, or nullable wrappers around either.
    #[must_use]
    pub fn is_deep_cloneable(&self) -> bool {
        if self.source != self.target {
            return false;
        }
        deep_cloneable(&self.source)
    }

    /// Same pair with sides swapped
    #[inline]
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.target.clone(), self.source.clone())
    }
}

fn deep_cloneable(ty: &Ty) -> bool {
    match ty {
        Ty::Nullable(inner) => deep_cloneable(inner),
        ty => ty.is_primitive() || ty.is_immutable_builtin(),
    }
}

impl Display for TypePair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

impl From<(Ty, Ty)> for TypePair {
    fn from((source, target): (Ty, Ty)) -> Self {
        Self::new(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: Ty, target: Ty) -> TypePair {
        TypePair::new(source, target)
    }

    #[test]
    fn deep_cloneable_requires_identity() {
        assert!(pair(Ty::I32, Ty::I32).is_deep_cloneable());
        assert!(!pair(Ty::I32, Ty::I64).is_deep_cloneable());
    }

    #[test]
    fn deep_cloneable_allow_list() {
        for ty in [Ty::String, Ty::Decimal, Ty::DateTime, Ty::Duration, Ty::Uuid] {
            assert!(pair(ty.clone(), ty).is_deep_cloneable());
        }
        assert!(pair(Ty::nullable(Ty::Uuid), Ty::nullable(Ty::Uuid)).is_deep_cloneable());
    }

    #[test]
    fn objects_and_collections_are_not_deep_cloneable() {
        assert!(!pair(Ty::object("A"), Ty::object("A")).is_deep_cloneable());
        assert!(!pair(Ty::list(Ty::I32), Ty::list(Ty::I32)).is_deep_cloneable());
        assert!(!pair(Ty::enumeration("E"), Ty::enumeration("E")).is_deep_cloneable());
    }

    #[test]
    fn classification() {
        assert!(pair(Ty::list(Ty::I32), Ty::array(Ty::I64)).is_enumerable_types());
        assert!(!pair(Ty::list(Ty::I32), Ty::I32).is_enumerable_types());
        assert!(pair(Ty::enumeration("A"), Ty::nullable(Ty::enumeration("B"))).is_enum_types());
        assert!(pair(Ty::nullable(Ty::I32), Ty::I32).is_nullable_to_not_nullable());
        assert!(!pair(Ty::I32, Ty::nullable(Ty::I32)).is_nullable_to_not_nullable());
    }

    #[test]
    fn display() {
        assert_eq!(pair(Ty::I32, Ty::String).to_string(), "i32 -> String");
    }
}

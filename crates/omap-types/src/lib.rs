//! omap data-shape model
//!
//! Everything the mapping engine knows about types and values, independent of
//! how mappers are built.
//!
//! # Overview
//!
//! - **Ty / TypeName**: structural description of a data shape
//! - **TypePair**: the (source, target) key mappers are cached under, with
//!   the classification predicates the builders dispatch on
//! - **Value**: dynamic instances (objects, collections, scalars)
//! - **TypeIntrospector**: descriptor lookup collaborator; [`TypeCatalog`] is
//!   the default implementation
//! - **convert / defaults / json**: built-in scalar conversions, zero values
//!   and default instances, JSON bridge
//!
//! # Example
//!
//! ```rust
//! use omap_types::{ObjectDescriptor, Ty, TypeCatalog, TypePair};
//!
//! let catalog = TypeCatalog::new()
//!     .with(ObjectDescriptor::new("Person").field("Name", Ty::String));
//!
//! let pair = TypePair::new(catalog.parse_ty("Person").unwrap(), Ty::object("Person"));
//! assert!(!pair.is_deep_cloneable());
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod convert;
pub mod decimal;
pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod json;
pub mod pair;
pub mod parse;
pub mod ty;
pub mod value;

// Re-exports
pub use catalog::{CatalogFile, TypeCatalog};
pub use decimal::Decimal;
pub use descriptor::{
    Access, EnumDescriptor, EnumVariant, MemberAttribute, MemberDescriptor, MemberInfo,
    ObjectDescriptor, TypeDescriptor,
};
pub use error::{CatalogError, ConvertError, MapError, TypeParseError};
pub use introspect::TypeIntrospector;
pub use pair::TypePair;
pub use parse::parse_ty;
pub use ty::{PrimitiveKind, Ty, TypeName};
pub use value::{EnumValue, Object, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for describing types and building values
    pub use crate::{
        EnumDescriptor, EnumValue, MapError, MemberAttribute, MemberDescriptor, Object,
        ObjectDescriptor, Ty, TypeCatalog, TypeIntrospector, TypeName, TypePair, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

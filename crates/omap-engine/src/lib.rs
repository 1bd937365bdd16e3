//! omap mapping engine
//!
//! Builds cycle-safe mapper graphs for (source, target) type pairs and runs
//! them over dynamic [`Value`](omap_types::Value)s.
//!
//! # Overview
//!
//! - **BindingConfig**: per-pair renames, member paths, type overrides,
//!   converters and ignores
//! - **MappingMemberBuilder**: pairs source members with target members
//! - **Builders**: convertible, collection, class and custom strategies
//! - **MapperCache**: reserves ids ahead of building so recursive pairs
//!   resolve to the same node
//! - **Mapper / MapperGraph**: the immutable result of a bind
//! - **ObjectMapper**: registry facade with `bind` and `map`
//! - **MappingProfile**: declarative configuration loaded from YAML/JSON
//!
//! # Example
//!
//! ```rust
//! use omap_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = TypeCatalog::new()
//!     .with(ObjectDescriptor::new("Node").field("Id", Ty::I32).field("Next", Ty::object("Node")))
//!     .with(ObjectDescriptor::new("NodeDto").field("Id", Ty::I64).field("Next", Ty::object("NodeDto")));
//! let mapper = ObjectMapper::new(Arc::new(catalog));
//!
//! let bound = mapper.bind(Ty::object("Node"), Ty::object("NodeDto"), None)?;
//! assert_eq!(bound.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod global;
pub mod mapper;
pub mod member;
pub mod profile;
pub mod registry;

// Re-exports
pub use binding::{BindingConfig, BindingFieldPath, Converter};
pub use builder::{
    default_builders, BuildContext, ClassMapperBuilder, CollectionMapperBuilder,
    ConvertibleMapperBuilder, CustomMapperBuilder, MapperBuilder,
};
pub use cache::{MapperCache, MapperCacheItem, MapperId};
pub use config::{MapperConfig, NameMatcher, NameMatching, RebindPolicy};
pub use error::{BindError, BindingError, ProfileError};
pub use mapper::{routine, Mapper, MapperGraph, MapperKind, MapperNode};
pub use member::{MappingMember, MappingMemberBuilder, MappingMemberPath};
pub use profile::{FieldBind, MappingProfile, ProfileBinding};
pub use registry::{ObjectMapper, ObjectMapperBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for binding and mapping
    pub use crate::{
        BindError, BindingConfig, Mapper, MapperConfig, MappingProfile, NameMatching,
        ObjectMapper, RebindPolicy,
    };
    pub use omap_types::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

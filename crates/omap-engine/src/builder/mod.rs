//! Mapper builders
//!
//! One strategy per pair shape, tried in order: convertible, collection,
//! class. The first builder whose [`MapperBuilder::supports`] accepts a pair
//! builds its node. Custom converters are not dispatched; the class builder
//! attaches them per member through [`BuildContext::custom`].
//!
//! Builders obtain sibling mappers through [`BuildContext::mapper_for`],
//! which reserves a cache id before building so recursive pairs terminate.

mod class;
mod collection;
mod convertible;
mod custom;

pub use class::ClassMapperBuilder;
pub use collection::CollectionMapperBuilder;
pub use convertible::ConvertibleMapperBuilder;
pub use custom::CustomMapperBuilder;

use crate::binding::{BindingConfig, Converter};
use crate::cache::{MapperCache, MapperId};
use crate::config::MapperConfig;
use crate::error::BindError;
use crate::mapper::{MapperGraph, MapperNode};
use omap_emit::{Program, Routine, RoutineBackend};
use omap_types::{TypeIntrospector, TypePair};
use std::fmt::Debug;
use std::sync::Arc;

/// Strategy for one family of pair shapes
pub trait MapperBuilder: Debug + Send + Sync {
    /// Builder name for diagnostics
    fn name(&self) -> &'static str;

    /// Whether this builder claims `pair`
    fn supports(&self, pair: &TypePair, ctx: &BuildContext<'_>) -> bool;

    /// Build the node for `pair`
    ///
    /// # Errors
    /// [`BindError`] when the pair cannot be mapped after all.
    fn build(&self, pair: &TypePair, ctx: &mut BuildContext<'_>) -> Result<MapperNode, BindError>;
}

/// Built-in builders in dispatch order
#[must_use]
pub fn default_builders() -> Vec<Box<dyn MapperBuilder>> {
    vec![
        Box::new(ConvertibleMapperBuilder::new()),
        Box::new(CollectionMapperBuilder::new()),
        Box::new(ClassMapperBuilder::new()),
    ]
}

/// Binding lookup used during a build
pub type BindingLookup<'a> = &'a dyn Fn(&TypePair) -> Option<Arc<BindingConfig>>;

/// State of one bind
pub struct BuildContext<'a> {
    introspector: &'a Arc<dyn TypeIntrospector>,
    config: &'a MapperConfig,
    backend: &'a dyn RoutineBackend,
    bindings: BindingLookup<'a>,
    builders: &'a [Box<dyn MapperBuilder>],
    cache: MapperCache,
}

impl<'a> BuildContext<'a> {
    /// Create context with an empty cache
    #[must_use]
    pub fn new(
        introspector: &'a Arc<dyn TypeIntrospector>,
        config: &'a MapperConfig,
        backend: &'a dyn RoutineBackend,
        bindings: BindingLookup<'a>,
        builders: &'a [Box<dyn MapperBuilder>],
    ) -> Self {
        Self {
            introspector,
            config,
            backend,
            bindings,
            builders,
            cache: MapperCache::new(),
        }
    }

    /// Type introspector
    #[inline]
    #[must_use]
    pub fn introspector(&self) -> &'a Arc<dyn TypeIntrospector> {
        self.introspector
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'a MapperConfig {
        self.config
    }

    /// Binding configuration for `pair`, if any
    #[must_use]
    pub fn binding(&self, pair: &TypePair) -> Option<Arc<BindingConfig>> {
        (self.bindings)(pair)
    }

    /// Cache of this bind
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &MapperCache {
        &self.cache
    }

    /// Compile `program` with the configured backend
    ///
    /// # Errors
    /// [`BindError::Emit`] when verification fails.
    pub fn compile(&self, program: &Program) -> Result<Routine, BindError> {
        Ok(self.backend.compile(program, self.introspector)?)
    }

    /// Id of the mapper for `pair`, building it on first request
    ///
    /// A pair already being built returns its reserved id.
    ///
    /// # Errors
    /// [`BindError::Unsupported`] when no builder claims the pair, or the
    /// claiming builder's error.
    pub fn mapper_for(&mut self, pair: &TypePair) -> Result<MapperId, BindError> {
        if let Some(id) = self.cache.lookup(pair) {
            return Ok(id);
        }
        let id = self.cache.reserve(pair.clone());
        let builders = self.builders;
        let ctx: &BuildContext<'a> = self;
        let Some(builder) = builders.iter().find(|b| b.supports(pair, ctx)) else {
            return Err(BindError::unsupported(pair));
        };
        tracing::debug!("{} builder takes {} as {}", builder.name(), pair, id);
        let node = builder.build(pair, self)?;
        self.cache.complete(id, node)?;
        Ok(id)
    }

    /// Id of a fresh mapper wrapping `converter` for one member
    ///
    /// # Errors
    /// [`BindError::UnresolvedStub`] if the reserved slot cannot be filled.
    pub fn custom(&mut self, pair: &TypePair, converter: Converter) -> Result<MapperId, BindError> {
        let id = self.cache.reserve_anonymous(pair.clone());
        let node = CustomMapperBuilder::new(converter).build(pair);
        self.cache.complete(id, node)?;
        Ok(id)
    }

    /// Freeze the cache into a graph rooted at `root`
    ///
    /// # Errors
    /// [`BindError::UnresolvedStub`] or [`BindError::UnknownRoot`].
    pub fn finish(self, root: MapperId) -> Result<MapperGraph, BindError> {
        self.cache.finalize(root)
    }
}

impl Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("backend", &self.backend.name())
            .field("builders", &self.builders.len())
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

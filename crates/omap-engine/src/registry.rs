//! Bind/Map facade
//!
//! [`ObjectMapper`] owns the registry of bound mappers. Binds are serialized
//! by one lock and publish their mapper only once the whole graph is
//! finalized; maps clone the mapper handle out of the registry and run
//! without holding any lock, so they never observe a partial graph.
//!
//! ```rust
//! use omap_engine::ObjectMapper;
//! use omap_types::{Object, ObjectDescriptor, Ty, TypeCatalog, Value};
//! use std::sync::Arc;
//!
//! let catalog = TypeCatalog::new()
//!     .with(ObjectDescriptor::new("Person").field("Name", Ty::String))
//!     .with(ObjectDescriptor::new("PersonDto").field("Name", Ty::String));
//! let mapper = ObjectMapper::new(Arc::new(catalog));
//!
//! let (person, dto) = (Ty::object("Person"), Ty::object("PersonDto"));
//! mapper.bind(person.clone(), dto.clone(), None)?;
//!
//! let source = Value::Object(Object::new("Person").with("Name", "Ada"));
//! let mapped = mapper.map(&person, &dto, source, None)?;
//! assert_eq!(mapped.field("Name"), Some(&Value::String("Ada".into())));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::binding::BindingConfig;
use crate::builder::{default_builders, BuildContext, MapperBuilder};
use crate::config::{MapperConfig, RebindPolicy};
use crate::error::BindError;
use crate::mapper::Mapper;
use dashmap::DashMap;
use omap_emit::{ClosureBackend, RoutineBackend};
use omap_types::{MapError, Ty, TypeIntrospector, TypePair, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// Registry of bound mappers
#[derive(Debug)]
pub struct ObjectMapper {
    introspector: Arc<dyn TypeIntrospector>,
    config: MapperConfig,
    backend: Arc<dyn RoutineBackend>,
    builders: Vec<Box<dyn MapperBuilder>>,
    mappers: DashMap<TypePair, Mapper>,
    bindings: DashMap<TypePair, Arc<BindingConfig>>,
    bind_lock: Mutex<()>,
}

impl ObjectMapper {
    /// Create with default configuration, backend and builders
    #[must_use]
    pub fn new(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self::builder(introspector).build()
    }

    /// Start a customized mapper
    #[must_use]
    pub fn builder(introspector: Arc<dyn TypeIntrospector>) -> ObjectMapperBuilder {
        ObjectMapperBuilder {
            introspector,
            config: MapperConfig::default(),
            backend: None,
            builders: default_builders(),
        }
    }

    /// Build and register the mapper graph for `source -> target`
    ///
    /// `config` customizes the root pair; `None` reuses whatever was
    /// registered for it through [`configure`](Self::configure) or an
    /// earlier bind. Nested pairs use their registered configuration. On
    /// failure nothing is registered.
    ///
    /// # Errors
    /// [`BindError::AlreadyBound`] under [`RebindPolicy::Reject`], otherwise
    /// whatever graph construction fails with.
    pub fn bind(
        &self,
        source: Ty,
        target: Ty,
        config: Option<BindingConfig>,
    ) -> Result<Mapper, BindError> {
        let pair = TypePair::new(source, target);
        let _guard = self.bind_lock.lock();
        if self.config.rebind == RebindPolicy::Reject && self.mappers.contains_key(&pair) {
            return Err(BindError::AlreadyBound {
                source_type: pair.source,
                target_type: pair.target,
            });
        }

        let pending = config.map(Arc::new);
        let lookup = |p: &TypePair| -> Option<Arc<BindingConfig>> {
            match &pending {
                Some(config) if *p == pair => Some(Arc::clone(config)),
                _ => self.bindings.get(p).map(|entry| Arc::clone(entry.value())),
            }
        };
        let mut ctx = BuildContext::new(
            &self.introspector,
            &self.config,
            self.backend.as_ref(),
            &lookup,
            &self.builders,
        );
        let root = ctx.mapper_for(&pair)?;
        let mapper = Mapper::new(ctx.finish(root)?);

        if let Some(config) = pending {
            self.bindings.insert(pair.clone(), config);
        }
        let replaced = self.mappers.insert(pair.clone(), mapper.clone()).is_some();
        if replaced {
            tracing::info!("rebound {} ({} mappers)", pair, mapper.len());
        } else {
            tracing::info!("bound {} ({} mappers)", pair, mapper.len());
        }
        Ok(mapper)
    }

    /// Map `value` with the mapper bound for `source -> target`
    ///
    /// # Errors
    /// [`MapError::Unbound`] when the pair was never bound; otherwise the
    /// mapper's runtime error.
    pub fn map(
        &self,
        source: &Ty,
        target: &Ty,
        value: Value,
        existing: Option<Value>,
    ) -> Result<Value, MapError> {
        let pair = TypePair::new(source.clone(), target.clone());
        let Some(mapper) = self.mapper(&pair) else {
            return Err(MapError::Unbound {
                source_type: pair.source,
                target_type: pair.target,
            });
        };
        mapper.map(value, existing)
    }

    /// Map `value`, taking the source type from the value itself
    ///
    /// # Errors
    /// [`MapError::CannotInfer`] for values without a declared type, then as
    /// [`map`](Self::map).
    pub fn map_inferred(&self, target: &Ty, value: Value) -> Result<Value, MapError> {
        let source = match &value {
            Value::Object(object) => Ty::Object(object.type_name().clone()),
            Value::Enum(variant) => Ty::Enum(variant.type_name.clone()),
            other => return Err(MapError::CannotInfer(other.kind())),
        };
        self.map(&source, target, value, None)
    }

    /// Store the binding configuration for a pair without binding it
    ///
    /// Applies to later binds that reach the pair, as root or nested.
    pub fn configure(&self, source: Ty, target: Ty, config: BindingConfig) {
        let _guard = self.bind_lock.lock();
        self.bindings
            .insert(TypePair::new(source, target), Arc::new(config));
    }

    /// Registered binding configuration for a pair
    #[must_use]
    pub fn binding(&self, pair: &TypePair) -> Option<Arc<BindingConfig>> {
        self.bindings.get(pair).map(|entry| Arc::clone(entry.value()))
    }

    /// Bound mapper for a pair
    #[must_use]
    pub fn mapper(&self, pair: &TypePair) -> Option<Mapper> {
        self.mappers.get(pair).map(|entry| entry.value().clone())
    }

    /// Whether `source -> target` is bound
    #[must_use]
    pub fn is_bound(&self, source: &Ty, target: &Ty) -> bool {
        self.mappers
            .contains_key(&TypePair::new(source.clone(), target.clone()))
    }

    /// Every bound root pair
    #[must_use]
    pub fn bound_pairs(&self) -> Vec<TypePair> {
        self.mappers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Type introspector
    #[inline]
    #[must_use]
    pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
        &self.introspector
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Routine backend name
    #[inline]
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

/// Builder for [`ObjectMapper`]
#[derive(Debug)]
pub struct ObjectMapperBuilder {
    introspector: Arc<dyn TypeIntrospector>,
    config: MapperConfig,
    backend: Option<Arc<dyn RoutineBackend>>,
    builders: Vec<Box<dyn MapperBuilder>>,
}

impl ObjectMapperBuilder {
    /// With engine configuration
    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// With a routine backend other than [`ClosureBackend`]
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn RoutineBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// With an extra builder, tried before the built-in ones
    #[must_use]
    pub fn with_builder(mut self, builder: Box<dyn MapperBuilder>) -> Self {
        self.builders.insert(0, builder);
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> ObjectMapper {
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(ClosureBackend::new()));
        ObjectMapper {
            introspector: self.introspector,
            config: self.config,
            backend,
            builders: self.builders,
            mappers: DashMap::new(),
            bindings: DashMap::new(),
            bind_lock: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omap_types::{Object, ObjectDescriptor, TypeCatalog};

    fn mapper(config: MapperConfig) -> ObjectMapper {
        let catalog = TypeCatalog::new()
            .with(ObjectDescriptor::new("Order").field("X", Ty::I32))
            .with(ObjectDescriptor::new("OrderDto").field("X", Ty::I64));
        ObjectMapper::builder(Arc::new(catalog))
            .with_config(config)
            .build()
    }

    fn order_pair() -> (Ty, Ty) {
        (Ty::object("Order"), Ty::object("OrderDto"))
    }

    #[test]
    fn map_before_bind_fails_fast() {
        let mapper = mapper(MapperConfig::new());
        let (a, b) = order_pair();
        let err = mapper.map(&a, &b, Value::Null, None).unwrap_err();
        assert!(matches!(err, MapError::Unbound { .. }), "{err}");
        assert_eq!(
            err.to_string(),
            "no mapper is bound for Order -> OrderDto; call bind(Order, OrderDto) first"
        );
        assert!(!mapper.is_bound(&a, &b));
    }

    #[test]
    fn reject_policy_refuses_rebind() {
        let mapper = mapper(MapperConfig::new().with_rebind(RebindPolicy::Reject));
        let (a, b) = order_pair();
        mapper.bind(a.clone(), b.clone(), None).unwrap();
        let err = mapper.bind(a, b, None).unwrap_err();
        assert!(matches!(err, BindError::AlreadyBound { .. }));
    }

    #[test]
    fn replace_policy_swaps_graph() {
        let mapper = mapper(MapperConfig::new());
        let (a, b) = order_pair();
        let first = mapper.bind(a.clone(), b.clone(), None).unwrap();
        let second = mapper.bind(a.clone(), b.clone(), None).unwrap();
        assert!(!first.same_graph(&second));
        let current = mapper.mapper(&TypePair::new(a, b)).unwrap();
        assert!(current.same_graph(&second));
        assert_eq!(mapper.bound_pairs().len(), 1);
    }

    #[test]
    fn failed_bind_registers_nothing() {
        let mapper = mapper(MapperConfig::new());
        let err = mapper
            .bind(Ty::object("Order"), Ty::object("Missing"), None)
            .unwrap_err();
        assert!(matches!(err, BindError::NoDefaultConstructor { .. }));
        assert!(mapper.bound_pairs().is_empty());
    }

    #[test]
    fn infers_source_type_from_value() {
        let mapper = mapper(MapperConfig::new());
        let (a, b) = order_pair();
        mapper.bind(a, b.clone(), None).unwrap();
        let value = Value::Object(Object::new("Order").with("X", 3_i32));
        let mapped = mapper.map_inferred(&b, value).unwrap();
        assert_eq!(mapped.field("X"), Some(&Value::Int(3)));
        assert!(matches!(
            mapper.map_inferred(&b, Value::Int(1)),
            Err(MapError::CannotInfer("int"))
        ));
    }

    #[test]
    fn configure_applies_to_later_binds() {
        let mapper = mapper(MapperConfig::new());
        let (a, b) = order_pair();
        mapper.configure(a.clone(), b.clone(), BindingConfig::new().ignore("X").unwrap());
        mapper.bind(a.clone(), b.clone(), None).unwrap();
        let value = Value::Object(Object::new("Order").with("X", 3_i32));
        let mapped = mapper.map(&a, &b, value, None).unwrap();
        assert_eq!(mapped.field("X"), Some(&Value::Int(0)));
        assert!(mapper.binding(&TypePair::new(a, b)).is_some());
    }
}

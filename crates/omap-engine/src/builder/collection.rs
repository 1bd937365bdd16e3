//! Collection mappers
//!
//! Lists, arrays and sequences map element-wise into a freshly allocated
//! container of the requested shape; sequences accumulate into a list.
//! Dictionaries map keys and values independently, and when two converted
//! keys collide the later entry wins.

use super::{BuildContext, MapperBuilder};
use crate::cache::MapperId;
use crate::error::BindError;
use crate::mapper::{routine, MapperKind, MapperNode};
use indexmap::IndexMap;
use omap_emit::SiblingInvoker;
use omap_types::{MapError, Ty, TypePair, Value};
use std::hash::{Hash, Hasher};

/// Builder for pairs whose sides are both enumerable
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionMapperBuilder;

impl CollectionMapperBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// How one element (or key, or value) is carried across
#[derive(Debug, Clone, Copy)]
enum Element {
    Copy,
    Sibling(usize),
}

impl Element {
    fn apply(self, siblings: &dyn SiblingInvoker, value: Value) -> Result<Value, MapError> {
        match self {
            Self::Copy => Ok(value),
            Self::Sibling(index) => siblings.invoke(index, value, None),
        }
    }
}

/// Dictionary key hashed consistently with `Value`'s equality
///
/// A re-inserted key keeps its first position and takes the later value.
/// NaN keys never compare equal, so each one stays a separate entry.
struct EntryKey(Value);

impl PartialEq for EntryKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for EntryKey {}

impl Hash for EntryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Bool(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Int(i) => i.hash(state),
            Value::UInt(u) => u.hash(state),
            // adding 0.0 folds -0.0 into 0.0, which compare equal
            Value::Float(f) => (f + 0.0).to_bits().hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::String(s) => s.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Duration(d) => d.hash(state),
            Value::Uuid(id) => id.hash(state),
            Value::Enum(e) => e.hash(state),
            Value::List(items) | Value::Array(items) => items.len().hash(state),
            Value::Map(entries) => entries.len().hash(state),
            Value::Null | Value::Object(_) => {}
        }
    }
}

fn element(
    pair: TypePair,
    ctx: &mut BuildContext<'_>,
    siblings: &mut Vec<MapperId>,
) -> Result<Element, BindError> {
    if pair.is_deep_cloneable() {
        return Ok(Element::Copy);
    }
    let id = ctx.mapper_for(&pair)?;
    siblings.push(id);
    Ok(Element::Sibling(siblings.len() - 1))
}

impl MapperBuilder for CollectionMapperBuilder {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn supports(&self, pair: &TypePair, _: &BuildContext<'_>) -> bool {
        pair.is_enumerable_types()
    }

    fn build(&self, pair: &TypePair, ctx: &mut BuildContext<'_>) -> Result<MapperNode, BindError> {
        let mut siblings = Vec::new();
        let routine = match (pair.source.entry(), pair.target.entry()) {
            (Some((sk, sv)), Some((tk, tv))) => {
                let key = element(TypePair::new(sk.clone(), tk.clone()), ctx, &mut siblings)?;
                let value = element(TypePair::new(sv.clone(), tv.clone()), ctx, &mut siblings)?;
                routine(move |invoker, source, _| match source {
                    Value::Null => Ok(Value::Null),
                    Value::Map(entries) => {
                        let mut out: IndexMap<EntryKey, Value> =
                            IndexMap::with_capacity(entries.len());
                        for (k, v) in entries {
                            let k = key.apply(invoker, k)?;
                            let v = value.apply(invoker, v)?;
                            out.insert(EntryKey(k), v);
                        }
                        Ok(Value::Map(out.into_iter().map(|(k, v)| (k.0, v)).collect()))
                    }
                    other => Err(MapError::shape("map", &other)),
                })
            }
            (None, None) => {
                let (Some(se), Some(te)) = (pair.source.element(), pair.target.element()) else {
                    return Err(BindError::unsupported(pair));
                };
                let item = element(TypePair::new(se.clone(), te.clone()), ctx, &mut siblings)?;
                let array = matches!(pair.target, Ty::Array(_));
                routine(move |invoker, source, _| {
                    let items = match source {
                        Value::Null => return Ok(Value::Null),
                        Value::List(items) | Value::Array(items) => items,
                        other => return Err(MapError::shape("list", &other)),
                    };
                    let mapped = items
                        .into_iter()
                        .map(|v| item.apply(invoker, v))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(if array {
                        Value::Array(mapped)
                    } else {
                        Value::List(mapped)
                    })
                })
            }
            _ => return Err(BindError::unsupported(pair)),
        };
        Ok(MapperNode::new(pair.clone(), MapperKind::Collection, routine).with_siblings(siblings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingConfig;
    use crate::builder::default_builders;
    use crate::config::MapperConfig;
    use crate::mapper::MapperGraph;
    use omap_emit::ClosureBackend;
    use omap_types::{TypeCatalog, TypeIntrospector};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn bind(source: Ty, target: Ty) -> Result<(MapperGraph, MapperId), BindError> {
        let introspector: Arc<dyn TypeIntrospector> = Arc::new(TypeCatalog::new());
        let config = MapperConfig::new();
        let backend = ClosureBackend::new();
        let builders = default_builders();
        let lookup = |_: &TypePair| -> Option<Arc<BindingConfig>> { None };
        let mut ctx = BuildContext::new(&introspector, &config, &backend, &lookup, &builders);
        let id = ctx.mapper_for(&TypePair::new(source, target))?;
        Ok((ctx.finish(id)?, id))
    }

    fn map(source: Ty, target: Ty, value: Value) -> Value {
        let (graph, id) = bind(source, target).unwrap();
        graph.invoke(id, value, None).unwrap()
    }

    #[test]
    fn list_to_array_copies_elements() {
        let items: Vec<Value> = (0..5).map(Value::Int).collect();
        assert_eq!(
            map(Ty::list(Ty::I32), Ty::array(Ty::I32), Value::List(items.clone())),
            Value::Array(items)
        );
    }

    #[test]
    fn elements_route_through_siblings() {
        let (graph, id) = bind(Ty::sequence(Ty::I32), Ty::list(Ty::String)).unwrap();
        assert_eq!(graph.len(), 2);
        let mapped = graph
            .invoke(id, Value::List(vec![Value::Int(1), Value::Int(2)]), None)
            .unwrap();
        assert_eq!(
            mapped,
            Value::List(vec![Value::String("1".into()), Value::String("2".into())])
        );
    }

    #[test]
    fn null_collection_maps_to_null() {
        assert_eq!(
            map(Ty::list(Ty::I32), Ty::list(Ty::I32), Value::Null),
            Value::Null
        );
    }

    #[test]
    fn dictionary_keys_collide_later_wins() {
        let source = Value::Map(vec![
            (Value::String("1".into()), Value::Int(10)),
            (Value::String("01".into()), Value::Int(20)),
            (Value::String("2".into()), Value::Int(30)),
        ]);
        let mapped = map(
            Ty::map(Ty::String, Ty::I32),
            Ty::map(Ty::I64, Ty::I64),
            source,
        );
        assert_eq!(
            mapped,
            Value::Map(vec![
                (Value::Int(1), Value::Int(20)),
                (Value::Int(2), Value::Int(30)),
            ])
        );
    }

    #[test]
    fn large_dictionary_keeps_every_entry_in_order() {
        let source: Vec<(Value, Value)> = (0..20_000)
            .map(|i| (Value::String(format!("k{i}")), Value::Int(i)))
            .collect();
        let mapped = map(
            Ty::map(Ty::String, Ty::I32),
            Ty::map(Ty::String, Ty::I64),
            Value::Map(source.clone()),
        );
        assert_eq!(mapped, Value::Map(source));
    }

    #[test]
    fn copied_keys_repeated_in_source_later_wins() {
        let source = Value::Map(vec![
            (Value::Float(0.0), Value::Int(1)),
            (Value::Float(2.5), Value::Int(2)),
            (Value::Float(-0.0), Value::Int(3)),
        ]);
        let mapped = map(
            Ty::map(Ty::F64, Ty::I32),
            Ty::map(Ty::F64, Ty::I64),
            source,
        );
        assert_eq!(
            mapped,
            Value::Map(vec![
                (Value::Float(0.0), Value::Int(3)),
                (Value::Float(2.5), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn dictionary_to_list_is_unsupported() {
        let err = bind(Ty::map(Ty::String, Ty::I32), Ty::list(Ty::I32)).unwrap_err();
        assert!(matches!(err, BindError::Unsupported { .. }));
    }
}

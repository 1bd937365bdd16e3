//! Scalar, enum and nullable conversions
//!
//! The conversion for a pair is decided once at build time and captured in a
//! closure. Nullable wrappers are handled around every case: a null source
//! yields null for nullable (or reference-shaped) targets and the target's
//! zero value otherwise.

use super::{BuildContext, MapperBuilder};
use crate::error::BindError;
use crate::mapper::{routine, MapperKind, MapperNode};
use omap_types::convert::{self, convert_scalar};
use omap_types::defaults::zero_value;
use omap_types::{
    ConvertError, EnumDescriptor, EnumValue, MapError, Ty, TypeIntrospector, TypeName, TypePair,
    Value,
};
use std::collections::HashMap;
use std::sync::Arc;

type Convert = Arc<dyn Fn(Value) -> Result<Value, MapError> + Send + Sync>;

fn lift<F>(f: F) -> Convert
where
    F: Fn(Value) -> Result<Value, MapError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Builder for primitive, text, decimal, date/time, unique-id and enum pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertibleMapperBuilder;

impl ConvertibleMapperBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MapperBuilder for ConvertibleMapperBuilder {
    fn name(&self) -> &'static str {
        "convertible"
    }

    fn supports(&self, pair: &TypePair, ctx: &BuildContext<'_>) -> bool {
        pair.source.is_convertible_kind()
            || pair.target.is_convertible_kind()
            || ctx.introspector().has_conversion(&pair.source, &pair.target)
    }

    fn build(&self, pair: &TypePair, ctx: &mut BuildContext<'_>) -> Result<MapperNode, BindError> {
        let introspector = ctx.introspector().as_ref();
        if pair.is_deep_cloneable() {
            return Ok(MapperNode::new(
                pair.clone(),
                MapperKind::Convertible,
                routine(|_, source, _| Ok(source)),
            ));
        }

        let apply = conversion(pair, introspector)?;
        let on_null = if pair.target.is_nullable() {
            Value::Null
        } else {
            zero_value(&pair.target, introspector)
        };
        Ok(MapperNode::new(
            pair.clone(),
            MapperKind::Convertible,
            routine(move |_, source, _| {
                if source.is_null() {
                    Ok(on_null.clone())
                } else {
                    apply(source)
                }
            }),
        ))
    }
}

fn conversion(pair: &TypePair, introspector: &dyn TypeIntrospector) -> Result<Convert, BindError> {
    let (from, to) = (pair.source.unwrap_nullable(), pair.target.unwrap_nullable());
    if from == to && (from.is_primitive() || from.is_immutable_builtin()) {
        return Ok(lift(Ok));
    }
    match (from, to) {
        (Ty::Enum(a), Ty::Enum(b)) => {
            let (a, b) = (enumeration(a, pair, introspector)?, enumeration(b, pair, introspector)?);
            Ok(enum_to_enum(a, b))
        }
        (Ty::Enum(name), Ty::String) => {
            let descriptor = enumeration(name, pair, introspector)?.clone();
            Ok(lift(move |value| {
                let discriminant = discriminant(&descriptor.name, &value)?;
                let text = descriptor
                    .name_of(discriminant)
                    .map_or_else(|| discriminant.to_string(), str::to_string);
                Ok(Value::String(text))
            }))
        }
        (Ty::String, Ty::Enum(name)) => {
            let descriptor = enumeration(name, pair, introspector)?.clone();
            Ok(lift(move |value| {
                let Value::String(text) = &value else {
                    return Err(MapError::shape("string", &value));
                };
                let discriminant = parse_variant(&descriptor, text.trim())?;
                Ok(Value::Enum(EnumValue::new(descriptor.name.clone(), discriminant)))
            }))
        }
        (Ty::Enum(name), Ty::Primitive(kind)) if kind.is_integer() => {
            let descriptor = enumeration(name, pair, introspector)?.clone();
            let target = to.clone();
            Ok(lift(move |value| {
                let discriminant = discriminant(&descriptor.name, &value)?;
                Ok(convert_scalar(Value::Int(discriminant), &Ty::I64, &target)?)
            }))
        }
        (Ty::Primitive(kind), Ty::Enum(name)) if kind.is_integer() => {
            let descriptor = enumeration(name, pair, introspector)?.clone();
            let source = from.clone();
            Ok(lift(move |value| {
                let discriminant = match convert_scalar(value, &source, &Ty::I64)? {
                    Value::Int(i) => i,
                    other => return Err(MapError::shape("int", &other)),
                };
                Ok(Value::Enum(EnumValue::new(descriptor.name.clone(), discriminant)))
            }))
        }
        _ if introspector.has_conversion(from, to) => {
            let (from, to) = (from.clone(), to.clone());
            Ok(lift(move |value| Ok(convert_scalar(value, &from, &to)?)))
        }
        _ => Err(BindError::unsupported(pair)),
    }
}

fn enumeration<'i>(
    name: &TypeName,
    pair: &TypePair,
    introspector: &'i dyn TypeIntrospector,
) -> Result<&'i EnumDescriptor, BindError> {
    introspector
        .enumeration(name)
        .ok_or_else(|| BindError::unsupported(pair))
}

fn discriminant(expected: &TypeName, value: &Value) -> Result<i64, MapError> {
    match value {
        Value::Enum(value) => Ok(value.discriminant),
        other => Err(MapError::shape(expected.as_str(), other)),
    }
}

/// Variant by exact name, then case-insensitive name, then numeric text
fn parse_variant(descriptor: &EnumDescriptor, text: &str) -> Result<i64, ConvertError> {
    descriptor
        .discriminant_of(text)
        .or_else(|| {
            descriptor
                .variants
                .iter()
                .find(|v| v.name.eq_ignore_ascii_case(text))
                .map(|v| v.discriminant)
        })
        .or_else(|| text.parse::<i64>().ok())
        .ok_or_else(|| ConvertError::UnknownVariant {
            enum_name: descriptor.name.clone(),
            variant: text.to_string(),
        })
}

/// Translate by variant name; unnamed discriminants pass through
fn enum_to_enum(source: &EnumDescriptor, target: &EnumDescriptor) -> Convert {
    let mut table = HashMap::with_capacity(source.variants.len());
    let mut missing = HashMap::new();
    for variant in &source.variants {
        match target.discriminant_of(&variant.name) {
            Some(discriminant) => {
                table.insert(variant.discriminant, discriminant);
            }
            None => {
                missing.insert(variant.discriminant, variant.name.clone());
            }
        }
    }
    let (source_name, target_name) = (source.name.clone(), target.name.clone());
    lift(move |value| {
        let from = discriminant(&source_name, &value)?;
        if let Some(name) = missing.get(&from) {
            return Err(ConvertError::UnknownVariant {
                enum_name: target_name.clone(),
                variant: name.clone(),
            }
            .into());
        }
        let to = table.get(&from).copied().unwrap_or(from);
        Ok(Value::Enum(EnumValue::new(target_name.clone(), to)))
    })
}

/// Whether `to` can be emitted as a plain cast instead of a sibling call
///
/// Lossless primitive widenings and `T -> T?` wrapping of non-enum scalars.
#[must_use]
pub(crate) fn is_cast(pair: &TypePair) -> bool {
    let (from, to) = (&pair.source, &pair.target);
    if from.is_enum() || to.is_enum() {
        return false;
    }
    match (from, to.unwrap_nullable()) {
        (Ty::Primitive(a), Ty::Primitive(b)) => convert::is_widening(*a, *b),
        (a, b) => to.is_nullable() && a == b && a.is_convertible_kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingConfig;
    use crate::builder::default_builders;
    use crate::cache::MapperId;
    use crate::config::MapperConfig;
    use crate::mapper::MapperGraph;
    use omap_emit::ClosureBackend;
    use omap_types::{EnumDescriptor, PrimitiveKind, TypeCatalog};
    use pretty_assertions::assert_eq;

    fn catalog() -> Arc<dyn TypeIntrospector> {
        Arc::new(
            TypeCatalog::new()
                .with(
                    EnumDescriptor::new("Color")
                        .variant("Red", 1)
                        .variant("Green", 2)
                        .variant("Blue", 3),
                )
                .with(
                    EnumDescriptor::new("Colour")
                        .variant("Green", 20)
                        .variant("Red", 10),
                ),
        )
    }

    fn bind(source: Ty, target: Ty) -> Result<(MapperGraph, MapperId), BindError> {
        let introspector = catalog();
        let config = MapperConfig::new();
        let backend = ClosureBackend::new();
        let builders = default_builders();
        let lookup = |_: &TypePair| -> Option<Arc<BindingConfig>> { None };
        let mut ctx = BuildContext::new(&introspector, &config, &backend, &lookup, &builders);
        let id = ctx.mapper_for(&TypePair::new(source, target))?;
        Ok((ctx.finish(id)?, id))
    }

    fn map(source: Ty, target: Ty, value: Value) -> Result<Value, MapError> {
        let (graph, id) = bind(source, target).unwrap();
        graph.invoke(id, value, None)
    }

    fn color(d: i64) -> Value {
        Value::Enum(EnumValue::new("Color", d))
    }

    #[test]
    fn identity_and_widening() {
        assert_eq!(map(Ty::I32, Ty::I32, Value::Int(5)).unwrap(), Value::Int(5));
        assert_eq!(map(Ty::I32, Ty::I64, Value::Int(5)).unwrap(), Value::Int(5));
        assert_eq!(
            map(Ty::I32, Ty::String, Value::Int(5)).unwrap(),
            Value::String("5".into())
        );
    }

    #[test]
    fn nullable_null_becomes_zero_or_null() {
        let nullable = Ty::nullable(Ty::I32);
        assert_eq!(map(nullable.clone(), Ty::I32, Value::Null).unwrap(), Value::Int(0));
        assert_eq!(map(nullable.clone(), Ty::I32, Value::Int(9)).unwrap(), Value::Int(9));
        assert_eq!(map(Ty::I32, nullable, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn enums_translate_by_name() {
        let to = Ty::enumeration("Colour");
        assert_eq!(
            map(Ty::enumeration("Color"), to.clone(), color(1)).unwrap(),
            Value::Enum(EnumValue::new("Colour", 10))
        );
        let err = map(Ty::enumeration("Color"), to, color(3)).unwrap_err();
        assert!(err.to_string().contains("Blue"));
    }

    #[test]
    fn enum_text_and_integers() {
        let e = Ty::enumeration("Color");
        assert_eq!(
            map(e.clone(), Ty::String, color(2)).unwrap(),
            Value::String("Green".into())
        );
        assert_eq!(
            map(Ty::String, e.clone(), Value::String("blue".into())).unwrap(),
            color(3)
        );
        assert!(map(Ty::String, e.clone(), Value::String("Mauve".into())).is_err());
        assert_eq!(map(e.clone(), Ty::I64, color(3)).unwrap(), Value::Int(3));
        assert_eq!(
            map(Ty::Primitive(PrimitiveKind::U8), e, Value::UInt(2)).unwrap(),
            color(2)
        );
    }

    #[test]
    fn unsupported_pairs_fail_bind() {
        let err = bind(Ty::Uuid, Ty::I32).unwrap_err();
        assert!(matches!(err, BindError::Unsupported { .. }));
        let err = bind(Ty::enumeration("Color"), Ty::F64).unwrap_err();
        assert!(matches!(err, BindError::Unsupported { .. }));
    }

    #[test]
    fn cast_classification() {
        assert!(is_cast(&TypePair::new(Ty::I32, Ty::I64)));
        assert!(is_cast(&TypePair::new(Ty::I32, Ty::nullable(Ty::I32))));
        assert!(!is_cast(&TypePair::new(Ty::I64, Ty::I32)));
        assert!(!is_cast(&TypePair::new(Ty::nullable(Ty::I32), Ty::I32)));
        assert!(!is_cast(&TypePair::new(
            Ty::enumeration("Color"),
            Ty::nullable(Ty::enumeration("Color"))
        )));
    }
}

//! Zero values and default instances

use crate::decimal::Decimal;
use crate::introspect::TypeIntrospector;
use crate::ty::{PrimitiveKind, Ty, TypeName};
use crate::value::{EnumValue, Object, Value};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Zero value of a type
///
/// Value kinds get their all-zero representation (enums discriminant `0`,
/// value-kind objects every instance member zeroed). Reference shapes and
/// nullable wrappers are `Null`.
#[must_use]
pub fn zero_value(ty: &Ty, introspector: &dyn TypeIntrospector) -> Value {
    zero_value_guarded(ty, introspector, &mut Vec::new())
}

fn zero_value_guarded(
    ty: &Ty,
    introspector: &dyn TypeIntrospector,
    visiting: &mut Vec<TypeName>,
) -> Value {
    match ty {
        Ty::Primitive(kind) => zero_primitive(*kind),
        Ty::Decimal => Value::Decimal(Decimal::ZERO),
        Ty::DateTime => Value::DateTime(DateTime::<Utc>::default()),
        Ty::Duration => Value::Duration(TimeDelta::zero()),
        Ty::Uuid => Value::Uuid(Uuid::nil()),
        Ty::Enum(name) => Value::Enum(EnumValue::new(name.clone(), 0)),
        Ty::Object(name) => {
            let Some(object) = introspector.object(name) else {
                return Value::Null;
            };
            if !object.value_kind || visiting.contains(name) {
                return Value::Null;
            }
            visiting.push(name.clone());
            let mut instance = Object::new(name.clone());
            for member in object.members.iter().filter(|m| !m.is_static) {
                let value = zero_value_guarded(&member.ty, introspector, visiting);
                instance.set(member.name.clone(), value);
            }
            visiting.pop();
            Value::Object(instance)
        }
        Ty::String
        | Ty::Nullable(_)
        | Ty::List(_)
        | Ty::Array(_)
        | Ty::Sequence(_)
        | Ty::Map(..) => Value::Null,
    }
}

fn zero_primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(false),
        PrimitiveKind::Char => Value::Char('\0'),
        PrimitiveKind::F32 | PrimitiveKind::F64 => Value::Float(0.0),
        k if k.is_signed_integer() => Value::Int(0),
        _ => Value::UInt(0),
    }
}

/// Freshly constructed instance of an object type
///
/// Members start at their declared initializer, or their zero value. Returns
/// `None` when the type is unknown or has neither a parameterless
/// constructor nor value-kind semantics.
#[must_use]
pub fn default_instance(name: &TypeName, introspector: &dyn TypeIntrospector) -> Option<Value> {
    let object = introspector.object(name)?;
    if !object.constructible() {
        return None;
    }
    let mut instance = Object::new(name.clone());
    for member in object.members.iter().filter(|m| !m.is_static) {
        let value = member
            .initial
            .clone()
            .unwrap_or_else(|| zero_value(&member.ty, introspector));
        instance.set(member.name.clone(), value);
    }
    Some(Value::Object(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::descriptor::{EnumDescriptor, ObjectDescriptor};

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.insert(EnumDescriptor::new("Color").variant("Red", 1));
        catalog.insert(
            ObjectDescriptor::new("Point")
                .value_kind()
                .without_default_constructor()
                .field("X", Ty::I32)
                .field("Y", Ty::F64),
        );
        catalog.insert(
            ObjectDescriptor::new("Shape")
                .field("Origin", Ty::object("Point"))
                .field("Label", Ty::String)
                .field("Tint", Ty::enumeration("Color")),
        );
        catalog.insert(ObjectDescriptor::new("Sealed").without_default_constructor());
        catalog
    }

    #[test]
    fn scalar_zeroes() {
        let catalog = catalog();
        assert_eq!(zero_value(&Ty::I32, &catalog), Value::Int(0));
        assert_eq!(zero_value(&Ty::U8, &catalog), Value::UInt(0));
        assert_eq!(zero_value(&Ty::nullable(Ty::I32), &catalog), Value::Null);
        assert_eq!(zero_value(&Ty::String, &catalog), Value::Null);
    }

    #[test]
    fn value_kind_objects_zero_initialize() {
        let catalog = catalog();
        let zero = zero_value(&Ty::object("Point"), &catalog);
        assert_eq!(zero.field("X"), Some(&Value::Int(0)));
        assert_eq!(zero.field("Y"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn default_instance_fills_members() {
        let catalog = catalog();
        let shape = default_instance(&"Shape".into(), &catalog).unwrap();
        assert!(shape.field("Origin").unwrap().as_object().is_some());
        assert_eq!(shape.field("Label"), Some(&Value::Null));
        assert_eq!(
            shape.field("Tint"),
            Some(&Value::Enum(EnumValue::new("Color", 0)))
        );
    }

    #[test]
    fn sealed_types_have_no_default() {
        let catalog = catalog();
        assert!(default_instance(&"Sealed".into(), &catalog).is_none());
        assert!(default_instance(&"Missing".into(), &catalog).is_none());
    }
}

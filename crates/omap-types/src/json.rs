//! JSON bridge
//!
//! Reads JSON documents into [`Value`] trees guided by a declared [`Ty`], and
//! renders values back. Used by catalog initializers and the CLI.

use crate::convert::{self, to_text};
use crate::error::ConvertError;
use crate::introspect::TypeIntrospector;
use crate::ty::Ty;
use crate::value::{EnumValue, Object, Value};
use serde_json::{Map as JsonMap, Number, Value as Json};

/// Render a value as JSON
///
/// Enums render as their variant name when the introspector knows it, else as
/// the discriminant. Decimals render as strings to keep precision.
/// Dictionaries with string keys become objects; any other key shape becomes
/// an array of `[key, value]` pairs.
#[must_use]
pub fn to_json(value: &Value, introspector: &dyn TypeIntrospector) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::UInt(u) => Json::from(*u),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Enum(e) => introspector
            .enumeration(&e.type_name)
            .and_then(|d| d.name_of(e.discriminant))
            .map_or_else(|| Json::from(e.discriminant), |name| Json::from(name)),
        Value::List(items) | Value::Array(items) => {
            Json::Array(items.iter().map(|v| to_json(v, introspector)).collect())
        }
        Value::Map(entries) => {
            if entries.iter().all(|(k, _)| matches!(k, Value::String(_))) {
                let object: JsonMap<String, Json> = entries
                    .iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), to_json(v, introspector))))
                    .collect();
                Json::Object(object)
            } else {
                Json::Array(
                    entries
                        .iter()
                        .map(|(k, v)| Json::Array(vec![to_json(k, introspector), to_json(v, introspector)]))
                        .collect(),
                )
            }
        }
        Value::Object(object) => Json::Object(
            object
                .fields()
                .map(|(k, v)| (k.to_string(), to_json(v, introspector)))
                .collect(),
        ),
        scalar => to_text(scalar).map_or(Json::Null, Json::String),
    }
}

/// Read a JSON document as a value of type `ty`
///
/// Object keys that are not declared members are ignored; declared members
/// missing from the document are left absent.
///
/// # Errors
/// [`ConvertError::ValueMismatch`] when the JSON shape does not fit `ty`, plus
/// any scalar conversion error.
pub fn from_json(
    json: &Json,
    ty: &Ty,
    introspector: &dyn TypeIntrospector,
) -> Result<Value, ConvertError> {
    let mismatch = || ConvertError::ValueMismatch {
        expected: ty.clone(),
        found: json_kind(json),
    };
    if json.is_null() {
        return Ok(Value::Null);
    }
    match ty {
        Ty::Nullable(inner) => from_json(json, inner, introspector),
        Ty::Enum(name) => {
            let descriptor = introspector
                .enumeration(name)
                .ok_or_else(|| ConvertError::UnknownEnum(name.clone()))?;
            match json {
                Json::String(variant) => descriptor
                    .discriminant_of(variant)
                    .map(|d| Value::Enum(EnumValue::new(name.clone(), d)))
                    .ok_or_else(|| ConvertError::UnknownVariant {
                        enum_name: name.clone(),
                        variant: variant.clone(),
                    }),
                Json::Number(n) => n
                    .as_i64()
                    .map(|d| Value::Enum(EnumValue::new(name.clone(), d)))
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            }
        }
        Ty::List(element) | Ty::Sequence(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items_from_json(items, element, introspector).map(Value::List)
        }
        Ty::Array(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items_from_json(items, element, introspector).map(Value::Array)
        }
        Ty::Map(key, value) => match json {
            Json::Object(object) => object
                .iter()
                .map(|(k, v)| {
                    let key = convert::convert_scalar(Value::String(k.clone()), &Ty::String, key)
                        .or_else(|_| from_json(&Json::String(k.clone()), key, introspector))?;
                    Ok::<_, ConvertError>((key, from_json(v, value, introspector)?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Map),
            Json::Array(pairs) => pairs
                .iter()
                .map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([k, v]) => Ok((
                        from_json(k, key, introspector)?,
                        from_json(v, value, introspector)?,
                    )),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Map),
            _ => Err(mismatch()),
        },
        Ty::Object(name) => {
            let fields = json.as_object().ok_or_else(mismatch)?;
            let descriptor = introspector.object(name).ok_or_else(mismatch)?;
            let mut object = Object::new(name.clone());
            for member in descriptor.members.iter().filter(|m| !m.is_static) {
                if let Some(field) = fields.get(&member.name) {
                    object.set(member.name.clone(), from_json(field, &member.ty, introspector)?);
                }
            }
            Ok(Value::Object(object))
        }
        scalar => {
            let (raw, raw_ty) = match json {
                Json::Bool(b) => (Value::Bool(*b), Ty::BOOL),
                Json::String(s) => (Value::String(s.clone()), Ty::String),
                Json::Number(n) => number_value(n),
                _ => return Err(mismatch()),
            };
            if raw_ty == *scalar {
                return Ok(raw);
            }
            convert::convert_scalar(raw, &raw_ty, scalar)
        }
    }
}

fn items_from_json(
    items: &[Json],
    element: &Ty,
    introspector: &dyn TypeIntrospector,
) -> Result<Vec<Value>, ConvertError> {
    items
        .iter()
        .map(|item| from_json(item, element, introspector))
        .collect()
}

fn number_value(n: &Number) -> (Value, Ty) {
    if let Some(i) = n.as_i64() {
        (Value::Int(i), Ty::I64)
    } else if let Some(u) = n.as_u64() {
        (Value::UInt(u), Ty::Primitive(crate::ty::PrimitiveKind::U64))
    } else {
        (Value::Float(n.as_f64().unwrap_or(f64::NAN)), Ty::F64)
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::descriptor::{EnumDescriptor, ObjectDescriptor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.insert(EnumDescriptor::new("Color").variant("Red", 1).variant("Blue", 3));
        catalog.insert(
            ObjectDescriptor::new("Item")
                .field("Name", Ty::String)
                .field("Count", Ty::I32)
                .field("Tint", Ty::nullable(Ty::enumeration("Color")))
                .field("Tags", Ty::list(Ty::String)),
        );
        catalog
    }

    #[test]
    fn reads_objects() {
        let catalog = catalog();
        let doc = json!({"Name": "bolt", "Count": 4, "Tint": "Blue", "Tags": ["a"], "Extra": 1});
        let value = from_json(&doc, &Ty::object("Item"), &catalog).unwrap();
        let expected = Value::Object(
            Object::new("Item")
                .with("Name", "bolt")
                .with("Count", 4_i32)
                .with("Tint", EnumValue::new("Color", 3))
                .with("Tags", vec!["a"]),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn renders_objects() {
        let catalog = catalog();
        let value = Value::Object(
            Object::new("Item")
                .with("Name", "nut")
                .with("Tint", EnumValue::new("Color", 1)),
        );
        assert_eq!(to_json(&value, &catalog), json!({"Name": "nut", "Tint": "Red"}));
    }

    #[test]
    fn maps_from_objects_and_pairs() {
        let catalog = catalog();
        let ty = Ty::map(Ty::String, Ty::I64);
        let value = from_json(&json!({"a": 1}), &ty, &catalog).unwrap();
        assert_eq!(value, Value::Map(vec![(Value::from("a"), Value::Int(1))]));

        let ty = Ty::map(Ty::I32, Ty::String);
        let value = from_json(&json!([[1, "x"]]), &ty, &catalog).unwrap();
        assert_eq!(value, Value::Map(vec![(Value::Int(1), Value::from("x"))]));
        assert_eq!(to_json(&value, &catalog), json!([[1, "x"]]));
    }

    #[test]
    fn shape_mismatch() {
        let catalog = catalog();
        let err = from_json(&json!([1]), &Ty::object("Item"), &catalog).unwrap_err();
        assert!(matches!(err, ConvertError::ValueMismatch { found: "array", .. }));
        assert!(matches!(
            from_json(&json!("Green"), &Ty::enumeration("Color"), &catalog),
            Err(ConvertError::UnknownVariant { .. })
        ));
    }
}

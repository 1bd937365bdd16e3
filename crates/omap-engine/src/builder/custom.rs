//! Custom-override mappers

use crate::binding::Converter;
use crate::mapper::{routine, MapperKind, MapperNode};
use omap_types::{MapError, TypePair};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Wraps a user converter for one target member
///
/// The converter sees every value, nulls included, and its errors surface
/// unchanged as [`MapError::Converter`].
#[derive(Clone)]
pub struct CustomMapperBuilder {
    converter: Converter,
}

impl CustomMapperBuilder {
    /// Create builder
    #[must_use]
    pub fn new(converter: Converter) -> Self {
        Self { converter }
    }

    /// Build the node for `pair`
    #[must_use]
    pub fn build(&self, pair: &TypePair) -> MapperNode {
        let converter = Arc::clone(&self.converter);
        MapperNode::new(
            pair.clone(),
            MapperKind::Custom,
            routine(move |_, source, _| converter(source).map_err(MapError::Converter)),
        )
    }
}

impl Debug for CustomMapperBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CustomMapperBuilder(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omap_emit::NoSiblings;
    use omap_types::{Ty, Value};

    #[test]
    fn converter_errors_pass_through() {
        let converter: Converter = Arc::new(|value: Value| match value {
            Value::Int(i) => Ok(Value::String(format!("#{i}"))),
            other => anyhow::bail!("cannot tag {}", other.kind()),
        });
        let node = CustomMapperBuilder::new(converter).build(&TypePair::new(Ty::I32, Ty::String));
        assert_eq!(node.kind, MapperKind::Custom);
        assert_eq!(
            (node.routine)(&NoSiblings, Value::Int(7), None).unwrap(),
            Value::String("#7".into())
        );
        let err = (node.routine)(&NoSiblings, Value::Bool(true), None).unwrap_err();
        assert_eq!(err.to_string(), "cannot tag bool");
    }
}

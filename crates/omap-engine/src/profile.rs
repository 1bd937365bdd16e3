//! Mapping profiles
//!
//! A profile is a declarative description of an [`ObjectMapper`]: the engine
//! configuration plus the pairs to bind and their binding configuration.
//!
//! ```yaml
//! config:
//!   name_matching: ignore_case
//! bindings:
//!   - source: Person
//!     target: PersonDto
//!     bind:
//!       - { source: Address.Street, target: Street }
//!     types:
//!       Id: String
//!     ignore: [Secret]
//! ```

use crate::binding::BindingConfig;
use crate::config::MapperConfig;
use crate::error::ProfileError;
use crate::mapper::Mapper;
use crate::registry::ObjectMapper;
use indexmap::IndexMap;
use omap_types::{parse_ty, Ty, TypeIntrospector, TypeName};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Declarative mapper setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingProfile {
    /// Engine configuration
    #[serde(default)]
    pub config: MapperConfig,
    /// Pairs to bind, in order
    #[serde(default)]
    pub bindings: Vec<ProfileBinding>,
}

/// One pair of a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileBinding {
    /// Source type expression
    pub source: String,
    /// Target type expression
    pub target: String,
    /// Member binds, single-level or dotted paths
    #[serde(default)]
    pub bind: Vec<FieldBind>,
    /// Target member type overrides, as type expressions
    #[serde(default)]
    pub types: IndexMap<String, String>,
    /// Ignored source members
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Source path to target path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBind {
    /// Source member or dotted path
    pub source: String,
    /// Target member or dotted path
    pub target: String,
}

impl ProfileBinding {
    fn binding_config(
        &self,
        resolve: &dyn Fn(&str) -> Option<Ty>,
    ) -> Result<BindingConfig, ProfileError> {
        let mut config = BindingConfig::new();
        for bind in &self.bind {
            config = config.bind_path(&bind.source, &bind.target)?;
        }
        for (member, expr) in &self.types {
            config = config.bind_type(member, parse_ty(expr, resolve)?)?;
        }
        for member in &self.ignore {
            config = config.ignore(member)?;
        }
        Ok(config)
    }
}

impl MappingProfile {
    /// Load a profile, choosing the format by extension
    ///
    /// # Errors
    /// I/O and syntax errors, or [`ProfileError::UnsupportedFormat`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(ProfileError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse a YAML profile
    ///
    /// # Errors
    /// YAML syntax or shape errors.
    pub fn from_yaml_str(text: &str) -> Result<Self, ProfileError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON profile
    ///
    /// # Errors
    /// JSON syntax or shape errors.
    pub fn from_json_str(text: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Create a mapper with this profile's configuration and bind every pair
    ///
    /// # Errors
    /// See [`apply`](Self::apply).
    pub fn build_mapper(
        &self,
        introspector: Arc<dyn TypeIntrospector>,
    ) -> Result<(ObjectMapper, Vec<Mapper>), ProfileError> {
        let mapper = ObjectMapper::builder(introspector)
            .with_config(self.config.clone())
            .build();
        let bound = self.apply(&mapper)?;
        Ok((mapper, bound))
    }

    /// Configure and bind every pair on an existing mapper
    ///
    /// All pairs are configured before the first bind, so a pair reached
    /// while binding another already carries its profile configuration.
    ///
    /// # Errors
    /// Type expressions naming unknown types, malformed member paths, and
    /// bind failures.
    pub fn apply(&self, mapper: &ObjectMapper) -> Result<Vec<Mapper>, ProfileError> {
        let introspector = Arc::clone(mapper.introspector());
        let resolve = move |name: &str| -> Option<Ty> {
            let name = TypeName::new(name);
            if introspector.object(&name).is_some() {
                Some(Ty::Object(name))
            } else if introspector.enumeration(&name).is_some() {
                Some(Ty::Enum(name))
            } else {
                None
            }
        };

        let mut pairs = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let source = parse_ty(&binding.source, &resolve)?;
            let target = parse_ty(&binding.target, &resolve)?;
            let config = binding.binding_config(&resolve)?;
            mapper.configure(source.clone(), target.clone(), config);
            pairs.push((source, target));
        }

        let mut bound = Vec::with_capacity(pairs.len());
        for (source, target) in pairs {
            bound.push(mapper.bind(source, target, None)?);
        }
        tracing::debug!("profile bound {} pairs", bound.len());
        Ok(bound)
    }
}

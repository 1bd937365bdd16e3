//! Per-pair binding configuration
//!
//! [`BindingConfig`] customizes how one source type maps onto one target
//! type: member renames, multi-level path binds, target type overrides,
//! custom converters and ignored members. Paths are validated when they are
//! added, so a malformed path never reaches a build.
//!
//! ```rust
//! use omap_engine::BindingConfig;
//! use omap_types::Ty;
//!
//! let config = BindingConfig::new()
//!     .bind_path("Address.Street", "Street")?
//!     .bind_rename("Surname", "LastName")?
//!     .bind_type("Score", Ty::F64)?
//!     .ignore("Password")?;
//! assert!(config.is_ignored("Password"));
//! # Ok::<(), omap_engine::BindingError>(())
//! ```

use crate::error::BindingError;
use indexmap::{IndexMap, IndexSet};
use omap_types::{Ty, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// User converter for one target member
pub type Converter = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

fn segments(path: &str) -> Result<Vec<String>, BindingError> {
    let malformed = |reason| BindingError::MalformedPath {
        path: path.to_string(),
        reason,
    };
    if path.trim().is_empty() {
        return Err(malformed("empty path"));
    }
    path.split('.')
        .map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                Err(malformed("empty segment"))
            } else if !IDENTIFIER.is_match(segment) {
                Err(malformed("segment is not an identifier"))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

fn identifier(name: &str) -> Result<String, BindingError> {
    match segments(name)?.as_slice() {
        [single] => Ok(single.clone()),
        _ => Err(BindingError::MalformedPath {
            path: name.to_string(),
            reason: "expected a single member name",
        }),
    }
}

/// Validated source/target member path pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingFieldPath {
    source: Vec<String>,
    target: Vec<String>,
}

impl BindingFieldPath {
    /// Parse two dotted member-access chains
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`] for empty or non-identifier segments.
    pub fn new(source_path: &str, target_path: &str) -> Result<Self, BindingError> {
        Ok(Self {
            source: segments(source_path)?,
            target: segments(target_path)?,
        })
    }

    /// Source segments
    #[inline]
    #[must_use]
    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Target segments
    #[inline]
    #[must_use]
    pub fn target(&self) -> &[String] {
        &self.target
    }

    /// First source segment: the member the path hangs off
    #[inline]
    #[must_use]
    pub fn source_head(&self) -> &str {
        self.source.first().map_or("", String::as_str)
    }

    /// Dotted target path
    #[must_use]
    pub fn target_key(&self) -> String {
        self.target.join(".")
    }

    /// Both sides are a single member
    #[inline]
    #[must_use]
    pub fn is_single_level(&self) -> bool {
        self.source.len() == 1 && self.target.len() == 1
    }
}

/// Per-pair binding configuration
#[derive(Clone, Default)]
pub struct BindingConfig {
    renames: IndexMap<String, Vec<String>>,
    paths: IndexMap<String, Vec<BindingFieldPath>>,
    types: HashMap<String, Ty>,
    converters: HashMap<String, Converter>,
    ignored: IndexSet<String>,
}

impl BindingConfig {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `source_path` to `target_path`
    ///
    /// Single members on both sides become a rename; anything deeper becomes
    /// a path bind keyed by the source head. A source member may be bound to
    /// several targets.
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`].
    pub fn bind_path(mut self, source_path: &str, target_path: &str) -> Result<Self, BindingError> {
        let path = BindingFieldPath::new(source_path, target_path)?;
        if path.is_single_level() {
            let (source, target) = (path.source[0].clone(), path.target[0].clone());
            self.push_rename(source, target);
        } else {
            self.paths
                .entry(path.source_head().to_string())
                .or_default()
                .push(path);
        }
        Ok(self)
    }

    /// Bind source member `source` to target member `target`
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`] unless both are plain member names.
    pub fn bind_rename(mut self, source: &str, target: &str) -> Result<Self, BindingError> {
        let (source, target) = (identifier(source)?, identifier(target)?);
        self.push_rename(source, target);
        Ok(self)
    }

    fn push_rename(&mut self, source: String, target: String) {
        let targets = self.renames.entry(source).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Override the type a target member is mapped as
    ///
    /// `target` may be a dotted path to override the tail of a path bind.
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`].
    pub fn bind_type(mut self, target: &str, ty: Ty) -> Result<Self, BindingError> {
        let key = segments(target)?.join(".");
        self.types.insert(key, ty);
        Ok(self)
    }

    /// Convert values written to `target` with `converter`
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`].
    pub fn bind_converter<F>(mut self, target: &str, converter: F) -> Result<Self, BindingError>
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let key = segments(target)?.join(".");
        self.converters.insert(key, Arc::new(converter));
        Ok(self)
    }

    /// Skip source member `source`
    ///
    /// # Errors
    /// [`BindingError::MalformedPath`] unless `source` is a plain member name.
    pub fn ignore(mut self, source: &str) -> Result<Self, BindingError> {
        self.ignored.insert(identifier(source)?);
        Ok(self)
    }

    /// Target names `source` is renamed to
    #[must_use]
    pub fn renames_for(&self, source: &str) -> Option<&[String]> {
        self.renames.get(source).map(Vec::as_slice)
    }

    /// Path binds hanging off source member `source`
    #[must_use]
    pub fn paths_for(&self, source: &str) -> Option<&[BindingFieldPath]> {
        self.paths.get(source).map(Vec::as_slice)
    }

    /// Type override for a target member (or dotted target path)
    #[must_use]
    pub fn type_for(&self, target: &str) -> Option<&Ty> {
        self.types.get(target)
    }

    /// Converter for a target member (or dotted target path)
    #[must_use]
    pub fn converter_for(&self, target: &str) -> Option<&Converter> {
        self.converters.get(target)
    }

    /// Whether source member `source` is ignored
    #[inline]
    #[must_use]
    pub fn is_ignored(&self, source: &str) -> bool {
        self.ignored.contains(source)
    }

    /// Nothing configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
            && self.paths.is_empty()
            && self.types.is_empty()
            && self.converters.is_empty()
            && self.ignored.is_empty()
    }
}

impl Debug for BindingConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut converters: Vec<_> = self.converters.keys().collect();
        converters.sort();
        f.debug_struct("BindingConfig")
            .field("renames", &self.renames)
            .field("paths", &self.paths)
            .field("types", &self.types)
            .field("converters", &converters)
            .field("ignored", &self.ignored)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_level_paths_become_renames() {
        let config = BindingConfig::new()
            .bind_path("Name", "FullName")
            .unwrap()
            .bind_path("Name", "DisplayName")
            .unwrap();
        assert_eq!(
            config.renames_for("Name"),
            Some(&["FullName".to_string(), "DisplayName".to_string()][..])
        );
        assert!(config.paths_for("Name").is_none());
    }

    #[test]
    fn deep_paths_keyed_by_source_head() {
        let config = BindingConfig::new()
            .bind_path("Address.Street", "Street")
            .unwrap()
            .bind_path("Address.Phone", "Contact.Phone")
            .unwrap();
        let paths = config.paths_for("Address").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].target_key(), "Contact.Phone");
        assert!(config.renames_for("Address").is_none());
    }

    #[test]
    fn malformed_paths_fail_eagerly() {
        for bad in ["", "a..b", ".a", "a.", "1abc", "a-b", "a b"] {
            let err = BindingConfig::new().bind_path(bad, "X").unwrap_err();
            assert!(matches!(err, BindingError::MalformedPath { .. }), "{bad:?}");
        }
        assert!(BindingConfig::new().bind_rename("a.b", "c").is_err());
        assert!(BindingConfig::new().ignore("").is_err());
    }

    #[test]
    fn lookups_return_none_when_unset() {
        let config = BindingConfig::new();
        assert!(config.is_empty());
        assert!(config.renames_for("X").is_none());
        assert!(config.type_for("X").is_none());
        assert!(config.converter_for("X").is_none());
        assert!(!config.is_ignored("X"));
    }

    #[test]
    fn converters_and_types() {
        let config = BindingConfig::new()
            .bind_converter("Age", |v| Ok(v))
            .unwrap()
            .bind_type("Score", Ty::F64)
            .unwrap();
        let convert = config.converter_for("Age").unwrap();
        assert_eq!(convert(Value::Int(3)).unwrap(), Value::Int(3));
        assert_eq!(config.type_for("Score"), Some(&Ty::F64));
        assert!(format!("{config:?}").contains("Age"));
    }
}

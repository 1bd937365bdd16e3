//! Error types for the mapping engine
//!
//! Provides error handling for:
//! - Binding configuration (eager path validation)
//! - Bind failures (unsupported shapes, missing members, unresolved graphs)
//! - Mapping profile loading and application

use omap_emit::EmitError;
use omap_types::{CatalogError, Ty, TypePair, TypeParseError};

/// Invalid binding configuration, reported before any build
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// Member path is empty, has an empty segment, or a non-identifier segment
    #[error("malformed member path {path:?}: {reason}")]
    MalformedPath {
        /// Offending path
        path: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Bind failure; nothing is registered when one is returned
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// No builder can map this pair
    #[error("cannot map {source_type} to {target_type}")]
    Unsupported {
        /// Source type
        source_type: Ty,
        /// Target type
        target_type: Ty,
    },

    /// Path bind names a member that does not exist (or is not accessible)
    #[error("{owner} has no accessible member {member:?}")]
    MemberNotFound {
        /// Type searched
        owner: Ty,
        /// Missing member
        member: String,
    },

    /// Target object cannot be allocated
    #[error("{target_type} has neither a parameterless constructor nor value semantics")]
    NoDefaultConstructor {
        /// Type that could not be allocated
        target_type: Ty,
    },

    /// Pair is bound and the rebind policy rejects rebinding
    #[error("{source_type} -> {target_type} is already bound")]
    AlreadyBound {
        /// Source type
        source_type: Ty,
        /// Target type
        target_type: Ty,
    },

    /// A reserved mapper slot was never filled, or a sibling id is dangling
    #[error("mapper {id} for {pair} was never built")]
    UnresolvedStub {
        /// Cache id
        id: usize,
        /// Pair the slot was reserved for
        pair: TypePair,
    },

    /// Graph root id is not a slot of the cache being finalized
    #[error("mapper {0} is not a slot of this cache")]
    UnknownRoot(usize),

    /// Binding configuration rejected
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    /// Routine construction failed
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),

    /// Type expression failed to parse
    #[error("type error: {0}")]
    TypeParse(#[from] TypeParseError),
}

impl BindError {
    /// Unsupported-pair helper
    #[inline]
    #[must_use]
    pub fn unsupported(pair: &TypePair) -> Self {
        Self::Unsupported {
            source_type: pair.source.clone(),
            target_type: pair.target.clone(),
        }
    }
}

/// Mapping profile failure
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// File read failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension not recognized
    #[error("unsupported profile format: {path}")]
    UnsupportedFormat {
        /// Offending path
        path: String,
    },

    /// Catalog referenced by the profile failed to load
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Type expression in the profile failed to parse
    #[error("type error: {0}")]
    TypeParse(#[from] TypeParseError),

    /// Binding entry rejected
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    /// Bind of a profile pair failed
    #[error("bind error: {0}")]
    Bind(#[from] BindError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_both_types() {
        let pair = TypePair::new(Ty::object("Person"), Ty::I32);
        let msg = BindError::unsupported(&pair).to_string();
        assert_eq!(msg, "cannot map Person to i32");
    }

    #[test]
    fn binding_errors_convert() {
        let err: BindError = BindingError::MalformedPath {
            path: "a..b".into(),
            reason: "empty segment",
        }
        .into();
        assert!(matches!(err, BindError::Binding(_)));
    }
}

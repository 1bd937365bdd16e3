//! Member resolution
//!
//! [`MappingMemberBuilder`] decides which source members feed which target
//! members for one [`TypePair`], honoring member annotations, the pair's
//! [`BindingConfig`] and the configured name matcher.

use crate::binding::{BindingConfig, BindingFieldPath};
use crate::config::MapperConfig;
use crate::error::BindError;
use omap_types::{MemberAttribute, MemberInfo, Ty, TypeIntrospector, TypeName, TypePair};

/// One level of copy: source accessor, target accessor, member pair
#[derive(Debug, Clone, PartialEq)]
pub struct MappingMember {
    /// Member read from the source
    pub source: MemberInfo,
    /// Member written on the target
    pub target: MemberInfo,
    /// Conversion pair (target side narrowed by any type override)
    pub pair: TypePair,
}

/// Chain of accessors on each side
///
/// Both chains are non-empty. The head is the first level; the tail is the
/// innermost member and its pair governs conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingMemberPath {
    source: Vec<MemberInfo>,
    target: Vec<MemberInfo>,
    pair: TypePair,
}

impl MappingMemberPath {
    /// Create path; `None` when either chain is empty
    #[must_use]
    pub fn new(source: Vec<MemberInfo>, target: Vec<MemberInfo>, pair: TypePair) -> Option<Self> {
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            source,
            target,
            pair,
        })
    }

    /// Source accessor chain
    #[inline]
    #[must_use]
    pub fn source(&self) -> &[MemberInfo] {
        &self.source
    }

    /// Target accessor chain
    #[inline]
    #[must_use]
    pub fn target(&self) -> &[MemberInfo] {
        &self.target
    }

    /// Tail conversion pair
    #[inline]
    #[must_use]
    pub fn pair(&self) -> &TypePair {
        &self.pair
    }

    /// First-level members
    #[must_use]
    pub fn head(&self) -> (&MemberInfo, &MemberInfo) {
        (&self.source[0], &self.target[0])
    }

    /// Innermost members
    #[must_use]
    pub fn tail(&self) -> (&MemberInfo, &MemberInfo) {
        (
            &self.source[self.source.len() - 1],
            &self.target[self.target.len() - 1],
        )
    }

    /// One member on each side
    #[inline]
    #[must_use]
    pub fn is_single_level(&self) -> bool {
        self.source.len() == 1 && self.target.len() == 1
    }

    /// Dotted target path, the key converters and type overrides use
    #[must_use]
    pub fn target_key(&self) -> String {
        self.target
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<MappingMember> for MappingMemberPath {
    fn from(member: MappingMember) -> Self {
        Self {
            source: vec![member.source],
            target: vec![member.target],
            pair: member.pair,
        }
    }
}

/// Resolves the ordered member paths for a pair
#[derive(Debug, Clone, Copy)]
pub struct MappingMemberBuilder<'a> {
    introspector: &'a dyn TypeIntrospector,
    config: &'a MapperConfig,
    binding: Option<&'a BindingConfig>,
}

impl<'a> MappingMemberBuilder<'a> {
    /// Create builder
    #[must_use]
    pub fn new(
        introspector: &'a dyn TypeIntrospector,
        config: &'a MapperConfig,
        binding: Option<&'a BindingConfig>,
    ) -> Self {
        Self {
            introspector,
            config,
            binding,
        }
    }

    /// Resolve every member path for `pair`
    ///
    /// Paths come in source declaration order; for one source member, name
    /// binds precede path binds.
    ///
    /// # Errors
    /// [`BindError::MemberNotFound`] when a path bind does not resolve.
    pub fn build(&self, pair: &TypePair) -> Result<Vec<MappingMemberPath>, BindError> {
        let sources = self.introspector.readable_members(&pair.source);
        let targets = self.introspector.writable_members(&pair.target);
        let source_name = pair.source.type_name();
        let target_name = pair.target.type_name();

        let mut paths = Vec::new();
        for member in &sources {
            if self.is_ignored(member, target_name) {
                continue;
            }
            for name in self.candidate_names(member, &targets, source_name, target_name) {
                let Some(target) = targets.iter().find(|t| self.config.names_match(&name, &t.name))
                else {
                    continue;
                };
                let ty = self
                    .binding
                    .and_then(|b| b.type_for(&target.name))
                    .cloned()
                    .unwrap_or_else(|| target.ty.clone());
                paths.push(MappingMemberPath::from(MappingMember {
                    source: member.clone(),
                    target: target.clone(),
                    pair: TypePair::new(member.ty.clone(), ty),
                }));
            }
            if let Some(binds) = self.binding.and_then(|b| b.paths_for(&member.name)) {
                for bind in binds {
                    paths.push(self.resolve_path(pair, bind)?);
                }
            }
        }
        tracing::debug!("resolved {} member paths for {}", paths.len(), pair);
        Ok(paths)
    }

    fn is_ignored(&self, member: &MemberInfo, target_name: Option<&TypeName>) -> bool {
        let qualified = member.attributes.iter().any(|a| {
            matches!(a, MemberAttribute::Ignore { target: Some(t) } if Some(t) == target_name)
        });
        let unqualified = member
            .attributes
            .iter()
            .any(|a| matches!(a, MemberAttribute::Ignore { target: None }));
        qualified || unqualified || self.binding.is_some_and(|b| b.is_ignored(&member.name))
    }

    fn candidate_names(
        &self,
        member: &MemberInfo,
        targets: &[MemberInfo],
        source_name: Option<&TypeName>,
        target_name: Option<&TypeName>,
    ) -> Vec<String> {
        let binds = |qualified: bool| -> Vec<String> {
            member
                .attributes
                .iter()
                .filter_map(|a| match a {
                    MemberAttribute::Bind { name, target: Some(t) }
                        if qualified && Some(t) == target_name =>
                    {
                        Some(name.clone())
                    }
                    MemberAttribute::Bind { name, target: None } if !qualified => {
                        Some(name.clone())
                    }
                    _ => None,
                })
                .collect()
        };

        let qualified = binds(true);
        if !qualified.is_empty() {
            return qualified;
        }
        let unqualified = binds(false);
        if !unqualified.is_empty() {
            return unqualified;
        }
        if let Some(renames) = self.binding.and_then(|b| b.renames_for(&member.name)) {
            return renames.to_vec();
        }
        let reverse: Vec<String> = targets
            .iter()
            .filter(|t| {
                t.attributes.iter().any(|a| match a {
                    MemberAttribute::Bind { name, target } => {
                        name == &member.name
                            && (target.is_none() || target.as_ref() == source_name)
                    }
                    MemberAttribute::Ignore { .. } => false,
                })
            })
            .map(|t| t.name.clone())
            .collect();
        if !reverse.is_empty() {
            return reverse;
        }
        vec![member.name.clone()]
    }

    fn resolve_path(
        &self,
        pair: &TypePair,
        bind: &BindingFieldPath,
    ) -> Result<MappingMemberPath, BindError> {
        let source = self.walk(&pair.source, bind.source(), Side::Source)?;
        let target = self.walk(&pair.target, bind.target(), Side::Target)?;
        let (source_tail, target_tail) = (&source[source.len() - 1], &target[target.len() - 1]);
        let ty = self
            .binding
            .and_then(|b| b.type_for(&bind.target_key()))
            .cloned()
            .unwrap_or_else(|| target_tail.ty.clone());
        let tail = TypePair::new(source_tail.ty.clone(), ty);
        MappingMemberPath::new(source, target, tail).ok_or_else(|| BindError::MemberNotFound {
            owner: pair.target.clone(),
            member: bind.target_key(),
        })
    }

    fn walk(&self, root: &Ty, segments: &[String], side: Side) -> Result<Vec<MemberInfo>, BindError> {
        let mut owner = root.clone();
        let mut chain = Vec::with_capacity(segments.len());
        for (level, segment) in segments.iter().enumerate() {
            let last = level + 1 == segments.len();
            let candidates = match side {
                Side::Source => self.introspector.readable_members(&owner),
                Side::Target => self.introspector.writable_members(&owner),
            };
            let found = candidates
                .into_iter()
                .find(|m| self.config.names_match(segment, &m.name))
                .filter(|m| last || m.ty.is_object())
                .filter(|m| last || side == Side::Source || self.is_readable(&owner, &m.name));
            let Some(member) = found else {
                return Err(BindError::MemberNotFound {
                    owner,
                    member: segment.clone(),
                });
            };
            owner = member.ty.clone();
            chain.push(member);
        }
        Ok(chain)
    }

    fn is_readable(&self, owner: &Ty, name: &str) -> bool {
        self.introspector
            .readable_members(owner)
            .iter()
            .any(|m| m.name == name && !m.is_static)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// How candidate names are matched against target member names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Ordinal comparison
    #[default]
    Exact,
    /// ASCII case-insensitive comparison
    IgnoreCase,
    /// Case-insensitive, ignoring `_` and `-`
    Normalized,
}

impl NameMatching {
    /// Whether `candidate` names `member`
    #[must_use]
    pub fn matches(self, candidate: &str, member: &str) -> bool {
        match self {
            Self::Exact => candidate == member,
            Self::IgnoreCase => candidate.eq_ignore_ascii_case(member),
            Self::Normalized => normalized(candidate).eq(normalized(member)),
        }
    }
}

fn normalized(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
}

/// What a second bind of the same pair does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebindPolicy {
    /// Build a new graph and swap it in atomically
    #[default]
    Replace,
    /// Fail with `AlreadyBound`
    Reject,
}

/// Custom name matcher: `(candidate, member) -> matches`
#[derive(Clone)]
pub struct NameMatcher(Arc<dyn Fn(&str, &str) -> bool + Send + Sync>);

impl NameMatcher {
    /// Wrap a matching function
    pub fn new(f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply
    #[inline]
    #[must_use]
    pub fn matches(&self, candidate: &str, member: &str) -> bool {
        (self.0)(candidate, member)
    }
}

impl Debug for NameMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("NameMatcher(..)")
    }
}

/// Mapper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Built-in name matching mode
    #[serde(default)]
    pub name_matching: NameMatching,
    /// Rebind behavior
    #[serde(default)]
    pub rebind: RebindPolicy,
    /// Custom matcher; takes precedence over `name_matching`
    #[serde(skip)]
    pub matcher: Option<NameMatcher>,
}

impl MapperConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With name matching mode
    #[inline]
    #[must_use]
    pub fn with_name_matching(mut self, mode: NameMatching) -> Self {
        self.name_matching = mode;
        self
    }

    /// With rebind policy
    #[inline]
    #[must_use]
    pub fn with_rebind(mut self, policy: RebindPolicy) -> Self {
        self.rebind = policy;
        self
    }

    /// With custom matcher
    #[inline]
    #[must_use]
    pub fn with_matcher(mut self, f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        self.matcher = Some(NameMatcher::new(f));
        self
    }

    /// Whether `candidate` names the member `member`
    #[must_use]
    pub fn names_match(&self, candidate: &str, member: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.matches(candidate, member),
            None => self.name_matching.matches(candidate, member),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_modes() {
        assert!(NameMatching::Exact.matches("Name", "Name"));
        assert!(!NameMatching::Exact.matches("name", "Name"));
        assert!(NameMatching::IgnoreCase.matches("name", "NAME"));
        assert!(NameMatching::Normalized.matches("first_name", "FirstName"));
        assert!(!NameMatching::Normalized.matches("first", "FirstName"));
    }

    #[test]
    fn custom_matcher_wins() {
        let config = MapperConfig::new()
            .with_name_matching(NameMatching::IgnoreCase)
            .with_matcher(|candidate, member| member == format!("m_{candidate}"));
        assert!(config.names_match("Age", "m_Age"));
        assert!(!config.names_match("age", "AGE"));
    }

    #[test]
    fn deserializes_from_yaml() {
        let config: MapperConfig =
            serde_yaml::from_str("name_matching: ignore_case\nrebind: reject\n").unwrap();
        assert_eq!(config.name_matching, NameMatching::IgnoreCase);
        assert_eq!(config.rebind, RebindPolicy::Reject);
        assert!(config.matcher.is_none());
    }
}

//! Script namespaces and user-supplied identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Provenance of a script, which is also the directory that holds it.
///
/// # Examples
///
/// ```
/// use act_core::Namespace;
///
/// assert_eq!("LOCAL".parse::<Namespace>(), Ok(Namespace::Local));
/// assert_eq!(Namespace::Community.to_string(), "community");
/// assert!("team".parse::<Namespace>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// User-authored scripts.
    Local,
    /// Scripts installed from the community repository.
    Community,
}

impl Namespace {
    /// Every namespace in search order: local scripts shadow community ones.
    pub const SEARCH_ORDER: [Namespace; 2] = [Namespace::Local, Namespace::Community];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Local => "local",
            Namespace::Community => "community",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known namespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown namespace '{0}'")]
pub struct UnknownNamespace(pub String);

impl FromStr for Namespace {
    type Err = UnknownNamespace;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            Ok(Namespace::Local)
        } else if s.eq_ignore_ascii_case("community") {
            Ok(Namespace::Community)
        } else {
            Err(UnknownNamespace(s.to_string()))
        }
    }
}

/// A script identifier as typed by the user, optionally `namespace:token`.
///
/// An unrecognized namespace prefix is not an error: the whole input is then
/// treated as an unscoped token.
///
/// # Examples
///
/// ```
/// use act_core::{Identifier, Namespace};
///
/// let id = Identifier::parse("Community:weather");
/// assert_eq!(id.namespace(), Some(Namespace::Community));
/// assert_eq!(id.token(), "weather");
/// assert_eq!(id.search_order(), &[Namespace::Community]);
///
/// let id = Identifier::parse("team:weather");
/// assert_eq!(id.namespace(), None);
/// assert_eq!(id.token(), "team:weather");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    namespace: Option<Namespace>,
    token: String,
}

impl Identifier {
    pub fn parse(raw: &str) -> Self {
        let scoped = raw
            .split_once(':')
            .and_then(|(prefix, token)| Some((prefix.parse::<Namespace>().ok()?, token)));

        match scoped {
            Some((namespace, token)) => Self {
                raw: raw.to_string(),
                namespace: Some(namespace),
                token: token.to_string(),
            },
            None => Self {
                raw: raw.to_string(),
                namespace: None,
                token: raw.to_string(),
            },
        }
    }

    /// The identifier exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }

    /// The command or alias to look for.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Namespaces to search, in priority order.
    pub fn search_order(&self) -> &'static [Namespace] {
        match self.namespace {
            Some(Namespace::Local) => &[Namespace::Local],
            Some(Namespace::Community) => &[Namespace::Community],
            None => &Namespace::SEARCH_ORDER,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscoped_searches_local_first() {
        let id = Identifier::parse("build");
        assert_eq!(id.namespace(), None);
        assert_eq!(id.token(), "build");
        assert_eq!(id.search_order(), &[Namespace::Local, Namespace::Community]);
    }

    #[test]
    fn test_scoped_is_case_insensitive() {
        let id = Identifier::parse("LoCaL:build");
        assert_eq!(id.namespace(), Some(Namespace::Local));
        assert_eq!(id.token(), "build");
        assert_eq!(id.as_str(), "LoCaL:build");
    }

    #[test]
    fn test_splits_on_first_separator_only() {
        let id = Identifier::parse("community:a:b");
        assert_eq!(id.namespace(), Some(Namespace::Community));
        assert_eq!(id.token(), "a:b");
    }

    #[test]
    fn test_unknown_namespace_falls_back_to_whole_identifier() {
        let id = Identifier::parse("wttr.in:berlin");
        assert_eq!(id.namespace(), None);
        assert_eq!(id.token(), "wttr.in:berlin");
        assert_eq!(id.search_order().len(), 2);
    }

    #[test]
    fn test_namespace_serde_is_lowercase() {
        let json = serde_json::to_string(&Namespace::Community).unwrap();
        assert_eq!(json, "\"community\"");
    }
}

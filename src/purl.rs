//! Canonical package coordinates.
//!
//! A [`PackageId`] is the package-URL style coordinate
//! (`pkg:type/namespace/name@version?qualifiers`) used as the sole external
//! key for every package in the store and as the argument to every harvester
//! call. Instances are immutable once parsed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a package coordinate.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PurlError {
    /// Input does not start with the `pkg:` scheme
    #[error("missing 'pkg:' scheme in '{0}'")]
    MissingScheme(String),

    /// A mandatory component (type or name) is absent
    #[error("missing {component} in '{input}'")]
    MissingComponent {
        component: &'static str,
        input: String,
    },

    /// A qualifier is not a `key=value` pair
    #[error("malformed qualifier '{0}'")]
    MalformedQualifier(String),
}

/// Canonical, immutable package coordinate.
///
/// Ordering and hashing follow the canonical string form, so identifiers can
/// be used directly as map keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
    /// Package ecosystem (e.g. `npm`, `deb`, `maven`)
    pub pkg_type: String,

    /// Optional grouping such as an npm scope or Maven group
    pub namespace: Option<String>,

    /// Package name
    pub name: String,

    /// Version or revision
    pub version: String,

    /// Additional qualifiers (e.g. `arch=amd64`), sorted by key
    pub qualifiers: BTreeMap<String, String>,
}

impl PackageId {
    /// Builds a coordinate without namespace or qualifiers.
    pub fn new(
        pkg_type: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            pkg_type: pkg_type.into(),
            namespace: None,
            name: name.into(),
            version: version.into(),
            qualifiers: BTreeMap::new(),
        }
    }

    /// Adds a namespace component.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds one qualifier.
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers.insert(key.into(), value.into());
        self
    }

    /// Parses the canonical `pkg:` text form.
    ///
    /// # Errors
    ///
    /// Returns [`PurlError`] if the scheme, type or name is missing, or a
    /// qualifier is not a `key=value` pair.
    pub fn parse(input: &str) -> Result<Self, PurlError> {
        let body = input
            .strip_prefix("pkg:")
            .ok_or_else(|| PurlError::MissingScheme(input.to_string()))?;

        let (body, qualifiers) = match body.split_once('?') {
            Some((head, query)) => (head, parse_qualifiers(query)?),
            None => (body, BTreeMap::new()),
        };

        let (path, version) = match body.rsplit_once('@') {
            Some((path, version)) if !version.is_empty() => (path, version.to_string()),
            _ => {
                return Err(PurlError::MissingComponent {
                    component: "version",
                    input: input.to_string(),
                })
            }
        };

        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(PurlError::MissingComponent {
                component: "type or name",
                input: input.to_string(),
            });
        }
        let pkg_type = segments.remove(0).to_ascii_lowercase();
        let name = segments
            .pop()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PurlError::MissingComponent {
                component: "name",
                input: input.to_string(),
            })?
            .to_string();
        let namespace = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };

        Ok(Self {
            pkg_type,
            namespace,
            name,
            version,
            qualifiers,
        })
    }
}

fn parse_qualifiers(query: &str) -> Result<BTreeMap<String, String>, PurlError> {
    let mut qualifiers = BTreeMap::new();
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| PurlError::MalformedQualifier(pair.to_string()))?;
        qualifiers.insert(key.to_ascii_lowercase(), value.to_string());
    }
    Ok(qualifiers)
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}", self.pkg_type)?;
        if let Some(ns) = &self.namespace {
            write!(f, "/{}", ns)?;
        }
        write!(f, "/{}@{}", self.name, self.version)?;
        let mut sep = '?';
        for (key, value) in &self.qualifiers {
            write!(f, "{}{}={}", sep, key, value)?;
            sep = '&';
        }
        Ok(())
    }
}

impl FromStr for PackageId {
    type Err = PurlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageId {
    type Error = PurlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_coordinate() {
        let id = PackageId::parse("pkg:npm/%40scope/left-pad@1.3.0?arch=amd64&os=linux").unwrap();
        assert_eq!(id.pkg_type, "npm");
        assert_eq!(id.namespace.as_deref(), Some("%40scope"));
        assert_eq!(id.name, "left-pad");
        assert_eq!(id.version, "1.3.0");
        assert_eq!(id.qualifiers.get("arch").map(String::as_str), Some("amd64"));
        assert_eq!(id.qualifiers.get("os").map(String::as_str), Some("linux"));
    }

    #[test]
    fn parses_without_namespace() {
        let id = PackageId::parse("pkg:deb/curl@7.88.1").unwrap();
        assert_eq!(id.pkg_type, "deb");
        assert_eq!(id.namespace, None);
        assert_eq!(id.name, "curl");
    }

    #[test]
    fn round_trips_display() {
        for text in [
            "pkg:deb/curl@7.88.1",
            "pkg:maven/org.apache/commons-io@2.11.0",
            "pkg:npm/chalk@5.0.0?arch=all",
        ] {
            let id = PackageId::parse(text).unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn normalizes_type_to_lowercase() {
        let id = PackageId::parse("pkg:NPM/chalk@5.0.0").unwrap();
        assert_eq!(id.pkg_type, "npm");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            PackageId::parse("npm/chalk@5.0.0"),
            Err(PurlError::MissingScheme(_))
        ));
        assert!(matches!(
            PackageId::parse("pkg:npm/chalk"),
            Err(PurlError::MissingComponent { .. })
        ));
        assert!(matches!(
            PackageId::parse("pkg:chalk@5.0.0"),
            Err(PurlError::MissingComponent { .. })
        ));
        assert!(matches!(
            PackageId::parse("pkg:npm/chalk@5.0.0?arch"),
            Err(PurlError::MalformedQualifier(_))
        ));
    }

    #[test]
    fn builder_matches_parser() {
        let built = PackageId::new("npm", "chalk", "5.0.0").with_qualifier("arch", "all");
        let parsed = PackageId::parse("pkg:npm/chalk@5.0.0?arch=all").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn serde_uses_string_form() {
        let id = PackageId::parse("pkg:deb/curl@7.88.1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pkg:deb/curl@7.88.1\"");
        let back: PackageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

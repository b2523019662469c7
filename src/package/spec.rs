//! Package specifier parsing.

use anyhow::Result;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProdError;

/// A requestable package: a name plus an optional version token.
///
/// Format: "name" or "name-version", where the version starts with a digit
/// (e.g. "vfxCore-2.5", "mayaUSD", "my-tool-1.0").
/// Identity for overrides is the name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(String::from),
        }
    }

    /// Two specifiers are interchangeable for override purposes when their names match.
    pub fn same_package(&self, other: &PackageSpec) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}-{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Serialize for PackageSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for PackageSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(ProdError::InvalidPackageSpec {
                spec: s.to_string(),
            }
            .into());
        }

        // Only split on the last '-' when what follows looks like a version.
        if let Some(dash) = token.rfind('-') {
            let (name, version) = (&token[..dash], &token[dash + 1..]);
            if !name.is_empty() && is_version_like(version) {
                return Ok(PackageSpec::new(name, Some(version)));
            }
        }

        if token.starts_with('-') || token.ends_with('-') {
            return Err(ProdError::InvalidPackageSpec {
                spec: s.to_string(),
            }
            .into());
        }

        Ok(PackageSpec::new(token, None))
    }
}

fn is_version_like(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '<' | '~' | '|'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_version() {
        let spec = PackageSpec::from_str("vfxCore-2.5").unwrap();
        assert_eq!(spec.name, "vfxCore");
        assert_eq!(spec.version.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_parse_without_version() {
        let spec = PackageSpec::from_str("mayaUSD").unwrap();
        assert_eq!(spec.name, "mayaUSD");
        assert_eq!(spec.version, None);
    }

    #[test]
    fn test_parse_hyphenated_name_without_version() {
        let spec = PackageSpec::from_str("usd-tools").unwrap();
        assert_eq!(spec.name, "usd-tools");
        assert_eq!(spec.version, None);
    }

    #[test]
    fn test_parse_hyphenated_name_with_version() {
        let spec = PackageSpec::from_str("usd-tools-23.11").unwrap();
        assert_eq!(spec.name, "usd-tools");
        assert_eq!(spec.version.as_deref(), Some("23.11"));
    }

    #[test]
    fn test_parse_version_range_suffix() {
        let spec = PackageSpec::from_str("python-3.9+<3.11").unwrap();
        assert_eq!(spec.name, "python");
        assert_eq!(spec.version.as_deref(), Some("3.9+<3.11"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PackageSpec::from_str("").is_err());
        assert!(PackageSpec::from_str("two words").is_err());
        assert!(PackageSpec::from_str("-2.0").is_err());
        assert!(PackageSpec::from_str("trailing-").is_err());
    }

    #[test]
    fn test_display_round_trips_token() {
        for token in ["golaem-6.3", "mtoa", "usd-tools-23.11"] {
            let spec = PackageSpec::from_str(token).unwrap();
            assert_eq!(spec.to_string(), token);
        }
    }

    #[test]
    fn test_same_package_ignores_version() {
        let a = PackageSpec::from_str("vfxCore-2.5").unwrap();
        let b = PackageSpec::from_str("vfxCore-3.0").unwrap();
        let c = PackageSpec::from_str("vfxCoreExtra-2.5").unwrap();
        assert!(a.same_package(&b));
        assert!(!a.same_package(&c));
    }

    #[test]
    fn test_serializes_as_token() {
        let spec = PackageSpec::from_str("mtoa-2.3").unwrap();
        assert_eq!(serde_json::to_string(&spec).unwrap(), "\"mtoa-2.3\"");
    }
}

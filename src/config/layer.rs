//! Parsing of a single configuration file into a typed layer.
//!
//! Grammar (one construct per line):
//!
//! ```text
//! # comment            ; comment
//! [section]
//! key = scalar value
//! key = ["pkg-1.0", 'other', ...]
//! ```
//!
//! A value starting with `[` must be a complete list of quoted package
//! specifiers on that line; anything else is a scalar.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ProdError;
use crate::package::PackageSpec;

/// A configuration value: a scalar string or an ordered list of package specifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Packages(Vec<PackageSpec>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Packages(_) => None,
        }
    }

    pub fn as_packages(&self) -> Option<&[PackageSpec]> {
        match self {
            Value::Packages(p) => Some(p),
            Value::Scalar(_) => None,
        }
    }
}

pub type Section = BTreeMap<String, Value>;

/// One parsed configuration file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    origin: PathBuf,
    sections: BTreeMap<String, Section>,
}

impl ConfigLayer {
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn sections(&self) -> &BTreeMap<String, Section> {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn scalar(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)?.as_scalar()
    }

    /// Parse `text` read from `origin`.
    pub fn parse(origin: &Path, text: &str) -> Result<Self> {
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let fail = |detail: String| ProdError::ConfigParse {
                path: origin.to_path_buf(),
                line: line_no,
                detail,
            };

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| fail(format!("unterminated section header: {}", line)))?
                    .trim();
                if name.is_empty() {
                    return Err(fail("empty section name".to_string()).into());
                }
                if sections.contains_key(name) {
                    return Err(fail(format!("duplicate section [{}]", name)).into());
                }
                sections.insert(name.to_string(), Section::new());
                current = Some(name.to_string());
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| fail(format!("expected 'key = value', found: {}", line)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(fail("empty key".to_string()).into());
            }

            let section_name = current
                .as_ref()
                .ok_or_else(|| fail(format!("key '{}' appears before any section header", key)))?;
            let section = sections.entry(section_name.clone()).or_default();
            if section.contains_key(key) {
                return Err(fail(format!("duplicate key '{}' in [{}]", key, section_name)).into());
            }

            let value = parse_value(value.trim()).map_err(fail)?;
            section.insert(key.to_string(), value);
        }

        Ok(Self {
            origin: origin.to_path_buf(),
            sections,
        })
    }
}

fn parse_value(raw: &str) -> Result<Value, String> {
    match raw.strip_prefix('[') {
        Some(rest) => {
            let body = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unterminated list: {}", raw))?;
            parse_package_list(body).map(Value::Packages)
        }
        None => Ok(Value::Scalar(raw.to_string())),
    }
}

fn parse_package_list(body: &str) -> Result<Vec<PackageSpec>, String> {
    let mut packages = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let quote = match chars.next() {
            None => break,
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(format!("expected a quoted package name, found '{}'", c)),
        };

        let mut token = String::new();
        loop {
            match chars.next() {
                Some(c) if c == quote => break,
                Some(c) => token.push(c),
                None => return Err(format!("unterminated string in list: {}{}", quote, token)),
            }
        }
        let spec = PackageSpec::from_str(&token).map_err(|e| e.to_string())?;
        packages.push(spec);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => return Err(format!("expected ',' or ']' after {}, found '{}'", token, c)),
        }
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigLayer> {
        ConfigLayer::parse(Path::new("/studio/software.ini"), text)
    }

    fn parse_error(text: &str) -> (usize, String) {
        let err = parse(text).unwrap_err();
        match err.downcast_ref::<ProdError>() {
            Some(ProdError::ConfigParse { line, detail, .. }) => (*line, detail.clone()),
            other => panic!("expected ConfigParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sections_scalars_and_lists() {
        let layer = parse(
            r#"
# studio software
[maya]
version = 2023.3.2
packages = ["mtoa-2.3", 'mayaUSD']

[environment]
PROD_TYPE = feature
"#,
        )
        .unwrap();

        assert_eq!(layer.origin(), Path::new("/studio/software.ini"));
        assert_eq!(layer.scalar("maya", "version"), Some("2023.3.2"));
        assert_eq!(layer.scalar("environment", "PROD_TYPE"), Some("feature"));

        let packages = layer.section("maya").unwrap()["packages"].as_packages().unwrap();
        assert_eq!(
            packages,
            &[
                PackageSpec::new("mtoa", Some("2.3")),
                PackageSpec::new("mayaUSD", None)
            ]
        );
    }

    #[test]
    fn test_parse_empty_list_and_trailing_comma() {
        let layer = parse("[common]\npackages = []\n[nuke]\npackages = [\"a-1\", ]\n").unwrap();
        assert_eq!(
            layer.section("common").unwrap()["packages"].as_packages(),
            Some(&[][..])
        );
        assert_eq!(
            layer.section("nuke").unwrap()["packages"]
                .as_packages()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_scalar_keeps_inner_equals_and_case() {
        let layer = parse("[environment]\nOCIO = /show/ocio/config.ocio?a=b\n").unwrap();
        assert_eq!(
            layer.scalar("environment", "OCIO"),
            Some("/show/ocio/config.ocio?a=b")
        );
        assert_eq!(layer.scalar("environment", "ocio"), None);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        assert_eq!(parse_error("[maya]\npackages = [\"a\"\n").0, 2);
        assert!(parse_error("[maya]\npackages = [a-1]\n").1.contains("quoted"));
        assert!(parse_error("[maya]\npackages = [\"a-1\" \"b\"]\n").1.contains("','"));
        assert!(parse_error("[maya]\npackages = [\"a-1]\n").1.contains("unterminated"));
        assert!(parse_error("version = 1\n").1.contains("before any section"));
        assert!(parse_error("[maya\n").1.contains("section header"));
        assert!(parse_error("[maya]\njust text\n").1.contains("key = value"));
        assert_eq!(parse_error("[a]\n[b]\n[a]\n").0, 3);
        assert!(parse_error("[a]\nx = 1\nx = 2\n").1.contains("duplicate key"));
    }

    #[test]
    fn test_parse_invalid_package_token() {
        let (_, detail) = parse_error("[maya]\npackages = [\"two words\"]\n");
        assert!(detail.contains("two words"));
    }
}

//! Layer merging under the precedence rule: later layers win.

use std::collections::BTreeMap;

use super::layer::{ConfigLayer, Section, Value};
use crate::error::ProdError;
use crate::package::PackageSpec;

/// Section holding the packages every alias receives.
pub const COMMON_SECTION: &str = "common";
/// Section holding environment variable assignments.
pub const ENVIRONMENT_SECTION: &str = "environment";

const RESERVED_SECTIONS: [&str; 2] = [COMMON_SECTION, ENVIRONMENT_SECTION];

pub type EnvMap = BTreeMap<String, String>;

/// Apply `overrides` on top of `base` by package name.
///
/// A specifier whose name is already present replaces that entry in place;
/// otherwise it is appended. Later entries in `overrides` win over earlier ones.
pub fn apply_override(base: &[PackageSpec], overrides: &[PackageSpec]) -> Vec<PackageSpec> {
    let mut merged = Vec::with_capacity(base.len() + overrides.len());
    for spec in base.iter().chain(overrides) {
        match merged.iter().position(|p: &PackageSpec| p.same_package(spec)) {
            Some(idx) => merged[idx] = spec.clone(),
            None => merged.push(spec.clone()),
        }
    }
    merged
}

/// A software entry as configured in the merged software layers.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareDefinition {
    pub alias: String,
    /// Package name requested from the package runtime.
    pub software: String,
    pub version: String,
    /// Executable launched inside the environment.
    pub command: String,
    pub packages: Vec<PackageSpec>,
}

/// The logical result of merging an ordered sequence of layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedConfig {
    sections: BTreeMap<String, Section>,
}

impl MergedConfig {
    /// Merge `layers`; index order is precedence order (last wins).
    pub fn merge(layers: &[ConfigLayer]) -> Self {
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();

        for layer in layers {
            for (name, incoming) in layer.sections() {
                let section = sections.entry(name.clone()).or_default();
                for (key, value) in incoming {
                    let merged = match (section.get(key), value) {
                        (Some(Value::Packages(current)), Value::Packages(new)) => {
                            Value::Packages(apply_override(current, new))
                        }
                        (_, Value::Packages(new)) => Value::Packages(apply_override(&[], new)),
                        (_, scalar) => scalar.clone(),
                    };
                    section.insert(key.clone(), merged);
                }
            }
        }

        Self { sections }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn scalar(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key)?.as_scalar()
    }

    pub fn packages(&self, section: &str) -> &[PackageSpec] {
        self.sections
            .get(section)
            .and_then(|s| s.get("packages"))
            .and_then(Value::as_packages)
            .unwrap_or_default()
    }

    /// Software aliases: every non-reserved section that defines a `version`.
    pub fn software_aliases(&self) -> Vec<&str> {
        self.section_names()
            .filter(|name| !RESERVED_SECTIONS.contains(name))
            .filter(|name| self.scalar(name, "version").is_some())
            .collect()
    }

    pub fn software(&self, alias: &str) -> Result<SoftwareDefinition, ProdError> {
        let version = self
            .scalar(alias, "version")
            .filter(|_| !RESERVED_SECTIONS.contains(&alias))
            .ok_or_else(|| ProdError::UnknownAlias {
                alias: alias.to_string(),
            })?;

        let software = self.scalar(alias, "software").unwrap_or(alias).to_string();
        let command = self
            .scalar(alias, "command")
            .map(String::from)
            .unwrap_or_else(|| software.clone());

        Ok(SoftwareDefinition {
            alias: alias.to_string(),
            software,
            version: version.to_string(),
            command,
            packages: self.packages(alias).to_vec(),
        })
    }

    /// `[common]` packages with the alias section's packages applied on top.
    pub fn pipeline_packages(&self, alias: &str) -> Vec<PackageSpec> {
        apply_override(self.packages(COMMON_SECTION), self.packages(alias))
    }

    /// The merged `[environment]` section; list values are ignored.
    pub fn environment_variables(&self) -> EnvMap {
        self.sections
            .get(ENVIRONMENT_SECTION)
            .map(|section| {
                section
                    .iter()
                    .filter_map(|(k, v)| v.as_scalar().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

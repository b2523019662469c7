//! Turning a resolved invocation into a request for the package runtime.

use serde::Serialize;
use std::collections::BTreeMap;

use super::resolver::{LaunchMode, ResolvedInvocation};
use super::PackageSpec;

/// A request for the package runtime: materialize exactly these packages, in
/// this order, and optionally run `command` inside the environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationRequest {
    pub alias: String,
    pub packages: Vec<PackageSpec>,
    /// `None` hands interactive control to the runtime's own environment shell.
    pub command: Option<String>,
    pub verbose: bool,
}

impl InvocationRequest {
    /// Build the request for `resolved`: the software package first, then the
    /// resolved packages; no command in env-only mode.
    pub fn build(resolved: &ResolvedInvocation) -> Self {
        let mut packages = Vec::with_capacity(resolved.packages.len() + 1);
        packages.push(PackageSpec::new(&resolved.software, Some(&resolved.version)));
        packages.extend(resolved.packages.iter().cloned());

        let command = match resolved.mode {
            LaunchMode::Normal => Some(resolved.command.clone()),
            LaunchMode::EnvOnly => None,
        };

        Self {
            alias: resolved.alias.clone(),
            packages,
            command,
            verbose: resolved.verbose,
        }
    }
}

/// Alias name → invocation descriptor for a production session.
///
/// Invoking an alias resolves it again from configuration; the stored
/// request describes what the alias launched with no extra flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AliasTable {
    entries: BTreeMap<String, InvocationRequest>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, alias: &str, request: InvocationRequest) {
        self.entries.insert(alias.to_string(), request);
    }

    pub fn get(&self, alias: &str) -> Option<&InvocationRequest> {
        self.entries.get(alias)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn resolved(mode: LaunchMode) -> ResolvedInvocation {
        ResolvedInvocation {
            alias: "mayapy".into(),
            software: "maya".into(),
            version: "2023.3.2".into(),
            command: "mayapy".into(),
            packages: vec![
                PackageSpec::from_str("mtoa-2.3").unwrap(),
                PackageSpec::from_str("vfxCore-2.5").unwrap(),
            ],
            mode,
            verbose: false,
        }
    }

    #[test]
    fn test_build_prepends_software_and_sets_command() {
        let request = InvocationRequest::build(&resolved(LaunchMode::Normal));
        let tokens: Vec<_> = request.packages.iter().map(ToString::to_string).collect();
        assert_eq!(tokens, ["maya-2023.3.2", "mtoa-2.3", "vfxCore-2.5"]);
        assert_eq!(request.command.as_deref(), Some("mayapy"));
        assert_eq!(request.alias, "mayapy");
    }

    #[test]
    fn test_build_env_only_has_no_command() {
        let request = InvocationRequest::build(&resolved(LaunchMode::EnvOnly));
        assert_eq!(request.command, None);
        assert_eq!(request.packages.len(), 3);
    }

    #[test]
    fn test_alias_table_lookup() {
        let mut table = AliasTable::new();
        assert!(table.is_empty());

        table.register("mayapy", InvocationRequest::build(&resolved(LaunchMode::Normal)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.names().collect::<Vec<_>>(), ["mayapy"]);
        assert!(table.get("mayapy").is_some());
        assert!(table.get("nuke").is_none());
    }
}

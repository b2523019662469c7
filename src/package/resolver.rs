//! Final package set resolution for a software alias.

use serde::Serialize;

use super::PackageSpec;
use crate::config::{MergedConfig, apply_override};
use crate::error::ProdError;

/// How the package runtime should treat the resolved environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchMode {
    /// Launch the software inside the environment.
    #[default]
    Normal,
    /// Open the environment's shell without launching anything.
    EnvOnly,
}

/// Flags supplied for one alias invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationOptions {
    pub packages: Vec<PackageSpec>,
    pub mode: LaunchMode,
    pub verbose: bool,
}

/// Everything needed to launch one alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInvocation {
    pub alias: String,
    pub software: String,
    pub version: String,
    pub command: String,
    pub packages: Vec<PackageSpec>,
    pub mode: LaunchMode,
    pub verbose: bool,
}

/// Resolves aliases against the merged software and pipeline configurations.
pub struct PackageResolver<'a> {
    software: &'a MergedConfig,
    pipeline: &'a MergedConfig,
}

impl<'a> PackageResolver<'a> {
    pub fn new(software: &'a MergedConfig, pipeline: &'a MergedConfig) -> Self {
        Self { software, pipeline }
    }

    /// Aliases that can be resolved, in name order.
    pub fn aliases(&self) -> Vec<&'a str> {
        self.software.software_aliases()
    }

    /// Resolve `alias`: software packages, then pipeline packages, then the
    /// invocation's own packages, each applied by name over the previous.
    /// The software version is never affected by package overrides.
    pub fn resolve(
        &self,
        alias: &str,
        options: &InvocationOptions,
    ) -> Result<ResolvedInvocation, ProdError> {
        let definition = self.software.software(alias)?;

        let packages = apply_override(&[], &definition.packages);
        let packages = apply_override(&packages, &self.pipeline.pipeline_packages(alias));
        let packages = apply_override(&packages, &options.packages);

        Ok(ResolvedInvocation {
            alias: definition.alias,
            software: definition.software,
            version: definition.version,
            command: definition.command,
            packages,
            mode: options.mode,
            verbose: options.verbose,
        })
    }
}

//! A production's merged configuration.

use anyhow::{Context, Result};
use log::debug;

use crate::config::{EnvMap, MergedConfig, load_layer_paths};
use crate::package::{AliasTable, InvocationOptions, InvocationRequest, PackageResolver};
use crate::runtime::Runtime;
use crate::settings::Settings;

/// Variable that names the active production in a session's environment.
pub const PROD_ENV: &str = "PROD";

/// Software and pipeline configuration merged for one production.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionConfig {
    pub name: String,
    pub software: MergedConfig,
    pub pipeline: MergedConfig,
}

impl ProductionConfig {
    /// Load and merge both configuration kinds for a registered production.
    #[tracing::instrument(skip(runtime, settings))]
    pub fn load<R: Runtime>(runtime: &R, settings: &Settings, name: &str) -> Result<Self> {
        settings.require_production(runtime, name)?;

        let software_layers = load_layer_paths(runtime, &settings.software_paths(runtime, name))
            .context("Failed to load software configuration")?;
        let pipeline_layers = load_layer_paths(runtime, &settings.pipeline_paths(runtime, name))
            .context("Failed to load pipeline configuration")?;
        debug!(
            "Loaded {} software and {} pipeline layers for {}",
            software_layers.len(),
            pipeline_layers.len(),
            name
        );

        Ok(Self {
            name: name.to_string(),
            software: MergedConfig::merge(&software_layers),
            pipeline: MergedConfig::merge(&pipeline_layers),
        })
    }

    pub fn resolver(&self) -> PackageResolver<'_> {
        PackageResolver::new(&self.software, &self.pipeline)
    }

    /// Variables a session sets: the pipeline `[environment]` section plus
    /// `PROD`, which always names this production.
    pub fn environment(&self) -> EnvMap {
        let mut env = self.pipeline.environment_variables();
        env.insert(PROD_ENV.to_string(), self.name.clone());
        env
    }

    /// One alias per configured software, each resolved with no extra flags.
    pub fn alias_table(&self) -> Result<AliasTable> {
        let resolver = self.resolver();
        let options = InvocationOptions::default();
        let mut table = AliasTable::new();

        for alias in resolver.aliases() {
            let resolved = resolver
                .resolve(alias, &options)
                .with_context(|| format!("Failed to resolve alias '{}'", alias))?;
            table.register(alias, InvocationRequest::build(&resolved));
        }

        Ok(table)
    }
}

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    config::EnvMap,
    package::{InvocationOptions, ResolvedInvocation},
    production::ProductionConfig,
    runtime::Runtime,
    settings::Settings,
};

use super::run::target_production;

/// What a production provides: its environment and every software alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionInfo {
    pub production: String,
    pub environment: EnvMap,
    pub software: Vec<ResolvedInvocation>,
}

impl ProductionInfo {
    pub fn collect(config: &ProductionConfig) -> Result<Self> {
        let resolver = config.resolver();
        let options = InvocationOptions::default();
        let software = resolver
            .aliases()
            .into_iter()
            .map(|alias| resolver.resolve(alias, &options))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            production: config.name.clone(),
            environment: config.environment(),
            software,
        })
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Production: {}\n", self.production);

        out.push_str("\nEnvironment:\n");
        for (key, value) in &self.environment {
            out.push_str(&format!("  {}={}\n", key, value));
        }

        out.push_str("\nSoftware:\n");
        if self.software.is_empty() {
            out.push_str("  (none)\n");
        }
        for sw in &self.software {
            let packages: Vec<_> = sw.packages.iter().map(ToString::to_string).collect();
            out.push_str(&format!("  {} {} ({})\n", sw.alias, sw.version, sw.command));
            if !packages.is_empty() {
                out.push_str(&format!("    packages: {}\n", packages.join(" ")));
            }
        }
        out
    }
}

/// Show a production's environment and software
#[tracing::instrument(skip(runtime, settings))]
pub fn info<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    production: Option<&str>,
    json: bool,
) -> Result<()> {
    let production = target_production(runtime, production)?;
    let config = ProductionConfig::load(runtime, settings, &production)?;
    let info = ProductionInfo::collect(&config)?;

    if json {
        let text =
            serde_json::to_string_pretty(&info).context("Failed to serialize production info")?;
        println!("{}", text);
    } else {
        print!("{}", info.render_text());
    }
    Ok(())
}

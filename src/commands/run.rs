use anyhow::Result;
use log::debug;

use crate::{
    error::ProdError,
    package::{InvocationOptions, InvocationRequest, LaunchMode, PackageRuntime, PackageSpec},
    production::{PROD_ENV, ProductionConfig},
    runtime::Runtime,
    settings::Settings,
};

/// Flags for one alias invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub alias: String,
    /// Production to resolve against; defaults to `$PROD`.
    pub production: Option<String>,
    /// Raw package specifiers, applied last.
    pub packages: Vec<String>,
    pub env_only: bool,
    pub verbose: bool,
}

impl RunOptions {
    fn invocation_options(&self) -> Result<InvocationOptions> {
        let packages = self
            .packages
            .iter()
            .map(|token| token.parse::<PackageSpec>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InvocationOptions {
            packages,
            mode: if self.env_only {
                LaunchMode::EnvOnly
            } else {
                LaunchMode::Normal
            },
            verbose: self.verbose,
        })
    }
}

/// Production an invocation resolves against: the explicit one, else the
/// active session's.
pub fn target_production<R: Runtime>(runtime: &R, explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    runtime
        .env_var(PROD_ENV)
        .ok()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ProdError::NoActiveProduction.into())
}

/// Resolve an alias from configuration and hand it to the package runtime.
/// Returns the package runtime's exit code unchanged.
#[tracing::instrument(skip(runtime, settings, package_runtime))]
pub fn run<R: Runtime, P: PackageRuntime>(
    runtime: &R,
    settings: &Settings,
    package_runtime: &P,
    options: &RunOptions,
) -> Result<i32> {
    let invocation = options.invocation_options()?;
    let production = target_production(runtime, options.production.as_deref())?;
    debug!("Running {} in production {}", options.alias, production);

    let config = ProductionConfig::load(runtime, settings, &production)?;
    let resolved = config.resolver().resolve(&options.alias, &invocation)?;
    let request = InvocationRequest::build(&resolved);

    package_runtime.materialize(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::MockPackageRuntime;
    use crate::test_utils::{MemoryRuntime, test_settings};

    fn runtime(env: &[(&str, &str)]) -> MemoryRuntime {
        let runtime = MemoryRuntime::with_env(env);
        runtime.add_file(
            "/studio/software.ini",
            "[maya]\nversion = 2023.3.2\npackages = [\"mtoa-2.3\"]\n",
        );
        runtime.add_file(
            "/studio/pipeline.ini",
            "[common]\npackages = [\"vfxCore-2.5\"]\n\
             [maya]\npackages = [\"vfxMayaTools-2.3\", \"golaem-6.3\"]\n",
        );
        runtime.add_dir("/prods/dlt");
        runtime
    }

    fn options(alias: &str) -> RunOptions {
        RunOptions {
            alias: alias.to_string(),
            ..Default::default()
        }
    }

    fn tokens(request: &InvocationRequest) -> Vec<String> {
        request.packages.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_run_uses_active_production() {
        let runtime = runtime(&[("PROD", "dlt")]);
        let mut rez = MockPackageRuntime::new();
        rez.expect_materialize()
            .withf(|request| {
                tokens(request)
                    == [
                        "maya-2023.3.2",
                        "mtoa-2.3",
                        "vfxCore-2.5",
                        "vfxMayaTools-2.3",
                        "golaem-6.3",
                    ]
                    && request.command.as_deref() == Some("maya")
            })
            .times(1)
            .returning(|_| Ok(0));

        assert_eq!(run(&runtime, &test_settings(), &rez, &options("maya")).unwrap(), 0);
    }

    #[test]
    fn test_run_with_overrides_and_env_only() {
        let runtime = runtime(&[]);
        let mut rez = MockPackageRuntime::new();
        rez.expect_materialize()
            .withf(|request| {
                tokens(request)
                    == [
                        "maya-2023.3.2",
                        "mtoa-2.3",
                        "vfxCore-2.5",
                        "vfxMayaTools-2.3",
                        "golaem-7.0",
                        "usd",
                    ]
                    && request.command.is_none()
                    && request.verbose
            })
            .times(1)
            .returning(|_| Ok(9));

        let options = RunOptions {
            production: Some("dlt".into()),
            packages: vec!["golaem-7.0".into(), "usd".into()],
            env_only: true,
            verbose: true,
            ..options("maya")
        };
        assert_eq!(run(&runtime, &test_settings(), &rez, &options).unwrap(), 9);
    }

    #[test]
    fn test_run_without_production() {
        let runtime = runtime(&[]);
        let mut rez = MockPackageRuntime::new();
        rez.expect_materialize().never();

        let err = run(&runtime, &test_settings(), &rez, &options("maya")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProdError>(),
            Some(ProdError::NoActiveProduction)
        ));
    }

    #[test]
    fn test_run_unknown_alias() {
        let runtime = runtime(&[("PROD", "dlt")]);
        let mut rez = MockPackageRuntime::new();
        rez.expect_materialize().never();

        let err = run(&runtime, &test_settings(), &rez, &options("houdini")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProdError>(),
            Some(ProdError::UnknownAlias { alias }) if alias == "houdini"
        ));
    }

    #[test]
    fn test_run_invalid_package_spec() {
        let runtime = runtime(&[("PROD", "dlt")]);
        let mut rez = MockPackageRuntime::new();
        rez.expect_materialize().never();

        let options = RunOptions {
            packages: vec!["-1.0".into()],
            ..options("maya")
        };
        let err = run(&runtime, &test_settings(), &rez, &options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProdError>(),
            Some(ProdError::InvalidPackageSpec { .. })
        ));
    }
}

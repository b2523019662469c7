//! The external package runtime (rez).

use anyhow::Result;
use log::info;

use super::InvocationRequest;
use crate::runtime::Runtime;

/// Materializes package environments on request. The core never resolves
/// dependencies itself; it asks for an exact ordered package list.
#[cfg_attr(test, mockall::automock)]
pub trait PackageRuntime {
    /// Materialize the environment and run the request's command (or the
    /// runtime's own shell). Returns the exit code unchanged.
    fn materialize(&self, request: &InvocationRequest) -> Result<i32>;
}

/// Runs `rez env <packages...> [-- <command>]`.
pub struct RezRuntime<'a, R: Runtime> {
    runtime: &'a R,
    program: String,
}

impl<'a, R: Runtime> RezRuntime<'a, R> {
    pub fn new(runtime: &'a R, program: impl Into<String>) -> Self {
        Self {
            runtime,
            program: program.into(),
        }
    }

    pub fn command_args(request: &InvocationRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(request.packages.len() + 4);
        if request.verbose {
            args.push("-v".to_string());
        }
        args.push("env".to_string());
        args.extend(request.packages.iter().map(ToString::to_string));
        if let Some(command) = &request.command {
            args.push("--".to_string());
            args.push(command.clone());
        }
        args
    }
}

impl<R: Runtime> PackageRuntime for RezRuntime<'_, R> {
    #[tracing::instrument(skip(self, request), fields(alias = %request.alias))]
    fn materialize(&self, request: &InvocationRequest) -> Result<i32> {
        let args = Self::command_args(request);
        info!("Executing: {} {}", self.program, args.join(" "));
        self.runtime.run_command(&self.program, &args)
    }
}

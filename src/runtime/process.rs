//! Child process execution.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::process::Command;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_impl(&self, program: &str, args: &[String]) -> Result<i32> {
        self.run_command_with_env_impl(program, args, &[])
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_with_env_impl(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<i32> {
        debug!("Running {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .status()
            .with_context(|| format!("Failed to run '{}'", program))?;

        match status.code() {
            Some(code) => Ok(code),
            None => {
                // Terminated by a signal; report the conventional shell status.
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    let signal = status.signal().unwrap_or_default();
                    warn!("'{}' was terminated by signal {}", program, signal);
                    Ok(128 + signal)
                }
                #[cfg(not(unix))]
                {
                    warn!("'{}' exited without a status code", program);
                    Ok(1)
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_run_command_returns_exit_code() {
        let runtime = RealRuntime;

        let code = runtime
            .run_command("sh", &["-c".to_string(), "exit 7".to_string()])
            .unwrap();
        assert_eq!(code, 7);

        let code = runtime.run_command("true", &[]).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_run_command_with_env_reaches_child_only() {
        let runtime = RealRuntime;
        let env = [("PROD_CHILD_ONLY".to_string(), "dlt".to_string())];

        let code = runtime
            .run_command_with_env(
                "sh",
                &["-c".to_string(), "test \"$PROD_CHILD_ONLY\" = dlt".to_string()],
                &env,
            )
            .unwrap();
        assert_eq!(code, 0);
        assert!(std::env::var("PROD_CHILD_ONLY").is_err());
    }

    #[test]
    fn test_run_command_missing_program() {
        let runtime = RealRuntime;
        let result = runtime.run_command("/nonexistent/prod-test-binary", &[]);
        assert!(result.is_err());
    }
}
